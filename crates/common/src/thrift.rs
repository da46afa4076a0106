//! IDL-derived structured records.
//!
//! A [`StructDescriptor`] is the runtime form of a Thrift struct definition; generated types
//! expose it through [`TBase`] and convert to/from the dynamic [`ThriftStruct`] value the
//! columnar schemes move around. Descriptors serialize to JSON so they can be embedded in file
//! metadata and recovered when reading without a compile-time type.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TapError};

/// Primitive Thrift field types supported by the columnar mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThriftType {
    Bool,
    Byte,
    I16,
    I32,
    I64,
    Double,
    String,
    Binary,
}

impl fmt::Display for ThriftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ThriftType::Bool => "bool",
            ThriftType::Byte => "byte",
            ThriftType::I16 => "i16",
            ThriftType::I32 => "i32",
            ThriftType::I64 => "i64",
            ThriftType::Double => "double",
            ThriftType::String => "string",
            ThriftType::Binary => "binary",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Thrift field id.
    pub id: i16,
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ThriftType,
    /// `required` fields must be set on every record; everything else is optional.
    #[serde(default)]
    pub required: bool,
}

impl FieldDescriptor {
    pub fn required(id: i16, name: impl Into<String>, ty: ThriftType) -> Self {
        Self {
            id,
            name: name.into(),
            ty,
            required: true,
        }
    }

    pub fn optional(id: i16, name: impl Into<String>, ty: ThriftType) -> Self {
        Self {
            id,
            name: name.into(),
            ty,
            required: false,
        }
    }
}

/// Shape of a structured record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDescriptor {
    /// Fully qualified struct name, e.g. `com.example.Person`.
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl StructDescriptor {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Checks that the struct is non-empty and field ids/names are unique.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(TapError::InvalidConfig(format!(
                "struct '{}' declares no fields",
                self.name
            )));
        }
        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for f in &self.fields {
            if !ids.insert(f.id) {
                return Err(TapError::InvalidConfig(format!(
                    "struct '{}' reuses field id {}",
                    self.name, f.id
                )));
            }
            if !names.insert(f.name.as_str()) {
                return Err(TapError::InvalidConfig(format!(
                    "struct '{}' reuses field name '{}'",
                    self.name, f.name
                )));
            }
        }
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<(usize, &FieldDescriptor)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name == name)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| TapError::format("struct descriptor encode failed", e))
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let desc: Self = serde_json::from_str(s)
            .map_err(|e| TapError::format("struct descriptor decode failed", e))?;
        desc.validate()?;
        Ok(desc)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ThriftValue {
    Bool(bool),
    Byte(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
}

impl ThriftValue {
    pub fn thrift_type(&self) -> ThriftType {
        match self {
            ThriftValue::Bool(_) => ThriftType::Bool,
            ThriftValue::Byte(_) => ThriftType::Byte,
            ThriftValue::I16(_) => ThriftType::I16,
            ThriftValue::I32(_) => ThriftType::I32,
            ThriftValue::I64(_) => ThriftType::I64,
            ThriftValue::Double(_) => ThriftType::Double,
            ThriftValue::String(_) => ThriftType::String,
            ThriftValue::Binary(_) => ThriftType::Binary,
        }
    }
}

/// Conversion from a field value to a concrete Rust type, used by generated `from_struct`.
pub trait FromThriftValue: Sized {
    fn from_thrift(value: &ThriftValue) -> Option<Self>;
}

macro_rules! thrift_value_conversions {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for ThriftValue {
                fn from(v: $t) -> Self {
                    ThriftValue::$variant(v)
                }
            }

            impl FromThriftValue for $t {
                fn from_thrift(value: &ThriftValue) -> Option<Self> {
                    match value {
                        ThriftValue::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }
            }
        )*
    };
}

thrift_value_conversions!(
    bool => Bool,
    i8 => Byte,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f64 => Double,
    String => String,
    Vec<u8> => Binary,
);

impl From<&str> for ThriftValue {
    fn from(v: &str) -> Self {
        ThriftValue::String(v.to_string())
    }
}

/// Dynamic structured record: one optional slot per descriptor field.
#[derive(Debug, Clone, PartialEq)]
pub struct ThriftStruct {
    descriptor: Arc<StructDescriptor>,
    values: Vec<Option<ThriftValue>>,
}

impl ThriftStruct {
    pub fn new(descriptor: Arc<StructDescriptor>) -> Self {
        let values = vec![None; descriptor.fields.len()];
        Self { descriptor, values }
    }

    pub fn descriptor(&self) -> &Arc<StructDescriptor> {
        &self.descriptor
    }

    /// Sets a field by name, checking the value's type against the descriptor.
    pub fn set(&mut self, name: &str, value: impl Into<ThriftValue>) -> Result<()> {
        let idx = self
            .descriptor
            .field(name)
            .map(|(idx, _)| idx)
            .ok_or_else(|| {
                TapError::InvalidRecord(format!(
                    "struct '{}' has no field '{name}'",
                    self.descriptor.name
                ))
            })?;
        self.set_at(idx, Some(value.into()))
    }

    pub fn set_at(&mut self, idx: usize, value: Option<ThriftValue>) -> Result<()> {
        let field = self.descriptor.fields.get(idx).ok_or_else(|| {
            TapError::InvalidRecord(format!(
                "field index {idx} out of range for struct '{}'",
                self.descriptor.name
            ))
        })?;
        if let Some(v) = &value {
            if v.thrift_type() != field.ty {
                return Err(TapError::TypeMismatch(format!(
                    "field '{}' of '{}' expects {}, got {}",
                    field.name,
                    self.descriptor.name,
                    field.ty,
                    v.thrift_type()
                )));
            }
        }
        self.values[idx] = value;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ThriftValue> {
        let (idx, _) = self.descriptor.field(name)?;
        self.values[idx].as_ref()
    }

    pub fn value_at(&self, idx: usize) -> Option<&ThriftValue> {
        self.values.get(idx).and_then(Option::as_ref)
    }

    /// Typed accessor for a field that must be present.
    pub fn required<T: FromThriftValue>(&self, name: &str) -> Result<T> {
        self.optional(name)?.ok_or_else(|| {
            TapError::InvalidRecord(format!(
                "required field '{name}' of '{}' is unset",
                self.descriptor.name
            ))
        })
    }

    /// Typed accessor; unset fields come back as `None`.
    pub fn optional<T: FromThriftValue>(&self, name: &str) -> Result<Option<T>> {
        match self.get(name) {
            None => Ok(None),
            Some(v) => T::from_thrift(v).map(Some).ok_or_else(|| {
                TapError::TypeMismatch(format!(
                    "field '{name}' of '{}' holds {}",
                    self.descriptor.name,
                    v.thrift_type()
                ))
            }),
        }
    }

    /// Fails if a required field is unset.
    pub fn validate(&self) -> Result<()> {
        for (f, v) in self.descriptor.fields.iter().zip(&self.values) {
            if f.required && v.is_none() {
                return Err(TapError::InvalidRecord(format!(
                    "required field '{}' of '{}' is unset",
                    f.name, self.descriptor.name
                )));
            }
        }
        Ok(())
    }
}

/// Implemented by IDL-generated record types.
pub trait TBase: Sized {
    fn descriptor() -> StructDescriptor;

    fn to_struct(&self) -> Result<ThriftStruct>;

    fn from_struct(value: &ThriftStruct) -> Result<Self>;
}
