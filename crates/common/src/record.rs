//! Tuple model exchanged between schemes and the pipeline.

use std::fmt;

use crate::error::{Result, TapError};
use crate::thrift::ThriftStruct;

/// Ordered field names of a tuple stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fields(Vec<String>);

impl Fields {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn size(&self) -> usize {
        self.0.len()
    }

    pub fn name(&self, pos: usize) -> Option<&str> {
        self.0.get(pos).map(String::as_str)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Tagged tuple field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bytes(Vec<u8>),
    Struct(ThriftStruct),
}

impl FieldValue {
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bytes(_) => "bytes",
            FieldValue::Struct(_) => "struct",
        }
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        FieldValue::Bytes(v)
    }
}

impl From<&[u8]> for FieldValue {
    fn from(v: &[u8]) -> Self {
        FieldValue::Bytes(v.to_vec())
    }
}

impl From<ThriftStruct> for FieldValue {
    fn from(v: ThriftStruct) -> Self {
        FieldValue::Struct(v)
    }
}

/// Positional record. Schemes clear and refill it on every `source` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tuple {
    values: Vec<FieldValue>,
}

impl Tuple {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn add(&mut self, value: impl Into<FieldValue>) {
        self.values.push(value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, pos: usize) -> Result<&FieldValue> {
        self.values.get(pos).ok_or_else(|| {
            TapError::TypeMismatch(format!(
                "tuple has {} fields, position {pos} requested",
                self.values.len()
            ))
        })
    }

    /// Byte-sequence view of a field; any other kind is a type mismatch.
    pub fn get_bytes(&self, pos: usize) -> Result<&[u8]> {
        match self.get(pos)? {
            FieldValue::Bytes(b) => Ok(b),
            other => Err(TapError::TypeMismatch(format!(
                "field {pos} must be bytes, found {}",
                other.kind()
            ))),
        }
    }

    pub fn get_struct(&self, pos: usize) -> Result<&ThriftStruct> {
        match self.get(pos)? {
            FieldValue::Struct(s) => Ok(s),
            other => Err(TapError::TypeMismatch(format!(
                "field {pos} must be struct, found {}",
                other.kind()
            ))),
        }
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<FieldValue> {
        self.values
    }
}

impl From<Vec<FieldValue>> for Tuple {
    fn from(values: Vec<FieldValue>) -> Self {
        Self { values }
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldValue, Fields, Tuple};
    use crate::error::TapError;

    #[test]
    fn typed_accessors_reject_other_kinds() {
        let t = Tuple::from(vec![FieldValue::Bytes(vec![1, 2]), FieldValue::Null]);
        assert_eq!(t.get_bytes(0).expect("bytes"), &[1, 2]);
        assert!(matches!(t.get_bytes(1), Err(TapError::TypeMismatch(_))));
        assert!(matches!(t.get_struct(0), Err(TapError::TypeMismatch(_))));
        assert!(matches!(t.get(2), Err(TapError::TypeMismatch(_))));
    }

    #[test]
    fn fields_lookup() {
        let f = Fields::new(["key", "value"]);
        assert_eq!(f.size(), 2);
        assert_eq!(f.position("value"), Some(1));
        assert_eq!(f.to_string(), "[key, value]");
    }
}
