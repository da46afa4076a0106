//! Struct descriptor <-> arrow schema mapping and footer metadata.

use std::collections::HashMap;

use arrow_schema::{DataType, Field, Schema};
use parquet::arrow::PARQUET_FIELD_ID_META_KEY;
use parquet::format::KeyValue;
use taps_common::{FieldDescriptor, Result, StructDescriptor, ThriftType};

/// Footer key holding the struct name.
pub const THRIFT_CLASS_KEY: &str = "thrift.class";
/// Footer key holding the JSON struct descriptor.
pub const THRIFT_DESCRIPTOR_KEY: &str = "thrift.descriptor";

pub fn arrow_type(ty: ThriftType) -> DataType {
    match ty {
        ThriftType::Bool => DataType::Boolean,
        ThriftType::Byte => DataType::Int8,
        ThriftType::I16 => DataType::Int16,
        ThriftType::I32 => DataType::Int32,
        ThriftType::I64 => DataType::Int64,
        ThriftType::Double => DataType::Float64,
        ThriftType::String => DataType::Utf8,
        ThriftType::Binary => DataType::Binary,
    }
}

pub fn arrow_field(field: &FieldDescriptor) -> Field {
    Field::new(&field.name, arrow_type(field.ty), !field.required).with_metadata(HashMap::from(
        [(PARQUET_FIELD_ID_META_KEY.to_string(), field.id.to_string())],
    ))
}

pub fn arrow_schema(descriptor: &StructDescriptor) -> Schema {
    Schema::new(
        descriptor
            .fields
            .iter()
            .map(arrow_field)
            .collect::<Vec<_>>(),
    )
}

/// Key/value pairs embedding the descriptor in the parquet footer.
pub fn footer_metadata(descriptor: &StructDescriptor) -> Result<Vec<KeyValue>> {
    Ok(vec![
        KeyValue {
            key: THRIFT_CLASS_KEY.to_string(),
            value: Some(descriptor.name.clone()),
        },
        KeyValue {
            key: THRIFT_DESCRIPTOR_KEY.to_string(),
            value: Some(descriptor.to_json()?),
        },
    ])
}

/// Recovers the descriptor written by [`footer_metadata`], if present.
pub fn descriptor_from_footer(kv: Option<&Vec<KeyValue>>) -> Result<Option<StructDescriptor>> {
    let Some(entries) = kv else {
        return Ok(None);
    };
    entries
        .iter()
        .find(|e| e.key == THRIFT_DESCRIPTOR_KEY)
        .and_then(|e| e.value.as_deref())
        .map(StructDescriptor::from_json)
        .transpose()
}

#[cfg(test)]
mod tests {
    use arrow_schema::DataType;
    use parquet::arrow::PARQUET_FIELD_ID_META_KEY;
    use taps_common::{FieldDescriptor, StructDescriptor, ThriftType};

    use super::{arrow_schema, descriptor_from_footer, footer_metadata};

    fn event() -> StructDescriptor {
        StructDescriptor::new(
            "test.Event",
            vec![
                FieldDescriptor::required(1, "ts", ThriftType::I64),
                FieldDescriptor::optional(4, "payload", ThriftType::Binary),
            ],
        )
    }

    #[test]
    fn maps_fields_with_ids_and_nullability() {
        let schema = arrow_schema(&event());
        let ts = schema.field_with_name("ts").expect("ts");
        assert_eq!(ts.data_type(), &DataType::Int64);
        assert!(!ts.is_nullable());
        let payload = schema.field_with_name("payload").expect("payload");
        assert!(payload.is_nullable());
        assert_eq!(
            payload.metadata().get(PARQUET_FIELD_ID_META_KEY).map(String::as_str),
            Some("4")
        );
    }

    #[test]
    fn footer_round_trip() {
        let kv = footer_metadata(&event()).expect("encode");
        assert_eq!(kv[0].value.as_deref(), Some("test.Event"));
        let back = descriptor_from_footer(Some(&kv)).expect("decode");
        assert_eq!(back, Some(event()));
        assert_eq!(descriptor_from_footer(None).expect("none"), None);
    }
}
