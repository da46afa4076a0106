use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{Float64Type, Int16Type, Int32Type, Int64Type, Int8Type};
use arrow::record_batch::RecordBatch;
use arrow_schema::Schema;
use parquet::format::KeyValue;
use taps_common::{Result, StructDescriptor, TapError, ThriftStruct, ThriftType, ThriftValue};

use crate::schema::{arrow_type, descriptor_from_footer};

/// Decides which struct shape a file is read as.
pub trait ReadSupport: Send + Sync {
    fn name(&self) -> &'static str;

    /// Resolves the read descriptor from the file footer and arrow schema.
    fn init(
        &self,
        footer: Option<&Vec<KeyValue>>,
        file_schema: &Schema,
    ) -> Result<Arc<StructDescriptor>>;
}

/// Reads with the requested struct type, else the descriptor embedded in the footer.
#[derive(Debug, Clone, Default)]
pub struct ThriftReadSupport {
    requested: Option<Arc<StructDescriptor>>,
}

impl ThriftReadSupport {
    pub fn new(requested: Option<Arc<StructDescriptor>>) -> Self {
        Self { requested }
    }
}

impl ReadSupport for ThriftReadSupport {
    fn name(&self) -> &'static str {
        "ThriftReadSupport"
    }

    fn init(
        &self,
        footer: Option<&Vec<KeyValue>>,
        file_schema: &Schema,
    ) -> Result<Arc<StructDescriptor>> {
        let descriptor = match &self.requested {
            Some(d) => Arc::clone(d),
            None => descriptor_from_footer(footer)?.map(Arc::new).ok_or_else(|| {
                TapError::InvalidConfig(
                    "no thrift record type configured and the file footer carries no descriptor"
                        .to_string(),
                )
            })?,
        };

        for field in &descriptor.fields {
            match file_schema.field_with_name(&field.name) {
                Ok(col) => {
                    let expected = arrow_type(field.ty);
                    if col.data_type() != &expected {
                        return Err(TapError::TypeMismatch(format!(
                            "column '{}' is {}, struct '{}' expects {expected}",
                            field.name,
                            col.data_type(),
                            descriptor.name
                        )));
                    }
                }
                Err(_) if field.required => {
                    return Err(TapError::InvalidConfig(format!(
                        "required field '{}' of '{}' is missing from the file",
                        field.name, descriptor.name
                    )));
                }
                Err(_) => {}
            }
        }
        Ok(descriptor)
    }
}

/// Assembles one structured record from a row of a decoded batch.
pub trait RecordConverter: Send + Sync {
    fn convert(
        &self,
        descriptor: &Arc<StructDescriptor>,
        batch: &RecordBatch,
        row: usize,
    ) -> Result<ThriftStruct>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TBaseRecordConverter;

impl RecordConverter for TBaseRecordConverter {
    fn convert(
        &self,
        descriptor: &Arc<StructDescriptor>,
        batch: &RecordBatch,
        row: usize,
    ) -> Result<ThriftStruct> {
        let mut record = ThriftStruct::new(Arc::clone(descriptor));
        for (idx, field) in descriptor.fields.iter().enumerate() {
            let Some(col) = batch.column_by_name(&field.name) else {
                continue;
            };
            if col.is_null(row) {
                continue;
            }
            let value = cell(col.as_ref(), field.ty, row).ok_or_else(|| {
                TapError::TypeMismatch(format!(
                    "column '{}' is {}, cannot decode as {}",
                    field.name,
                    col.data_type(),
                    field.ty
                ))
            })?;
            record.set_at(idx, Some(value))?;
        }
        record.validate()?;
        Ok(record)
    }
}

fn cell(col: &dyn Array, ty: ThriftType, row: usize) -> Option<ThriftValue> {
    Some(match ty {
        ThriftType::Bool => ThriftValue::Bool(col.as_boolean_opt()?.value(row)),
        ThriftType::Byte => ThriftValue::Byte(col.as_primitive_opt::<Int8Type>()?.value(row)),
        ThriftType::I16 => ThriftValue::I16(col.as_primitive_opt::<Int16Type>()?.value(row)),
        ThriftType::I32 => ThriftValue::I32(col.as_primitive_opt::<Int32Type>()?.value(row)),
        ThriftType::I64 => ThriftValue::I64(col.as_primitive_opt::<Int64Type>()?.value(row)),
        ThriftType::Double => {
            ThriftValue::Double(col.as_primitive_opt::<Float64Type>()?.value(row))
        }
        ThriftType::String => {
            ThriftValue::String(col.as_string_opt::<i32>()?.value(row).to_string())
        }
        ThriftType::Binary => ThriftValue::Binary(col.as_binary_opt::<i32>()?.value(row).to_vec()),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use arrow::record_batch::RecordBatch;
    use taps_common::{FieldDescriptor, StructDescriptor, TapError, ThriftType, ThriftValue};

    use super::{ReadSupport, RecordConverter, TBaseRecordConverter, ThriftReadSupport};
    use crate::schema::{arrow_schema, footer_metadata};

    fn descriptor() -> StructDescriptor {
        StructDescriptor::new(
            "test.User",
            vec![
                FieldDescriptor::required(1, "id", ThriftType::I64),
                FieldDescriptor::optional(2, "email", ThriftType::String),
            ],
        )
    }

    #[test]
    fn falls_back_to_footer_descriptor() {
        let schema = arrow_schema(&descriptor());
        let footer = footer_metadata(&descriptor()).expect("footer");
        let resolved = ThriftReadSupport::default()
            .init(Some(&footer), &schema)
            .expect("inferred");
        assert_eq!(resolved.name, "test.User");

        let err = ThriftReadSupport::default()
            .init(None, &schema)
            .expect_err("nothing to infer from");
        assert!(matches!(err, TapError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_missing_required_and_mistyped_columns() {
        let file = arrow_schema(&StructDescriptor::new(
            "test.Other",
            vec![FieldDescriptor::optional(2, "email", ThriftType::String)],
        ));
        let err = ThriftReadSupport::new(Some(Arc::new(descriptor())))
            .init(None, &file)
            .expect_err("id missing");
        assert!(matches!(err, TapError::InvalidConfig(_)));

        let file = arrow_schema(&StructDescriptor::new(
            "test.Other",
            vec![FieldDescriptor::required(1, "id", ThriftType::String)],
        ));
        let err = ThriftReadSupport::new(Some(Arc::new(descriptor())))
            .init(None, &file)
            .expect_err("id mistyped");
        assert!(matches!(err, TapError::TypeMismatch(_)));
    }

    #[test]
    fn converts_rows_with_nulls() {
        let d = Arc::new(descriptor());
        let batch = RecordBatch::try_new(
            Arc::new(arrow_schema(&d)),
            vec![
                Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef,
                Arc::new(StringArray::from(vec![Some("a@x"), None])) as ArrayRef,
            ],
        )
        .expect("batch");

        let first = TBaseRecordConverter.convert(&d, &batch, 0).expect("row 0");
        assert_eq!(first.get("email"), Some(&ThriftValue::String("a@x".to_string())));
        let second = TBaseRecordConverter.convert(&d, &batch, 1).expect("row 1");
        assert_eq!(second.get("id"), Some(&ThriftValue::I64(2)));
        assert_eq!(second.get("email"), None);
    }
}
