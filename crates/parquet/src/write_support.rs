use std::sync::Arc;

use arrow::array::{
    ArrayRef, BinaryBuilder, BooleanBuilder, Float64Builder, Int16Builder, Int32Builder,
    Int64Builder, Int8Builder, StringBuilder,
};
use arrow::record_batch::RecordBatch;
use arrow_schema::SchemaRef;
use parquet::format::KeyValue;
use taps_common::{Result, StructDescriptor, TapError, ThriftStruct, ThriftType, ThriftValue};

use crate::schema::{arrow_schema, footer_metadata};

/// File-level layout decided once per output file.
#[derive(Debug, Clone)]
pub struct WriteContext {
    pub schema: SchemaRef,
    pub extra_metadata: Vec<KeyValue>,
}

/// Decomposes structured records into columns.
pub trait WriteSupport: Send + Sync {
    fn name(&self) -> &'static str;

    fn init(&self) -> Result<WriteContext>;

    /// Checked per record before it is buffered.
    fn validate(&self, record: &ThriftStruct) -> Result<()>;

    fn build_batch(&self, schema: &SchemaRef, records: &[ThriftStruct]) -> Result<RecordBatch>;
}

#[derive(Debug, Clone)]
pub struct TBaseWriteSupport {
    descriptor: Arc<StructDescriptor>,
}

impl TBaseWriteSupport {
    pub fn new(descriptor: Arc<StructDescriptor>) -> Self {
        Self { descriptor }
    }

    pub fn descriptor(&self) -> &Arc<StructDescriptor> {
        &self.descriptor
    }
}

macro_rules! build_column {
    ($records:expr, $idx:expr, $builder:ty, $variant:ident) => {{
        let mut builder = <$builder>::new();
        for record in $records {
            match record.value_at($idx) {
                Some(ThriftValue::$variant(v)) => builder.append_value(v.clone()),
                _ => builder.append_null(),
            }
        }
        Arc::new(builder.finish()) as ArrayRef
    }};
}

impl WriteSupport for TBaseWriteSupport {
    fn name(&self) -> &'static str {
        "TBaseWriteSupport"
    }

    fn init(&self) -> Result<WriteContext> {
        Ok(WriteContext {
            schema: Arc::new(arrow_schema(&self.descriptor)),
            extra_metadata: footer_metadata(&self.descriptor)?,
        })
    }

    fn validate(&self, record: &ThriftStruct) -> Result<()> {
        if record.descriptor().as_ref() != self.descriptor.as_ref() {
            return Err(TapError::TypeMismatch(format!(
                "sink expects '{}' records, got '{}'",
                self.descriptor.name,
                record.descriptor().name
            )));
        }
        record.validate()
    }

    fn build_batch(&self, schema: &SchemaRef, records: &[ThriftStruct]) -> Result<RecordBatch> {
        let columns = self
            .descriptor
            .fields
            .iter()
            .enumerate()
            .map(|(idx, field)| match field.ty {
                ThriftType::Bool => build_column!(records, idx, BooleanBuilder, Bool),
                ThriftType::Byte => build_column!(records, idx, Int8Builder, Byte),
                ThriftType::I16 => build_column!(records, idx, Int16Builder, I16),
                ThriftType::I32 => build_column!(records, idx, Int32Builder, I32),
                ThriftType::I64 => build_column!(records, idx, Int64Builder, I64),
                ThriftType::Double => build_column!(records, idx, Float64Builder, Double),
                ThriftType::String => build_column!(records, idx, StringBuilder, String),
                ThriftType::Binary => build_column!(records, idx, BinaryBuilder, Binary),
            })
            .collect::<Vec<_>>();
        RecordBatch::try_new(Arc::clone(schema), columns)
            .map_err(|e| TapError::format("record batch assembly failed", e))
    }
}
