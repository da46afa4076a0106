use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow_schema::SchemaRef;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use taps_common::{IoConfig, OutputFormat, RecordWriter, Result, TapError, ThriftStruct};
use tracing::debug;

use crate::write_support::WriteSupport;

#[derive(Clone)]
pub struct ParquetOutputFormat {
    write_support: Arc<dyn WriteSupport>,
}

impl ParquetOutputFormat {
    pub fn new(write_support: Arc<dyn WriteSupport>) -> Self {
        Self { write_support }
    }
}

impl OutputFormat for ParquetOutputFormat {
    type Writer = ParquetRecordWriter;

    fn name(&self) -> &'static str {
        "ParquetOutputFormat"
    }

    fn extension(&self) -> &'static str {
        ".parquet"
    }

    fn record_writer(&self, path: &Path, config: &IoConfig) -> Result<Self::Writer> {
        let ctx = self.write_support.init()?;
        let props = WriterProperties::builder()
            .set_max_row_group_size(config.parquet_max_row_group_rows.max(1))
            .set_key_value_metadata(Some(ctx.extra_metadata))
            .build();
        let file = File::create(path)?;
        let writer = ArrowWriter::try_new(file, Arc::clone(&ctx.schema), Some(props))
            .map_err(|e| TapError::format("parquet writer init failed", e))?;
        debug!(
            path = %path.display(),
            support = self.write_support.name(),
            "parquet file opened for write"
        );
        Ok(ParquetRecordWriter {
            writer: Some(writer),
            schema: ctx.schema,
            write_support: Arc::clone(&self.write_support),
            pending: Vec::new(),
            batch_rows: config.parquet_batch_size_rows.max(1),
        })
    }
}

/// Buffers records and hands them to the arrow writer a batch at a time.
pub struct ParquetRecordWriter {
    writer: Option<ArrowWriter<File>>,
    schema: SchemaRef,
    write_support: Arc<dyn WriteSupport>,
    pending: Vec<ThriftStruct>,
    batch_rows: usize,
}

impl ParquetRecordWriter {
    /// Validates and buffers one record; nothing is buffered when validation fails.
    pub fn write(&mut self, record: ThriftStruct) -> Result<()> {
        if self.writer.is_none() {
            return Err(TapError::InvalidConfig(
                "parquet writer already closed".to_string(),
            ));
        }
        self.write_support.validate(&record)?;
        self.pending.push(record);
        if self.pending.len() >= self.batch_rows {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        if self.pending.is_empty() {
            return Ok(());
        }
        let batch = self.write_support.build_batch(&self.schema, &self.pending)?;
        writer
            .write(&batch)
            .map_err(|e| TapError::format("parquet write failed", e))?;
        self.pending.clear();
        Ok(())
    }
}

impl RecordWriter for ParquetRecordWriter {
    fn close(&mut self) -> Result<()> {
        self.flush()?;
        if let Some(writer) = self.writer.take() {
            let meta = writer
                .close()
                .map_err(|e| TapError::format("parquet close failed", e))?;
            debug!(
                rows = meta.num_rows,
                row_groups = meta.row_groups.len(),
                "parquet file closed"
            );
        }
        Ok(())
    }
}
