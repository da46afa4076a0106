use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use taps_common::{
    InputFormat, IoConfig, Result, StructDescriptor, TapError, ThriftStruct, global_metrics,
};
use tracing::debug;

use crate::predicate::FilterPredicate;
use crate::read_support::{ReadSupport, RecordConverter};
use crate::stats::row_group_stats;

/// Opens parquet files as streams of structured records.
#[derive(Clone)]
pub struct ParquetInputFormat {
    read_support: Arc<dyn ReadSupport>,
    converter: Arc<dyn RecordConverter>,
    predicate: Option<FilterPredicate>,
}

impl ParquetInputFormat {
    pub fn new(read_support: Arc<dyn ReadSupport>, converter: Arc<dyn RecordConverter>) -> Self {
        Self {
            read_support,
            converter,
            predicate: None,
        }
    }

    pub fn with_filter_predicate(mut self, predicate: Option<FilterPredicate>) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn filter_predicate(&self) -> Option<&FilterPredicate> {
        self.predicate.as_ref()
    }
}

impl InputFormat for ParquetInputFormat {
    type Reader = ParquetRecordReader;

    fn name(&self) -> &'static str {
        "ParquetInputFormat"
    }

    fn open(&self, path: &Path, config: &IoConfig) -> Result<Self::Reader> {
        let file = File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| {
                TapError::format(format!("parquet footer read failed: {}", path.display()), e)
            })?;
        let metadata = Arc::clone(builder.metadata());
        let descriptor = self.read_support.init(
            metadata.file_metadata().key_value_metadata(),
            builder.schema(),
        )?;
        if let Some(p) = &self.predicate {
            p.validate(&descriptor)?;
        }

        let total = metadata.num_row_groups();
        let row_groups = (0..total)
            .filter(|&i| match &self.predicate {
                Some(p) => {
                    !p.can_drop(&|column: &str| row_group_stats(metadata.row_group(i), column))
                }
                None => true,
            })
            .collect::<Vec<_>>();
        let skipped = total - row_groups.len();
        global_metrics().record_row_groups(self.name(), row_groups.len() as u64, skipped as u64);
        debug!(
            path = %path.display(),
            record = %descriptor.name,
            row_groups = total,
            skipped,
            "parquet row groups selected"
        );

        let roots = descriptor
            .fields
            .iter()
            .filter_map(|f| builder.schema().index_of(&f.name).ok())
            .collect::<Vec<_>>();
        let mask = ProjectionMask::roots(builder.parquet_schema(), roots);
        let reader = builder
            .with_projection(mask)
            .with_row_groups(row_groups)
            .with_batch_size(config.parquet_batch_size_rows)
            .build()
            .map_err(|e| TapError::format("parquet reader build failed", e))?;

        Ok(ParquetRecordReader {
            reader,
            batch: None,
            row: 0,
            done: false,
            descriptor,
            converter: Arc::clone(&self.converter),
            predicate: self.predicate.clone(),
            row_groups_skipped: skipped,
        })
    }
}

/// Record-at-a-time view over decoded batches; rows failing the predicate are dropped.
pub struct ParquetRecordReader {
    reader: ParquetRecordBatchReader,
    batch: Option<RecordBatch>,
    row: usize,
    done: bool,
    descriptor: Arc<StructDescriptor>,
    converter: Arc<dyn RecordConverter>,
    predicate: Option<FilterPredicate>,
    row_groups_skipped: usize,
}

impl ParquetRecordReader {
    pub fn descriptor(&self) -> &Arc<StructDescriptor> {
        &self.descriptor
    }

    pub fn row_groups_skipped(&self) -> usize {
        self.row_groups_skipped
    }

    /// Next matching record, or `None` once the file is exhausted (idempotent).
    pub fn next_record(&mut self) -> Result<Option<ThriftStruct>> {
        if self.done {
            return Ok(None);
        }
        loop {
            if let Some(batch) = &self.batch {
                if self.row < batch.num_rows() {
                    let record = self.converter.convert(&self.descriptor, batch, self.row)?;
                    self.row += 1;
                    if self.predicate.as_ref().map_or(true, |p| p.matches(&record)) {
                        return Ok(Some(record));
                    }
                    continue;
                }
            }
            match self.reader.next() {
                Some(batch) => {
                    self.batch =
                        Some(batch.map_err(|e| TapError::format("parquet decode failed", e))?);
                    self.row = 0;
                }
                None => {
                    self.batch = None;
                    self.done = true;
                    return Ok(None);
                }
            }
        }
    }
}
