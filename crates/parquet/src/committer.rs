use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use taps_common::{
    FileOutputCommitter, IoConfig, OutputCommitter, Result, StructDescriptor, TapError,
    TaskAttemptId,
};
use tracing::info;

use crate::schema::{arrow_schema, footer_metadata};

/// Summary footer written next to the part files.
pub const COMMON_METADATA_FILE: &str = "_common_metadata";

/// File committer that also leaves a row-less `_common_metadata` footer at job commit.
#[derive(Debug, Clone)]
pub struct ParquetOutputCommitter {
    inner: FileOutputCommitter,
    descriptor: Arc<StructDescriptor>,
}

impl ParquetOutputCommitter {
    pub fn new(config: IoConfig, descriptor: Arc<StructDescriptor>) -> Self {
        Self {
            inner: FileOutputCommitter::new(config),
            descriptor,
        }
    }

    fn write_summary(&self, output: &Path) -> Result<()> {
        let path = output.join(COMMON_METADATA_FILE);
        let props = WriterProperties::builder()
            .set_key_value_metadata(Some(footer_metadata(&self.descriptor)?))
            .build();
        let writer = ArrowWriter::try_new(
            File::create(&path)?,
            Arc::new(arrow_schema(&self.descriptor)),
            Some(props),
        )
        .map_err(|e| TapError::format("summary metadata init failed", e))?;
        writer
            .close()
            .map_err(|e| TapError::format("summary metadata write failed", e))?;
        info!(path = %path.display(), record = %self.descriptor.name, "summary metadata written");
        Ok(())
    }
}

impl OutputCommitter for ParquetOutputCommitter {
    fn name(&self) -> &'static str {
        "ParquetOutputCommitter"
    }

    fn setup_job(&self, output: &Path) -> Result<()> {
        self.inner.setup_job(output)
    }

    fn setup_task(&self, output: &Path, attempt: &TaskAttemptId) -> Result<PathBuf> {
        self.inner.setup_task(output, attempt)
    }

    fn commit_task(&self, output: &Path, attempt: &TaskAttemptId) -> Result<()> {
        self.inner.commit_task(output, attempt)
    }

    fn abort_task(&self, output: &Path, attempt: &TaskAttemptId) -> Result<()> {
        self.inner.abort_task(output, attempt)
    }

    fn commit_job(&self, output: &Path) -> Result<()> {
        if self.inner.config().write_summary_metadata {
            std::fs::create_dir_all(output)?;
            self.write_summary(output)?;
        }
        self.inner.commit_job(output)
    }

    fn abort_job(&self, output: &Path) -> Result<()> {
        self.inner.abort_job(output)
    }
}
