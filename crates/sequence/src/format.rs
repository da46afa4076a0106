use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use taps_common::{InputFormat, IoConfig, OutputFormat, RecordWriter, Result, TapError};
use tracing::debug;

use crate::reader::SequenceFileReader;
use crate::writable::BytesWritable;
use crate::writer::SequenceFileWriter;

pub type FileSequenceReader = SequenceFileReader<BufReader<File>>;

#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceFileInputFormat;

impl InputFormat for SequenceFileInputFormat {
    type Reader = FileSequenceReader;

    fn name(&self) -> &'static str {
        "SequenceFileInputFormat"
    }

    fn open(&self, path: &Path, _config: &IoConfig) -> Result<Self::Reader> {
        let file = File::open(path)?;
        let reader = SequenceFileReader::new(BufReader::new(file))?;
        debug!(
            path = %path.display(),
            key_class = reader.key_class_name(),
            value_class = reader.value_class_name(),
            "sequence file opened for read"
        );
        Ok(reader)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceFileOutputFormat;

impl OutputFormat for SequenceFileOutputFormat {
    type Writer = SequenceFileRecordWriter;

    fn name(&self) -> &'static str {
        "SequenceFileOutputFormat"
    }

    fn extension(&self) -> &'static str {
        ""
    }

    fn record_writer(&self, path: &Path, config: &IoConfig) -> Result<Self::Writer> {
        let file = File::create(path)?;
        let writer = SequenceFileWriter::new(BufWriter::new(file), config.sync_interval_bytes)?;
        debug!(path = %path.display(), "sequence file opened for write");
        Ok(SequenceFileRecordWriter {
            inner: Some(writer),
        })
    }
}

/// Output collector over a sequence file on disk.
pub struct SequenceFileRecordWriter {
    inner: Option<SequenceFileWriter<BufWriter<File>>>,
}

impl SequenceFileRecordWriter {
    pub fn collect(&mut self, key: &BytesWritable, value: &BytesWritable) -> Result<()> {
        match self.inner.as_mut() {
            Some(w) => w.append(key, value),
            None => Err(TapError::InvalidConfig(
                "sequence file writer already closed".to_string(),
            )),
        }
    }
}

impl RecordWriter for SequenceFileRecordWriter {
    fn close(&mut self) -> Result<()> {
        if let Some(w) = self.inner.take() {
            let out = w.into_inner()?;
            out.into_inner()
                .map_err(|e| TapError::Io(e.into_error()))?
                .sync_all()?;
        }
        Ok(())
    }
}
