use std::path::Path;
use std::sync::Arc;

use crate::committer::{FileOutputCommitter, OutputCommitter};
use crate::config::IoConfig;
use crate::error::{Result, TapError};
use crate::record::{Fields, Tuple};

/// Opens a record reader over one input file.
pub trait InputFormat: Send + Sync {
    type Reader;

    fn name(&self) -> &'static str;

    /// # Errors
    /// Returns IO/format errors from the underlying storage library unchanged.
    fn open(&self, path: &Path, config: &IoConfig) -> Result<Self::Reader>;
}

/// Creates a record writer for one output file.
pub trait OutputFormat: Send + Sync {
    type Writer: RecordWriter;

    fn name(&self) -> &'static str;

    /// Suffix appended to part file names (e.g. `.parquet`); empty for none.
    fn extension(&self) -> &'static str;

    fn record_writer(&self, path: &Path, config: &IoConfig) -> Result<Self::Writer>;
}

pub trait RecordWriter {
    /// Flushes buffered records and finalizes the file.
    fn close(&mut self) -> Result<()>;
}

/// Read-side job configuration a scheme registers its plugins on.
pub struct SourceConf<R: 'static> {
    config: IoConfig,
    input_format: Option<Arc<dyn InputFormat<Reader = R>>>,
}

impl<R: 'static> SourceConf<R> {
    pub fn new(config: IoConfig) -> Self {
        Self {
            config,
            input_format: None,
        }
    }

    pub fn config(&self) -> &IoConfig {
        &self.config
    }

    pub fn set_input_format(&mut self, format: impl InputFormat<Reader = R> + 'static) {
        self.input_format = Some(Arc::new(format));
    }

    pub fn input_format(&self) -> Result<Arc<dyn InputFormat<Reader = R>>> {
        self.input_format
            .clone()
            .ok_or_else(|| TapError::InvalidConfig("no input format registered".to_string()))
    }
}

/// Write-side job configuration a scheme registers its plugins on.
pub struct SinkConf<W: 'static> {
    config: IoConfig,
    output_format: Option<Arc<dyn OutputFormat<Writer = W>>>,
    output_committer: Option<Arc<dyn OutputCommitter>>,
}

impl<W: 'static> SinkConf<W> {
    pub fn new(config: IoConfig) -> Self {
        Self {
            config,
            output_format: None,
            output_committer: None,
        }
    }

    pub fn config(&self) -> &IoConfig {
        &self.config
    }

    pub fn set_output_format(&mut self, format: impl OutputFormat<Writer = W> + 'static) {
        self.output_format = Some(Arc::new(format));
    }

    pub fn set_output_committer(&mut self, committer: impl OutputCommitter + 'static) {
        self.output_committer = Some(Arc::new(committer));
    }

    pub fn output_format(&self) -> Result<Arc<dyn OutputFormat<Writer = W>>> {
        self.output_format
            .clone()
            .ok_or_else(|| TapError::InvalidConfig("no output format registered".to_string()))
    }

    /// Registered committer, or a [`FileOutputCommitter`] when the scheme set none.
    pub fn output_committer(&self) -> Arc<dyn OutputCommitter> {
        self.output_committer
            .clone()
            .unwrap_or_else(|| Arc::new(FileOutputCommitter::new(self.config.clone())))
    }
}

/// Record-format driver: translates between a storage reader/writer and tuples.
///
/// `*_conf_init` runs once per job before any IO and is where configuration errors must
/// surface. `source`/`sink` run once per record on the task thread.
pub trait Scheme: Send + Sync {
    type Reader: 'static;
    type Writer: RecordWriter + 'static;
    /// Per-reader state created by [`Scheme::source_prepare`] (e.g. reusable buffers).
    type SourceContext;

    fn name(&self) -> &'static str;

    fn source_fields(&self) -> &Fields;

    fn sink_fields(&self) -> &Fields;

    fn source_conf_init(&self, conf: &mut SourceConf<Self::Reader>) -> Result<()>;

    fn sink_conf_init(&self, conf: &mut SinkConf<Self::Writer>) -> Result<()>;

    fn source_prepare(&self, reader: &mut Self::Reader) -> Result<Self::SourceContext>;

    /// Fills `tuple` with the next record. Returns `false` at end of input.
    fn source(
        &self,
        context: &mut Self::SourceContext,
        reader: &mut Self::Reader,
        tuple: &mut Tuple,
    ) -> Result<bool>;

    fn sink(&self, tuple: &Tuple, writer: &mut Self::Writer) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::{SinkConf, SourceConf};
    use crate::config::IoConfig;
    use crate::error::TapError;
    use crate::scheme::RecordWriter;

    struct NullWriter;

    impl RecordWriter for NullWriter {
        fn close(&mut self) -> crate::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn unregistered_formats_are_config_errors() {
        let source = SourceConf::<()>::new(IoConfig::default());
        assert!(matches!(
            source.input_format(),
            Err(TapError::InvalidConfig(_))
        ));

        let sink = SinkConf::<NullWriter>::new(IoConfig::default());
        assert!(matches!(sink.output_format(), Err(TapError::InvalidConfig(_))));
        assert_eq!(sink.output_committer().name(), "FileOutputCommitter");
    }
}
