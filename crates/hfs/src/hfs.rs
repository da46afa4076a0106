use std::path::{Path, PathBuf};
use std::sync::Arc;

use taps_common::{
    IoConfig, OutputCommitter, OutputFormat, Result, Scheme, SinkConf, SourceConf, TapError,
    TaskAttemptId, is_hidden_file_name,
};
use tracing::info;

use crate::collector::TupleEntrySchemeCollector;
use crate::fs::{FileSystem, LocalFileSystem};
use crate::iterator::TupleEntrySchemeIterator;

/// What preparing a sink does with an existing output path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SinkMode {
    /// Existing output is an error.
    #[default]
    Keep,
    /// Existing output is deleted first.
    Replace,
    /// Existing output is kept; committed parts with the same name are overwritten.
    Update,
}

/// File tap: a scheme bound to a path on a [`FileSystem`].
pub struct Hfs<S: Scheme> {
    scheme: Arc<S>,
    path: String,
    sink_mode: SinkMode,
    fs: Arc<dyn FileSystem>,
    config: IoConfig,
}

impl<S: Scheme> Hfs<S> {
    pub fn new(scheme: S, path: impl Into<String>) -> Self {
        Self {
            scheme: Arc::new(scheme),
            path: path.into(),
            sink_mode: SinkMode::default(),
            fs: Arc::new(LocalFileSystem),
            config: IoConfig::default(),
        }
    }

    pub fn with_sink_mode(mut self, mode: SinkMode) -> Self {
        self.sink_mode = mode;
        self
    }

    pub fn with_config(mut self, config: IoConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn scheme(&self) -> &S {
        &self.scheme
    }

    /// Path or wildcard expression this tap was built with.
    pub fn identifier(&self) -> &str {
        &self.path
    }

    pub fn sink_mode(&self) -> SinkMode {
        self.sink_mode
    }

    pub fn file_system(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn config(&self) -> &IoConfig {
        &self.config
    }

    pub fn resource_exists(&self) -> bool {
        self.fs.exists(Path::new(&self.path))
    }

    pub fn delete_resource(&self) -> Result<()> {
        self.fs.delete(Path::new(&self.path), true)
    }

    /// Bytes under the literal path; wildcards are not expanded.
    pub fn size(&self) -> Result<u64> {
        Ok(self.fs.content_summary(Path::new(&self.path))?.length)
    }

    /// Data files the tap reads: matches of the path expression, with directories
    /// expanded one level and `_`/`.` bookkeeping entries skipped.
    pub fn input_files(&self) -> Result<Vec<PathBuf>> {
        let matches = self.fs.glob_status(&self.path)?;
        if matches.is_empty() {
            return Err(TapError::NotFound(self.path.clone()));
        }
        let mut files = Vec::new();
        for status in matches {
            if !status.is_dir {
                files.push(status.path);
                continue;
            }
            for child in self.fs.list_status(&status.path)? {
                let hidden = child.file_name().map_or(true, is_hidden_file_name);
                if !child.is_dir && !hidden {
                    files.push(child.path);
                }
            }
        }
        Ok(files)
    }

    pub fn open_for_read(&self) -> Result<TupleEntrySchemeIterator<S>> {
        let mut conf = SourceConf::new(self.config.clone());
        self.scheme.source_conf_init(&mut conf)?;
        let format = conf.input_format()?;
        let files = self.input_files()?;
        info!(
            path = %self.path,
            scheme = self.scheme.name(),
            files = files.len(),
            "tap opened for read"
        );
        Ok(TupleEntrySchemeIterator::new(
            Arc::clone(&self.scheme),
            format,
            self.config.clone(),
            files,
        ))
    }

    /// Runs sink configuration, applies the sink mode and sets up job output.
    pub fn prepare_sink(&self) -> Result<SinkJob<S>> {
        let mut conf = SinkConf::new(self.config.clone());
        self.scheme.sink_conf_init(&mut conf)?;
        let format = conf.output_format()?;
        let committer = conf.output_committer();

        let output = PathBuf::from(&self.path);
        if self.fs.exists(&output) {
            match self.sink_mode {
                SinkMode::Keep => {
                    return Err(TapError::InvalidConfig(format!(
                        "output path already exists: {}",
                        self.path
                    )));
                }
                SinkMode::Replace => {
                    info!(path = %self.path, "replacing existing output");
                    self.fs.delete(&output, true)?;
                }
                SinkMode::Update => {}
            }
        }
        committer.setup_job(&output)?;
        info!(
            path = %self.path,
            scheme = self.scheme.name(),
            committer = committer.name(),
            "tap prepared for write"
        );
        Ok(SinkJob {
            scheme: Arc::clone(&self.scheme),
            output,
            format,
            committer,
            config: self.config.clone(),
        })
    }
}

/// Job-side handle of a prepared sink.
pub struct SinkJob<S: Scheme> {
    scheme: Arc<S>,
    output: PathBuf,
    format: Arc<dyn OutputFormat<Writer = S::Writer>>,
    committer: Arc<dyn OutputCommitter>,
    config: IoConfig,
}

impl<S: Scheme> SinkJob<S> {
    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn committer(&self) -> &dyn OutputCommitter {
        self.committer.as_ref()
    }

    /// Opens the part file for `attempt` in its private work directory.
    pub fn open_task(&self, attempt: TaskAttemptId) -> Result<TupleEntrySchemeCollector<S>> {
        let work = self.committer.setup_task(&self.output, &attempt)?;
        let file = work.join(format!("{}{}", attempt.part_name(), self.format.extension()));
        let writer = self.format.record_writer(&file, &self.config)?;
        Ok(TupleEntrySchemeCollector::new(
            Arc::clone(&self.scheme),
            writer,
            Arc::clone(&self.committer),
            self.output.clone(),
            attempt,
            file,
        ))
    }

    pub fn commit(self) -> Result<()> {
        self.committer.commit_job(&self.output)
    }

    pub fn abort(self) -> Result<()> {
        self.committer.abort_job(&self.output)
    }
}
