use std::path::{Path, PathBuf};
use std::sync::Arc;

use taps_common::{OutputCommitter, RecordWriter, Result, Scheme, TaskAttemptId, Tuple};
use tracing::{debug, warn};

/// Task-side writer into a tap.
///
/// Output stays in the attempt's work directory until [`close`](Self::close) commits it.
/// A collector dropped without closing aborts its attempt.
pub struct TupleEntrySchemeCollector<S: Scheme> {
    scheme: Arc<S>,
    writer: Option<S::Writer>,
    committer: Arc<dyn OutputCommitter>,
    output: PathBuf,
    attempt: TaskAttemptId,
    file: PathBuf,
    written: u64,
    finished: bool,
}

impl<S: Scheme> TupleEntrySchemeCollector<S> {
    pub(crate) fn new(
        scheme: Arc<S>,
        writer: S::Writer,
        committer: Arc<dyn OutputCommitter>,
        output: PathBuf,
        attempt: TaskAttemptId,
        file: PathBuf,
    ) -> Self {
        Self {
            scheme,
            writer: Some(writer),
            committer,
            output,
            attempt,
            file,
            written: 0,
            finished: false,
        }
    }

    pub fn attempt(&self) -> &TaskAttemptId {
        &self.attempt
    }

    /// Staged part file this attempt writes.
    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn add(&mut self, tuple: &Tuple) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            self.scheme.sink(tuple, writer)?;
            self.written += 1;
        }
        Ok(())
    }

    /// Finalizes the part file and commits the attempt. A failed close aborts it.
    pub fn close(mut self) -> Result<()> {
        self.finished = true;
        let closed = match self.writer.take() {
            Some(mut writer) => writer.close(),
            None => Ok(()),
        };
        if let Err(e) = closed {
            if let Err(abort) = self.committer.abort_task(&self.output, &self.attempt) {
                warn!(attempt = %self.attempt, error = %abort, "abort after failed close failed");
            }
            return Err(e);
        }
        self.committer.commit_task(&self.output, &self.attempt)?;
        debug!(attempt = %self.attempt, tuples = self.written, "collector closed");
        Ok(())
    }

    pub fn abort(mut self) -> Result<()> {
        self.finished = true;
        self.writer = None;
        self.committer.abort_task(&self.output, &self.attempt)
    }
}

impl<S: Scheme> Drop for TupleEntrySchemeCollector<S> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.writer = None;
        if let Err(e) = self.committer.abort_task(&self.output, &self.attempt) {
            warn!(attempt = %self.attempt, error = %e, "abort of unclosed collector failed");
        }
    }
}
