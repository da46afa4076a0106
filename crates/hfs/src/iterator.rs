use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use taps_common::{InputFormat, IoConfig, Result, Scheme, Tuple};
use tracing::debug;

/// Tuples from a sequence of files, opened lazily one after another.
///
/// Yields an error at most once; iteration ends after it.
pub struct TupleEntrySchemeIterator<S: Scheme> {
    scheme: Arc<S>,
    format: Arc<dyn InputFormat<Reader = S::Reader>>,
    config: IoConfig,
    pending: VecDeque<PathBuf>,
    current: Option<(S::Reader, S::SourceContext)>,
    tuple: Tuple,
    failed: bool,
}

impl<S: Scheme> TupleEntrySchemeIterator<S> {
    pub fn new(
        scheme: Arc<S>,
        format: Arc<dyn InputFormat<Reader = S::Reader>>,
        config: IoConfig,
        files: Vec<PathBuf>,
    ) -> Self {
        Self {
            scheme,
            format,
            config,
            pending: files.into(),
            current: None,
            tuple: Tuple::new(),
            failed: false,
        }
    }

    fn open_next(&mut self) -> Result<bool> {
        let Some(path) = self.pending.pop_front() else {
            return Ok(false);
        };
        debug!(
            path = %path.display(),
            format = self.format.name(),
            scheme = self.scheme.name(),
            "opening tap input"
        );
        let mut reader = self.format.open(&path, &self.config)?;
        let context = self.scheme.source_prepare(&mut reader)?;
        self.current = Some((reader, context));
        Ok(true)
    }

    fn advance(&mut self) -> Result<bool> {
        loop {
            if let Some((reader, context)) = self.current.as_mut() {
                if self.scheme.source(context, reader, &mut self.tuple)? {
                    return Ok(true);
                }
                self.current = None;
            }
            if !self.open_next()? {
                return Ok(false);
            }
        }
    }
}

impl<S: Scheme> Iterator for TupleEntrySchemeIterator<S> {
    type Item = Result<Tuple>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.advance() {
            Ok(true) => Some(Ok(self.tuple.clone())),
            Ok(false) => None,
            Err(e) => {
                self.failed = true;
                self.current = None;
                Some(Err(e))
            }
        }
    }
}
