use taps_common::{Result, Scheme};

use crate::hfs::Hfs;
use crate::iterator::TupleEntrySchemeIterator;
use crate::size::get_size;

/// Read-only tap over every path matching a wildcard expression.
pub struct GlobHfs<S: Scheme> {
    inner: Hfs<S>,
}

impl<S: Scheme> GlobHfs<S> {
    pub fn new(scheme: S, pattern: impl Into<String>) -> Self {
        Self {
            inner: Hfs::new(scheme, pattern),
        }
    }

    pub fn from_hfs(inner: Hfs<S>) -> Self {
        Self { inner }
    }

    pub fn hfs(&self) -> &Hfs<S> {
        &self.inner
    }

    pub fn identifier(&self) -> &str {
        self.inner.identifier()
    }

    /// Total bytes of all matches; a pattern matching nothing is not-found.
    pub fn size(&self) -> Result<u64> {
        get_size(self.inner.file_system(), self.inner.identifier())
    }

    pub fn open_for_read(&self) -> Result<TupleEntrySchemeIterator<S>> {
        self.inner.open_for_read()
    }
}
