//! File taps binding a scheme to a path.
//!
//! Architecture role:
//! - resolves path expressions (wildcards allowed) through a [`FileSystem`]
//! - reads tuples across all matched files ([`TupleEntrySchemeIterator`])
//! - writes task output through the scheme's committer ([`SinkJob`],
//!   [`TupleEntrySchemeCollector`])
//! - estimates input size ([`get_size`], [`GlobHfs::size`])

pub mod collector;
pub mod fs;
pub mod glob_hfs;
pub mod hfs;
pub mod iterator;
pub mod size;

pub use collector::TupleEntrySchemeCollector;
pub use fs::{ContentSummary, FileStatus, FileSystem, LocalFileSystem};
pub use glob_hfs::GlobHfs;
pub use hfs::{Hfs, SinkJob, SinkMode};
pub use iterator::TupleEntrySchemeIterator;
pub use size::get_size;
