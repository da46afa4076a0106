//! Shared errors, configuration, record model and plugin traits for taps crates.
//!
//! Architecture role:
//! - defines the tuple/record model schemes exchange with the pipeline
//! - defines the host-engine seams ([`Scheme`], [`InputFormat`], [`OutputFormat`],
//!   [`OutputCommitter`]) as traits instead of class-name registration
//! - provides common [`TapError`] / [`Result`] contracts and IO metrics
//!
//! Key modules:
//! - [`committer`]
//! - [`config`]
//! - [`error`]
//! - [`ids`]
//! - [`metrics`]
//! - [`record`]
//! - [`scheme`]
//! - [`thrift`]

pub mod committer;
pub mod config;
pub mod error;
pub mod ids;
pub mod metrics;
pub mod record;
pub mod scheme;
pub mod thrift;

pub use committer::{FileOutputCommitter, OutputCommitter, SUCCESS_MARKER, is_hidden_file_name};
pub use config::IoConfig;
pub use error::{Result, TapError};
pub use ids::*;
pub use metrics::{IoMetrics, global_metrics};
pub use record::{FieldValue, Fields, Tuple};
pub use scheme::{InputFormat, OutputFormat, RecordWriter, Scheme, SinkConf, SourceConf};
pub use thrift::{
    FieldDescriptor, FromThriftValue, StructDescriptor, TBase, ThriftStruct, ThriftType,
    ThriftValue,
};
