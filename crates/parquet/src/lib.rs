//! Parquet storage for structured records.
//!
//! [`ParquetTBaseScheme`] moves [`taps_common::ThriftStruct`] values between single-field
//! tuples and parquet files. The struct descriptor is stored in the file footer, so files
//! can be read back without a compile-time record type. An optional [`FilterPredicate`]
//! prunes row groups from their statistics and filters the surviving rows exactly.
//!
//! Key modules:
//! - [`predicate`]
//! - [`read_support`] / [`write_support`]
//! - [`input_format`] / [`output_format`]
//! - [`committer`]
//! - [`scheme`]

pub mod committer;
pub mod input_format;
pub mod output_format;
pub mod predicate;
pub mod read_support;
pub mod schema;
pub mod scheme;
pub mod stats;
pub mod write_support;

pub use committer::{COMMON_METADATA_FILE, ParquetOutputCommitter};
pub use input_format::{ParquetInputFormat, ParquetRecordReader};
pub use output_format::{ParquetOutputFormat, ParquetRecordWriter};
pub use predicate::{CmpOp, FilterPredicate, Literal};
pub use read_support::{ReadSupport, RecordConverter, TBaseRecordConverter, ThriftReadSupport};
pub use schema::{THRIFT_CLASS_KEY, THRIFT_DESCRIPTOR_KEY};
pub use scheme::{ParquetTBaseScheme, ParquetValueConfig};
pub use stats::ColumnStats;
pub use write_support::{TBaseWriteSupport, WriteContext, WriteSupport};
