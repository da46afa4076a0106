//! Raw key/value byte pairs stored in Hadoop-compatible sequence files.
//!
//! - [`writable`]: `BytesWritable`, vlong and `Text` encodings
//! - [`header`] / [`reader`] / [`writer`]: the uncompressed container layout
//! - [`format`]: input/output format plugins over local files
//! - [`scheme`]: [`KeyValueByteScheme`], the 2-field tuple codec

pub mod format;
pub mod header;
pub mod reader;
pub mod scheme;
pub mod writable;
pub mod writer;

pub use format::{SequenceFileInputFormat, SequenceFileOutputFormat, SequenceFileRecordWriter};
pub use header::{BYTES_WRITABLE_CLASS, Header};
pub use reader::SequenceFileReader;
pub use scheme::{KeyValueByteScheme, KeyValueContext};
pub use writable::BytesWritable;
pub use writer::SequenceFileWriter;
