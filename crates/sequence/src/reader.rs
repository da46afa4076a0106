use std::collections::BTreeMap;
use std::io::{self, Read};

use taps_common::{Result, TapError};

use crate::header::{Header, SYNC_ESCAPE, SYNC_HASH_SIZE};
use crate::writable::{BytesWritable, read_i32};

/// Streams key/value records out of an uncompressed sequence file.
///
/// `next` decodes into caller-owned, reused [`BytesWritable`] cells; once the input is
/// exhausted every further call returns `false`.
pub struct SequenceFileReader<R: Read> {
    input: R,
    header: Header,
    done: bool,
    records: u64,
}

impl<R: Read> SequenceFileReader<R> {
    pub fn new(mut input: R) -> Result<Self> {
        let header = Header::read_from(&mut input)?;
        if header.compressed {
            return Err(TapError::Unsupported(format!(
                "compressed sequence files ({})",
                header.compression_codec.as_deref().unwrap_or("unknown codec")
            )));
        }
        Ok(Self {
            input,
            header,
            done: false,
            records: 0,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn key_class_name(&self) -> &str {
        &self.header.key_class
    }

    pub fn value_class_name(&self) -> &str {
        &self.header.value_class
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.header.metadata
    }

    /// Records returned so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn next(&mut self, key: &mut BytesWritable, value: &mut BytesWritable) -> Result<bool> {
        if self.done {
            return Ok(false);
        }
        let Some(record_len) = self.read_record_length()? else {
            self.done = true;
            return Ok(false);
        };
        let key_len = read_i32(&mut self.input)?;
        let (key_len, value_len) = cell_lengths(record_len, key_len)?;

        read_cell(&mut self.input, key, key_len, "key")?;
        read_cell(&mut self.input, value, value_len, "value")?;
        self.records += 1;
        Ok(true)
    }

    fn read_record_length(&mut self) -> Result<Option<i32>> {
        loop {
            match read_i32_or_eof(&mut self.input)? {
                None => return Ok(None),
                Some(SYNC_ESCAPE) => {
                    let mut marker = [0u8; SYNC_HASH_SIZE];
                    self.input.read_exact(&mut marker)?;
                    if marker != self.header.sync_marker {
                        return Err(TapError::format(
                            "sequence file record decode failed",
                            "sync marker mismatch (file is corrupt)",
                        ));
                    }
                }
                Some(len) => return Ok(Some(len)),
            }
        }
    }
}

/// Splits a record header into key and value lengths; both cells carry a 4-byte prefix.
fn cell_lengths(record_len: i32, key_len: i32) -> Result<(usize, usize)> {
    let value_len = i64::from(record_len) - i64::from(key_len);
    match (usize::try_from(key_len), usize::try_from(value_len)) {
        (Ok(k), Ok(v)) if k >= 4 && v >= 4 => Ok((k, v)),
        _ => Err(TapError::format(
            "sequence file record decode failed",
            format!("invalid lengths: record {record_len}, key {key_len}"),
        )),
    }
}

fn read_cell<R: Read>(
    input: &mut R,
    cell: &mut BytesWritable,
    serialized_len: usize,
    what: &str,
) -> Result<()> {
    let mut limited = input.take(serialized_len as u64);
    cell.read_fields(&mut limited)?;
    if cell.serialized_len() != serialized_len {
        return Err(TapError::format(
            "sequence file record decode failed",
            format!(
                "{what} length {} disagrees with record header {serialized_len}",
                cell.serialized_len()
            ),
        ));
    }
    Ok(())
}

/// Reads a big-endian i32, distinguishing a clean end of input from truncation.
fn read_i32_or_eof<R: Read>(input: &mut R) -> io::Result<Option<i32>> {
    let mut buf = [0u8; 4];
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "truncated sequence file record",
                ));
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(Some(i32::from_be_bytes(buf)))
}
