use std::collections::BTreeMap;
use std::io::Write;

use taps_common::{Result, TapError};

use crate::header::{Header, SYNC_ESCAPE};
use crate::writable::BytesWritable;

/// Appends `BytesWritable` key/value records to an uncompressed sequence file.
pub struct SequenceFileWriter<W: Write> {
    out: W,
    header: Header,
    position: u64,
    last_sync_pos: u64,
    sync_interval: u64,
    records: u64,
}

impl<W: Write> SequenceFileWriter<W> {
    pub fn new(out: W, sync_interval_bytes: usize) -> Result<Self> {
        Self::with_metadata(out, BTreeMap::new(), sync_interval_bytes)
    }

    pub fn with_metadata(
        mut out: W,
        metadata: BTreeMap<String, String>,
        sync_interval_bytes: usize,
    ) -> Result<Self> {
        let header = Header::bytes_pairs(metadata);
        let mut buf = Vec::with_capacity(128);
        header.write_to(&mut buf)?;
        out.write_all(&buf)?;
        Ok(Self {
            out,
            header,
            position: buf.len() as u64,
            last_sync_pos: 0,
            sync_interval: sync_interval_bytes.max(1) as u64,
            records: 0,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Bytes written so far, header included.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn append(&mut self, key: &BytesWritable, value: &BytesWritable) -> Result<()> {
        let (record_len, key_len) = record_header(key.serialized_len(), value.serialized_len())?;
        self.check_and_write_sync()?;

        self.out.write_all(&record_len.to_be_bytes())?;
        self.out.write_all(&key_len.to_be_bytes())?;
        key.write_to(&mut self.out)?;
        value.write_to(&mut self.out)?;

        self.position += 8 + u64::from(record_len.unsigned_abs());
        self.records += 1;
        Ok(())
    }

    /// Writes a sync marker unless one was just written.
    pub fn sync(&mut self) -> Result<()> {
        if self.last_sync_pos != self.position {
            self.out.write_all(&SYNC_ESCAPE.to_be_bytes())?;
            self.out.write_all(&self.header.sync_marker)?;
            self.position += 4 + self.header.sync_marker.len() as u64;
            self.last_sync_pos = self.position;
        }
        Ok(())
    }

    fn check_and_write_sync(&mut self) -> Result<()> {
        if self.position >= self.last_sync_pos + self.sync_interval {
            self.sync()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Record and key length prefixes; records must fit the format's signed 32-bit lengths.
fn record_header(key_len: usize, value_len: usize) -> Result<(i32, i32)> {
    let record_len = key_len.checked_add(value_len);
    match (record_len.map(i32::try_from), i32::try_from(key_len)) {
        (Some(Ok(record)), Ok(key)) => Ok((record, key)),
        _ => Err(TapError::InvalidRecord(format!(
            "sequence file record too large: key {key_len} bytes, value {value_len} bytes"
        ))),
    }
}
