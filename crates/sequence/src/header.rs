use std::collections::BTreeMap;
use std::io::{Read, Write};

use taps_common::{Result, TapError};

use crate::writable::{read_i32, read_text, write_text};

pub const MAGIC: &[u8; 3] = b"SEQ";
pub const VERSION: u8 = 6;
pub const SYNC_HASH_SIZE: usize = 16;
/// Record-length value announcing a sync marker instead of a record.
pub const SYNC_ESCAPE: i32 = -1;
pub const BYTES_WRITABLE_CLASS: &str = "org.apache.hadoop.io.BytesWritable";

/// Sequence file header (uncompressed layout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub key_class: String,
    pub value_class: String,
    pub compressed: bool,
    pub block_compressed: bool,
    pub compression_codec: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub sync_marker: [u8; SYNC_HASH_SIZE],
}

impl Header {
    pub fn bytes_pairs(metadata: BTreeMap<String, String>) -> Self {
        Self {
            version: VERSION,
            key_class: BYTES_WRITABLE_CLASS.to_string(),
            value_class: BYTES_WRITABLE_CLASS.to_string(),
            compressed: false,
            block_compressed: false,
            compression_codec: None,
            metadata,
            sync_marker: *uuid::Uuid::new_v4().as_bytes(),
        }
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(MAGIC)?;
        out.write_all(&[self.version])?;
        write_text(out, &self.key_class)?;
        write_text(out, &self.value_class)?;
        out.write_all(&[self.compressed as u8, self.block_compressed as u8])?;
        if let Some(codec) = &self.compression_codec {
            write_text(out, codec)?;
        }
        out.write_all(&(self.metadata.len() as i32).to_be_bytes())?;
        for (k, v) in &self.metadata {
            write_text(out, k)?;
            write_text(out, v)?;
        }
        out.write_all(&self.sync_marker)?;
        Ok(())
    }

    pub fn read_from<R: Read>(input: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        input.read_exact(&mut magic)?;
        if &magic[..3] != MAGIC {
            return Err(TapError::format(
                "sequence file header decode failed",
                "not a sequence file (bad magic)",
            ));
        }
        let version = magic[3];
        if version != VERSION {
            return Err(TapError::Unsupported(format!(
                "sequence file version {version} (only {VERSION} is supported)"
            )));
        }

        let key_class = read_text(input)?;
        let value_class = read_text(input)?;
        let mut flags = [0u8; 2];
        input.read_exact(&mut flags)?;
        let compressed = flags[0] != 0;
        let block_compressed = flags[1] != 0;
        let compression_codec = if compressed {
            Some(read_text(input)?)
        } else {
            None
        };

        let count = read_i32(input)?;
        if count < 0 {
            return Err(TapError::format(
                "sequence file header decode failed",
                format!("negative metadata count {count}"),
            ));
        }
        let mut metadata = BTreeMap::new();
        for _ in 0..count {
            let k = read_text(input)?;
            let v = read_text(input)?;
            metadata.insert(k, v);
        }

        let mut sync_marker = [0u8; SYNC_HASH_SIZE];
        input.read_exact(&mut sync_marker)?;

        Ok(Self {
            version,
            key_class,
            value_class,
            compressed,
            block_compressed,
            compression_codec,
            metadata,
            sync_marker,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::io::Cursor;

    use taps_common::TapError;

    use super::{BYTES_WRITABLE_CLASS, Header};

    #[test]
    fn header_reads_back_with_metadata() {
        let mut meta = BTreeMap::new();
        meta.insert("origin".to_string(), "unit-test".to_string());
        let header = Header::bytes_pairs(meta);

        let mut buf = Vec::new();
        header.write_to(&mut buf).expect("write");
        assert_eq!(&buf[..4], b"SEQ\x06");

        let back = Header::read_from(&mut Cursor::new(buf)).expect("read");
        assert_eq!(back, header);
        assert_eq!(back.key_class, BYTES_WRITABLE_CLASS);
    }

    #[test]
    fn rejects_foreign_files() {
        let err = Header::read_from(&mut Cursor::new(b"PAR1xxxx".to_vec())).expect_err("magic");
        assert!(matches!(err, TapError::Format { .. }));

        let err = Header::read_from(&mut Cursor::new(b"SEQ\x05".to_vec())).expect_err("version");
        assert!(matches!(err, TapError::Unsupported(_)));
    }
}
