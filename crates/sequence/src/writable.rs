//! Hadoop `Writable` encodings used by sequence files.

use std::io::{self, Read, Write};

use taps_common::{Result, TapError};

/// Reusable length-prefixed byte cell.
///
/// The backing buffer is grown to 3/2 of the requested size and reused across
/// [`BytesWritable::read_fields`] calls, so [`BytesWritable::get_bytes`] may be longer than
/// the logical value and its contents change on the next read. Use
/// [`BytesWritable::copy_bytes`] to take a length-exact owned copy.
#[derive(Debug, Clone, Default)]
pub struct BytesWritable {
    bytes: Vec<u8>,
    size: usize,
}

impl BytesWritable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_slice(data: &[u8]) -> Self {
        Self {
            bytes: data.to_vec(),
            size: data.len(),
        }
    }

    /// Backing buffer; only the first [`BytesWritable::len`] bytes are valid.
    pub fn get_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.size]
    }

    pub fn copy_bytes(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }

    pub fn set(&mut self, data: &[u8]) {
        self.set_size(0);
        self.set_size(data.len());
        self.bytes[..data.len()].copy_from_slice(data);
    }

    fn set_size(&mut self, size: usize) {
        if size > self.bytes.len() {
            self.bytes.resize(size * 3 / 2, 0);
        }
        self.size = size;
    }

    /// Serialized length: 4-byte size prefix plus payload.
    pub fn serialized_len(&self) -> usize {
        4 + self.size
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let size = i32::try_from(self.size).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("BytesWritable of {} bytes exceeds the 32-bit length prefix", self.size),
            )
        })?;
        out.write_all(&size.to_be_bytes())?;
        out.write_all(self.as_slice())
    }

    pub fn read_fields<R: Read>(&mut self, input: &mut R) -> Result<()> {
        let size = read_i32(input)?;
        if size < 0 {
            return Err(TapError::format(
                "BytesWritable decode failed",
                format!("negative length {size}"),
            ));
        }
        self.set_size(0);
        self.set_size(size as usize);
        input.read_exact(&mut self.bytes[..self.size])?;
        Ok(())
    }
}

impl PartialEq for BytesWritable {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for BytesWritable {}

pub(crate) fn read_i32<R: Read>(input: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

/// Zero-compressed variable-length long (`WritableUtils.writeVLong` layout).
pub fn write_vlong<W: Write>(out: &mut W, value: i64) -> io::Result<()> {
    if (-112..=127).contains(&value) {
        return out.write_all(&[value as i8 as u8]);
    }

    let mut i = value;
    let mut len: i32 = -112;
    if i < 0 {
        i ^= -1;
        len = -120;
    }
    let mut tmp = i;
    while tmp != 0 {
        tmp >>= 8;
        len -= 1;
    }
    out.write_all(&[len as i8 as u8])?;

    let len = if len < -120 { -(len + 120) } else { -(len + 112) };
    for idx in (1..=len).rev() {
        let shift = (idx - 1) * 8;
        out.write_all(&[((i >> shift) & 0xFF) as u8])?;
    }
    Ok(())
}

pub fn read_vlong<R: Read>(input: &mut R) -> Result<i64> {
    let mut first = [0u8; 1];
    input.read_exact(&mut first)?;
    let first = first[0] as i8;
    if first >= -112 {
        return Ok(first as i64);
    }

    let len = if first < -120 {
        -119 - first as i32
    } else {
        -111 - first as i32
    };
    let mut i: i64 = 0;
    for _ in 0..len - 1 {
        let mut b = [0u8; 1];
        input.read_exact(&mut b)?;
        i = (i << 8) | b[0] as i64;
    }
    if first < -120 { Ok(i ^ -1) } else { Ok(i) }
}

/// `Text` encoding: vlong byte length followed by UTF-8.
pub fn write_text<W: Write>(out: &mut W, s: &str) -> io::Result<()> {
    write_vlong(out, s.len() as i64)?;
    out.write_all(s.as_bytes())
}

pub fn read_text<R: Read>(input: &mut R) -> Result<String> {
    let len = read_vlong(input)?;
    if len < 0 || len > i32::MAX as i64 {
        return Err(TapError::format(
            "Text decode failed",
            format!("invalid length {len}"),
        ));
    }
    let mut buf = vec![0u8; len as usize];
    input.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| TapError::format("Text decode failed", e))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{BytesWritable, read_text, read_vlong, write_text, write_vlong};

    #[test]
    fn vlong_matches_hadoop_layout() {
        let mut out = Vec::new();
        write_vlong(&mut out, 5).expect("small");
        assert_eq!(out, vec![5]);

        out.clear();
        write_vlong(&mut out, 300).expect("two bytes");
        assert_eq!(out, vec![0x8E, 0x01, 0x2C]);

        out.clear();
        write_vlong(&mut out, -200).expect("negative");
        assert_eq!(out, vec![0x87, 0xC7]);
    }

    #[test]
    fn vlong_decodes_edges() {
        for v in [0_i64, -112, 127, 128, -113, 300, -200, i32::MAX as i64, i64::MIN, i64::MAX] {
            let mut out = Vec::new();
            write_vlong(&mut out, v).expect("write");
            let back = read_vlong(&mut Cursor::new(out)).expect("read");
            assert_eq!(back, v);
        }
    }

    #[test]
    fn text_reads_back() {
        let mut out = Vec::new();
        write_text(&mut out, "org.apache.hadoop.io.BytesWritable").expect("write");
        assert_eq!(out[0], 34);
        let s = read_text(&mut Cursor::new(out)).expect("read");
        assert_eq!(s, "org.apache.hadoop.io.BytesWritable");
    }

    #[test]
    fn backing_buffer_outgrows_logical_length() {
        let mut w = BytesWritable::new();
        let mut input = Vec::new();
        BytesWritable::from_slice(&[1, 2, 3, 4]).write_to(&mut input).expect("encode");
        w.read_fields(&mut Cursor::new(input)).expect("decode");

        assert_eq!(w.len(), 4);
        assert_eq!(w.capacity(), 6);
        assert_eq!(w.get_bytes().len(), 6);
        assert_eq!(w.copy_bytes(), vec![1, 2, 3, 4]);
    }
}
