use taps_common::{
    Fields, Result, Scheme, SinkConf, SourceConf, TapError, Tuple, global_metrics,
};

use crate::format::{
    FileSequenceReader, SequenceFileInputFormat, SequenceFileOutputFormat,
    SequenceFileRecordWriter,
};
use crate::header::BYTES_WRITABLE_CLASS;
use crate::writable::BytesWritable;

/// Exposes `BytesWritable` key/value sequence files as 2-field tuples of byte sequences.
#[derive(Debug, Clone)]
pub struct KeyValueByteScheme {
    fields: Fields,
}

impl Default for KeyValueByteScheme {
    fn default() -> Self {
        Self {
            fields: Fields::new(["key", "value"]),
        }
    }
}

impl KeyValueByteScheme {
    /// # Errors
    /// Returns [`TapError::InvalidConfig`] unless exactly two fields are declared.
    pub fn new(fields: Fields) -> Result<Self> {
        if fields.size() != 2 {
            return Err(TapError::InvalidConfig(format!(
                "KeyValueByteScheme needs exactly 2 fields (key, value), got {fields}"
            )));
        }
        Ok(Self { fields })
    }

    /// Length-exact copy of a cell; never a view of the reader's reusable buffer.
    pub fn get_bytes(cell: &BytesWritable) -> Vec<u8> {
        cell.copy_bytes()
    }
}

/// Reusable key/value cells handed to the container reader.
#[derive(Debug, Default)]
pub struct KeyValueContext {
    pub key: BytesWritable,
    pub value: BytesWritable,
}

impl Scheme for KeyValueByteScheme {
    type Reader = FileSequenceReader;
    type Writer = SequenceFileRecordWriter;
    type SourceContext = KeyValueContext;

    fn name(&self) -> &'static str {
        "KeyValueByteScheme"
    }

    fn source_fields(&self) -> &Fields {
        &self.fields
    }

    fn sink_fields(&self) -> &Fields {
        &self.fields
    }

    fn source_conf_init(&self, conf: &mut SourceConf<Self::Reader>) -> Result<()> {
        conf.set_input_format(SequenceFileInputFormat);
        Ok(())
    }

    fn sink_conf_init(&self, conf: &mut SinkConf<Self::Writer>) -> Result<()> {
        conf.set_output_format(SequenceFileOutputFormat);
        Ok(())
    }

    fn source_prepare(&self, reader: &mut Self::Reader) -> Result<Self::SourceContext> {
        for (side, class) in [
            ("key", reader.key_class_name()),
            ("value", reader.value_class_name()),
        ] {
            if class != BYTES_WRITABLE_CLASS {
                return Err(TapError::TypeMismatch(format!(
                    "sequence file {side} class is {class}, expected {BYTES_WRITABLE_CLASS}"
                )));
            }
        }
        Ok(KeyValueContext::default())
    }

    fn source(
        &self,
        context: &mut Self::SourceContext,
        reader: &mut Self::Reader,
        tuple: &mut Tuple,
    ) -> Result<bool> {
        if !reader.next(&mut context.key, &mut context.value)? {
            return Ok(false);
        }

        tuple.clear();
        tuple.add(Self::get_bytes(&context.key));
        tuple.add(Self::get_bytes(&context.value));
        global_metrics().record_read(self.name(), 1);
        Ok(true)
    }

    fn sink(&self, tuple: &Tuple, writer: &mut Self::Writer) -> Result<()> {
        if tuple.len() != 2 {
            return Err(TapError::TypeMismatch(format!(
                "{} sinks key/value pairs, got a tuple of {} fields",
                self.name(),
                tuple.len()
            )));
        }
        let key = BytesWritable::from_slice(tuple.get_bytes(0)?);
        let value = BytesWritable::from_slice(tuple.get_bytes(1)?);
        writer.collect(&key, &value)?;
        global_metrics().record_written(self.name(), 1);
        Ok(())
    }
}
