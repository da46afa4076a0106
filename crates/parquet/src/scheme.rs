use std::sync::Arc;

use taps_common::{
    Fields, Result, Scheme, SinkConf, SourceConf, StructDescriptor, TBase, TapError, Tuple,
    global_metrics,
};

use crate::committer::ParquetOutputCommitter;
use crate::input_format::{ParquetInputFormat, ParquetRecordReader};
use crate::output_format::{ParquetOutputFormat, ParquetRecordWriter};
use crate::predicate::FilterPredicate;
use crate::read_support::{TBaseRecordConverter, ThriftReadSupport};
use crate::write_support::TBaseWriteSupport;

/// Record type and predicate a [`ParquetTBaseScheme`] is built from.
#[derive(Debug, Clone, Default)]
pub struct ParquetValueConfig {
    record_descriptor: Option<Arc<StructDescriptor>>,
    filter_predicate: Option<FilterPredicate>,
}

impl ParquetValueConfig {
    pub fn with_record_type<T: TBase>(self) -> Self {
        self.with_record_descriptor(T::descriptor())
    }

    pub fn with_record_descriptor(mut self, descriptor: StructDescriptor) -> Self {
        self.record_descriptor = Some(Arc::new(descriptor));
        self
    }

    pub fn with_filter_predicate(mut self, predicate: FilterPredicate) -> Self {
        self.filter_predicate = Some(predicate);
        self
    }

    pub fn record_descriptor(&self) -> Option<&Arc<StructDescriptor>> {
        self.record_descriptor.as_ref()
    }

    pub fn filter_predicate(&self) -> Option<&FilterPredicate> {
        self.filter_predicate.as_ref()
    }
}

/// Reads and writes structured records as single-field `value` tuples over parquet files.
///
/// Without a record type the scheme can only read, taking the struct shape from the
/// descriptor embedded in each file's footer.
#[derive(Debug, Clone)]
pub struct ParquetTBaseScheme {
    fields: Fields,
    config: ParquetValueConfig,
}

impl ParquetTBaseScheme {
    /// # Errors
    /// Returns [`TapError::InvalidConfig`] when the record descriptor is malformed or the
    /// predicate does not fit it.
    pub fn new(config: ParquetValueConfig) -> Result<Self> {
        if let Some(d) = &config.record_descriptor {
            d.validate()?;
            if let Some(p) = &config.filter_predicate {
                p.validate(d)?;
            }
        }
        Ok(Self {
            fields: Fields::new(["value"]),
            config,
        })
    }

    /// Read-only scheme inferring the record type from file metadata.
    pub fn infer() -> Self {
        Self {
            fields: Fields::new(["value"]),
            config: ParquetValueConfig::default(),
        }
    }

    pub fn for_type<T: TBase>() -> Result<Self> {
        Self::new(ParquetValueConfig::default().with_record_type::<T>())
    }

    pub fn with_filter(predicate: FilterPredicate) -> Result<Self> {
        Self::new(ParquetValueConfig::default().with_filter_predicate(predicate))
    }

    pub fn for_type_with_filter<T: TBase>(predicate: FilterPredicate) -> Result<Self> {
        Self::new(
            ParquetValueConfig::default()
                .with_record_type::<T>()
                .with_filter_predicate(predicate),
        )
    }

    pub fn config(&self) -> &ParquetValueConfig {
        &self.config
    }
}

impl Scheme for ParquetTBaseScheme {
    type Reader = ParquetRecordReader;
    type Writer = ParquetRecordWriter;
    type SourceContext = ();

    fn name(&self) -> &'static str {
        "ParquetTBaseScheme"
    }

    fn source_fields(&self) -> &Fields {
        &self.fields
    }

    fn sink_fields(&self) -> &Fields {
        &self.fields
    }

    fn source_conf_init(&self, conf: &mut SourceConf<Self::Reader>) -> Result<()> {
        let read_support = ThriftReadSupport::new(self.config.record_descriptor.clone());
        conf.set_input_format(
            ParquetInputFormat::new(Arc::new(read_support), Arc::new(TBaseRecordConverter))
                .with_filter_predicate(self.config.filter_predicate.clone()),
        );
        Ok(())
    }

    fn sink_conf_init(&self, conf: &mut SinkConf<Self::Writer>) -> Result<()> {
        let descriptor = self.config.record_descriptor.clone().ok_or_else(|| {
            TapError::InvalidConfig(
                "To use ParquetTBaseScheme as a sink, you must specify a thrift record type"
                    .to_string(),
            )
        })?;
        conf.set_output_format(ParquetOutputFormat::new(Arc::new(TBaseWriteSupport::new(
            Arc::clone(&descriptor),
        ))));
        let committer = ParquetOutputCommitter::new(conf.config().clone(), descriptor);
        conf.set_output_committer(committer);
        Ok(())
    }

    fn source_prepare(&self, _reader: &mut Self::Reader) -> Result<Self::SourceContext> {
        Ok(())
    }

    fn source(
        &self,
        _context: &mut Self::SourceContext,
        reader: &mut Self::Reader,
        tuple: &mut Tuple,
    ) -> Result<bool> {
        let Some(record) = reader.next_record()? else {
            return Ok(false);
        };
        tuple.clear();
        tuple.add(record);
        global_metrics().record_read(self.name(), 1);
        Ok(true)
    }

    fn sink(&self, tuple: &Tuple, writer: &mut Self::Writer) -> Result<()> {
        let record = tuple.get_struct(0)?;
        writer.write(record.clone())?;
        global_metrics().record_written(self.name(), 1);
        Ok(())
    }
}
