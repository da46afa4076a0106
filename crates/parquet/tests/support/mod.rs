#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use taps_common::{
    FieldDescriptor, IoConfig, RecordWriter, Result, Scheme, SinkConf, SourceConf,
    StructDescriptor, TBase, ThriftStruct, ThriftType, Tuple,
};
use taps_parquet::{ParquetRecordReader, ParquetTBaseScheme};

/// Hand-written equivalent of an IDL-generated struct.
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub age: Option<i32>,
    pub email: Option<String>,
}

fn person_descriptor() -> &'static Arc<StructDescriptor> {
    static D: OnceLock<Arc<StructDescriptor>> = OnceLock::new();
    D.get_or_init(|| Arc::new(Person::descriptor()))
}

impl TBase for Person {
    fn descriptor() -> StructDescriptor {
        StructDescriptor::new(
            "test.Person",
            vec![
                FieldDescriptor::required(1, "id", ThriftType::I64),
                FieldDescriptor::required(2, "name", ThriftType::String),
                FieldDescriptor::optional(3, "age", ThriftType::I32),
                FieldDescriptor::optional(4, "email", ThriftType::String),
            ],
        )
    }

    fn to_struct(&self) -> Result<ThriftStruct> {
        let mut s = ThriftStruct::new(Arc::clone(person_descriptor()));
        s.set("id", self.id)?;
        s.set("name", self.name.clone())?;
        if let Some(age) = self.age {
            s.set("age", age)?;
        }
        if let Some(email) = &self.email {
            s.set("email", email.clone())?;
        }
        Ok(s)
    }

    fn from_struct(value: &ThriftStruct) -> Result<Self> {
        Ok(Self {
            id: value.required("id")?,
            name: value.required("name")?,
            age: value.optional("age")?,
            email: value.optional("email")?,
        })
    }
}

/// Projection of [`Person`] onto two of its columns.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonName {
    pub id: i64,
    pub name: Option<String>,
}

impl TBase for PersonName {
    fn descriptor() -> StructDescriptor {
        StructDescriptor::new(
            "test.PersonName",
            vec![
                FieldDescriptor::required(1, "id", ThriftType::I64),
                FieldDescriptor::optional(2, "name", ThriftType::String),
            ],
        )
    }

    fn to_struct(&self) -> Result<ThriftStruct> {
        let mut s = ThriftStruct::new(Arc::new(Self::descriptor()));
        s.set("id", self.id)?;
        if let Some(name) = &self.name {
            s.set("name", name.clone())?;
        }
        Ok(s)
    }

    fn from_struct(value: &ThriftStruct) -> Result<Self> {
        Ok(Self {
            id: value.required("id")?,
            name: value.optional("name")?,
        })
    }
}

pub fn person(id: i64) -> Person {
    Person {
        id,
        name: format!("person-{id}"),
        age: (id % 7 != 0).then(|| 20 + (id % 40) as i32),
        email: (id % 2 == 0).then(|| format!("p{id}@example.com")),
    }
}

pub fn unique_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("{prefix}_{nanos}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub fn write_people(
    scheme: &ParquetTBaseScheme,
    path: &Path,
    config: IoConfig,
    people: &[Person],
) {
    write_records(scheme, path, config, people);
}

pub fn write_records<T: TBase>(
    scheme: &ParquetTBaseScheme,
    path: &Path,
    config: IoConfig,
    records: &[T],
) {
    let mut conf = SinkConf::new(config);
    scheme.sink_conf_init(&mut conf).expect("sink conf");
    let mut writer = conf
        .output_format()
        .expect("output format")
        .record_writer(path, conf.config())
        .expect("record writer");
    for r in records {
        let mut tuple = Tuple::new();
        tuple.add(r.to_struct().expect("to struct"));
        scheme.sink(&tuple, &mut writer).expect("sink");
    }
    writer.close().expect("close");
}

pub fn open_reader(scheme: &ParquetTBaseScheme, path: &Path) -> Result<ParquetRecordReader> {
    let mut conf = SourceConf::new(IoConfig::default());
    scheme.source_conf_init(&mut conf)?;
    conf.input_format()?.open(path, conf.config())
}

pub fn drain(scheme: &ParquetTBaseScheme, reader: &mut ParquetRecordReader) -> Vec<ThriftStruct> {
    let mut ctx = scheme.source_prepare(reader).expect("prepare");
    let mut tuple = Tuple::new();
    let mut out = Vec::new();
    while scheme.source(&mut ctx, reader, &mut tuple).expect("source") {
        out.push(tuple.get_struct(0).expect("struct value").clone());
    }
    out
}

pub fn read_all(scheme: &ParquetTBaseScheme, path: &Path) -> Vec<ThriftStruct> {
    let mut reader = open_reader(scheme, path).expect("open");
    drain(scheme, &mut reader)
}
