use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use taps_common::{
    FieldValue, Fields, IoConfig, RecordWriter, Scheme, SinkConf, SourceConf, TapError, Tuple,
};
use taps_sequence::{Header, KeyValueByteScheme};

fn unique_path(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}_{nanos}.seq"))
}

fn write_tuples(scheme: &KeyValueByteScheme, path: &Path, tuples: &[Tuple]) {
    let mut conf = SinkConf::new(IoConfig::default());
    scheme.sink_conf_init(&mut conf).expect("sink conf");
    let format = conf.output_format().expect("output format");
    let mut writer = format
        .record_writer(path, conf.config())
        .expect("record writer");
    for t in tuples {
        scheme.sink(t, &mut writer).expect("sink");
    }
    writer.close().expect("close");
}

fn read_all(scheme: &KeyValueByteScheme, path: &Path) -> Vec<Tuple> {
    let mut conf = SourceConf::new(IoConfig::default());
    scheme.source_conf_init(&mut conf).expect("source conf");
    let format = conf.input_format().expect("input format");
    let mut reader = format.open(path, conf.config()).expect("open");
    let mut ctx = scheme.source_prepare(&mut reader).expect("prepare");
    let mut out = Vec::new();
    let mut tuple = Tuple::new();
    while scheme
        .source(&mut ctx, &mut reader, &mut tuple)
        .expect("source")
    {
        out.push(tuple.clone());
    }
    out
}

fn pair(key: &[u8], value: &[u8]) -> Tuple {
    Tuple::from(vec![FieldValue::from(key), FieldValue::from(value)])
}

#[test]
fn byte_pairs_round_trip_exactly() {
    let path = unique_path("taps_kv_roundtrip");
    let scheme = KeyValueByteScheme::default();
    write_tuples(
        &scheme,
        &path,
        &[pair(&[0x00, 0x01], &[0xFF]), pair(&[], &[0x10; 300])],
    );

    let tuples = read_all(&scheme, &path);
    assert_eq!(tuples.len(), 2);
    assert_eq!(tuples[0].get_bytes(0).expect("key"), &[0x00, 0x01]);
    assert_eq!(tuples[0].get_bytes(1).expect("value"), &[0xFF]);
    assert!(tuples[1].get_bytes(0).expect("empty key").is_empty());
    assert_eq!(tuples[1].get_bytes(1).expect("value").len(), 300);

    let _ = std::fs::remove_file(path);
}

#[test]
fn records_stay_valid_after_reader_advances() {
    let path = unique_path("taps_kv_buffers");
    let scheme = KeyValueByteScheme::default();
    write_tuples(
        &scheme,
        &path,
        &[pair(&[1; 10], &[2; 10]), pair(&[3; 4], &[4; 2])],
    );

    let mut conf = SourceConf::new(IoConfig::default());
    scheme.source_conf_init(&mut conf).expect("source conf");
    let mut reader = conf
        .input_format()
        .expect("input format")
        .open(&path, conf.config())
        .expect("open");
    let mut ctx = scheme.source_prepare(&mut reader).expect("prepare");

    let mut first = Tuple::new();
    assert!(scheme.source(&mut ctx, &mut reader, &mut first).expect("first"));
    let mut second = Tuple::new();
    assert!(scheme.source(&mut ctx, &mut reader, &mut second).expect("second"));

    // The reused cells keep their larger backing buffers.
    assert!(ctx.key.get_bytes().len() > ctx.key.len());
    assert_eq!(first.get_bytes(0).expect("key"), &[1; 10]);
    assert_eq!(first.get_bytes(1).expect("value"), &[2; 10]);
    assert_eq!(second.get_bytes(0).expect("key"), &[3; 4]);
    assert_eq!(second.get_bytes(1).expect("value"), &[4; 2]);

    let mut third = Tuple::new();
    assert!(!scheme.source(&mut ctx, &mut reader, &mut third).expect("eof"));
    assert!(!scheme.source(&mut ctx, &mut reader, &mut third).expect("eof again"));

    let _ = std::fs::remove_file(path);
}

#[test]
fn sink_rejects_non_byte_fields_before_writing() {
    let path = unique_path("taps_kv_mismatch");
    let scheme = KeyValueByteScheme::default();

    let mut conf = SinkConf::new(IoConfig::default());
    scheme.sink_conf_init(&mut conf).expect("sink conf");
    let mut writer = conf
        .output_format()
        .expect("output format")
        .record_writer(&path, conf.config())
        .expect("record writer");
    let bad = Tuple::from(vec![FieldValue::Bytes(vec![1]), FieldValue::Null]);
    let err = scheme.sink(&bad, &mut writer).expect_err("must fail");
    assert!(matches!(err, TapError::TypeMismatch(_)));

    let wide = Tuple::from(vec![
        FieldValue::Bytes(vec![1]),
        FieldValue::Bytes(vec![2]),
        FieldValue::Bytes(vec![3]),
    ]);
    let err = scheme.sink(&wide, &mut writer).expect_err("three fields");
    assert!(matches!(err, TapError::TypeMismatch(_)));
    writer.close().expect("close");

    assert!(read_all(&scheme, &path).is_empty());

    let _ = std::fs::remove_file(path);
}

#[test]
fn rejects_containers_of_other_writables() {
    let path = unique_path("taps_kv_text");
    let mut header = Header::bytes_pairs(BTreeMap::new());
    header.value_class = "org.apache.hadoop.io.Text".to_string();
    let mut buf = Vec::new();
    header.write_to(&mut buf).expect("header");
    std::fs::write(&path, buf).expect("write file");

    let scheme = KeyValueByteScheme::default();
    let mut conf = SourceConf::new(IoConfig::default());
    scheme.source_conf_init(&mut conf).expect("source conf");
    let mut reader = conf
        .input_format()
        .expect("input format")
        .open(&path, conf.config())
        .expect("open");
    let err = scheme.source_prepare(&mut reader).expect_err("text values");
    assert!(matches!(err, TapError::TypeMismatch(_)));

    let _ = std::fs::remove_file(path);
}

#[test]
fn requires_exactly_two_fields() {
    let err = KeyValueByteScheme::new(Fields::new(["k", "v", "extra"])).expect_err("arity");
    assert!(matches!(err, TapError::InvalidConfig(_)));
    let scheme = KeyValueByteScheme::new(Fields::new(["k", "v"])).expect("two fields");
    assert_eq!(scheme.source_fields().name(1), Some("v"));
}
