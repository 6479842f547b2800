//! Cross-checks against the reference Avro implementation: our containers
//! must be readable by it, and our record encoding must match its bytes.

use apache_avro::types::Value as AvroValue;
use csv2avro::{ConvertOptions, Converter, RecordSchema, Value, encode_record};

const SCHEMA: &str = r#"{
    "type": "record",
    "name": "listing",
    "namespace": "shop",
    "fields": [
        { "name": "id", "type": "long" },
        { "name": "title", "type": "string" },
        { "name": "active", "type": "boolean" },
        { "name": "score", "type": "float" },
        { "name": "weight", "type": ["null", "double"] },
        { "name": "tags", "type": { "type": "array", "items": "string" } },
        { "name": "notes", "type": [{ "type": "array", "items": "int" }, "null"] }
    ]
}"#;

fn avro_record(
    id: i64,
    title: &str,
    active: bool,
    score: f32,
    weight: Option<f64>,
    tags: &[&str],
    notes: Option<&[i32]>,
) -> AvroValue {
    AvroValue::Record(vec![
        ("id".into(), AvroValue::Long(id)),
        ("title".into(), AvroValue::String(title.into())),
        ("active".into(), AvroValue::Boolean(active)),
        ("score".into(), AvroValue::Float(score)),
        (
            "weight".into(),
            match weight {
                Some(w) => AvroValue::Union(1, Box::new(AvroValue::Double(w))),
                None => AvroValue::Union(0, Box::new(AvroValue::Null)),
            },
        ),
        (
            "tags".into(),
            AvroValue::Array(tags.iter().map(|t| AvroValue::String(t.to_string())).collect()),
        ),
        (
            "notes".into(),
            match notes {
                Some(ns) => AvroValue::Union(
                    0,
                    Box::new(AvroValue::Array(ns.iter().map(|n| AvroValue::Int(*n)).collect())),
                ),
                None => AvroValue::Union(1, Box::new(AvroValue::Null)),
            },
        ),
    ])
}

#[test]
fn reference_reader_reads_our_container() {
    let schema = RecordSchema::parse(SCHEMA).unwrap();
    let input = "id,title,active,score,weight,tags,notes\n\
                 1,lamp,true,4.5,2.25,\"home,light\",\"3,4\"\n\
                 2,chair,false,0,,,\n";

    let mut out = Vec::new();
    Converter::new(&schema, ConvertOptions::default())
        .convert(input.as_bytes(), &mut out)
        .unwrap();

    let reader = apache_avro::Reader::new(&out[..]).unwrap();
    let values: Vec<AvroValue> = reader.map(|v| v.unwrap()).collect();

    assert_eq!(
        values,
        vec![
            avro_record(1, "lamp", true, 4.5, Some(2.25), &["home", "light"], Some(&[3, 4])),
            avro_record(2, "chair", false, 0.0, None, &[], None),
        ]
    );
}

#[test]
fn reference_reader_accepts_embedded_schema() {
    let schema = RecordSchema::parse(SCHEMA).unwrap();
    let mut out = Vec::new();
    Converter::new(&schema, ConvertOptions::default())
        .convert("id,title,active,score,weight,tags,notes\n".as_bytes(), &mut out)
        .unwrap();

    let reader = apache_avro::Reader::new(&out[..]).unwrap();
    let expected = apache_avro::Schema::parse_str(SCHEMA).unwrap();
    assert_eq!(reader.writer_schema().canonical_form(), expected.canonical_form());
    assert_eq!(reader.count(), 0);
}

#[test]
fn canonical_form_matches_reference() {
    let ours = RecordSchema::parse(SCHEMA).unwrap();
    let theirs = apache_avro::Schema::parse_str(SCHEMA).unwrap();
    assert_eq!(ours.canonical_form(), theirs.canonical_form());
}

#[test]
fn fingerprint_matches_reference_rabin() {
    let ours = RecordSchema::parse(SCHEMA).unwrap();
    let theirs = apache_avro::Schema::parse_str(SCHEMA).unwrap();
    let expected = theirs.fingerprint::<apache_avro::rabin::Rabin>();
    assert_eq!(ours.fingerprint().to_le_bytes().to_vec(), expected.bytes);
}

#[test]
fn record_bytes_match_reference_datum() {
    let ours = RecordSchema::parse(SCHEMA).unwrap();
    let theirs = apache_avro::Schema::parse_str(SCHEMA).unwrap();

    let cases = [
        (
            vec![
                Value::Long(-42),
                Value::String("désk".into()),
                Value::Boolean(true),
                Value::Float(-1.5),
                Value::Union(1, Box::new(Value::Double(1e10))),
                Value::Array(vec![Value::String("a".into())]),
                Value::Union(0, Box::new(Value::Array(vec![Value::Int(i32::MIN), Value::Int(7)]))),
            ],
            avro_record(-42, "désk", true, -1.5, Some(1e10), &["a"], Some(&[i32::MIN, 7])),
        ),
        (
            vec![
                Value::Long(i64::MAX),
                Value::String(String::new()),
                Value::Boolean(false),
                Value::Float(0.0),
                Value::Union(0, Box::new(Value::Null)),
                Value::Array(vec![]),
                Value::Union(1, Box::new(Value::Null)),
            ],
            avro_record(i64::MAX, "", false, 0.0, None, &[], None),
        ),
    ];

    for (values, reference) in cases {
        let mut buf = Vec::new();
        encode_record(&values, &ours, &mut buf).unwrap();
        let expected = apache_avro::to_avro_datum(&theirs, reference).unwrap();
        assert_eq!(buf, expected);
    }
}
