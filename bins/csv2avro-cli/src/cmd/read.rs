use std::io::{BufWriter, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use csv2avro::{ContainerReader, Record, RecordSchema, Value};
use serde_json::{Map, Value as Json};

use super::load_schema;
use crate::config::ReadArgs;
use crate::error::CliError;

pub fn run(args: ReadArgs) -> Result<(), CliError> {
    let bytes = std::fs::read(&args.input).map_err(CliError::file(&args.input))?;
    let container = ContainerReader::new(&bytes)?;

    let schema = match &args.schema {
        Some(path) => load_schema(path)?,
        None => {
            let text = container.embedded_schema().ok_or(CliError::NoEmbeddedSchema)?;
            RecordSchema::parse(text)?
        }
    };
    tracing::debug!(schema = %schema.full_name(), "reading container");

    let records = container.read_all(&schema)?;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for record in &records {
        serde_json::to_writer(&mut out, &record_to_json(record))?;
        writeln!(out)?;
    }
    out.flush()?;

    tracing::info!(records = records.len(), input = %args.input.display(), "read container");
    Ok(())
}

/// JSON object with fields in schema order; unions are unwrapped.
fn record_to_json(record: &Record) -> Json {
    let mut obj = Map::new();
    for (name, value) in record.fields() {
        obj.insert(name.clone(), value_to_json(value));
    }
    Json::Object(obj)
}

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Int(n) => Json::from(*n),
        Value::Long(n) => Json::from(*n),
        // Non-finite floats become null.
        Value::Float(f) => Json::from(f64::from(*f)),
        Value::Double(d) => Json::from(*d),
        Value::Boolean(b) => Json::Bool(*b),
        Value::String(s) => Json::String(s.clone()),
        Value::Bytes(b) => Json::String(STANDARD.encode(b)),
        Value::Array(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Union(_, inner) => value_to_json(inner),
    }
}
