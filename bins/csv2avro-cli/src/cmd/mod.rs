pub mod convert;
pub mod read;

use std::path::Path;

use csv2avro::RecordSchema;

use crate::error::CliError;

/// Reads and parses a schema JSON file.
pub(crate) fn load_schema(path: &Path) -> Result<RecordSchema, CliError> {
    let text = std::fs::read_to_string(path).map_err(CliError::file(path))?;
    Ok(RecordSchema::parse(&text)?)
}
