use std::collections::HashMap;
use std::io::{Read, Write};

use serde::Serialize;

use crate::coerce::{accepts_blank, coerce};
use crate::config::ConvertOptions;
use crate::container::{ContainerReader, ContainerWriter};
use crate::encode::encode;
use crate::error::{ConvertError, EncodeError};
use crate::schema::RecordSchema;
use crate::value::Record;

// ═══════════════════════════════════════════════════════════════
//  Column mapping
// ═══════════════════════════════════════════════════════════════

/// Header-derived column names, looked up by name.
pub struct ColumnMap {
    index: HashMap<String, usize>,
}

impl ColumnMap {
    pub fn from_header<'a>(fields: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = HashMap::new();
        for (i, name) in fields.into_iter().enumerate() {
            // First occurrence wins on duplicate headers.
            index.entry(name.trim().to_string()).or_insert(i);
        }
        Self { index }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Column index per schema field, in field order. `None` marks a field
    /// with no column, allowed only when a blank cell resolves for it.
    pub fn resolve(
        &self,
        schema: &RecordSchema,
        options: &ConvertOptions,
    ) -> Result<Vec<Option<usize>>, ConvertError> {
        schema
            .fields
            .iter()
            .map(|field| match self.get(&field.name) {
                Some(i) => Ok(Some(i)),
                None if accepts_blank(field, options) => {
                    tracing::debug!(field = %field.name, "column absent, field treated as blank");
                    Ok(None)
                }
                None => Err(ConvertError::MissingColumn(field.name.clone())),
            })
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Stats
// ═══════════════════════════════════════════════════════════════

/// Counters of one conversion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertStats {
    pub rows: u64,
    pub blocks: u64,
    pub bytes_written: u64,
}

/// A named counter, ready for JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub name: &'static str,
    pub value: u64,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl ConvertStats {
    pub fn metrics(&self) -> Vec<Metric> {
        vec![
            Metric { name: "rows_processed", value: self.rows, kind: "counter" },
            Metric { name: "blocks_written", value: self.blocks, kind: "counter" },
            Metric { name: "bytes_written", value: self.bytes_written, kind: "counter" },
        ]
    }
}

// ═══════════════════════════════════════════════════════════════
//  Converter
// ═══════════════════════════════════════════════════════════════

/// Delimited text → object container, one schema, one set of options.
pub struct Converter<'s> {
    schema: &'s RecordSchema,
    options: ConvertOptions,
}

impl<'s> Converter<'s> {
    pub fn new(schema: &'s RecordSchema, options: ConvertOptions) -> Self {
        Self { schema, options }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    fn csv_reader<R: Read>(&self, input: R) -> Result<csv::Reader<R>, ConvertError> {
        let mut rb = csv::ReaderBuilder::new();
        rb.delimiter(self.options.delimiter_byte()?)
            .has_headers(false)
            .flexible(true);
        Ok(rb.from_reader(input))
    }

    /// Coerces and encodes one data row. `row` is 1-based, header excluded.
    pub fn encode_row(
        &self,
        row: u64,
        cells: &csv::StringRecord,
        columns: &[Option<usize>],
        out: &mut Vec<u8>,
    ) -> Result<(), ConvertError> {
        for (field, column) in self.schema.fields.iter().zip(columns) {
            let raw = column.and_then(|i| cells.get(i));
            let value = coerce(raw, field, &self.options).map_err(|e| e.at_row(row))?;
            encode(&value, &field.ty, out).map_err(|e| ConvertError::Encode {
                row,
                source: EncodeError::Field { field: field.name.clone(), source: Box::new(e) },
            })?;
        }
        Ok(())
    }

    /// Reads the header, then converts every row into `output`.
    ///
    /// Aborts on the first bad row; nothing after it is written.
    pub fn convert<R: Read, W: Write>(
        &self,
        input: R,
        output: W,
    ) -> Result<ConvertStats, ConvertError> {
        self.options.validate()?;
        let mut reader = self.csv_reader(input)?;

        let mut record = csv::StringRecord::new();
        if !reader.read_record(&mut record)? {
            return Err(ConvertError::EmptyInput);
        }
        let columns = ColumnMap::from_header(record.iter()).resolve(self.schema, &self.options)?;
        tracing::debug!(
            header = record.len(),
            fields = columns.len(),
            absent = columns.iter().filter(|c| c.is_none()).count(),
            "resolved header"
        );

        let mut writer = ContainerWriter::new(output, self.schema)?;
        let mut buf = Vec::new();
        let mut rows = 0u64;

        while reader.read_record(&mut record)? {
            rows += 1;
            buf.clear();
            self.encode_row(rows, &record, &columns, &mut buf)?;
            writer.append(&buf)?;
        }

        writer.flush()?;
        let stats = ConvertStats {
            rows,
            blocks: writer.blocks_written(),
            bytes_written: writer.bytes_written(),
        };
        writer.finish()?;

        tracing::debug!(rows = stats.rows, blocks = stats.blocks, "conversion done");
        Ok(stats)
    }
}

/// Decodes a whole container with `schema`, in row order.
pub fn read_container(bytes: &[u8], schema: &RecordSchema) -> Result<Vec<Record>, ConvertError> {
    Ok(ContainerReader::new(bytes)?.read_all(schema)?)
}
