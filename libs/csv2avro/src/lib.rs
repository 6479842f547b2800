//! Schema-driven conversion of delimited text rows into a binary object
//! container, and back.
//!
//! ```no_run
//! use csv2avro::{ConvertOptions, Converter, RecordSchema, read_container};
//!
//! # fn main() -> Result<(), csv2avro::ConvertError> {
//! let schema = RecordSchema::parse(
//!     r#"{"type":"record","name":"r","fields":[{"name":"id","type":"int"}]}"#,
//! )?;
//! let mut out = Vec::new();
//! Converter::new(&schema, ConvertOptions::default()).convert("id\n1\n".as_bytes(), &mut out)?;
//! let records = read_container(&out, &schema)?;
//! # Ok(())
//! # }
//! ```

pub mod coerce;
pub mod config;
pub mod container;
pub mod decode;
pub mod encode;
pub mod error;
pub mod pipeline;
pub mod schema;
pub mod value;

pub use coerce::coerce;
pub use config::{ConvertOptions, parse_delimiter};
pub use container::{ContainerReader, ContainerWriter};
pub use decode::{Reader, decode, decode_record};
pub use encode::{encode, encode_record};
pub use error::{CoercionError, ConfigError, ConvertError, DecodeError, EncodeError, SchemaError};
pub use pipeline::{ColumnMap, ConvertStats, Converter, Metric, read_container};
pub use schema::{RecordSchema, SchemaField, SchemaType};
pub use value::{Record, Value};
