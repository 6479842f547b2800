use crate::schema::SchemaType;

/// Malformed or unsupported schema. Fatal before any row is read.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("schema is not valid JSON: {0}")]
    Json(String),

    #[error("missing or invalid '{key}' in {context}")]
    MissingKey { key: &'static str, context: String },

    #[error("top-level type must be \"record\", got {0}")]
    NotARecord(String),

    #[error("unknown type {0}")]
    UnknownType(String),

    #[error("invalid union: {0}")]
    InvalidUnion(String),

    #[error("invalid array: {0}")]
    InvalidArray(String),

    #[error("field '{0}': null is only allowed as a union branch")]
    BareNull(String),

    #[error("duplicate field '{0}'")]
    DuplicateField(String),

    #[error("field '{field}': invalid default {default}: {reason}")]
    InvalidDefault {
        field: String,
        default: String,
        reason: String,
    },
}

/// A raw cell that cannot be turned into the declared type.
///
/// `row` is filled in by the pipeline; standalone `coerce` calls leave it empty.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}field '{field}': cannot coerce {raw:?} to {expected}", row_prefix(.row))]
pub struct CoercionError {
    pub row: Option<u64>,
    pub field: String,
    pub raw: String,
    pub expected: String,
}

impl CoercionError {
    pub(crate) fn new(field: &str, raw: &str, expected: &SchemaType) -> Self {
        Self {
            row: None,
            field: field.to_string(),
            raw: raw.to_string(),
            expected: expected.to_string(),
        }
    }

    pub fn at_row(mut self, row: u64) -> Self {
        self.row = Some(row);
        self
    }
}

fn row_prefix(row: &Option<u64>) -> String {
    match row {
        Some(r) => format!("row {r}, "),
        None => String::new(),
    }
}

/// Value shape does not fit the schema type it is being written under.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    #[error("type mismatch: expected {expected}, got {found}")]
    TypeMismatch { expected: String, found: &'static str },

    #[error("union branch {index} out of range ({branches} branches)")]
    BranchOutOfRange { index: u32, branches: usize },

    #[error("field '{field}': {source}")]
    Field {
        field: String,
        #[source]
        source: Box<EncodeError>,
    },
}

/// Corrupt or truncated binary input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("unexpected end of input at offset {offset}: need {needed} more bytes")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("varint at offset {offset} exceeds 10 bytes")]
    VarintOverflow { offset: usize },

    #[error("value {value} at offset {offset} does not fit in int")]
    IntOverflow { offset: usize, value: i64 },

    #[error("negative length {value} at offset {offset}")]
    NegativeLength { offset: usize, value: i64 },

    #[error("invalid boolean byte {byte:#04x} at offset {offset}")]
    InvalidBoolean { offset: usize, byte: u8 },

    #[error("invalid UTF-8 string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("union branch {index} out of range ({branches} branches) at offset {offset}")]
    BranchOutOfRange {
        offset: usize,
        index: i64,
        branches: usize,
    },

    #[error("not an object container: bad magic")]
    BadMagic,

    #[error("unsupported codec '{0}'")]
    UnsupportedCodec(String),

    #[error("block {block}: sync marker mismatch")]
    SyncMismatch { block: u64 },

    #[error("block {block}: declared {declared} bytes, records used {used}")]
    BlockSize {
        block: u64,
        declared: usize,
        used: usize,
    },

    #[error("field '{field}': {source}")]
    Field {
        field: String,
        #[source]
        source: Box<DecodeError>,
    },
}

/// Invalid conversion options.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("delimiter must be a single ASCII character other than a line break or quote, got {0:?}")]
    Delimiter(String),

    #[error("array delimiter must not be empty")]
    EmptyArrayDelimiter,
}

/// Everything that can abort a conversion run.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Coercion(#[from] CoercionError),

    #[error("missing column '{0}' in header")]
    MissingColumn(String),

    #[error("input has no header row")]
    EmptyInput,

    #[error("row {row}: {source}")]
    Encode {
        row: u64,
        #[source]
        source: EncodeError,
    },

    #[error("decode: {0}")]
    Decode(#[from] DecodeError),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
