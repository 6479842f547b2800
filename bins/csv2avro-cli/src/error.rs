use std::path::PathBuf;

use csv2avro::{ConfigError, ConvertError, DecodeError, SchemaError};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("no schema: pass --schema or set `schema` in the config file")]
    NoSchema,

    #[error("container has no embedded schema; pass --schema")]
    NoEmbeddedSchema,

    #[error("'{}': {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("options: {0}")]
    Options(#[from] ConfigError),

    #[error("schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("{0}")]
    Convert(#[from] ConvertError),

    #[error("decode: {0}")]
    Decode(#[from] DecodeError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn file(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| CliError::File { path, source }
    }
}
