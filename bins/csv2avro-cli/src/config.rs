use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use csv2avro::{ConvertOptions, parse_delimiter};
use serde::Deserialize;

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "csv2avro", about = "Delimited text to binary object container, and back")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a CSV/TSV file into a container
    Convert(ConvertArgs),
    /// Print the records of a container as JSON lines
    Read(ReadArgs),
}

// ═══════════════════════════════════════════════════════════════
//  CLI args
// ═══════════════════════════════════════════════════════════════

#[derive(Args, Clone, Debug)]
pub struct ConvertArgs {
    /// Input file; stdin when omitted
    pub input: Option<PathBuf>,

    /// Schema JSON file
    #[arg(long, short)]
    pub schema: Option<PathBuf>,

    /// Output file (default: <input stem>.avro next to the input)
    #[arg(long, short, conflicts_with = "stdout")]
    pub output: Option<PathBuf>,

    /// Write the container to stdout
    #[arg(long)]
    pub stdout: bool,

    /// Field delimiter, e.g. "," or "\t"
    #[arg(long, short)]
    pub delimiter: Option<String>,

    /// Separator between items of an array cell
    #[arg(long)]
    pub array_delimiter: Option<String>,

    /// Fill blank cells from schema defaults
    #[arg(long)]
    pub write_defaults: bool,

    /// Print conversion metrics to stderr as JSON lines
    #[arg(long)]
    pub metrics: bool,

    /// Path to the TOML config file
    #[arg(long, default_value = "csv2avro.toml", env = "CSV2AVRO_CONFIG")]
    pub config: String,
}

#[derive(Args, Clone, Debug)]
pub struct ReadArgs {
    /// Container file
    pub input: PathBuf,

    /// Schema JSON file; the schema embedded in the container otherwise
    #[arg(long, short)]
    pub schema: Option<PathBuf>,
}

// ═══════════════════════════════════════════════════════════════
//  Config file (TOML)
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub schema: Option<PathBuf>,
    pub delimiter: Option<String>,
    pub array_delimiter: Option<String>,
    pub write_defaults: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &str) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path).map_err(|e| CliError::Config {
            context: "read",
            detail: format!("'{path}': {e}"),
        })?;
        toml::from_str(&content).map_err(|e| CliError::Config {
            context: "parse",
            detail: format!("'{path}': {e}"),
        })
    }
}

// ═══════════════════════════════════════════════════════════════
//  Effective — merged config
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

/// Final settings after the merge: config file < CLI flags.
#[derive(Debug)]
pub struct Effective {
    pub input: Option<PathBuf>,
    pub schema: PathBuf,
    pub output: Output,
    pub options: ConvertOptions,
    pub metrics: bool,
}

impl Effective {
    pub fn new(args: &ConvertArgs) -> Result<Self, CliError> {
        let cfg = match FileConfig::load(&args.config) {
            Ok(c) => c,
            Err(e) => {
                if Path::new(&args.config).exists() {
                    return Err(e);
                }
                FileConfig::default()
            }
        };
        Self::merge(args, cfg)
    }

    fn merge(args: &ConvertArgs, cfg: FileConfig) -> Result<Self, CliError> {
        let schema = args.schema.clone().or(cfg.schema).ok_or(CliError::NoSchema)?;

        let mut options = ConvertOptions::default()
            .with_write_defaults(args.write_defaults || cfg.write_defaults.unwrap_or(false));
        if let Some(d) = args.delimiter.as_deref().or(cfg.delimiter.as_deref()) {
            options = options.with_delimiter(parse_delimiter(d)?);
        }
        if let Some(d) = args.array_delimiter.clone().or(cfg.array_delimiter) {
            options = options.with_array_delimiter(d);
        }
        options.validate()?;

        let output = match (&args.output, &args.input) {
            (Some(path), _) => Output::File(path.clone()),
            _ if args.stdout => Output::Stdout,
            (None, Some(input)) => Output::File(input.with_extension("avro")),
            (None, None) => Output::Stdout,
        };
        if let (Output::File(out), Some(input)) = (&output, &args.input) {
            if same_path(out, input) {
                return Err(CliError::Config {
                    context: "output",
                    detail: format!(
                        "'{}' would overwrite the input; pass --output or --stdout",
                        out.display()
                    ),
                });
            }
        }

        Ok(Self {
            input: args.input.clone(),
            schema,
            output,
            options,
            metrics: args.metrics,
        })
    }
}

/// Same file, either by spelling or after resolving both existing paths.
fn same_path(a: &Path, b: &Path) -> bool {
    a == b
        || matches!(
            (a.canonicalize(), b.canonicalize()),
            (Ok(x), Ok(y)) if x == y
        )
}
