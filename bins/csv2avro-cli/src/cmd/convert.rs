use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};

use csv2avro::{ConvertStats, Converter};

use super::load_schema;
use crate::config::{ConvertArgs, Effective, Output};
use crate::error::CliError;

pub fn run(args: ConvertArgs) -> Result<(), CliError> {
    let eff = Effective::new(&args)?;
    let schema = load_schema(&eff.schema)?;

    tracing::info!(
        schema = %schema.full_name(),
        fingerprint = %format!("{:016x}", schema.fingerprint()),
        input = %eff.input.as_deref().map_or("<stdin>".into(), |p| p.display().to_string()),
        "converting"
    );

    let input: Box<dyn Read> = match &eff.input {
        Some(path) => Box::new(BufReader::new(File::open(path).map_err(CliError::file(path))?)),
        None => Box::new(std::io::stdin().lock()),
    };

    let converter = Converter::new(&schema, eff.options.clone());
    let stats = match &eff.output {
        Output::Stdout => {
            let stdout = std::io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            let stats = converter.convert(input, &mut out)?;
            out.flush()?;
            stats
        }
        Output::File(path) => {
            let file = File::create(path).map_err(CliError::file(path))?;
            let mut out = BufWriter::new(file);
            let result = converter
                .convert(input, &mut out)
                .map_err(CliError::from)
                .and_then(|stats| {
                    out.flush()?;
                    Ok(stats)
                });
            if result.is_err() {
                // Do not leave a truncated container behind.
                drop(out);
                let _ = std::fs::remove_file(path);
            }
            let stats = result?;
            tracing::info!(output = %path.display(), "wrote container");
            stats
        }
    };

    tracing::info!(
        rows = stats.rows,
        blocks = stats.blocks,
        bytes = stats.bytes_written,
        "conversion finished"
    );

    if eff.metrics {
        print_metrics(&stats)?;
    }
    Ok(())
}

fn print_metrics(stats: &ConvertStats) -> Result<(), CliError> {
    let stderr = std::io::stderr();
    let mut err = stderr.lock();
    for metric in stats.metrics() {
        serde_json::to_writer(&mut err, &metric)?;
        writeln!(err)?;
    }
    Ok(())
}
