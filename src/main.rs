use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::Parser;
use log::{debug, error, warn};

use sffsplit::{AdaptorTable, Error, SplitConfig, Splitter};

mod cli;

/// Initializes the logger with verbosity given in `log_max_level`.
fn init_log(log_max_level: usize) -> std::result::Result<(), log::SetLoggerError> {
    stderrlog::new()
        .module(module_path!())
        .module("sffsplit")
        .quiet(false)
        .verbosity(log_max_level)
        .timestamp(stderrlog::Timestamp::Off)
        .init()
}

/// `<stem>.<name>.sff`
fn output_path(stem: &Path, name: &str) -> PathBuf {
    let mut path = OsString::from(stem.as_os_str());
    path.push(format!(".{name}.sff"));
    PathBuf::from(path)
}

fn run(cli: &cli::Cli) -> Result<()> {
    let config = SplitConfig::new(cli.max_mismatch, cli.buffer, cli.threads)?;

    let table = AdaptorTable::from_path(&cli.adaptors)?;
    if table.is_empty() {
        warn!(
            "No adaptors read from {}, every read will be unmatched",
            cli.adaptors.display()
        );
    }

    let input = File::open(&cli.input)
        .map(BufReader::new)
        .map_err(|err| anyhow!("Unable to open input file {}: {err}", cli.input.display()))?;

    let stem = cli.output.clone();
    let factory = move |name: &str| -> sffsplit::Result<BufWriter<File>> {
        let path = output_path(&stem, name);
        debug!("Creating {}", path.display());
        Ok(File::create(path).map(BufWriter::new)?)
    };

    let mut splitter = Splitter::new(table, config, factory)?;
    splitter.run(input)?;
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<Error>() {
        Some(Error::ConfigError(_)) => 1,
        _ => 2,
    }
}

fn main() -> ExitCode {
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(err) = init_log(if cli.verbose { 2 } else { 1 }) {
        eprintln!("Unable to initialize logging: {err}");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::from(exit_code(&err))
        }
    }
}
