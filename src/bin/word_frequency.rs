//! Counts the words of a file, case-insensitively, and writes one
//! `word : count` line per word in alphabetical order.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};
use log::info;

use rbdict::logging::{LogConfig, init_logging};
use rbdict::text::word_frequencies;

#[derive(Debug, Parser)]
#[command(about = "Count word frequencies with a red-black tree dictionary")]
struct Args {
    input: PathBuf,
    output: PathBuf,
    /// Also write debug logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Check the tree's invariants before writing.
    #[arg(long)]
    check: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&LogConfig::default().with_verbosity(args.verbose).with_log_file(args.log_file))?;

    info!("starting input");
    let input = File::open(&args.input).with_context(|| format!("Cannot read file: {}", args.input.display()))?;
    let dict = word_frequencies(BufReader::new(input))
        .with_context(|| format!("Cannot read file: {}", args.input.display()))?;
    info!("finished input");

    if args.check {
        dict.validate().context("dictionary is corrupt")?;
    }

    fs::write(&args.output, dict.to_string())
        .with_context(|| format!("Cannot write to file: {}", args.output.display()))?;
    Ok(())
}
