//! Inserts every token of a file into a dictionary, keyed by token with the
//! position of its last occurrence as value, and writes the dictionary out in
//! key order followed by its pre-order shape.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{ArgAction, Parser};
use log::info;

use rbdict::logging::{LogConfig, init_logging};
use rbdict::text::{order_dictionary, render_order};

#[derive(Debug, Parser)]
#[command(about = "Order the tokens of a file with a red-black tree dictionary")]
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

    let input = File::open(&args.input).with_context(|| format!("Cannot read file: {}", args.input.display()))?;
    let dict = order_dictionary(BufReader::new(input))
        .with_context(|| format!("Cannot read file: {}", args.input.display()))?;

    if args.check {
        let black_height = match dict.validate() {
            Ok(height) => height,
            Err(violation) => bail!("dictionary is corrupt: {violation}"),
        };
        info!("tree is valid, black height {black_height}");
    }

    fs::write(&args.output, render_order(&dict))
        .with_context(|| format!("Cannot write to file: {}", args.output.display()))?;
    Ok(())
}
