// chainset: load records from stdin into a chained hash set and report
// the number of distinct records, optionally with a content checksum.
//
//   printf 'a\nb\na\n' | chainset -c
//   head -c 4096 /dev/urandom | chainset -b 2 -c --width 32

use std::io::{self, Write};
use std::num::NonZeroUsize;

use anyhow::Result;
use chained_hashset::{run, Backend, HarnessError, HashWidth, InputFormat, RunConfig};
use clap::{CommandFactory, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Width {
    #[value(name = "32")]
    W32,
    #[value(name = "64")]
    W64,
}

#[derive(Parser, Debug)]
#[command(name = "chainset", version)]
#[command(
    about = "Reads records from stdin into a chained hash table and prints the number of distinct records",
    long_about = None
)]
struct Args {
    /// Input is binary: slice it into records of N bytes
    #[arg(short = 'b', long = "binary", value_name = "N", conflicts_with = "hex")]
    binary: Option<NonZeroUsize>,

    /// Input lines are hex encoded; decode them first
    #[arg(short = 'x', long)]
    hex: bool,

    /// Width of the seeded hash function
    #[arg(long, value_enum, default_value = "64")]
    width: Width,

    /// Print a checksum of all stored records
    #[arg(short = 'c', long)]
    check: bool,

    /// Load into the reference set instead, to cross-check the table
    #[arg(short = 's', long)]
    reference: bool,
}

impl Args {
    fn to_config(&self) -> RunConfig {
        let format = match (self.binary, self.hex) {
            (Some(n), _) => InputFormat::Fixed(n),
            (None, true) => InputFormat::HexLines,
            (None, false) => InputFormat::Lines,
        };
        RunConfig {
            format,
            width: match self.width {
                Width::W32 => HashWidth::W32,
                Width::W64 => HashWidth::W64,
            },
            backend: if self.reference {
                Backend::Reference
            } else {
                Backend::Chained
            },
            checksum: self.check,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = args.to_config();

    match run(&config, io::stdin().lock()) {
        Ok(report) => {
            let mut out = io::stdout().lock();
            write!(out, "{report}")?;
            out.flush()?;
        }
        Err(HarnessError::EmptyInput) => {
            Args::command().print_help()?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
