use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

mod config;
mod error;
mod runner;

use config::{Config, Target};

/// Run a raw big-endian MIPS image on the R4300i or the RSP and print the final registers
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// INI configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Program image, overrides `[Program] image`
    image: Option<PathBuf>,
    #[arg(short, long, value_enum)]
    target: Option<Target>,
    /// Number of instructions to run
    #[arg(short = 'n', long)]
    steps: Option<u64>,
    /// Where the image is loaded: physical RAM address for the CPU, IMEM offset for the RSP
    #[arg(long, value_parser = parse_address)]
    load_address: Option<u64>,
    /// Start address instead of the reset vector
    #[arg(long, value_parser = parse_address)]
    entry: Option<u64>,
    /// Log every executed instruction
    #[arg(long)]
    trace: bool,
}

fn parse_address(s: &str) -> Result<u64, String> {
    config::parse_u64(s).ok_or_else(|| format!("`{}` is not a number", s))
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.trace {
        tracing_subscriber::filter::LevelFilter::TRACE
    } else {
        tracing_subscriber::filter::LevelFilter::INFO
    };

    tracing_subscriber::fmt().with_max_level(level).init();

    match start(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn start(args: Args) -> error::Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let program = &mut config.program;

    if let Some(image) = args.image {
        program.image = Some(image);
    }
    if let Some(target) = args.target {
        program.target = target;
    }
    if let Some(steps) = args.steps {
        program.steps = steps;
    }
    if let Some(addr) = args.load_address {
        program.load_address = addr as u32;
    }
    if let Some(entry) = args.entry {
        program.entry = Some(entry);
    }
    if args.trace {
        config.core.trace_instructions = true;
    }

    runner::run(&config)
}
