use std::path::PathBuf;

use clap::Parser;

use eros_export::convert;
use eros_export::event_log::DEFAULT_BOTTLE_SIZE;

/// Convert HDF5 event recordings to address-event log directories.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Directory of raw recordings, one subdirectory per sample
    #[arg(long)]
    input: PathBuf,

    /// Output directory for the converted logs
    #[arg(long)]
    output: PathBuf,

    /// Maximum events per output bottle
    #[arg(long, default_value_t = DEFAULT_BOTTLE_SIZE)]
    bottle_size: usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let converted = convert::convert_dataset(&args.input, &args.output, args.bottle_size)?;
    println!("converted {} recordings", converted);
    Ok(())
}
