use std::path::PathBuf;

use clap::Parser;

use eros_export::export::{self, ExportConfig, DEFAULT_WARMUP_FRAMES};

/// Export DVS Human3.6M recordings as EROS frames with pose annotations.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// EROS kernel size (odd)
    #[arg(long, default_value_t = 7)]
    eros_kernel: u32,

    /// Frame width in pixels
    #[arg(long, default_value_t = 640)]
    frame_width: u32,

    /// Frame height in pixels
    #[arg(long, default_value_t = 480)]
    frame_height: u32,

    /// Gaussian blur kernel size (odd)
    #[arg(long, default_value_t = 7)]
    gauss_kernel: u32,

    /// Frames skipped between retained frames
    #[arg(long)]
    skip_image: Option<u32>,

    /// Frames dropped per sequence while the surface populates
    #[arg(long, default_value_t = DEFAULT_WARMUP_FRAMES)]
    warmup: usize,

    /// Path to the dataset folder
    #[arg(long)]
    data_home: PathBuf,

    /// Write the annotation file from scratch
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    from_scratch: bool,

    /// Write the annotation file
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    write_annotation: bool,

    /// Save images
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    write_images: bool,

    /// Run in dev mode: export into tester/ and stop after one sequence
    #[arg(long)]
    dev: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = ExportConfig {
        eros_kernel: args.eros_kernel,
        frame_width: args.frame_width,
        frame_height: args.frame_height,
        gauss_kernel: args.gauss_kernel,
        skip: args.skip_image,
        warmup_frames: args.warmup,
        data_home: args.data_home,
        from_scratch: args.from_scratch,
        write_annotation: args.write_annotation,
        write_images: args.write_images,
        dev: args.dev,
    };

    let exported = export::run(&config)?;
    println!("exported {} sequences", exported);
    Ok(())
}
