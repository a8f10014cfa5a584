//! Main entry point for the npcm-image CLI tool

use clap::Parser;
use npcm_image::cli::{Args, init_logger, run_cli};

fn main() {
    let args = Args::parse();
    init_logger(args.verbose, args.quiet);

    if let Err(e) = run_cli(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
