//! CLI argument parsing with clap.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Browser front end for LongCat-Video generation on fal.ai
#[derive(Parser, Debug)]
#[command(name = "longcat-studio")]
#[command(version, about = "Generate videos with LongCat-Video from your browser", long_about = None)]
pub struct Args {
    /// Address to serve the UI on (overrides the config file)
    #[arg(long, short)]
    pub bind: Option<SocketAddr>,

    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}
