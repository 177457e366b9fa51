//! CLI argument parsing for Presagio

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "presagio")]
#[command(version)]
#[command(about = "Syscall sequence predictor with an HTTP train/predict API", long_about = None)]
pub struct Cli {
    /// Enable verbose debug logging
    #[arg(long)]
    pub debug: bool,
}
