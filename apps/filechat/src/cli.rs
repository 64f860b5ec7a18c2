use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "filechat")]
#[command(about = "Send files as chunked JSON events, or reassemble them", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to the per-user config path).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Streams the given files, then the message, as JSON lines on stdout.
    Send {
        #[arg(short, long, default_value = "")]
        message: String,
        files: Vec<PathBuf>,
    },
    /// Reads JSON-line events from stdin and writes the files into `out`.
    Receive {
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}
