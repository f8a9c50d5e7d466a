//! gifpng CLI - Convert a GIF frame to an indexed-color PNG.

mod commands;

use clap::{Parser, Subcommand};
use commands::{CmdConvert, CmdInfo};

/// Command-line arguments for the gifpng tool.
#[derive(Parser, Debug)]
#[command(name = "gifpng")]
#[command(version)]
#[command(about = "Convert one frame of a GIF to an indexed-color PNG")]
#[command(long_about = "gifpng decodes a single GIF frame, composites it onto the \n\
    logical screen and writes it as a palette PNG.\n\n\
    EXAMPLES:\n    \
    gifpng convert input.gif -o output.png\n    \
    gifpng convert input.gif -o output.png --frame 2 --background '#ffffff'\n    \
    gifpng convert input.gif -o output.png --placeholder broken.png\n    \
    gifpng info input.gif --json")]
struct Cli {
    /// Verbose output (debug-level logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a GIF frame to PNG
    Convert(CmdConvert),
    /// Show GIF structure
    Info(CmdInfo),
}

impl Cli {
    fn wants_logging(&self) -> bool {
        !matches!(&self.command, Commands::Info(info) if info.json)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // JSON output stays machine-readable
    if cli.wants_logging() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(if cli.verbose {
                tracing::Level::DEBUG
            } else {
                tracing::Level::INFO
            })
            .with_target(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    match &cli.command {
        Commands::Convert(cmd) => cmd.run(),
        Commands::Info(cmd) => cmd.run(),
    }
}
