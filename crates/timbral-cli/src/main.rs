//! Timbral CLI - build an instrument from a recording and play melodies with it.

mod commands;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "timbral")]
#[command(author, version, about = "Spectral instrument builder", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect note events in a recording
    Segment(commands::segment::SegmentArgs),

    /// Build an instrument from a recording and list its notes
    Build(commands::build::BuildArgs),

    /// Render a melody with the instrument built from a recording
    Render(commands::render::RenderArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG wins over -v
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Segment(args) => commands::segment::run(args),
        Commands::Build(args) => commands::build::run(args),
        Commands::Render(args) => commands::render::run(args),
    }
}
