//! Recording transcription command.

use std::path::PathBuf;

use clap::Args;
use timbral_config::MelodyFile;
use timbral_io::read_wav;

use super::common::{cancel_on_ctrlc, completed, describe_buffer, load_settings, transcribe};

#[derive(Args)]
pub struct SegmentArgs {
    /// Recording to segment (WAV)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Write the detected events as a melody file (TOML)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Settings file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

pub fn run(args: SegmentArgs) -> anyhow::Result<()> {
    let settings = load_settings(args.config.as_deref())?;
    let cancel = cancel_on_ctrlc()?;

    let (buffer, _) = read_wav(&args.input)?;
    describe_buffer(&args.input, &buffer);

    let Some(melody) = completed(transcribe(&buffer, &settings, &cancel)) else {
        return Ok(());
    };

    println!("\n{} event(s):", melody.len());
    println!("  {:>5}  {:>9}  {:>9}  {:>9}", "note", "amplitude", "start ms", "length ms");
    for event in melody.events() {
        println!(
            "  {:>5}  {:>9.3}  {:>9}  {:>9}",
            event.note_number, event.amplitude, event.start_ms, event.length_ms
        );
    }

    if let Some(output) = &args.output {
        MelodyFile::from(&melody).save(output)?;
        println!("\nMelody written to {}", output.display());
    }

    Ok(())
}
