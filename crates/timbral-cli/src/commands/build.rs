//! Instrument building command.

use std::path::PathBuf;

use clap::Args;
use timbral_config::MelodyFile;
use timbral_io::read_wav;

use super::common::{
    build_instrument, cancel_on_ctrlc, completed, describe_buffer, load_settings, transcribe,
};

#[derive(Args)]
pub struct BuildArgs {
    /// Recording to build the instrument from (WAV)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Use this melody file instead of transcribing the recording
    #[arg(short, long)]
    melody: Option<PathBuf>,

    /// Settings file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

pub fn run(args: BuildArgs) -> anyhow::Result<()> {
    let settings = load_settings(args.config.as_deref())?;
    let cancel = cancel_on_ctrlc()?;

    let (buffer, _) = read_wav(&args.input)?;
    describe_buffer(&args.input, &buffer);

    let melody = match &args.melody {
        Some(path) => {
            let file = MelodyFile::load(path)?;
            file.validate()?;
            file.to_melody()
        }
        None => match completed(transcribe(&buffer, &settings, &cancel)) {
            Some(melody) => melody,
            None => return Ok(()),
        },
    };

    let Some(instrument) = build_instrument(&buffer, &melody, &settings, &cancel)? else {
        return Ok(());
    };

    if instrument.is_empty() {
        println!("\nNo notes recorded.");
        return Ok(());
    }

    println!("\n{} recorded note(s):", instrument.len());
    for (note, model) in instrument.iter() {
        let partials = model.sinusoid.as_ref().map_or(0, |s| s.partials().len());
        println!(
            "  {:>4}  {:>6} ms  {} partial(s){}{}",
            note,
            model.length_ms,
            partials,
            if model.transient.is_some() { ", transient" } else { "" },
            if model.noise.is_some() { ", noise" } else { "" },
        );
    }

    Ok(())
}
