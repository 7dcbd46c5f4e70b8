//! Melody rendering command.

use std::path::PathBuf;

use clap::Args;
use timbral_config::{MelodyFile, validate_time_window};
use timbral_io::{WavSpec, read_wav, write_wav};
use timbral_synth::{Compositor, TimeWindow};

use super::common::{
    build_instrument, cancel_on_ctrlc, completed, describe_buffer, load_settings, transcribe,
    with_progress,
};

#[derive(Args)]
pub struct RenderArgs {
    /// Recording the instrument is built from (WAV)
    #[arg(value_name = "RECORDING")]
    recording: PathBuf,

    /// Melody to play (TOML)
    #[arg(value_name = "MELODY")]
    melody: PathBuf,

    /// Output WAV file
    #[arg(short, long)]
    output: PathBuf,

    /// Window start as a fraction of the melody length
    #[arg(long, default_value = "0.0")]
    start: f32,

    /// Window end as a fraction of the melody length
    #[arg(long, default_value = "1.0")]
    end: f32,

    /// Let notes ring past their length (overrides settings)
    #[arg(long)]
    sustain: Option<bool>,

    /// Seed for phase randomization (overrides settings)
    #[arg(long)]
    seed: Option<u64>,

    /// Output sample rate (overrides settings)
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Output bit depth (8, 16, 24, or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,

    /// Settings file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(sustain) = args.sustain {
        settings.render.enable_sustain = sustain;
    }
    if let Some(seed) = args.seed {
        settings.render.seed = seed;
    }
    if let Some(sample_rate) = args.sample_rate {
        settings.render.sample_rate = sample_rate;
    }
    validate_time_window(args.start, args.end)?;
    settings.validate()?;

    let melody_file = MelodyFile::load(&args.melody)?;
    melody_file.validate()?;
    let melody = melody_file.to_melody();

    let cancel = cancel_on_ctrlc()?;

    let (buffer, _) = read_wav(&args.recording)?;
    describe_buffer(&args.recording, &buffer);

    let Some(recorded) = completed(transcribe(&buffer, &settings, &cancel)) else {
        return Ok(());
    };
    let Some(instrument) = build_instrument(&buffer, &recorded, &settings, &cancel)? else {
        return Ok(());
    };
    println!(
        "Instrument: {} note(s) from {} event(s)",
        instrument.len(),
        recorded.len()
    );
    if instrument.is_empty() {
        tracing::warn!("no notes recorded, output will be silent");
    }

    let compositor = Compositor::new(settings.render.compositor_settings());
    let request = settings.render.request(TimeWindow::new(args.start, args.end));
    let result = with_progress("rendering", |progress| {
        compositor.render(&melody, &instrument, &request, progress, &cancel)
    })?;
    let Some(output) = completed(result) else {
        return Ok(());
    };

    let spec = WavSpec {
        channels: 1,
        sample_rate: output.sample_rate(),
        bits_per_sample: args.bit_depth,
    };
    println!("\nWriting {}...", args.output.display());
    write_wav(&args.output, &output, spec)?;
    println!(
        "  {} samples, {:.2}s, peak {:.3}",
        output.len(),
        output.length_ms() as f32 / 1000.0,
        output.peak()
    );
    println!("Done!");

    Ok(())
}
