//! Shared CLI helpers used across multiple commands.

use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use timbral_config::Settings;
use timbral_core::{CancelToken, Cancelled, Melody, Progress, SampleBuffer};
use timbral_synth::{Instrument, InstrumentBuilder};

/// Resolution of the progress bar.
const BAR_STEPS: u64 = 1000;

/// Load and validate settings from `config`, the user settings file, or
/// defaults, in that order.
pub fn load_settings(config: Option<&Path>) -> anyhow::Result<Settings> {
    let (settings, source) = Settings::resolve(config)?;
    match source {
        Some(path) => tracing::info!(path = %path.display(), "settings loaded"),
        None => tracing::info!("using default settings"),
    }
    Ok(settings)
}

/// Token cancelled by Ctrl-C.
pub fn cancel_on_ctrlc() -> anyhow::Result<CancelToken> {
    let token = CancelToken::new();
    let handle = token.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nStopping...");
        handle.cancel();
    })?;
    Ok(token)
}

/// Progress bar driven by a [`Progress`] ratio.
pub fn progress_bar(message: &'static str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(BAR_STEPS);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:>10} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% ({eta})")?
            .progress_chars("##-"),
    );
    pb.set_message(message);
    Ok(pb)
}

/// Run `task` with a progress tracker that feeds a fresh bar.
pub fn with_progress<T>(
    message: &'static str,
    task: impl FnOnce(&mut Progress<'_>) -> Result<T, Cancelled>,
) -> anyhow::Result<Result<T, Cancelled>> {
    let pb = progress_bar(message)?;
    let bar = pb.clone();
    let mut sink = move |ratio: f32| bar.set_position((ratio * BAR_STEPS as f32).round() as u64);
    let result = {
        let mut progress = Progress::with_sink(&mut sink);
        task(&mut progress)
    };
    match &result {
        Ok(_) => pb.finish(),
        Err(Cancelled) => pb.abandon_with_message("stopped"),
    }
    Ok(result)
}

/// Report a cancelled step. Returns `None` when the command should stop.
pub fn completed<T>(result: Result<T, Cancelled>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(Cancelled) => {
            println!("Stopped.");
            None
        }
    }
}

/// Segment `buffer` and assign pitches using `settings`.
pub fn transcribe(
    buffer: &SampleBuffer,
    settings: &Settings,
    cancel: &CancelToken,
) -> Result<Melody, Cancelled> {
    timbral_analysis::transcribe(
        buffer,
        &settings.segmentation.segmenter(),
        &settings.analysis.pitch_estimator(),
        settings.analysis.window(),
        cancel,
    )
}

/// Build an instrument from `buffer` and its melody, with a progress bar.
pub fn build_instrument(
    buffer: &SampleBuffer,
    melody: &Melody,
    settings: &Settings,
    cancel: &CancelToken,
) -> anyhow::Result<Option<Instrument>> {
    let builder = InstrumentBuilder::new(settings.analysis.feature_extractor());
    let result = with_progress("building", |progress| {
        builder.build(buffer, melody, progress, cancel)
    })?;
    Ok(completed(result))
}

/// Print a one-line summary of a recording.
pub fn describe_buffer(path: &Path, buffer: &SampleBuffer) {
    println!(
        "{}: {} samples, {} Hz, {:.2}s, peak {:.3}",
        path.display(),
        buffer.len(),
        buffer.sample_rate(),
        buffer.length_ms() as f32 / 1000.0,
        buffer.peak()
    );
}
