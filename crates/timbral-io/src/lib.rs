//! Audio file I/O for timbral.
//!
//! - **WAV reading**: [`read_wav`] mixes down to a mono [`SampleBuffer`](timbral_core::SampleBuffer);
//!   [`read_wav_interleaved`] keeps every channel
//! - **WAV writing**: [`write_wav`] saves a buffer as float or integer PCM
//! - **Metadata**: [`read_wav_info`] reads the header only
//!
//! ```rust,ignore
//! use timbral_io::{read_wav, write_wav, WavSpec};
//!
//! let (buffer, spec) = read_wav("take.wav")?;
//! write_wav("copy.wav", &buffer, WavSpec { bits_per_sample: 16, ..spec })?;
//! ```

mod wav;

pub use wav::{
    WavFormat, WavInfo, WavSpec, read_wav, read_wav_info, read_wav_interleaved, write_wav,
};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// The file's sample layout cannot be converted.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
