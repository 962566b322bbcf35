use thiserror::Error;

/// Failures raised by the encoding core.
///
/// Collaborator layers (decoding, file I/O, the binary) report through
/// `anyhow`, and a `CodexError` converts into that with `?`.
#[derive(Error, Debug)]
pub enum CodexError {
    #[error("channel {channel} has {found} samples, expected {expected}")]
    ChannelLengthMismatch {
        channel: usize,
        expected: usize,
        found: usize,
    },

    #[error("unsupported channel count: {0}")]
    ChannelCountUnsupported(usize),

    #[error("invalid duration: {0} seconds")]
    InvalidDuration(f64),

    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    #[error("payload of {bytes} bytes does not fit a RIFF container")]
    PayloadTooLarge { bytes: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
