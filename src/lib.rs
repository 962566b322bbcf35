pub mod codecs;
use std::path::{Path, PathBuf};

pub mod prelude;
use crate::prelude::*;
mod duration;
mod error;
mod interleave;
pub mod resample;

pub use codecs::{
    AudioDecoder, DecodedAudio, EncodeOptions, SampleFormat, WavCodec, WavHeader, encode_samples,
    quantize_i16,
};
pub use duration::{format_duration, samples_to_seconds};
pub use error::CodexError;
pub use interleave::interleave;
pub use resample::{PassthroughRenderer, Renderer, SincResampler};

// Format tags
const FORMAT_PCM: u16 = 1;
const FORMAT_IEEE_FLOAT: u16 = 3;
const FORMAT_EXTENSIBLE: u16 = 65534; // 0xFFFE

// Standard bit depths
const BIT_DEPTH_8: u16 = 8;
const BIT_DEPTH_16: u16 = 16;
const BIT_DEPTH_24: u16 = 24;
const BIT_DEPTH_32: u16 = 32;

// Sample normalization constants
const U8_OFFSET: f32 = 128.0;
const I16_MAX_F: f32 = 32767.0;
const I16_DIVISOR: f32 = 32768.0;
const I24_DIVISOR: f32 = 8388608.0;
const I32_DIVISOR: f32 = 2147483648.0;

//Bit Operations
const I24_SIGN_BIT: i32 = 0x800000;
const I24_SIGN_EXTENSION_MASK: i32 = !0xFFFFFF;

const MMAP_THRESHOLD: u64 = 100 * 1024 * 1024; // 100MB

pub const WAV_MIME_TYPE: &str = "audio/wav";
pub const DEFAULT_FILE_STEM: &str = "converted-audio";

/// Encodes per-channel float buffers into a canonical 44-byte-header WAV.
///
/// Channels are interleaved frame by frame, then written as 16-bit PCM or
/// 32-bit IEEE float depending on `use_float_samples`. Nothing is returned
/// on failure; a malformed container is never produced.
pub fn encode_container(
    channels: &[Vec<f32>],
    sample_rate: u32,
    use_float_samples: bool,
) -> Result<Vec<u8>, CodexError> {
    let options = EncodeOptions { use_float_samples };
    WavCodec.encode(channels, sample_rate, &options)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    pub encode: EncodeOptions,
    pub target_sample_rate: Option<u32>,
    pub file_stem: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            encode: EncodeOptions::default(),
            target_sample_rate: None,
            file_stem: DEFAULT_FILE_STEM.to_string(),
        }
    }
}

impl ConvertOptions {
    /// Picks the renderer matching `target_sample_rate`.
    pub fn renderer(&self) -> Box<dyn Renderer> {
        match self.target_sample_rate {
            Some(target_rate) => Box::new(SincResampler { target_rate }),
            None => Box::new(PassthroughRenderer),
        }
    }
}

/// Encoded output plus what a caller needs to persist or offer it.
#[derive(Debug, Clone)]
pub struct ConvertedAudio {
    pub file_name: String,
    pub mime_type: &'static str,
    pub duration: String,
    pub bytes: Vec<u8>,
}

impl ConvertedAudio {
    pub fn header(&self) -> R<WavHeader> {
        WavHeader::parse(&self.bytes)
    }

    pub fn write_to_path(&self, path: &Path) -> R<()> {
        std::fs::write(path, &self.bytes)?;
        info!("Wrote {} bytes to {}", self.bytes.len(), path.display());
        Ok(())
    }

    /// `file_name` placed inside `dir`.
    pub fn default_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.file_name)
    }
}

/// Decode, render and re-encode a media byte stream.
pub fn convert(
    input: &[u8],
    decoder: &dyn AudioDecoder,
    renderer: &dyn Renderer,
    options: &ConvertOptions,
) -> R<ConvertedAudio> {
    let decoded = decoder.decode(input)?;
    render_and_encode(decoded, renderer, options)
}

/// [`convert`] reading a WAV file from disk, with the renderer chosen by `options`.
pub fn convert_file(path: &Path, options: &ConvertOptions) -> R<ConvertedAudio> {
    let decoded = WavCodec.decode_file(path)?;
    info!("Decoded {}", path.display());
    let renderer = options.renderer();
    render_and_encode(decoded, &*renderer, options)
}

fn render_and_encode(
    decoded: DecodedAudio,
    renderer: &dyn Renderer,
    options: &ConvertOptions,
) -> R<ConvertedAudio> {
    debug!(
        "Decoded {} channel(s), {} frames at {} Hz",
        decoded.number_of_channels(),
        decoded.frames(),
        decoded.sample_rate
    );

    let duration = decoded.formatted_duration()?;
    info!("Source duration: {}", duration);

    let rendered = renderer.render(decoded)?;
    let bytes = WavCodec.encode(&rendered.channels, rendered.sample_rate, &options.encode)?;

    Ok(ConvertedAudio {
        file_name: format!("{}.{}", options.file_stem, WavCodec.file_extension()),
        mime_type: WAV_MIME_TYPE,
        duration,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_container_mismatch_has_no_output() {
        let left = vec![0.0f32; 10];
        let right = vec![0.0f32; 9];
        let result = encode_container(&[left, right], 44100, false);
        assert!(matches!(
            result,
            Err(CodexError::ChannelLengthMismatch {
                channel: 1,
                expected: 10,
                found: 9
            })
        ));
    }

    #[test]
    fn test_encode_container_is_deterministic() {
        let left = vec![0.25, -0.5, 1.0];
        let right = vec![-1.0, 0.0, 0.75];
        let a = encode_container(&[left.clone(), right.clone()], 48000, false).unwrap();
        let b = encode_container(&[left, right], 48000, false).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 44 + 6 * 2);
    }

    #[test]
    fn test_convert_round_trip() {
        let source = encode_container(&[vec![0.5; 4410], vec![-0.5; 4410]], 44100, true).unwrap();

        let converted = convert(
            &source,
            &WavCodec,
            &PassthroughRenderer,
            &ConvertOptions::default(),
        )
        .unwrap();

        assert_eq!(converted.file_name, "converted-audio.wav");
        assert_eq!(converted.mime_type, "audio/wav");
        assert_eq!(converted.duration, "00:00");

        let header = converted.header().unwrap();
        assert_eq!(header.format(), SampleFormat::I16);
        assert_eq!(header.channels(), 2);
        assert_eq!(header.sample_rate(), 44100);
        assert_eq!(header.data_bytes(), 4410 * 2 * 2);
        assert_eq!(converted.bytes.len(), 44 + 4410 * 2 * 2);
    }

    #[test]
    fn test_convert_rejects_garbage() {
        let result = convert(
            b"not a wav file at all",
            &WavCodec,
            &PassthroughRenderer,
            &ConvertOptions::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_options_pick_renderer() {
        let options = ConvertOptions {
            target_sample_rate: Some(8000),
            ..Default::default()
        };
        let audio = DecodedAudio::new(16000, vec![vec![0.0; 1600]]);
        let rendered = options.renderer().render(audio).unwrap();
        assert_eq!(rendered.sample_rate, 8000);
        assert_eq!(rendered.frames(), 800);
    }
}
