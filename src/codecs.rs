use std::path::Path;

use crate::prelude::*;
use crate::{BIT_DEPTH_16, BIT_DEPTH_32, FORMAT_IEEE_FLOAT, FORMAT_PCM, MMAP_THRESHOLD};
pub mod wav;
pub use wav::{WavCodec, WavHeader, encode_samples, quantize_i16};

/// Decoded, de-interleaved audio as handed to the encoder.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f32>>, // one float buffer per channel
}

impl DecodedAudio {
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    pub fn number_of_channels(&self) -> usize {
        self.channels.len()
    }

    /// Frames per channel, taken from the first channel.
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn duration_secs(&self) -> f64 {
        samples_to_seconds(self.frames(), self.sample_rate)
    }

    pub fn formatted_duration(&self) -> Result<String, CodexError> {
        format_duration(self.duration_secs())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleFormat {
    #[default]
    I16,
    F32,
}

impl SampleFormat {
    /// WAVE `fmt ` format tag.
    pub fn format_tag(&self) -> u16 {
        match self {
            SampleFormat::I16 => FORMAT_PCM,
            SampleFormat::F32 => FORMAT_IEEE_FLOAT,
        }
    }

    pub fn bits_per_sample(&self) -> u16 {
        match self {
            SampleFormat::I16 => BIT_DEPTH_16,
            SampleFormat::F32 => BIT_DEPTH_32,
        }
    }

    pub fn bytes_per_sample(&self) -> u16 {
        self.bits_per_sample() / 8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeOptions {
    pub use_float_samples: bool,
}

impl EncodeOptions {
    pub fn sample_format(&self) -> SampleFormat {
        if self.use_float_samples {
            SampleFormat::F32
        } else {
            SampleFormat::I16
        }
    }
}

/// Turns raw media bytes into [`DecodedAudio`].
pub trait AudioDecoder: Send + Sync {
    fn decode(&self, input: &[u8]) -> R<DecodedAudio>;

    fn decode_file(&self, path: &Path) -> R<DecodedAudio> {
        let mut file = std::fs::File::open(path)?;
        let file_size = file.metadata()?.len();

        // Only use mmap for large files
        if file_size > MMAP_THRESHOLD {
            let mapped_file = unsafe { MmapOptions::new().map(&file)? };
            self.decode(&mapped_file)
        } else {
            let mut data = Vec::with_capacity(file_size as usize);
            file.read_to_end(&mut data)?;
            self.decode(&data)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_selection() {
        let float = EncodeOptions {
            use_float_samples: true,
        };
        assert_eq!(float.sample_format(), SampleFormat::F32);
        assert_eq!(float.sample_format().format_tag(), 3);
        assert_eq!(float.sample_format().bits_per_sample(), 32);

        let pcm = EncodeOptions::default();
        assert_eq!(pcm.sample_format(), SampleFormat::I16);
        assert_eq!(pcm.sample_format().format_tag(), 1);
        assert_eq!(pcm.sample_format().bytes_per_sample(), 2);
    }

    #[test]
    fn test_decoded_audio_duration() {
        let audio = DecodedAudio::new(8000, vec![vec![0.0; 8000 * 61], vec![0.0; 8000 * 61]]);
        assert_eq!(audio.number_of_channels(), 2);
        assert_eq!(audio.frames(), 8000 * 61);
        assert_eq!(audio.formatted_duration().unwrap(), "01:01");

        let empty = DecodedAudio::default();
        assert_eq!(empty.frames(), 0);
        assert_eq!(empty.duration_secs(), 0.0);
    }
}
