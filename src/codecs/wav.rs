use crate::prelude::*;
use crate::{
    BIT_DEPTH_8, BIT_DEPTH_16, BIT_DEPTH_24, BIT_DEPTH_32, FORMAT_EXTENSIBLE, FORMAT_IEEE_FLOAT,
    FORMAT_PCM, I16_DIVISOR, I16_MAX_F, I24_DIVISOR, I24_SIGN_BIT, I24_SIGN_EXTENSION_MASK,
    I32_DIVISOR, U8_OFFSET,
};

// Chunk Identifiers
const RIFF_CHUNK_ID: &[u8; 4] = b"RIFF";
const WAVE_FORMAT_ID: &[u8; 4] = b"WAVE";
const FMT_CHUNK_ID: &[u8; 4] = b"fmt ";
const DATA_CHUNK_ID: &[u8; 4] = b"data";

// Chunk Structures
const STANDARD_FMT_CHUNK_SIZE: u32 = 16;
const EXTENSIBLE_FMT_CHUNK_SIZE: usize = 40;
const HEADER_SIZE: usize = 12; // RIFF + size + WAVE
pub const CANONICAL_HEADER_SIZE: usize = 44;
const RIFF_SIZE_OVERHEAD: u32 = 36; // everything after the RIFF size field except the payload

/// The fixed 44-byte header of a canonical WAV container.
///
/// Only built through [`WavHeader::new`] or [`WavHeader::parse`], so every
/// derived field fits its width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    format: SampleFormat,
    channels: u16,
    sample_rate: u32,
    data_bytes: u32,
}

impl WavHeader {
    /// Builds the header for `sample_count` interleaved samples.
    ///
    /// Fails instead of wrapping when a field would not fit its width.
    pub fn new(
        format: SampleFormat,
        channels: usize,
        sample_rate: u32,
        sample_count: usize,
    ) -> Result<Self, CodexError> {
        if sample_rate == 0 {
            return Err(CodexError::InvalidSampleRate(sample_rate));
        }

        let bytes_per_sample = format.bytes_per_sample() as u64;
        let block_align = channels as u64 * bytes_per_sample;
        if channels == 0 || block_align > u16::MAX as u64 {
            return Err(CodexError::ChannelCountUnsupported(channels));
        }

        let byte_rate = sample_rate as u64 * block_align;
        if byte_rate > u32::MAX as u64 {
            return Err(CodexError::PayloadTooLarge { bytes: byte_rate });
        }

        let data_bytes = sample_count as u64 * bytes_per_sample;
        if data_bytes + RIFF_SIZE_OVERHEAD as u64 > u32::MAX as u64 {
            return Err(CodexError::PayloadTooLarge { bytes: data_bytes });
        }

        Ok(Self {
            format,
            channels: channels as u16,
            sample_rate,
            data_bytes: data_bytes as u32,
        })
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn data_bytes(&self) -> u32 {
        self.data_bytes
    }

    pub fn block_align(&self) -> u16 {
        self.channels * self.format.bytes_per_sample()
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }

    pub fn riff_size(&self) -> u32 {
        RIFF_SIZE_OVERHEAD + self.data_bytes
    }

    /// Total container length, header included.
    pub fn file_size(&self) -> usize {
        CANONICAL_HEADER_SIZE + self.data_bytes as usize
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_all(RIFF_CHUNK_ID)?;
        out.write_u32::<LittleEndian>(self.riff_size())?;
        out.write_all(WAVE_FORMAT_ID)?;

        // ---- fmt chunk ----
        out.write_all(FMT_CHUNK_ID)?;
        out.write_u32::<LittleEndian>(STANDARD_FMT_CHUNK_SIZE)?;
        out.write_u16::<LittleEndian>(self.format.format_tag())?;
        out.write_u16::<LittleEndian>(self.channels)?;
        out.write_u32::<LittleEndian>(self.sample_rate)?;
        out.write_u32::<LittleEndian>(self.byte_rate())?;
        out.write_u16::<LittleEndian>(self.block_align())?;
        out.write_u16::<LittleEndian>(self.format.bits_per_sample())?;

        // ---- data chunk ----
        out.write_all(DATA_CHUNK_ID)?;
        out.write_u32::<LittleEndian>(self.data_bytes)?;
        Ok(())
    }

    /// Reads back a header in the exact canonical layout.
    pub fn parse(input: &[u8]) -> R<Self> {
        if input.len() < CANONICAL_HEADER_SIZE {
            return Err(anyhow!("Header too small: {} bytes", input.len()));
        }
        if &input[0..4] != RIFF_CHUNK_ID
            || &input[8..12] != WAVE_FORMAT_ID
            || &input[12..16] != FMT_CHUNK_ID
            || &input[36..40] != DATA_CHUNK_ID
        {
            return Err(anyhow!("Not a canonical WAV header"));
        }

        let mut cursor = Cursor::new(input);
        cursor.seek(SeekFrom::Start(16))?;
        let fmt_size = cursor.read_u32::<LittleEndian>()?;
        if fmt_size != STANDARD_FMT_CHUNK_SIZE {
            return Err(anyhow!("Unexpected fmt chunk size: {}", fmt_size));
        }
        let format_tag = cursor.read_u16::<LittleEndian>()?;
        let channels = cursor.read_u16::<LittleEndian>()?;
        let sample_rate = cursor.read_u32::<LittleEndian>()?;
        let byte_rate = cursor.read_u32::<LittleEndian>()?;
        let block_align = cursor.read_u16::<LittleEndian>()?;
        let bits_per_sample = cursor.read_u16::<LittleEndian>()?;
        cursor.seek(SeekFrom::Current(4))?; // "data"
        let data_bytes = cursor.read_u32::<LittleEndian>()?;

        let format = match (format_tag, bits_per_sample) {
            (FORMAT_PCM, BIT_DEPTH_16) => SampleFormat::I16,
            (FORMAT_IEEE_FLOAT, BIT_DEPTH_32) => SampleFormat::F32,
            _ => {
                return Err(anyhow!(
                    "Unsupported format: tag {}, bits {}",
                    format_tag,
                    bits_per_sample
                ));
            }
        };

        let bytes_per_sample = format.bytes_per_sample() as u32;
        if data_bytes % bytes_per_sample != 0 {
            return Err(anyhow!(
                "data size {} is not a whole number of {}-byte samples",
                data_bytes,
                bytes_per_sample
            ));
        }
        let header = Self::new(
            format,
            channels as usize,
            sample_rate,
            (data_bytes / bytes_per_sample) as usize,
        )?;

        if header.block_align() != block_align || header.byte_rate() != byte_rate {
            return Err(anyhow!(
                "Inconsistent fmt chunk: block align {} / byte rate {}, expected {} / {}",
                block_align,
                byte_rate,
                header.block_align(),
                header.byte_rate()
            ));
        }

        Ok(header)
    }
}

/// Maps a float sample to signed 16-bit PCM.
///
/// Negative samples scale by 32768 and positive ones by 32767, so -1.0 hits
/// `i16::MIN` and +1.0 hits `i16::MAX`. Input is clamped to [-1.0, 1.0] first.
pub fn quantize_i16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    let scaled = if s < 0.0 {
        s * I16_DIVISOR
    } else {
        s * I16_MAX_F
    };
    scaled.round() as i16
}

/// Writes interleaved samples in `format`, little-endian.
pub fn encode_samples<W: Write>(
    out: &mut W,
    samples: &[f32],
    format: SampleFormat,
) -> std::io::Result<()> {
    match format {
        SampleFormat::I16 => {
            for &sample in samples {
                out.write_i16::<LittleEndian>(quantize_i16(sample))?;
            }
        }
        SampleFormat::F32 => {
            for &sample in samples {
                out.write_f32::<LittleEndian>(sample)?;
            }
        }
    }
    Ok(())
}

pub struct WavCodec;

impl WavCodec {
    pub fn file_extension(&self) -> &'static str {
        "wav"
    }

    pub fn validate_file_format(&self, data: &[u8]) -> R<()> {
        if data.len() < HEADER_SIZE {
            return Err(anyhow!("File too small to be a valid WAV"));
        }

        if &data[0..4] != RIFF_CHUNK_ID || &data[8..12] != WAVE_FORMAT_ID {
            return Err(anyhow!("Invalid WAV File: Missing RIFF/WAVE signature"));
        }

        Ok(())
    }

    /// Interleaves `channels` and writes header plus payload in one buffer
    /// sized up front. A single channel is written straight from its buffer.
    pub fn encode(
        &self,
        channels: &[Vec<f32>],
        sample_rate: u32,
        options: &EncodeOptions,
    ) -> Result<Vec<u8>, CodexError> {
        let format = options.sample_format();
        let interleaved;
        let samples: &[f32] = match channels {
            [mono] => mono.as_slice(),
            _ => {
                interleaved = interleave(channels)?;
                interleaved.as_slice()
            }
        };
        let header = WavHeader::new(format, channels.len(), sample_rate, samples.len())?;

        debug!(
            "Encoding {} samples, {} channel(s), {} Hz, {}-bit tag {}",
            samples.len(),
            header.channels,
            header.sample_rate,
            format.bits_per_sample(),
            format.format_tag()
        );

        let mut output = Vec::with_capacity(header.file_size());
        header.write_to(&mut output)?;
        encode_samples(&mut output, samples, format)?;

        debug_assert_eq!(output.len(), header.file_size());
        Ok(output)
    }
}

impl AudioDecoder for WavCodec {
    fn decode(&self, input: &[u8]) -> R<DecodedAudio> {
        self.validate_file_format(input)?;

        let mut cursor = Cursor::new(input);
        cursor.seek(SeekFrom::Start(HEADER_SIZE as u64))?;

        let mut fmt: Option<(u16, u32, u16, bool)> = None; // channels, rate, bits, float
        let mut channel_data = None;

        while let Ok(chunk_id) = cursor.read_u32::<LittleEndian>() {
            let chunk_id = u32::to_le_bytes(chunk_id);
            let chunk_size = cursor.read_u32::<LittleEndian>()? as usize;
            let padding = (chunk_size % 2) as i64;

            match &chunk_id {
                FMT_CHUNK_ID => {
                    if chunk_size < STANDARD_FMT_CHUNK_SIZE as usize {
                        return Err(anyhow!("fmt chunk too small: {} bytes", chunk_size));
                    }
                    let format_tag = cursor.read_u16::<LittleEndian>()?;
                    let channels = cursor.read_u16::<LittleEndian>()?;
                    let sample_rate = cursor.read_u32::<LittleEndian>()?;
                    cursor.read_u32::<LittleEndian>()?; // byte rate
                    cursor.read_u16::<LittleEndian>()?; // block align
                    let bits_per_sample = cursor.read_u16::<LittleEndian>()?;
                    let mut consumed = STANDARD_FMT_CHUNK_SIZE as usize;

                    let tag = if format_tag == FORMAT_EXTENSIBLE {
                        if chunk_size < EXTENSIBLE_FMT_CHUNK_SIZE {
                            return Err(anyhow!(
                                "Extensible fmt chunk too small: {} bytes",
                                chunk_size
                            ));
                        }
                        // cbSize, valid bits, channel mask, then the subformat GUID
                        // whose first two bytes are the real format tag.
                        cursor.read_u16::<LittleEndian>()?;
                        cursor.read_u16::<LittleEndian>()?;
                        cursor.read_u32::<LittleEndian>()?;
                        let mut guid = [0u8; 16];
                        cursor.read_exact(&mut guid)?;
                        consumed = EXTENSIBLE_FMT_CHUNK_SIZE;
                        u16::from_le_bytes([guid[0], guid[1]])
                    } else {
                        format_tag
                    };

                    let is_float = match (tag, bits_per_sample) {
                        (FORMAT_PCM, BIT_DEPTH_8)
                        | (FORMAT_PCM, BIT_DEPTH_16)
                        | (FORMAT_PCM, BIT_DEPTH_24)
                        | (FORMAT_PCM, BIT_DEPTH_32) => false,
                        (FORMAT_IEEE_FLOAT, BIT_DEPTH_32) => true,
                        _ => {
                            return Err(anyhow!(
                                "Unsupported format: tag {}, bits {}",
                                tag,
                                bits_per_sample
                            ));
                        }
                    };
                    if channels == 0 {
                        return Err(anyhow!("fmt chunk declares zero channels"));
                    }

                    let extra_bytes = chunk_size.saturating_sub(consumed) as i64;
                    cursor.seek(SeekFrom::Current(extra_bytes + padding))?;
                    fmt = Some((channels, sample_rate, bits_per_sample, is_float));
                }
                DATA_CHUNK_ID => {
                    let Some((channels, _, bits_per_sample, is_float)) = fmt else {
                        return Err(anyhow!("'data' chunk found before 'fmt ' chunk"));
                    };
                    let start = cursor.position() as usize;
                    // Tolerate a truncated final chunk.
                    let end = (start + chunk_size).min(input.len());
                    channel_data = Some(decode_samples(
                        &input[start..end],
                        channels,
                        bits_per_sample,
                        is_float,
                    ));
                    cursor.seek(SeekFrom::Start((start + chunk_size) as u64))?;
                    cursor.seek(SeekFrom::Current(padding))?;
                }
                _ => {
                    debug!(
                        "Skipping '{}' chunk ({} bytes)",
                        String::from_utf8_lossy(&chunk_id),
                        chunk_size
                    );
                    cursor.seek(SeekFrom::Current(chunk_size as i64 + padding))?;
                }
            }
        }

        let (Some((_, sample_rate, bits_per_sample, is_float)), Some(channels)) =
            (fmt, channel_data)
        else {
            return Err(anyhow!("Missing 'fmt ' or 'data' chunk"));
        };

        if !(is_float || bits_per_sample == BIT_DEPTH_16) {
            warn!(
                "Source is {}-bit integer PCM; it will be re-quantized on encode",
                bits_per_sample
            );
        }

        Ok(DecodedAudio::new(sample_rate, channels))
    }
}

fn decode_samples(
    input: &[u8],
    channels: u16,
    bits_per_sample: u16,
    is_float_format: bool,
) -> Vec<Vec<f32>> {
    let bytes_per_sample = (bits_per_sample / 8) as usize;
    let channels = channels as usize;
    let frame_count = input.len() / (bytes_per_sample * channels);

    debug!(
        "Decoding {} channels, {} frames per channel, {} bits per sample",
        channels, frame_count, bits_per_sample
    );

    (0..channels)
        .into_par_iter() // Parallelize over channels
        .map(|ch| {
            (0..frame_count)
                .map(|frame| {
                    let idx = (frame * channels + ch) * bytes_per_sample;
                    let bytes = &input[idx..idx + bytes_per_sample];
                    match bits_per_sample {
                        BIT_DEPTH_8 => (bytes[0] as f32 - U8_OFFSET) / U8_OFFSET,
                        BIT_DEPTH_16 => {
                            i16::from_le_bytes([bytes[0], bytes[1]]) as f32 / I16_DIVISOR
                        }
                        BIT_DEPTH_24 => {
                            let val = ((bytes[2] as i32) << 16)
                                | ((bytes[1] as i32) << 8)
                                | (bytes[0] as i32);
                            let val = if val & I24_SIGN_BIT != 0 {
                                val | I24_SIGN_EXTENSION_MASK
                            } else {
                                val
                            };
                            val as f32 / I24_DIVISOR
                        }
                        _ => {
                            let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
                            if is_float_format {
                                f32::from_le_bytes(raw)
                            } else {
                                i32::from_le_bytes(raw) as f32 / I32_DIVISOR
                            }
                        }
                    }
                })
                .collect::<Vec<f32>>()
        })
        .collect()
}
