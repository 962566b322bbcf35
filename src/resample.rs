use std::f32::consts::PI;

use crate::prelude::*;

const KERNEL_SIZE: usize = 32;
const MAX_CUTOFF: f32 = 0.9;

/// Produces the buffer handed to the encoder from a decoded one.
pub trait Renderer: Send + Sync {
    fn render(&self, audio: DecodedAudio) -> R<DecodedAudio>;
}

/// Renders at the source's own rate, leaving samples untouched.
pub struct PassthroughRenderer;

impl Renderer for PassthroughRenderer {
    fn render(&self, audio: DecodedAudio) -> R<DecodedAudio> {
        Ok(audio)
    }
}

/// Resamples every channel to `target_rate` with a windowed sinc kernel.
pub struct SincResampler {
    pub target_rate: u32,
}

impl Renderer for SincResampler {
    fn render(&self, audio: DecodedAudio) -> R<DecodedAudio> {
        if self.target_rate == 0 {
            return Err(CodexError::InvalidSampleRate(self.target_rate).into());
        }
        if audio.sample_rate == 0 {
            return Err(CodexError::InvalidSampleRate(audio.sample_rate).into());
        }
        if audio.sample_rate == self.target_rate {
            return Ok(audio);
        }

        info!(
            "Resampling {} channel(s) from {} Hz to {} Hz",
            audio.number_of_channels(),
            audio.sample_rate,
            self.target_rate
        );

        let channels = audio
            .channels
            .par_iter()
            .map(|channel| resample_windowed_sinc(channel, audio.sample_rate, self.target_rate))
            .collect();

        Ok(DecodedAudio::new(self.target_rate, channels))
    }
}

/// Sinc function: sin(πx) / (πx)
fn sinc(x: f32) -> f32 {
    if x.abs() < 1e-6 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

/// Hann window function
fn hann_window(n: usize, length: usize) -> f32 {
    let n = n as f32;
    let len = length as f32;
    0.5 * (1.0 - (2.0 * PI * n / (len - 1.0)).cos())
}

/// Resample a mono f32 buffer from `src_rate` to `dst_rate`.
///
/// Output length is `ceil(len * dst_rate / src_rate)`.
pub fn resample_windowed_sinc(input: &[f32], src_rate: u32, dst_rate: u32) -> Vec<f32> {
    if src_rate == dst_rate || input.is_empty() {
        return input.to_vec();
    }

    let output_len =
        (input.len() as u64 * dst_rate as u64).div_ceil(src_rate as u64) as usize;
    let step = src_rate as f64 / dst_rate as f64;
    // low-pass cutoff for anti-aliasing when downsampling
    let cutoff = MAX_CUTOFF.min(dst_rate as f32 / src_rate as f32);
    let half = (KERNEL_SIZE / 2) as isize;

    (0..output_len)
        .map(|i| {
            let src_pos = i as f64 * step;
            let src_index = src_pos.floor() as isize;
            let frac = (src_pos - src_pos.floor()) as f32;

            let mut sample = 0.0;
            let mut weight_sum = 0.0;
            for j in -half..half {
                let weight =
                    sinc((j as f32 - frac) * cutoff) * hann_window((j + half) as usize, KERNEL_SIZE);
                weight_sum += weight;

                let idx = src_index + j;
                if idx >= 0 && (idx as usize) < input.len() {
                    sample += input[idx as usize] * weight;
                }
            }

            // Normalize to preserve amplitude
            if weight_sum.abs() > f32::EPSILON {
                sample / weight_sum
            } else {
                sample
            }
        })
        .collect()
}
