//! Raw sample conversion
//!
//! The ADC delivers `block_samples` rows of `channels_in` interleaved
//! signed integers. The converter picks the first eight voltage channels,
//! applies the per-channel scale to volts, and writes planar f32 buffers.
//! Any trailing channels (a timestamp lane, spare inputs) are skipped.

use lx_core::{LxError, LxResult, CHANNELS};

#[derive(Debug, Clone)]
pub struct SampleConverter {
    scales: [f32; CHANNELS],
    stride: usize,
}

impl SampleConverter {
    /// `channels_in` is the interleave stride of the raw stream; at least
    /// eight voltage channels (with scales) must be present.
    pub fn new(scales: &[f32], channels_in: usize) -> LxResult<Self> {
        if channels_in < CHANNELS || scales.len() < CHANNELS {
            return Err(LxError::Config(format!(
                "need at least {CHANNELS} voltage channels, source has {}",
                channels_in.min(scales.len())
            )));
        }
        for (c, &s) in scales.iter().take(CHANNELS).enumerate() {
            if !(s.is_finite() && s > 0.0) {
                return Err(LxError::Config(format!("channel {c} scale {s} is not usable")));
            }
        }
        let mut fixed = [0.0f32; CHANNELS];
        fixed.copy_from_slice(&scales[..CHANNELS]);
        Ok(Self {
            scales: fixed,
            stride: channels_in,
        })
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Convert one raw block into planar volts. `raw.len()` must equal
    /// `planar[0].len() * stride`.
    pub fn convert(&self, raw: &[i32], planar: &mut [Vec<f32>]) {
        let block_samples = planar[0].len();
        debug_assert_eq!(raw.len(), block_samples * self.stride);

        for (c, buf) in planar.iter_mut().enumerate().take(CHANNELS) {
            let scale = self.scales[c];
            for (i, value) in buf.iter_mut().enumerate() {
                *value = raw[i * self.stride + c] as f32 * scale;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_too_few_channels() {
        let scales = [1.0f32; 6];
        assert!(SampleConverter::new(&scales, 6).is_err());
    }

    #[test]
    fn test_rejects_bad_scale() {
        let mut scales = [1.0f32; 8];
        scales[3] = 0.0;
        assert!(SampleConverter::new(&scales, 8).is_err());
    }

    #[test]
    fn test_applies_per_channel_scale() {
        let scales: Vec<f32> = (1..=8).map(|c| c as f32 * 0.001).collect();
        let conv = SampleConverter::new(&scales, 8).unwrap();

        // Two rows, channel c carrying (row+1) * 10 + c.
        let mut raw = Vec::new();
        for row in 0..2 {
            for c in 0..8 {
                raw.push((row + 1) * 10 + c);
            }
        }
        let mut planar = vec![vec![0.0f32; 2]; 8];
        conv.convert(&raw, &mut planar);

        for c in 0..8 {
            assert!((planar[c][0] - (10 + c) as f32 * scales[c]).abs() < 1e-9);
            assert!((planar[c][1] - (20 + c) as f32 * scales[c]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_trailing_timestamp_channel_ignored() {
        let scales = [2.0f32; 8];
        let conv = SampleConverter::new(&scales, 9).unwrap();

        // Stride 9: the ninth lane holds a counter that must not leak in.
        let mut raw = Vec::new();
        for row in 0..3 {
            for _ in 0..8 {
                raw.push(1);
            }
            raw.push(row * 1_000_000);
        }
        let mut planar = vec![vec![0.0f32; 3]; 8];
        conv.convert(&raw, &mut planar);

        for buf in &planar {
            assert!(buf.iter().all(|&v| v == 2.0));
        }
    }
}
