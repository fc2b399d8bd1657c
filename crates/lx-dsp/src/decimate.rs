//! Integer decimation with cross-block carry
//!
//! Rows that do not fill a complete group of `decim` at the end of a block
//! are held over and prepended to the next block, so the decimated stream is
//! contiguous across refills. The carry never reaches `decim` rows.

use crate::Processor;

/// Block decimator over planar channel buffers.
#[derive(Debug, Clone)]
pub struct BlockDecimator {
    decim: usize,
    channels: usize,
    /// Held-over tail, `carry[c].len() == carry_len` for every channel.
    carry: Vec<Vec<f32>>,
    /// Carry plus current block, rebuilt each call.
    combined: Vec<Vec<f32>>,
}

impl BlockDecimator {
    pub fn new(decim: usize, channels: usize, block_samples: usize) -> Self {
        assert!(decim >= 1);
        let carry_cap = decim - 1;
        Self {
            decim,
            channels,
            carry: vec![Vec::with_capacity(carry_cap); channels],
            combined: vec![Vec::with_capacity(carry_cap + block_samples); channels],
        }
    }

    pub fn decim(&self) -> usize {
        self.decim
    }

    /// Rows currently held over. Always `< decim`.
    pub fn carry_len(&self) -> usize {
        self.carry[0].len()
    }

    /// Rows the next block of `n` samples can produce at most.
    pub fn max_output_rows(&self, n: usize) -> usize {
        (n + self.decim - 1) / self.decim
    }

    /// Decimate one block. `input[c][..n]` holds channel `c`; the output is
    /// written row-major into `out[row * channels + c]`. Returns the number
    /// of output rows.
    pub fn process(&mut self, input: &[Vec<f32>], n: usize, out: &mut [f32]) -> usize {
        for c in 0..self.channels {
            self.combined[c].clear();
            self.combined[c].extend_from_slice(&self.carry[c]);
            self.combined[c].extend_from_slice(&input[c][..n]);
        }

        let total = self.combined[0].len();
        let n_out = total / self.decim;
        let remainder = total % self.decim;

        for o in 0..n_out {
            let start = o * self.decim;
            for c in 0..self.channels {
                let group = &self.combined[c][start..start + self.decim];
                let sum: f64 = group.iter().map(|&v| v as f64).sum();
                out[o * self.channels + c] = (sum / self.decim as f64) as f32;
            }
        }

        for c in 0..self.channels {
            self.carry[c].clear();
            self.carry[c]
                .extend_from_slice(&self.combined[c][total - remainder..]);
        }

        n_out
    }
}

impl Processor for BlockDecimator {
    fn reset(&mut self) {
        for c in &mut self.carry {
            c.clear();
        }
    }
}
