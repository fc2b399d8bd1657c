//! Centered moving average
//!
//! Edge windows shrink to whatever fits inside the buffer and divide by the
//! actual sample count, so the ends are not pulled toward zero. A prefix-sum
//! scratchpad makes every output O(1) regardless of window length.

/// Centered moving average over one series. A window of 1 (or 0) is the
/// identity. The scratchpad is sized once for the longest series the caller
/// will pass.
#[derive(Debug, Clone)]
pub struct CenteredMovingAverage {
    window: usize,
    prefix: Vec<f64>,
}

impl CenteredMovingAverage {
    pub fn new(window: usize, max_len: usize) -> Self {
        Self {
            window,
            prefix: vec![0.0; max_len + 1],
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Smooth `input` into `output` (equal lengths, at most `max_len`).
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), output.len());
        debug_assert!(input.len() < self.prefix.len());

        if self.window <= 1 {
            output.copy_from_slice(input);
            return;
        }

        let len = input.len();
        if len == 0 {
            return;
        }

        self.prefix[0] = 0.0;
        for (i, &x) in input.iter().enumerate() {
            self.prefix[i + 1] = self.prefix[i] + x as f64;
        }

        let half = self.window / 2;
        for (i, y) in output.iter_mut().enumerate() {
            let start = i.saturating_sub(half);
            let end = (i + self.window - 1 - half).min(len - 1);
            let count = (end - start + 1) as f64;
            *y = ((self.prefix[end + 1] - self.prefix[start]) / count) as f32;
        }
    }
}
