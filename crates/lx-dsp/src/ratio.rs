//! Sensor/standard log-ratio
//!
//! The eight decimated channels pair into four lanes: sensor channels
//! {0, 2, 4, 6} against standard channels {1, 3, 5, 7}. Each lane produces
//! `R = alpha*beta*gamma * log_k(top/bot) + b`, then a centered moving
//! average over the decimated rows (Ravg). Both ratio legs are floored at
//! 1e-12 so a dark or disconnected channel yields a large finite value
//! rather than an infinity.

use lx_core::{Params, CLAMP_FLOOR, QUADS, SENSOR_CHANNELS, STANDARD_CHANNELS};

use crate::movavg::CenteredMovingAverage;

#[derive(Debug, Clone)]
pub struct RatioLogger {
    /// alpha * beta * gamma, folded once.
    coeff: f64,
    /// 1 / ln(k), precomputed.
    inv_ln_k: f64,
    bias: f64,
    r_abs: bool,
    smoother: CenteredMovingAverage,
    r_series: Vec<f32>,
    ravg_series: Vec<f32>,
}

impl RatioLogger {
    /// `max_rows` bounds the decimated rows of any single block.
    pub fn new(params: &Params, max_rows: usize) -> Self {
        Self {
            coeff: params.alpha * params.beta * params.gamma,
            inv_ln_k: 1.0 / params.k.ln(),
            bias: params.b,
            r_abs: params.r_abs,
            smoother: CenteredMovingAverage::new(params.movavg_r, max_rows),
            r_series: vec![0.0; max_rows],
            ravg_series: vec![0.0; max_rows],
        }
    }

    /// Compute Ravg for every lane. `decim_out` is row-major eight-channel
    /// (`n_rows * 8`); `ravg_out` receives row-major four-lane output
    /// (`n_rows * 4`).
    pub fn process(&mut self, decim_out: &[f32], n_rows: usize, ravg_out: &mut [f32]) {
        debug_assert!(decim_out.len() >= n_rows * lx_core::CHANNELS);
        debug_assert!(ravg_out.len() >= n_rows * QUADS);

        for q in 0..QUADS {
            for t in 0..n_rows {
                let row = &decim_out[t * lx_core::CHANNELS..];
                let mut top = row[SENSOR_CHANNELS[q]] as f64;
                let mut bot = row[STANDARD_CHANNELS[q]] as f64;
                if self.r_abs {
                    top = top.abs();
                    bot = bot.abs();
                }
                top = top.max(CLAMP_FLOOR);
                bot = bot.max(CLAMP_FLOOR);
                let r = self.coeff * (top / bot).ln() * self.inv_ln_k + self.bias;
                self.r_series[t] = r as f32;
            }

            self.smoother
                .process(&self.r_series[..n_rows], &mut self.ravg_series[..n_rows]);

            for t in 0..n_rows {
                ravg_out[t * QUADS + q] = self.ravg_series[t];
            }
        }
    }
}
