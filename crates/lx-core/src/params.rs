//! Worker parameter record
//!
//! `Params` is seeded from the command line plus compiled defaults, owned by
//! the DSP pipeline, and mutated only between blocks when a command arrives.
//! The control broker persists this record as JSON to restart the worker, so
//! it must round-trip through serde losslessly.

use serde::{Deserialize, Serialize};

use crate::{LxError, LxResult};

/// Maximum live length of any correction coefficient sequence.
pub const MAX_POLY_LEN: usize = 10;

/// Full parameter set consumed by the pipeline stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// ADC sampling rate in Hz. Set once at startup; defines the time base.
    pub sampling_frequency: f64,
    /// Presentation rate in Hz; `decim = floor(fs / target_rate)`.
    pub target_rate_hz: f64,
    /// Low-pass cutoff in Hz used to derive the filter sections.
    pub lpf_cutoff_hz: f64,
    /// Moving-average window at the decimated rate.
    pub movavg_r: usize,
    /// Moving-average window at the ADC rate.
    pub movavg_ch: usize,

    /// Log-ratio scaling: `R = alpha*beta*gamma * log_k(top/bot) + b`.
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    /// Logarithm base, must be > 1.
    pub k: f64,
    pub b: f64,
    /// Take |x| of both legs before the ratio.
    pub r_abs: bool,

    /// y1 rational correction, Horner order (highest first).
    pub y1_num: Vec<f64>,
    pub y1_den: Vec<f64>,
    /// y2/y3 polynomial corrections, Horner order.
    pub y2_coeffs: Vec<f64>,
    pub y3_coeffs: Vec<f64>,
    /// Affine output transform `yt = e * y3 + f`.
    pub e: f64,
    pub f: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            sampling_frequency: 1000.0,
            target_rate_hz: 10.0,
            lpf_cutoff_hz: 4.0,
            movavg_r: 1,
            movavg_ch: 1,
            alpha: 1.0,
            beta: 1.0,
            gamma: 1.0,
            k: 10.0,
            b: 0.0,
            r_abs: true,
            y1_num: vec![1.0, 0.0],
            y1_den: vec![1.0],
            y2_coeffs: vec![1.0, 0.0],
            y3_coeffs: vec![1.0, 0.0],
            e: 1.0,
            f: 0.0,
        }
    }
}

impl Params {
    /// Integer decimation factor from ADC rate to presentation rate.
    pub fn decim(&self) -> usize {
        (self.sampling_frequency / self.target_rate_hz) as usize
    }

    /// Check the startup invariants. Violations are fatal configuration
    /// errors; nothing here is recoverable at runtime.
    pub fn validate(&self) -> LxResult<()> {
        if !(self.sampling_frequency > 0.0 && self.sampling_frequency.is_finite()) {
            return Err(LxError::Config(format!(
                "sampling frequency must be positive, got {}",
                self.sampling_frequency
            )));
        }
        if !(self.target_rate_hz > 0.0 && self.target_rate_hz.is_finite()) {
            return Err(LxError::Config(format!(
                "target rate must be positive, got {}",
                self.target_rate_hz
            )));
        }
        if self.decim() < 1 {
            return Err(LxError::Config(format!(
                "target rate {} Hz exceeds sampling frequency {} Hz",
                self.target_rate_hz, self.sampling_frequency
            )));
        }
        if !(self.lpf_cutoff_hz > 0.0 && self.lpf_cutoff_hz.is_finite()) {
            return Err(LxError::Config(format!(
                "low-pass cutoff must be positive, got {}",
                self.lpf_cutoff_hz
            )));
        }
        if self.lpf_cutoff_hz >= self.sampling_frequency / 2.0 {
            return Err(LxError::Config(format!(
                "low-pass cutoff {} Hz is at or above Nyquist",
                self.lpf_cutoff_hz
            )));
        }
        if self.movavg_r == 0 || self.movavg_ch == 0 {
            return Err(LxError::Config(
                "moving-average windows must be positive".into(),
            ));
        }
        if !(self.k > 1.0) {
            return Err(LxError::Config(format!(
                "log base k must be > 1, got {}",
                self.k
            )));
        }
        for (name, seq) in [
            ("y1_num", &self.y1_num),
            ("y1_den", &self.y1_den),
            ("y2_coeffs", &self.y2_coeffs),
            ("y3_coeffs", &self.y3_coeffs),
        ] {
            if seq.len() > MAX_POLY_LEN {
                return Err(LxError::Config(format!(
                    "{name} has {} coefficients, limit is {MAX_POLY_LEN}",
                    seq.len()
                )));
            }
            if seq.iter().any(|c| !c.is_finite()) {
                return Err(LxError::Config(format!("{name} contains a non-finite value")));
            }
        }
        Ok(())
    }

    /// Apply a hot-reload update. Replacement is total, so re-applying the
    /// same update is a no-op.
    pub fn apply(&mut self, update: ParamUpdate) {
        match update {
            ParamUpdate::Y1Den(coeffs) => self.y1_den = coeffs,
            ParamUpdate::Y2Coeffs(coeffs) => self.y2_coeffs = coeffs,
            ParamUpdate::Y3Coeffs(coeffs) => self.y3_coeffs = coeffs,
            ParamUpdate::YtAffine { e, f } => {
                self.e = e;
                self.f = f;
            }
        }
    }
}

/// A validated hot-reload command, ready to apply between blocks.
///
/// Only the correction chain is mutable at runtime; filter coefficients,
/// the decimation factor, and the window lengths require a worker restart.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamUpdate {
    Y1Den(Vec<f64>),
    Y2Coeffs(Vec<f64>),
    Y3Coeffs(Vec<f64>),
    YtAffine { e: f64, f: f64 },
}
