//! lx-core: Shared types for the LumiFlux streaming DSP
//!
//! This crate provides the types both sides of the wire agree on: the
//! parameter record, the binary frame layout, and the error type.

mod error;
pub mod frame;
mod params;

pub use error::*;
pub use frame::*;
pub use params::*;

/// Voltage channels carried through the pipeline.
pub const CHANNELS: usize = 8;

/// Sensor/standard lanes derived from the eight channels.
pub const QUADS: usize = 4;

/// Sensor-side channel index per lane.
pub const SENSOR_CHANNELS: [usize; QUADS] = [0, 2, 4, 6];

/// Standard-side channel index per lane.
pub const STANDARD_CHANNELS: [usize; QUADS] = [1, 3, 5, 7];

/// Floor applied to the ratio legs and the y1 denominator magnitude.
pub const CLAMP_FLOOR: f64 = 1e-12;
