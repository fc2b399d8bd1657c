//! The composed per-block pipeline
//!
//! One `Pipeline` owns the parameter record, every piece of persistent
//! filter state, and every scratch buffer. All buffers are sized at
//! construction from `block_samples` and the decimation factor; the
//! per-block path allocates nothing.
//!
//! Stage order per block: convert → low-pass → channel smoothing →
//! decimation → log-ratio/Ravg → correction chain. Parameter updates are
//! applied only between blocks, so every stage sees one consistent
//! parameter snapshot for the whole block.

use lx_core::{LxError, LxResult, ParamUpdate, Params, CHANNELS, QUADS};

use crate::biquad::{self, BiquadCoeffs, FilterBank, SECTIONS};
use crate::convert::SampleConverter;
use crate::decimate::BlockDecimator;
use crate::movavg::CenteredMovingAverage;
use crate::ratio::RatioLogger;
use crate::{ychain, Processor};

/// Borrowed view of one block's outputs. Slices are empty when the block
/// completed no decimation group (`n_out == 0`).
#[derive(Debug)]
pub struct BlockOutput<'a> {
    /// Decimated rows produced by this block.
    pub n_out: usize,
    /// Row-major `n_out x 8` post-decimation channels.
    pub stage3: &'a [f32],
    /// Row-major `n_out x 4` smoothed log-ratio.
    pub ravg: &'a [f32],
    /// Row-major `n_out x 4` intermediate y2.
    pub y2: &'a [f32],
    /// Row-major `n_out x 4` intermediate y3.
    pub y3: &'a [f32],
    /// Row-major `n_out x 4` final output.
    pub yt: &'a [f32],
}

pub struct Pipeline {
    params: Params,
    block_samples: usize,

    converter: SampleConverter,
    filters: FilterBank,
    smoother: CenteredMovingAverage,
    decimator: BlockDecimator,
    ratio: RatioLogger,

    raw_planar: Vec<Vec<f32>>,
    lpf_planar: Vec<Vec<f32>>,
    smoothed_planar: Vec<Vec<f32>>,
    decim_out: Vec<f32>,
    ravg_buf: Vec<f32>,
    y2_out: Vec<f32>,
    y3_out: Vec<f32>,
    yt_out: Vec<f32>,
}

impl Pipeline {
    /// Build a pipeline whose low-pass sections are derived from
    /// `lpf_cutoff_hz`.
    pub fn new(
        params: Params,
        block_samples: usize,
        scales: &[f32],
        channels_in: usize,
    ) -> LxResult<Self> {
        let sections = biquad::butterworth4(params.lpf_cutoff_hz, params.sampling_frequency);
        Self::with_sections(params, block_samples, scales, channels_in, sections)
    }

    /// Build a pipeline with explicit filter sections (parity runs, tests).
    pub fn with_sections(
        params: Params,
        block_samples: usize,
        scales: &[f32],
        channels_in: usize,
        sections: [BiquadCoeffs; SECTIONS],
    ) -> LxResult<Self> {
        params.validate()?;
        if block_samples == 0 {
            return Err(LxError::Config("block size must be positive".into()));
        }

        let converter = SampleConverter::new(scales, channels_in)?;
        let decim = params.decim();
        let decimator = BlockDecimator::new(decim, CHANNELS, block_samples);
        let max_rows = decimator.max_output_rows(block_samples);

        log::info!(
            "pipeline: {} samples/block, decim {} ({} Hz -> {} Hz), windows ch={} r={}",
            block_samples,
            decim,
            params.sampling_frequency,
            params.target_rate_hz,
            params.movavg_ch,
            params.movavg_r,
        );

        Ok(Self {
            converter,
            filters: FilterBank::new(sections, CHANNELS),
            smoother: CenteredMovingAverage::new(params.movavg_ch, block_samples),
            decimator,
            ratio: RatioLogger::new(&params, max_rows),
            raw_planar: vec![vec![0.0; block_samples]; CHANNELS],
            lpf_planar: vec![vec![0.0; block_samples]; CHANNELS],
            smoothed_planar: vec![vec![0.0; block_samples]; CHANNELS],
            decim_out: vec![0.0; max_rows * CHANNELS],
            ravg_buf: vec![0.0; max_rows * QUADS],
            y2_out: vec![0.0; max_rows * QUADS],
            y3_out: vec![0.0; max_rows * QUADS],
            yt_out: vec![0.0; max_rows * QUADS],
            params,
            block_samples,
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn block_samples(&self) -> usize {
        self.block_samples
    }

    /// Raw samples one block must deliver (rows times interleave stride).
    pub fn raw_len(&self) -> usize {
        self.block_samples * self.converter.stride()
    }

    /// Apply a hot-reload command. Callers invoke this only between blocks.
    pub fn apply_update(&mut self, update: ParamUpdate) {
        log::debug!("applying parameter update {update:?}");
        self.params.apply(update);
    }

    /// Run one raw block through every stage.
    pub fn process_block(&mut self, raw: &[i32]) -> BlockOutput<'_> {
        debug_assert_eq!(raw.len(), self.raw_len());

        self.converter.convert(raw, &mut self.raw_planar);

        for c in 0..CHANNELS {
            self.filters
                .process(c, &self.raw_planar[c], &mut self.lpf_planar[c]);
            self.smoother
                .process(&self.lpf_planar[c], &mut self.smoothed_planar[c]);
        }

        let n_out =
            self.decimator
                .process(&self.smoothed_planar, self.block_samples, &mut self.decim_out);

        if n_out > 0 {
            self.ratio
                .process(&self.decim_out, n_out, &mut self.ravg_buf);
            ychain::evaluate(
                &self.params,
                &self.ravg_buf[..n_out * QUADS],
                &mut self.y2_out[..n_out * QUADS],
                &mut self.y3_out[..n_out * QUADS],
                &mut self.yt_out[..n_out * QUADS],
            );
        }

        BlockOutput {
            n_out,
            stage3: &self.decim_out[..n_out * CHANNELS],
            ravg: &self.ravg_buf[..n_out * QUADS],
            y2: &self.y2_out[..n_out * QUADS],
            y3: &self.y3_out[..n_out * QUADS],
            yt: &self.yt_out[..n_out * QUADS],
        }
    }
}

impl Processor for Pipeline {
    fn reset(&mut self) {
        self.filters.reset();
        self.decimator.reset();
    }
}
