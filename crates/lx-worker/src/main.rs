//! LumiFlux streaming DSP worker
//!
//! Reads interleaved ADC blocks from the front-end endpoint, runs the
//! filter/decimate/log-ratio/correction pipeline, and writes typed binary
//! frames to stdout. Stdin is the command channel; an optional serial port
//! mirrors the final output as text. Any fatal condition exits nonzero so
//! the control plane can respawn the worker.

mod command;
mod emit;
mod source;
mod worker;

use std::io;
use std::process;

use clap::Parser;
use log::{error, info};

use lx_core::Params;
use lx_dsp::Pipeline;

use crate::command::CommandReader;
use crate::emit::TraceSink;
use crate::source::AdcSource;
use crate::worker::Worker;

#[derive(Parser)]
#[command(name = "lx-worker", about = "LumiFlux streaming DSP worker", version)]
struct Cli {
    /// ADC front-end endpoint, host:port
    adc_endpoint: String,
    /// Samples per refill block
    block_samples: usize,
    /// ADC sampling frequency in Hz
    sampling_frequency_hz: f64,
    /// Decimated presentation rate in Hz
    target_rate_hz: f64,
    /// Low-pass cutoff in Hz
    lpf_cutoff_hz: f64,
    /// Moving-average window at the decimated rate
    movavg_r: usize,
    /// Moving-average window at the ADC rate
    movavg_ch: usize,
    /// Serial device for the textual yt trace (best-effort)
    #[arg(long)]
    trace_port: Option<String>,
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        error!("fatal: {err:#}");
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let params = Params {
        sampling_frequency: cli.sampling_frequency_hz,
        target_rate_hz: cli.target_rate_hz,
        lpf_cutoff_hz: cli.lpf_cutoff_hz,
        movavg_r: cli.movavg_r,
        movavg_ch: cli.movavg_ch,
        ..Params::default()
    };

    let source = source::connect(&cli.adc_endpoint)?;
    info!(
        "connected to {} ({} channels)",
        cli.adc_endpoint,
        source.channel_count()
    );

    let pipeline = Pipeline::new(
        params,
        cli.block_samples,
        source.scales(),
        source.channel_count(),
    )?;

    let commands = CommandReader::spawn_stdin()?;
    let trace = TraceSink::open(cli.trace_port.as_deref());
    let mut worker = Worker::new(source, pipeline, commands, io::stdout().lock(), trace);

    worker.run()?;
    Ok(())
}
