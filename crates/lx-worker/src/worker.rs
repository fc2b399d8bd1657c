//! The worker main loop
//!
//! Single-threaded cooperative: poll the command channel, refill from the
//! source, run the pipeline, emit frames, trace. The only suspension points
//! are the blocking refill and the output writes; a consumer that stops
//! draining stalls the loop, and the front-end absorbs (or drops) the
//! backlog per its own semantics.

use std::io::Write;

use lx_core::LxResult;
use lx_dsp::Pipeline;

use crate::command::CommandReader;
use crate::emit::{FrameEmitter, TraceSink};
use crate::source::AdcSource;

pub struct Worker<S: AdcSource, W: Write> {
    source: S,
    pipeline: Pipeline,
    commands: CommandReader,
    emitter: FrameEmitter<W>,
    trace: TraceSink,
    raw: Vec<i32>,
    blocks_done: u64,
}

impl<S: AdcSource, W: Write> Worker<S, W> {
    pub fn new(
        source: S,
        pipeline: Pipeline,
        commands: CommandReader,
        out: W,
        trace: TraceSink,
    ) -> Self {
        let raw = vec![0i32; pipeline.raw_len()];
        Self {
            source,
            pipeline,
            commands,
            emitter: FrameEmitter::new(out),
            trace,
            raw,
            blocks_done: 0,
        }
    }

    /// One loop iteration. Errors are fatal; the caller exits nonzero and
    /// the control plane respawns the worker.
    pub fn step(&mut self) -> LxResult<()> {
        if let Some(update) = self.commands.poll() {
            self.pipeline.apply_update(update);
        }

        self.source.fill_block(&mut self.raw)?;
        let output = self.pipeline.process_block(&self.raw);

        self.emitter.emit_block(&output)?;
        self.trace.trace_block(output.yt, output.n_out);

        self.blocks_done += 1;
        log::trace!("block {} done, {} rows", self.blocks_done, output.n_out);
        Ok(())
    }

    pub fn run(&mut self) -> LxResult<()> {
        loop {
            self.step()?;
        }
    }

    #[cfg(test)]
    pub fn output(&self) -> &W {
        self.emitter.get_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StreamSource;
    use lx_core::{frame, FrameType, Params};
    use std::io::Cursor;

    fn stream_bytes(blocks: &[Vec<i32>]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&8u32.to_le_bytes());
        for _ in 0..8 {
            bytes.extend_from_slice(&1.0f32.to_le_bytes());
        }
        for block in blocks {
            for v in block {
                bytes.extend_from_slice(&v.to_le_bytes());
            }
        }
        bytes
    }

    fn test_params() -> Params {
        Params {
            sampling_frequency: 100.0,
            target_rate_hz: 20.0,
            lpf_cutoff_hz: 5.0,
            movavg_r: 1,
            movavg_ch: 1,
            ..Params::default()
        }
    }

    fn build_worker(
        blocks: &[Vec<i32>],
        commands: CommandReader,
    ) -> Worker<StreamSource<Cursor<Vec<u8>>>, Vec<u8>> {
        let source = StreamSource::open(Cursor::new(stream_bytes(blocks))).unwrap();
        let pipeline = lx_dsp::Pipeline::with_sections(
            test_params(),
            10,
            source.scales(),
            source.channel_count(),
            [
                lx_dsp::biquad::BiquadCoeffs::bypass(),
                lx_dsp::biquad::BiquadCoeffs::bypass(),
            ],
        )
        .unwrap();
        Worker::new(source, pipeline, commands, Vec::new(), TraceSink::Absent)
    }

    fn dummy_commands() -> CommandReader {
        let (_, rx) = crossbeam_channel::unbounded::<String>();
        CommandReader::from_channel(rx)
    }

    #[test]
    fn test_step_emits_five_frames_in_order() {
        let block = vec![1i32; 10 * 8];
        let mut worker = build_worker(&[block], dummy_commands());
        worker.step().unwrap();

        let bytes = worker.output().clone();
        let mut cursor = Cursor::new(bytes.as_slice());
        let mut types = Vec::new();
        while (cursor.position() as usize) < bytes.len() {
            types.push(frame::read_from(&mut cursor).unwrap().frame_type);
        }
        assert_eq!(
            types,
            vec![
                FrameType::Stage3,
                FrameType::Stage5,
                FrameType::Stage7,
                FrameType::Stage8,
                FrameType::Stage9,
            ]
        );
    }

    #[test]
    fn test_command_applies_before_next_block() {
        let block = vec![1i32; 10 * 8];
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut worker = build_worker(&[block.clone(), block], CommandReader::from_channel(rx));

        worker.step().unwrap();
        tx.send("yt_coeffs 1,42".to_string()).unwrap();
        worker.step().unwrap();

        // Second block's Stage9 payload sits at the end of the stream.
        let bytes = worker.output().clone();
        let mut cursor = Cursor::new(bytes.as_slice());
        let mut last_yt = None;
        while (cursor.position() as usize) < bytes.len() {
            let f = frame::read_from(&mut cursor).unwrap();
            if f.frame_type == FrameType::Stage9 {
                last_yt = Some(f.payload);
            }
        }
        // Identity chain yields yt = 0; the update turns it into 1*y3 + 42.
        assert!(last_yt.unwrap().iter().all(|&v| (v - 42.0).abs() < 1e-6));
    }

    #[test]
    fn test_source_exhaustion_is_fatal() {
        let block = vec![1i32; 10 * 8];
        let mut worker = build_worker(&[block], dummy_commands());
        worker.step().unwrap();
        assert!(worker.step().is_err());
    }

    #[test]
    fn test_malformed_command_ignored() {
        let block = vec![1i32; 10 * 8];
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut worker = build_worker(&[block], CommandReader::from_channel(rx));
        tx.send("y2_coeffs 1,NaN".to_string()).unwrap();
        worker.step().unwrap();

        // The NaN line must not have replaced the defaults.
        assert_eq!(worker.pipeline.params().y2_coeffs, vec![1.0, 0.0]);
    }
}
