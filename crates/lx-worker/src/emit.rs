//! Frame emission and serial trace
//!
//! The emitter writes the five typed frames of a block in their fixed
//! order, flushing after each so a stalled reader is visible immediately.
//! The serial trace mirrors yt as text; it is a capability that degrades to
//! `Absent` on the first failure and stays silent from then on.

use std::io::{self, Write};
use std::time::Duration;

use lx_core::{frame, FrameType, QUADS};
use lx_dsp::BlockOutput;

pub struct FrameEmitter<W: Write> {
    out: W,
    scratch: Vec<u8>,
}

impl<W: Write> FrameEmitter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            scratch: Vec::new(),
        }
    }

    /// Emit Stage3 → Stage5 → Stage7 → Stage8 → Stage9 for one block.
    /// Blocks that produced no decimated rows emit nothing.
    pub fn emit_block(&mut self, block: &BlockOutput<'_>) -> io::Result<()> {
        if block.n_out == 0 {
            return Ok(());
        }
        self.write_frame(FrameType::Stage3, block.stage3)?;
        self.write_frame(FrameType::Stage5, block.ravg)?;
        self.write_frame(FrameType::Stage7, block.y2)?;
        self.write_frame(FrameType::Stage8, block.y3)?;
        self.write_frame(FrameType::Stage9, block.yt)?;
        Ok(())
    }

    fn write_frame(&mut self, frame_type: FrameType, payload: &[f32]) -> io::Result<()> {
        self.scratch.clear();
        frame::encode_into(
            &mut self.scratch,
            frame_type,
            frame_type.channel_count() as u32,
            payload,
        );
        self.out.write_all(&self.scratch)?;
        self.out.flush()
    }

    #[cfg(test)]
    pub fn get_ref(&self) -> &W {
        &self.out
    }
}

/// Write the textual yt trace for one block: one CR+LF line per decimated
/// row, `t` counting rows within the block.
pub fn write_trace<W: Write>(out: &mut W, yt: &[f32], n_out: usize) -> io::Result<()> {
    for t in 0..n_out {
        let row = &yt[t * QUADS..(t + 1) * QUADS];
        write!(out, "YT[{t}] = {}, {}, {}, {}\r\n", row[0], row[1], row[2], row[3])?;
    }
    out.flush()
}

/// The trace port as a capability: present until it fails.
pub enum TraceSink {
    Present(Box<dyn serialport::SerialPort>),
    Absent,
}

impl TraceSink {
    /// Open the serial device at 115200 8N1. Open failure is tolerated and
    /// leaves the sink absent.
    pub fn open(path: Option<&str>) -> Self {
        let Some(path) = path else {
            return Self::Absent;
        };
        match serialport::new(path, 115_200)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(Duration::from_millis(200))
            .open()
        {
            Ok(port) => {
                log::info!("trace port {path} open");
                Self::Present(port)
            }
            Err(err) => {
                log::warn!("trace port {path} unavailable: {err}");
                Self::Absent
            }
        }
    }

    /// Best-effort trace of one block's yt rows.
    pub fn trace_block(&mut self, yt: &[f32], n_out: usize) {
        if let Self::Present(port) = self {
            if let Err(err) = write_trace(port, yt, n_out) {
                log::warn!("trace port write failed, disabling trace: {err}");
                *self = Self::Absent;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn block<'a>(stage3: &'a [f32], lanes: &'a [f32]) -> BlockOutput<'a> {
        BlockOutput {
            n_out: lanes.len() / QUADS,
            stage3,
            ravg: lanes,
            y2: lanes,
            y3: lanes,
            yt: lanes,
        }
    }

    #[test]
    fn test_frame_order_per_block() {
        let stage3 = [1.0f32; 16];
        let lanes = [2.0f32; 8];
        let mut emitter = FrameEmitter::new(Vec::new());
        emitter.emit_block(&block(&stage3, &lanes)).unwrap();

        let bytes = emitter.get_ref().clone();
        let mut cursor = Cursor::new(bytes.as_slice());
        let types: Vec<FrameType> = (0..5)
            .map(|_| frame::read_from(&mut cursor).unwrap().frame_type)
            .collect();
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
        assert_eq!(cursor.position() as usize, bytes.len());
    }

    #[test]
    fn test_empty_block_emits_nothing() {
        let mut emitter = FrameEmitter::new(Vec::new());
        emitter.emit_block(&block(&[], &[])).unwrap();
        assert!(emitter.get_ref().is_empty());
    }

    #[test]
    fn test_payloads_survive_emission() {
        let stage3: Vec<f32> = (0..16).map(|v| v as f32 * 0.5).collect();
        let lanes: Vec<f32> = (0..8).map(|v| -(v as f32)).collect();
        let mut emitter = FrameEmitter::new(Vec::new());
        emitter.emit_block(&block(&stage3, &lanes)).unwrap();

        let bytes = emitter.get_ref().clone();
        let mut cursor = Cursor::new(bytes.as_slice());
        let first = frame::read_from(&mut cursor).unwrap();
        assert_eq!(first.n_samp, 2);
        assert_eq!(first.payload, stage3);
        let second = frame::read_from(&mut cursor).unwrap();
        assert_eq!(second.payload, lanes);
    }

    #[test]
    fn test_trace_format() {
        let yt = [0.5f32, -1.0, 2.0, 3.25, 4.0, 5.0, 6.0, 7.0];
        let mut out = Vec::new();
        write_trace(&mut out, &yt, 2).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "YT[0] = 0.5, -1, 2, 3.25\r\nYT[1] = 4, 5, 6, 7\r\n");
    }

    #[test]
    fn test_absent_sink_is_silent() {
        let mut sink = TraceSink::Absent;
        sink.trace_block(&[1.0; 4], 1);
    }
}
