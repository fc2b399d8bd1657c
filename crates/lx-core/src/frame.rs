//! Binary frame layout
//!
//! Every frame on the primary stream is `1 + 8 + n_samp * n_ch * 4` bytes:
//! one type byte, two little-endian u32 header words (`n_samp`, `n_ch`),
//! then `n_samp * n_ch` little-endian IEEE-754 f32 values in row-major
//! order. There is no magic and no trailing checksum; parsers key the
//! channel count off the frame type and read exactly the header's worth of
//! payload.

use std::io::Read;

use crate::{LxError, LxResult};

/// Fixed header size after the type byte.
pub const FRAME_HEADER_LEN: usize = 8;

/// Frame type tags on the primary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    /// Post-decimation eight-channel block.
    Stage3 = 1,
    /// Smoothed log-ratio (Ravg), one column per lane.
    Stage5 = 2,
    /// Final corrected output yt, one column per lane.
    Stage9 = 3,
    /// Intermediate y2, one column per lane.
    Stage7 = 4,
    /// Intermediate y3, one column per lane.
    Stage8 = 5,
}

impl FrameType {
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Stage3),
            2 => Some(Self::Stage5),
            3 => Some(Self::Stage9),
            4 => Some(Self::Stage7),
            5 => Some(Self::Stage8),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Columns a parser must expect for this type.
    pub fn channel_count(self) -> usize {
        match self {
            Self::Stage3 => crate::CHANNELS,
            Self::Stage5 | Self::Stage7 | Self::Stage8 | Self::Stage9 => crate::QUADS,
        }
    }
}

/// A decoded frame, as the broker-side parser sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub frame_type: FrameType,
    pub n_samp: u32,
    pub n_ch: u32,
    /// Row-major `n_samp * n_ch` values.
    pub payload: Vec<f32>,
}

/// Serialize one frame into `buf` (appended; callers clear between frames).
///
/// `payload.len()` must be a multiple of `n_ch`; `n_samp` is derived from it.
pub fn encode_into(buf: &mut Vec<u8>, frame_type: FrameType, n_ch: u32, payload: &[f32]) {
    debug_assert_eq!(payload.len() % n_ch as usize, 0);
    let n_samp = (payload.len() / n_ch as usize) as u32;

    buf.push(frame_type.as_u8());
    buf.extend_from_slice(&n_samp.to_le_bytes());
    buf.extend_from_slice(&n_ch.to_le_bytes());
    for &value in payload {
        buf.extend_from_slice(&value.to_le_bytes());
    }
}

/// Read one frame from a byte stream, validating the type tag and the
/// per-type channel count.
pub fn read_from<R: Read>(reader: &mut R) -> LxResult<Frame> {
    let mut tag = [0u8; 1];
    reader.read_exact(&mut tag)?;
    let frame_type = FrameType::from_u8(tag[0])
        .ok_or_else(|| LxError::Frame(format!("unknown frame type {}", tag[0])))?;

    let mut header = [0u8; FRAME_HEADER_LEN];
    reader.read_exact(&mut header)?;
    let n_samp = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let n_ch = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

    if n_ch as usize != frame_type.channel_count() {
        return Err(LxError::Frame(format!(
            "frame type {:?} carries {} channels, header says {}",
            frame_type,
            frame_type.channel_count(),
            n_ch
        )));
    }

    let count = n_samp as usize * n_ch as usize;
    let mut payload = vec![0.0f32; count];
    let mut word = [0u8; 4];
    for value in payload.iter_mut() {
        reader.read_exact(&mut word)?;
        *value = f32::from_le_bytes(word);
    }

    Ok(Frame {
        frame_type,
        n_samp,
        n_ch,
        payload,
    })
}
