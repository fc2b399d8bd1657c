//! ADC source abstraction
//!
//! The front-end is a byte stream: a short preamble announcing the channel
//! count and per-channel volt scales, then back-to-back blocks of
//! interleaved little-endian i32 samples. The worker talks to it through
//! `AdcSource`, so tests drive the loop from memory and production uses a
//! TCP endpoint. Any refill failure, including a clean EOF, is fatal to the
//! worker; the control plane restarts it.

use std::io::{BufReader, Read};
use std::net::TcpStream;

use lx_core::{LxError, LxResult};

/// Upper bound on the preamble channel count; anything larger means the
/// stream is not an ADC front-end.
const MAX_SOURCE_CHANNELS: usize = 64;

pub trait AdcSource {
    /// Interleave stride of the raw stream.
    fn channel_count(&self) -> usize;

    /// Per-channel scale factors, volts per count.
    fn scales(&self) -> &[f32];

    /// Refill one block of `block.len()` raw samples, blocking until the
    /// source delivers them.
    fn fill_block(&mut self, block: &mut [i32]) -> LxResult<()>;
}

/// `AdcSource` over any byte stream following the preamble contract.
pub struct StreamSource<R: Read> {
    reader: R,
    scales: Vec<f32>,
    byte_buf: Vec<u8>,
}

impl<R: Read> StreamSource<R> {
    /// Read the preamble and hand back a source ready to stream blocks.
    pub fn open(mut reader: R) -> LxResult<Self> {
        let mut word = [0u8; 4];
        reader.read_exact(&mut word)?;
        let channel_count = u32::from_le_bytes(word) as usize;
        if channel_count == 0 || channel_count > MAX_SOURCE_CHANNELS {
            return Err(LxError::Source(format!(
                "preamble announced {channel_count} channels"
            )));
        }

        let mut scales = vec![0.0f32; channel_count];
        for scale in scales.iter_mut() {
            reader.read_exact(&mut word)?;
            *scale = f32::from_le_bytes(word);
        }

        Ok(Self {
            reader,
            scales,
            byte_buf: Vec::new(),
        })
    }
}

impl<R: Read> AdcSource for StreamSource<R> {
    fn channel_count(&self) -> usize {
        self.scales.len()
    }

    fn scales(&self) -> &[f32] {
        &self.scales
    }

    fn fill_block(&mut self, block: &mut [i32]) -> LxResult<()> {
        // First call sizes the byte buffer; later calls reuse it.
        self.byte_buf.resize(block.len() * 4, 0);
        self.reader.read_exact(&mut self.byte_buf)?;
        for (sample, bytes) in block.iter_mut().zip(self.byte_buf.chunks_exact(4)) {
            *sample = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        Ok(())
    }
}

/// Connect to the ADC front-end at `host:port`.
pub fn connect(endpoint: &str) -> LxResult<StreamSource<BufReader<TcpStream>>> {
    let stream = TcpStream::connect(endpoint)
        .map_err(|err| LxError::Source(format!("connect to {endpoint}: {err}")))?;
    stream
        .set_nodelay(true)
        .map_err(|err| LxError::Source(format!("configure {endpoint}: {err}")))?;
    StreamSource::open(BufReader::new(stream))
}
