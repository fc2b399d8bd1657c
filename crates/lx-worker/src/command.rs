//! Command channel
//!
//! The worker's stdin carries one command per line: a key and a
//! comma-separated list of decimals. A dedicated thread feeds lines into a
//! channel; the main loop polls at most one line before each block, so a
//! command can never interrupt a block mid-flight. Anything that does not
//! tokenize — unknown key, non-finite or malformed number, over-long list —
//! drops silently, keeping the channel best-effort.

use std::io::BufRead;
use std::thread;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use lx_core::{LxResult, ParamUpdate, MAX_POLY_LEN};

pub struct CommandReader {
    rx: Receiver<String>,
}

impl CommandReader {
    /// Spawn the stdin reader thread. The thread exits when stdin closes.
    pub fn spawn_stdin() -> LxResult<Self> {
        let (tx, rx) = crossbeam_channel::unbounded();
        thread::Builder::new()
            .name("lx-commands".into())
            .spawn(move || read_lines(std::io::stdin().lock(), tx))?;
        Ok(Self { rx })
    }

    /// Build from an existing channel (tests).
    #[cfg(test)]
    pub fn from_channel(rx: Receiver<String>) -> Self {
        Self { rx }
    }

    /// Consume at most one pending line; malformed lines are dropped.
    pub fn poll(&self) -> Option<ParamUpdate> {
        match self.rx.try_recv() {
            Ok(line) => {
                let update = parse_line(&line);
                if update.is_none() {
                    log::debug!("ignoring command line {line:?}");
                }
                update
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

fn read_lines<B: BufRead>(input: B, tx: Sender<String>) {
    for line in input.lines() {
        let Ok(line) = line else { break };
        if tx.send(line).is_err() {
            break;
        }
    }
}

/// Tokenize one command line.
pub fn parse_line(line: &str) -> Option<ParamUpdate> {
    let line = line.trim();
    let (key, tail) = line.split_once(char::is_whitespace)?;

    let mut values = Vec::new();
    for token in tail.split(',') {
        let value: f64 = token.trim().parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        values.push(value);
    }
    if values.is_empty() || values.len() > MAX_POLY_LEN {
        return None;
    }

    match key {
        "y1_den" => Some(ParamUpdate::Y1Den(values)),
        "y2_coeffs" => Some(ParamUpdate::Y2Coeffs(values)),
        "y3_coeffs" => Some(ParamUpdate::Y3Coeffs(values)),
        "yt_coeffs" => {
            if values.len() == 2 {
                Some(ParamUpdate::YtAffine {
                    e: values[0],
                    f: values[1],
                })
            } else {
                None
            }
        }
        _ => None,
    }
}
