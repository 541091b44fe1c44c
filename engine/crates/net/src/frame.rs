use thiserror::Error;

use crate::protocol::Packet;

pub const DEFAULT_MAX_LINE_LEN: usize = 4096;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialize a packet as one newline-terminated JSON line.
pub fn encode_packet(packet: &Packet) -> Result<Vec<u8>, FrameError> {
    let mut bytes = serde_json::to_vec(packet)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decode one inbound line. Anything that is not a JSON packet is taken
/// verbatim as a `MESSAGE`, so plain line-mode clients still work.
pub fn decode_line(line: &str) -> Packet {
    let trimmed = line.trim_start();
    if trimmed.starts_with('{') {
        if let Ok(packet) = serde_json::from_str::<Packet>(trimmed) {
            return packet;
        }
    }
    Packet::text(line)
}

/// Accumulates raw bytes from the socket and yields complete packets.
pub struct FrameBuffer {
    buf: Vec<u8>,
    max_len: usize,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_LINE_LEN)
    }

    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_len,
        }
    }

    /// Feed raw data into the buffer. Returns any complete packets.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Packet> {
        let mut packets = Vec::new();

        for &byte in data {
            match byte {
                b'\n' => {
                    let line = self.take_line();
                    packets.push(decode_line(&line));
                }
                b'\r' => {}
                _ => {
                    // Overlong lines are truncated, not split.
                    if self.buf.len() < self.max_len {
                        self.buf.push(byte);
                    }
                }
            }
        }

        packets
    }

    /// Bytes of an incomplete line still waiting for its newline.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        line
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
