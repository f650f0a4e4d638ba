//! Frame encoding
//!
//! Wraps a command payload for transmission on the module bus.
//!
//! Frame format:
//! - 1 byte: `0xFD` start delimiter
//! - N bytes: escaped payload
//! - 1 byte: `0xFE` end delimiter
//!
//! Any payload byte at or above `0xFC` is prefixed with the `0xFC` escape
//! byte, so a literal `0xFC` is sent doubled and the delimiters never appear
//! unescaped between them. The bus is write-only, there is no decoder.

use byteorder::{BigEndian, ByteOrder};

/// Start-of-frame delimiter
pub const FRAME_START: u8 = 0xFD;

/// End-of-frame delimiter
pub const FRAME_END: u8 = 0xFE;

/// Escape prefix
pub const FRAME_ESCAPE: u8 = 0xFC;

/// Escape a payload so it can sit between the frame delimiters
pub fn escape(payload: &[u8]) -> Vec<u8> {
    let mut escaped = Vec::with_capacity(payload.len() + 2);
    for &c in payload {
        if c >= FRAME_ESCAPE {
            escaped.push(FRAME_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Escape and delimit a payload
pub fn frame(payload: &[u8]) -> Vec<u8> {
    Frame::new(payload.to_vec()).to_bytes()
}

/// A single framed message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Unescaped payload (opcode followed by fields)
    pub payload: Vec<u8>,
}

impl Frame {
    /// Create a new frame with the given payload
    pub fn new(payload: Vec<u8>) -> Self {
        Self { payload }
    }

    /// Encode the frame to raw bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.encoded_size());
        bytes.push(FRAME_START);
        bytes.extend_from_slice(&escape(&self.payload));
        bytes.push(FRAME_END);
        bytes
    }

    /// Get the total encoded size, escape bytes included
    pub fn encoded_size(&self) -> usize {
        let escapes = self.payload.iter().filter(|&&c| c >= FRAME_ESCAPE).count();
        2 + self.payload.len() + escapes
    }
}

/// Builder for command payloads
pub struct PayloadBuilder {
    payload: Vec<u8>,
}

impl PayloadBuilder {
    /// Create a new payload builder
    pub fn new() -> Self {
        Self {
            payload: Vec::with_capacity(8),
        }
    }

    /// Add the opcode byte
    pub fn opcode(mut self, opcode: u8) -> Self {
        self.payload.push(opcode);
        self
    }

    /// Add a single byte
    pub fn byte(mut self, b: u8) -> Self {
        self.payload.push(b);
        self
    }

    /// Add a 16-bit value (big-endian)
    pub fn u16_be(mut self, value: u16) -> Self {
        let mut bytes = [0u8; 2];
        BigEndian::write_u16(&mut bytes, value);
        self.payload.extend_from_slice(&bytes);
        self
    }

    /// Add a signed 32-bit value (big-endian, two's complement)
    pub fn i32_be(mut self, value: i32) -> Self {
        let mut bytes = [0u8; 4];
        BigEndian::write_i32(&mut bytes, value);
        self.payload.extend_from_slice(&bytes);
        self
    }

    /// Finish and return the raw payload
    pub fn build(self) -> Vec<u8> {
        self.payload
    }
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}
