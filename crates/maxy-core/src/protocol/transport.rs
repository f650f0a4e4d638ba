//! Transport sink
//!
//! Anything that can take a framed message. Serial ports, in-memory buffers and
//! test doubles all go through the same blanket implementation over [`Write`].

use std::io::{self, Write};

use super::ProtocolError;

/// A byte sink for framed messages
pub trait Transport {
    /// Write one complete frame
    fn write_frame(&mut self, bytes: &[u8]) -> Result<(), ProtocolError>;
}

impl<W: Write + ?Sized> Transport for W {
    fn write_frame(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        self.write_all(bytes).map_err(map_io_error)?;
        self.flush().map_err(map_io_error)
    }
}

/// Keep timeouts distinguishable so callers can pick a reconnect strategy
fn map_io_error(e: io::Error) -> ProtocolError {
    match e.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ProtocolError::Timeout,
        _ => ProtocolError::IoError(e),
    }
}
