//! Module Bus Protocol
//!
//! Implements the write-only framed protocol spoken by Maxy display modules.
//!
//! Each message is an opcode plus fixed-width big-endian fields, escaped and
//! wrapped in `0xFD ... 0xFE`. No responses are ever read back.

pub mod commands;
mod connection;
mod error;
pub mod frame;
pub mod serial;
mod transport;

pub use commands::Command;
pub use connection::{Backoff, ConnectionConfig, ConnectionState};
pub use error::ProtocolError;
pub use frame::{escape, frame, Frame, PayloadBuilder};
pub use serial::{list_ports, open_port, PortInfo};
pub use transport::Transport;

/// Default baud rate of the module bus
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default write timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
