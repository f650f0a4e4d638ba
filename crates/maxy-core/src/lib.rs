//! # Maxy Core Library
//!
//! Core functionality for driving chains of Maxy display modules.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Frame escaping and delimiting for the module bus
//! - Range-checked encoding of every module command
//! - A device model that caches per-module state and only sends changes
//! - Serial port helpers, JSON topology files and reconnect backoff
//! - A randomized demo driver
//!
//! ## Example
//!
//! ```rust,ignore
//! use maxy_core::device::{Controller, ModuleDefinition, ModuleKind};
//! use maxy_core::protocol::ConnectionConfig;
//!
//! let mut maxy = Controller::with_modules(vec![
//!     ModuleDefinition::named("Right1", ModuleKind::EightBy7Seg),
//! ])?;
//! maxy.connect_serial(&ConnectionConfig::new("/dev/ttyUSB0"))?;
//! maxy.set_global_intensity(3)?;
//! maxy.set_named_target("Right1", 42, false)?;
//! ```

pub mod demo;
pub mod device;
pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::device::{
        Controller, DeviceConfig, ModuleDefinition, ModuleKind, ModuleRef, SubModuleRef, UnitRef,
    };
    pub use crate::protocol::{
        Backoff, Command, ConnectionConfig, ConnectionState, ProtocolError, Transport,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
