//! Device Model
//!
//! Module kinds, per-unit cached state, the name registry and the controller
//! that emits a message whenever cached state changes.

mod config;
mod controller;
mod kind;
mod module;

pub use config::{DeviceConfig, ModuleDefinition};
pub use controller::Controller;
pub use kind::{KindDescriptor, ModuleKind};
pub use module::{Module, ModuleRef, SubModule, SubModuleRef, UnitRef};
