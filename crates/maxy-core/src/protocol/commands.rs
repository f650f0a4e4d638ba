//! Protocol commands
//!
//! Defines the messages understood by Maxy display modules and their wire layout.
//! Every payload is an opcode byte followed by fixed-width big-endian fields.

use super::error::check_range;
use super::frame::{Frame, PayloadBuilder};
use super::ProtocolError;

/// Message opcodes
pub mod opcode {
    /// Reset configuration of every module
    pub const RESET_CONFIG: u8 = 0x32;
    /// Broadcast intensity
    pub const SET_ALL_INTENSITY: u8 = 0x33;
    /// Assign a module type
    pub const SET_MODULE_TYPE: u8 = 0x3A;
    /// Module enable. Reserved by the firmware, nothing sends it yet.
    pub const ENABLE_MODULE: u8 = 0x3B;
    /// Animated target for a whole module
    pub const SET_MODULE_TARGET: u8 = 0x42;
    /// Animated target for one sub-module
    pub const SET_SUB_MODULE_TARGET: u8 = 0x43;
    /// Immediate target for a whole module
    pub const SET_MODULE_IMMEDIATE_TARGET: u8 = 0x44;
    /// Immediate target for one sub-module
    pub const SET_SUB_MODULE_IMMEDIATE_TARGET: u8 = 0x45;
    /// Per-module intensity
    pub const SET_MODULE_INTENSITY: u8 = 0x46;
    /// Per-module animation speed divider
    pub const SET_MODULE_SPEED_DIVIDER: u8 = 0x47;
}

/// Highest addressable module index
pub const MODULE_INDEX_MAX: u8 = 63;
/// Highest sub-module id within a module
pub const SUB_MODULE_MAX: u8 = 7;
/// Highest intensity level
pub const INTENSITY_MAX: u8 = 15;
/// Lowest target accepted on the wire
pub const TARGET_MIN: i32 = -9_999_999;
/// Highest target accepted on the wire
pub const TARGET_MAX: i32 = 99_999_999;
/// Highest speed divider
pub const SPEED_DIVIDER_MAX: u16 = 65_000;
/// Highest module type id
pub const MODULE_TYPE_MAX: u8 = 63;

/// Commands sent from the controller to the modules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Drop all module configuration
    ResetConfig,

    /// Set the intensity of every module at once
    SetAllIntensity { intensity: u8 },

    /// Tell a module which hardware type it is
    SetModuleType { module: u8, module_type: u8 },

    /// Animate a module towards a target
    SetModuleTarget { module: u8, target: i32 },

    /// Animate a sub-module towards a target
    SetSubModuleTarget { module: u8, sub_module: u8, target: i32 },

    /// Jump a module straight to a target
    SetModuleImmediateTarget { module: u8, target: i32 },

    /// Jump a sub-module straight to a target
    SetSubModuleImmediateTarget { module: u8, sub_module: u8, target: i32 },

    /// Set the intensity of one module
    SetModuleIntensity { module: u8, intensity: u8 },

    /// Slow down the animation of one module
    SetModuleSpeedDivider { module: u8, speed_divider: u16 },
}

impl Command {
    /// Get the opcode byte
    pub fn opcode(&self) -> u8 {
        match self {
            Command::ResetConfig => opcode::RESET_CONFIG,
            Command::SetAllIntensity { .. } => opcode::SET_ALL_INTENSITY,
            Command::SetModuleType { .. } => opcode::SET_MODULE_TYPE,
            Command::SetModuleTarget { .. } => opcode::SET_MODULE_TARGET,
            Command::SetSubModuleTarget { .. } => opcode::SET_SUB_MODULE_TARGET,
            Command::SetModuleImmediateTarget { .. } => opcode::SET_MODULE_IMMEDIATE_TARGET,
            Command::SetSubModuleImmediateTarget { .. } => {
                opcode::SET_SUB_MODULE_IMMEDIATE_TARGET
            }
            Command::SetModuleIntensity { .. } => opcode::SET_MODULE_INTENSITY,
            Command::SetModuleSpeedDivider { .. } => opcode::SET_MODULE_SPEED_DIVIDER,
        }
    }

    /// Check every field against its allowed range
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match *self {
            Command::ResetConfig => Ok(()),
            Command::SetAllIntensity { intensity } => {
                check_range("intensity", intensity, 0, INTENSITY_MAX)
            }
            Command::SetModuleType {
                module,
                module_type,
            } => {
                check_module(module)?;
                check_range("module_type", module_type, 0, MODULE_TYPE_MAX)
            }
            Command::SetModuleTarget { module, target }
            | Command::SetModuleImmediateTarget { module, target } => {
                check_module(module)?;
                check_target(target)
            }
            Command::SetSubModuleTarget {
                module,
                sub_module,
                target,
            }
            | Command::SetSubModuleImmediateTarget {
                module,
                sub_module,
                target,
            } => {
                check_module(module)?;
                check_range("sub_module", sub_module, 0, SUB_MODULE_MAX)?;
                check_target(target)
            }
            Command::SetModuleIntensity { module, intensity } => {
                check_module(module)?;
                check_range("intensity", intensity, 0, INTENSITY_MAX)
            }
            Command::SetModuleSpeedDivider {
                module,
                speed_divider,
            } => {
                check_module(module)?;
                check_range("speed_divider", speed_divider, 0, SPEED_DIVIDER_MAX)
            }
        }
    }

    /// Validate and encode the payload. Nothing is produced if any field is out of range.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        self.validate()?;

        let builder = PayloadBuilder::new().opcode(self.opcode());
        let payload = match *self {
            Command::ResetConfig => builder,
            Command::SetAllIntensity { intensity } => builder.byte(intensity),
            Command::SetModuleType {
                module,
                module_type,
            } => builder.byte(module).byte(module_type),
            Command::SetModuleTarget { module, target }
            | Command::SetModuleImmediateTarget { module, target } => {
                builder.byte(module).i32_be(target)
            }
            Command::SetSubModuleTarget {
                module,
                sub_module,
                target,
            }
            | Command::SetSubModuleImmediateTarget {
                module,
                sub_module,
                target,
            } => builder.byte(module).byte(sub_module).i32_be(target),
            Command::SetModuleIntensity { module, intensity } => {
                builder.byte(module).byte(intensity)
            }
            Command::SetModuleSpeedDivider {
                module,
                speed_divider,
            } => builder.byte(module).u16_be(speed_divider),
        };

        Ok(payload.build())
    }

    /// Encode into a frame ready for the wire
    pub fn to_frame(&self) -> Result<Frame, ProtocolError> {
        Ok(Frame::new(self.encode()?))
    }

    /// Get the unescaped payload length for this command
    pub fn payload_len(&self) -> usize {
        match self {
            Command::ResetConfig => 1,
            Command::SetAllIntensity { .. } => 2,
            Command::SetModuleType { .. } | Command::SetModuleIntensity { .. } => 3,
            Command::SetModuleSpeedDivider { .. } => 4,
            Command::SetModuleTarget { .. } | Command::SetModuleImmediateTarget { .. } => 6,
            Command::SetSubModuleTarget { .. } | Command::SetSubModuleImmediateTarget { .. } => 7,
        }
    }
}

fn check_module(module: u8) -> Result<(), ProtocolError> {
    check_range("module_index", module, 0, MODULE_INDEX_MAX)
}

fn check_target(target: i32) -> Result<(), ProtocolError> {
    check_range("target", target, TARGET_MIN, TARGET_MAX)
}
