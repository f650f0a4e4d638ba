//! Device topology configuration
//!
//! Describes the module chain and how to reach it, stored as JSON:
//!
//! ```json
//! {
//!   "connection": { "port_name": "/dev/ttyUSB0", "baud_rate": 9600, "timeout_ms": 5000 },
//!   "global_intensity": 3,
//!   "modules": [
//!     { "name": "Right1", "kind": "8x7seg" },
//!     null,
//!     { "name": "tail", "kind": "2x4x7seg", "sub_module_names": ["tail1", "tail2"] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::kind::ModuleKind;
use crate::protocol::{Backoff, ConnectionConfig, ProtocolError};

/// One entry of the module chain, in bus order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDefinition {
    /// Name the module is looked up by
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Hardware kind
    pub kind: ModuleKind,

    /// Names for the sub-modules, by id. Only used for kinds with more than one sub-module.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_module_names: Vec<Option<String>>,
}

impl ModuleDefinition {
    /// An unnamed module
    pub fn new(kind: ModuleKind) -> Self {
        Self {
            name: None,
            kind,
            sub_module_names: Vec::new(),
        }
    }

    /// A named module
    pub fn named(name: impl Into<String>, kind: ModuleKind) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(kind)
        }
    }

    /// Name the sub-modules in id order
    pub fn with_sub_modules<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_module_names = names.into_iter().map(|n| Some(n.into())).collect();
        self
    }
}

fn default_global_intensity() -> u8 {
    3
}

/// Everything needed to bring a display rig up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Serial link settings
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Intensity broadcast after every (re)connect
    #[serde(default = "default_global_intensity")]
    pub global_intensity: u8,

    /// Reconnect pacing
    #[serde(default)]
    pub backoff: Backoff,

    /// Module chain in bus order. `null` reserves a bus position.
    pub modules: Vec<Option<ModuleDefinition>>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            global_intensity: default_global_intensity(),
            backoff: Backoff::default(),
            modules: Vec::new(),
        }
    }
}

impl DeviceConfig {
    /// Parse a configuration from JSON text
    pub fn from_json_str(content: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(content).map_err(|e| ProtocolError::Config(e.to_string()))
    }

    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ProtocolError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| ProtocolError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String, ProtocolError> {
        serde_json::to_string_pretty(self).map_err(|e| ProtocolError::Config(e.to_string()))
    }

    /// Write the configuration to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ProtocolError> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}
