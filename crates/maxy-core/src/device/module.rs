//! Module and sub-module state
//!
//! Holds the last value sent for every addressable unit. The cached value is
//! the only record of what the hardware has been told, so updates report a
//! change only when the clamped value differs from it.

use serde::{Deserialize, Serialize};

use super::kind::ModuleKind;
use crate::protocol::commands::INTENSITY_MAX;

/// Handle to a registered module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleRef {
    /// Position of the module on the bus
    pub module: u8,
}

/// Handle to a sub-module of a registered module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubModuleRef {
    /// Position of the parent module on the bus
    pub module: u8,
    /// Sub-module id within the parent
    pub sub_module: u8,
}

impl ModuleRef {
    /// Handle for the module at bus position `module`
    pub fn new(module: u8) -> Self {
        Self { module }
    }

    /// The first sub-module, which carries the module's own target
    pub fn main(self) -> SubModuleRef {
        SubModuleRef::new(self.module, 0)
    }
}

impl SubModuleRef {
    /// Handle for sub-module `sub_module` of module `module`
    pub fn new(module: u8, sub_module: u8) -> Self {
        Self { module, sub_module }
    }

    /// Handle of the owning module
    pub fn parent(self) -> ModuleRef {
        ModuleRef::new(self.module)
    }
}

/// Anything a name can resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitRef {
    /// A whole module
    Module(ModuleRef),
    /// One sub-module
    SubModule(SubModuleRef),
}

/// One independently targetable element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubModule {
    sub_module_id: u8,
    target: i32,
}

impl SubModule {
    /// Sub-module id within the parent
    pub fn id(&self) -> u8 {
        self.sub_module_id
    }

    /// Last target sent
    pub fn target(&self) -> i32 {
        self.target
    }
}

/// A display module on the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    module_index: u8,
    kind: ModuleKind,
    intensity: u8,
    sub_modules: Vec<SubModule>,
}

impl Module {
    /// Create a module in its power-on state
    pub fn new(module_index: u8, kind: ModuleKind) -> Self {
        let initial_target = kind.clamp_target(0);
        let sub_modules = (0..kind.sub_module_count())
            .map(|sub_module_id| SubModule {
                sub_module_id,
                target: initial_target,
            })
            .collect();

        Self {
            module_index,
            kind,
            intensity: 0,
            sub_modules,
        }
    }

    /// Bus position
    pub fn index(&self) -> u8 {
        self.module_index
    }

    /// Hardware kind
    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    /// Last intensity sent
    pub fn intensity(&self) -> u8 {
        self.intensity
    }

    /// Target of sub-module 0
    pub fn main_target(&self) -> i32 {
        self.sub_modules[0].target
    }

    /// All sub-modules in id order
    pub fn sub_modules(&self) -> &[SubModule] {
        &self.sub_modules
    }

    /// Sub-module by id
    pub fn sub_module(&self, sub_module_id: u8) -> Option<&SubModule> {
        self.sub_modules.get(sub_module_id as usize)
    }

    /// Handle for this module
    pub fn handle(&self) -> ModuleRef {
        ModuleRef::new(self.module_index)
    }

    /// Clamp and store a new intensity. Returns the stored value if it changed.
    pub fn update_intensity(&mut self, intensity: i32) -> Option<u8> {
        let intensity = intensity.clamp(0, INTENSITY_MAX as i32) as u8;
        if intensity == self.intensity {
            return None;
        }
        self.intensity = intensity;
        Some(intensity)
    }

    /// Clamp and store a new target for a sub-module. Returns the stored value if it changed.
    ///
    /// `None` is also returned for an unknown sub-module id; callers resolve
    /// handles through [`Module::sub_module`] first.
    pub fn update_target(&mut self, sub_module_id: u8, target: i32) -> Option<i32> {
        let target = self.kind.clamp_target(target);
        let sub = self.sub_modules.get_mut(sub_module_id as usize)?;
        if target == sub.target {
            return None;
        }
        sub.target = target;
        Some(target)
    }
}
