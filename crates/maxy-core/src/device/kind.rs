//! Module kinds
//!
//! Each hardware variant is described by plain data: how many sub-modules it
//! has, which targets it can show and which type id it announces on the bus.

use serde::{Deserialize, Serialize};

use crate::protocol::commands::{TARGET_MAX, TARGET_MIN};

/// Static description of a module kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindDescriptor {
    /// Number of independently targetable sub-modules (1..=8)
    pub sub_module_count: u8,
    /// Lowest displayable target
    pub target_min: i32,
    /// Highest displayable target
    pub target_max: i32,
    /// Whether the whole module may be targeted through sub-module 0
    pub allows_direct_main_target_change: bool,
    /// Type id sent with `SetModuleType`
    pub type_id: u8,
}

const GENERIC: KindDescriptor = KindDescriptor {
    sub_module_count: 1,
    target_min: TARGET_MIN,
    target_max: TARGET_MAX,
    allows_direct_main_target_change: true,
    type_id: 0,
};

const EIGHT_BY_7SEG: KindDescriptor = KindDescriptor {
    sub_module_count: 1,
    target_min: -9_999_999,
    target_max: 99_999_999,
    allows_direct_main_target_change: true,
    type_id: 3,
};

const TWO_BY_FOUR_BY_7SEG: KindDescriptor = KindDescriptor {
    sub_module_count: 2,
    target_min: -999,
    target_max: 9999,
    allows_direct_main_target_change: false,
    type_id: 4,
};

/// Supported module hardware
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleKind {
    /// Unconfigured module, full target range
    #[default]
    #[serde(rename = "generic")]
    Generic,
    /// One row of eight 7-segment digits
    #[serde(rename = "8x7seg")]
    EightBy7Seg,
    /// Two independent groups of four 7-segment digits
    #[serde(rename = "2x4x7seg")]
    TwoByFourBy7Seg,
}

impl ModuleKind {
    /// All known kinds
    pub const ALL: [ModuleKind; 3] = [
        ModuleKind::Generic,
        ModuleKind::EightBy7Seg,
        ModuleKind::TwoByFourBy7Seg,
    ];

    /// Get the descriptor for this kind
    pub fn descriptor(&self) -> &'static KindDescriptor {
        match self {
            ModuleKind::Generic => &GENERIC,
            ModuleKind::EightBy7Seg => &EIGHT_BY_7SEG,
            ModuleKind::TwoByFourBy7Seg => &TWO_BY_FOUR_BY_7SEG,
        }
    }

    /// Number of sub-modules
    pub fn sub_module_count(&self) -> u8 {
        self.descriptor().sub_module_count
    }

    /// Lowest displayable target
    pub fn target_min(&self) -> i32 {
        self.descriptor().target_min
    }

    /// Highest displayable target
    pub fn target_max(&self) -> i32 {
        self.descriptor().target_max
    }

    /// Whether [`Controller::set_main_target`](super::Controller::set_main_target) is allowed
    pub fn allows_direct_main_target_change(&self) -> bool {
        self.descriptor().allows_direct_main_target_change
    }

    /// Type id announced on the bus
    pub fn type_id(&self) -> u8 {
        self.descriptor().type_id
    }

    /// Clamp a requested target into the displayable range
    pub fn clamp_target(&self, target: i32) -> i32 {
        target.clamp(self.target_min(), self.target_max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::commands::{MODULE_TYPE_MAX, SUB_MODULE_MAX};

    #[test]
    fn test_descriptors_fit_the_wire() {
        for kind in ModuleKind::ALL {
            let d = kind.descriptor();
            assert!(d.sub_module_count >= 1, "{kind:?}");
            assert!(d.sub_module_count <= SUB_MODULE_MAX + 1, "{kind:?}");
            assert!(d.target_min <= d.target_max, "{kind:?}");
            assert!(d.target_min >= TARGET_MIN && d.target_max <= TARGET_MAX, "{kind:?}");
            assert!(d.type_id <= MODULE_TYPE_MAX, "{kind:?}");
        }
    }

    #[test]
    fn test_clamp_target() {
        let kind = ModuleKind::TwoByFourBy7Seg;
        assert_eq!(kind.clamp_target(20000), 9999);
        assert_eq!(kind.clamp_target(-5000), -999);
        assert_eq!(kind.clamp_target(42), 42);
    }

    #[test]
    fn test_kind_names_in_json() {
        let json = serde_json::to_string(&ModuleKind::TwoByFourBy7Seg).unwrap();
        assert_eq!(json, "\"2x4x7seg\"");
        let kind: ModuleKind = serde_json::from_str("\"8x7seg\"").unwrap();
        assert_eq!(kind, ModuleKind::EightBy7Seg);
    }
}
