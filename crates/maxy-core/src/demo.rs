//! Demo Mode - randomized display traffic for bench testing
//!
//! Drives the standard rig (eight 8-digit modules plus a split tail module)
//! with random targets so every digit and sign position gets exercised.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::device::{Controller, ModuleDefinition, ModuleKind};
use crate::protocol::{ProtocolError, Transport};

/// Names of the 8-digit modules, in bus order
pub const DIGIT_MODULE_NAMES: [&str; 8] = [
    "Right1", "Right2", "Right3", "Right4", "Left1", "Left2", "Left3", "Left4",
];

/// The bench rig: eight 8x7seg modules and a 2x4x7seg tail split into `tail1`/`tail2`
pub fn standard_topology() -> Vec<ModuleDefinition> {
    let mut modules: Vec<ModuleDefinition> = DIGIT_MODULE_NAMES
        .iter()
        .map(|name| ModuleDefinition::named(*name, ModuleKind::EightBy7Seg))
        .collect();
    modules.push(
        ModuleDefinition::named("tail", ModuleKind::TwoByFourBy7Seg)
            .with_sub_modules(["tail1", "tail2"]),
    );
    modules
}

/// Where a demo update goes
#[derive(Debug, Clone, Copy)]
enum Slot {
    Name(&'static str),
    Index(u8),
}

/// One demo update: a slot and the inclusive range its target is drawn from
const ROUND: [(Slot, i32, i32); 10] = [
    (Slot::Name("Right1"), -9_999_999, 9_999_999),
    (Slot::Name("tail1"), -999, 9999),
    (Slot::Name("tail2"), -999, 999),
    (Slot::Index(1), -9_999_999, 9_999_999),
    (Slot::Name("Right3"), -9_999_999, 9_999_999),
    (Slot::Index(3), -9_999_999, 9_999_999),
    (Slot::Name("Left1"), -9999, 9999),
    (Slot::Name("Left2"), -999, 999),
    (Slot::Name("Left3"), -99, 99),
    (Slot::Name("Left4"), -9, 9),
];

/// Randomized driver for [`standard_topology`]
pub struct DemoDriver {
    /// Random number generator
    rng: StdRng,
    /// Rounds completed so far
    rounds: u64,
}

impl Default for DemoDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoDriver {
    /// Create a driver seeded from the OS
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            rounds: 0,
        }
    }

    /// Create a reproducible driver
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            rounds: 0,
        }
    }

    /// Number of completed rounds
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Run one round of updates. Returns how many messages were sent.
    ///
    /// `Right1` is snapped to zero first so its next animation always starts
    /// from a known value.
    pub fn tick<T: Transport>(
        &mut self,
        controller: &mut Controller<T>,
    ) -> Result<usize, ProtocolError> {
        let mut sent = 0;

        let right1 = controller.module_ref("Right1")?;
        sent += usize::from(controller.set_main_target(right1, 0, true)?);

        for (slot, min, max) in ROUND {
            let target = self.rng.gen_range(min..=max);
            let changed = match slot {
                Slot::Name(name) => controller.set_named_target(name, target, false)?,
                Slot::Index(index) => {
                    let module = controller
                        .module_at(index)
                        .ok_or_else(|| ProtocolError::UnknownUnit(format!("module #{}", index)))?;
                    controller.set_main_target(module, target, false)?
                }
            };
            sent += usize::from(changed);
        }

        self.rounds += 1;
        tracing::debug!(round = self.rounds, sent, "demo round complete");
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_controller() -> Controller<Vec<u8>> {
        let mut controller = Controller::with_modules(standard_topology()).unwrap();
        controller.attach(Vec::new());
        controller
    }

    #[test]
    fn test_standard_topology() {
        let controller: Controller<Vec<u8>> =
            Controller::with_modules(standard_topology()).unwrap();
        assert_eq!(controller.modules().count(), 9);
        for name in DIGIT_MODULE_NAMES {
            assert!(controller.module_ref(name).is_ok(), "{name}");
        }
        assert!(controller.sub_module_ref("tail1").is_ok());
        assert!(controller.sub_module_ref("tail2").is_ok());
    }

    #[test]
    fn test_tick_stays_in_range() {
        let mut controller = demo_controller();
        let mut driver = DemoDriver::with_seed(7);
        for _ in 0..20 {
            driver.tick(&mut controller).unwrap();
        }
        assert_eq!(driver.rounds(), 20);

        let left4 = controller.module_ref("Left4").unwrap();
        assert!((-9..=9).contains(&controller.target(left4.main()).unwrap()));
        let tail2 = controller.sub_module_ref("tail2").unwrap();
        assert!((-999..=999).contains(&controller.target(tail2).unwrap()));
    }

    #[test]
    fn test_seeded_drivers_agree() {
        let mut a = demo_controller();
        let mut b = demo_controller();
        DemoDriver::with_seed(42).tick(&mut a).unwrap();
        DemoDriver::with_seed(42).tick(&mut b).unwrap();
        assert_eq!(a.transport(), b.transport());
    }

    #[test]
    fn test_tick_requires_standard_names() {
        let mut controller: Controller<Vec<u8>> =
            Controller::with_modules(vec![ModuleDefinition::new(ModuleKind::Generic)]).unwrap();
        assert!(DemoDriver::with_seed(1).tick(&mut controller).is_err());
    }
}
