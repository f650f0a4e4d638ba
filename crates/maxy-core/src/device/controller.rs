//! Module controller
//!
//! Owns the registered module chain, resolves names to typed handles and turns
//! every observed state change into exactly one framed message on the
//! attached transport.

use serialport::SerialPort;
use std::collections::HashMap;

use super::config::ModuleDefinition;
use super::module::{Module, ModuleRef, SubModuleRef, UnitRef};
use crate::protocol::commands::MODULE_INDEX_MAX;
use crate::protocol::{
    open_port, Command, ConnectionConfig, ConnectionState, ProtocolError, Transport,
};

/// Controller for a chain of display modules
pub struct Controller<T> {
    /// Bus positions; `None` marks a reserved address
    slots: Vec<Option<Module>>,
    /// Name lookup for modules and sub-modules
    names: HashMap<String, UnitRef>,
    /// Attached sink, if any
    transport: Option<T>,
    /// Current connection state
    state: ConnectionState,
}

impl<T> Default for Controller<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            names: HashMap::new(),
            transport: None,
            state: ConnectionState::Disconnected,
        }
    }
}

impl<T: Transport> Controller<T> {
    /// Create a controller with no modules and no transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a controller and register `definitions`
    pub fn with_modules<I, D>(definitions: I) -> Result<Self, ProtocolError>
    where
        I: IntoIterator<Item = D>,
        D: Into<Option<ModuleDefinition>>,
    {
        let mut controller = Self::new();
        controller.register(definitions)?;
        Ok(controller)
    }

    /// Replace the whole module chain.
    ///
    /// Module indices are the positions in `definitions`. A `None` entry
    /// reserves its position: no module lives there and nothing is sent to it.
    /// Sub-module names are only registered for kinds with more than one
    /// sub-module. On error the previous chain is kept.
    pub fn register<I, D>(&mut self, definitions: I) -> Result<(), ProtocolError>
    where
        I: IntoIterator<Item = D>,
        D: Into<Option<ModuleDefinition>>,
    {
        let mut slots = Vec::new();
        let mut names = HashMap::new();

        for (position, def) in definitions.into_iter().enumerate() {
            if position > MODULE_INDEX_MAX as usize {
                return Err(ProtocolError::OutOfRange {
                    field: "module_index",
                    value: position as i64,
                    min: 0,
                    max: MODULE_INDEX_MAX as i64,
                });
            }
            let def: Option<ModuleDefinition> = def.into();
            let Some(def) = def else {
                slots.push(None);
                continue;
            };
            let module = Module::new(position as u8, def.kind);
            let handle = module.handle();

            if let Some(name) = def.name {
                insert_name(&mut names, name, UnitRef::Module(handle));
            }

            if def.kind.sub_module_count() > 1 {
                let ids = 0..def.kind.sub_module_count();
                for (sub_module_id, name) in ids.zip(def.sub_module_names) {
                    if let Some(name) = name {
                        let sub = SubModuleRef::new(handle.module, sub_module_id);
                        insert_name(&mut names, name, UnitRef::SubModule(sub));
                    }
                }
            }

            slots.push(Some(module));
        }

        tracing::info!(
            slots = slots.len(),
            modules = slots.iter().flatten().count(),
            names = names.len(),
            "registered modules"
        );
        self.slots = slots;
        self.names = names;
        Ok(())
    }

    /// Registered modules in bus order, reserved positions skipped
    pub fn modules(&self) -> impl Iterator<Item = &Module> + '_ {
        self.slots.iter().flatten()
    }

    /// Number of bus positions, reserved ones included
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Handle for the module at `index`, if one is registered there
    pub fn module_at(&self, index: u8) -> Option<ModuleRef> {
        self.slots
            .get(index as usize)
            .and_then(Option::as_ref)
            .map(Module::handle)
    }

    /// Resolve a name registered for a module or sub-module
    pub fn lookup(&self, name: &str) -> Option<UnitRef> {
        self.names.get(name).copied()
    }

    /// Resolve a module name
    pub fn module_ref(&self, name: &str) -> Result<ModuleRef, ProtocolError> {
        match self.lookup(name) {
            Some(UnitRef::Module(module)) => Ok(module),
            _ => Err(ProtocolError::UnknownUnit(name.to_string())),
        }
    }

    /// Resolve a sub-module name
    pub fn sub_module_ref(&self, name: &str) -> Result<SubModuleRef, ProtocolError> {
        match self.lookup(name) {
            Some(UnitRef::SubModule(sub)) => Ok(sub),
            _ => Err(ProtocolError::UnknownUnit(name.to_string())),
        }
    }

    /// Handle for sub-module `sub_module_id` of `module`
    pub fn sub_module_of(
        &self,
        module: ModuleRef,
        sub_module_id: u8,
    ) -> Result<SubModuleRef, ProtocolError> {
        let sub = SubModuleRef::new(module.module, sub_module_id);
        self.get(module)?
            .sub_module(sub_module_id)
            .map(|_| sub)
            .ok_or_else(|| unknown_sub_module(sub))
    }

    /// Get a registered module
    pub fn get(&self, module: ModuleRef) -> Result<&Module, ProtocolError> {
        self.slots
            .get(module.module as usize)
            .and_then(Option::as_ref)
            .ok_or_else(|| unknown_module(module))
    }

    fn get_mut(&mut self, module: ModuleRef) -> Result<&mut Module, ProtocolError> {
        self.slots
            .get_mut(module.module as usize)
            .and_then(Option::as_mut)
            .ok_or_else(|| unknown_module(module))
    }

    /// Cached intensity of a module
    pub fn intensity(&self, module: ModuleRef) -> Result<u8, ProtocolError> {
        Ok(self.get(module)?.intensity())
    }

    /// Cached target of a sub-module
    pub fn target(&self, sub: SubModuleRef) -> Result<i32, ProtocolError> {
        self.get(sub.parent())?
            .sub_module(sub.sub_module)
            .map(|s| s.target())
            .ok_or_else(|| unknown_sub_module(sub))
    }

    /// Get the current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether a transport is attached
    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// The attached transport
    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    /// The attached transport, mutably
    pub fn transport_mut(&mut self) -> Option<&mut T> {
        self.transport.as_mut()
    }

    /// Attach a transport without sending anything. Returns the previous one.
    ///
    /// Cached intensities and targets survive; the hardware may not have them.
    pub fn attach(&mut self, transport: T) -> Option<T> {
        self.state = ConnectionState::Connected;
        self.transport.replace(transport)
    }

    /// Detach and return the transport
    pub fn detach(&mut self) -> Option<T> {
        self.state = ConnectionState::Disconnected;
        self.transport.take()
    }

    /// Attach a transport and announce every module type
    pub fn connect(&mut self, transport: T) -> Result<(), ProtocolError> {
        self.attach(transport);
        tracing::info!(
            modules = self.modules().count(),
            "connected, configuring module types"
        );
        self.configure_module_types()
    }

    /// Encode, frame and write one command
    pub fn send(&mut self, command: Command) -> Result<(), ProtocolError> {
        let bytes = command.to_frame()?.to_bytes();
        let transport = self.transport.as_mut().ok_or(ProtocolError::NotConnected)?;

        tracing::debug!(?command, frame = ?bytes, "sending");
        match transport.write_frame(&bytes) {
            Ok(()) => {
                self.state = ConnectionState::Connected;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(?command, error = %e, "write failed");
                self.state = ConnectionState::Error;
                Err(e)
            }
        }
    }

    /// Set a module's intensity, clamped to 0..=15.
    ///
    /// Returns whether a message was sent. The cache keeps the new value even
    /// if the write fails.
    pub fn set_intensity(
        &mut self,
        module: ModuleRef,
        intensity: i32,
    ) -> Result<bool, ProtocolError> {
        let Some(intensity) = self.get_mut(module)?.update_intensity(intensity) else {
            return Ok(false);
        };
        self.send(Command::SetModuleIntensity {
            module: module.module,
            intensity,
        })?;
        Ok(true)
    }

    /// Set a sub-module's target, clamped to its kind's range.
    ///
    /// Returns whether a message was sent. The cache keeps the new value even
    /// if the write fails.
    pub fn set_target(
        &mut self,
        sub: SubModuleRef,
        target: i32,
        immediate: bool,
    ) -> Result<bool, ProtocolError> {
        let module = self.get_mut(sub.parent())?;
        if module.sub_module(sub.sub_module).is_none() {
            return Err(unknown_sub_module(sub));
        }
        let Some(target) = module.update_target(sub.sub_module, target) else {
            return Ok(false);
        };

        let command = if immediate {
            Command::SetSubModuleImmediateTarget {
                module: sub.module,
                sub_module: sub.sub_module,
                target,
            }
        } else {
            Command::SetSubModuleTarget {
                module: sub.module,
                sub_module: sub.sub_module,
                target,
            }
        };
        self.send(command)?;
        Ok(true)
    }

    /// Set a module's own target through sub-module 0
    pub fn set_main_target(
        &mut self,
        module: ModuleRef,
        target: i32,
        immediate: bool,
    ) -> Result<bool, ProtocolError> {
        let kind = self.get(module)?.kind();
        if !kind.allows_direct_main_target_change() {
            return Err(ProtocolError::UnsupportedOperation(format!(
                "module {} ({:?}) has no main target, set its sub-modules instead",
                module.module, kind
            )));
        }
        self.set_target(module.main(), target, immediate)
    }

    /// Set a target by registered name, module or sub-module
    pub fn set_named_target(
        &mut self,
        name: &str,
        target: i32,
        immediate: bool,
    ) -> Result<bool, ProtocolError> {
        match self.lookup(name) {
            Some(UnitRef::Module(module)) => self.set_main_target(module, target, immediate),
            Some(UnitRef::SubModule(sub)) => self.set_target(sub, target, immediate),
            None => Err(ProtocolError::UnknownUnit(name.to_string())),
        }
    }

    /// Send `SetModuleType` for every module, in bus order
    pub fn configure_module_types(&mut self) -> Result<(), ProtocolError> {
        let commands: Vec<Command> = self
            .modules()
            .map(|m| Command::SetModuleType {
                module: m.index(),
                module_type: m.kind().type_id(),
            })
            .collect();

        for command in commands {
            self.send(command)?;
        }
        Ok(())
    }

    /// Broadcast an intensity to every module. Per-module caches are not touched.
    pub fn set_global_intensity(&mut self, intensity: u8) -> Result<(), ProtocolError> {
        self.send(Command::SetAllIntensity { intensity })
    }

    /// Ask every module to drop its configuration
    pub fn reset_config(&mut self) -> Result<(), ProtocolError> {
        self.send(Command::ResetConfig)
    }

    /// Set a module's animation speed divider (0..=65000)
    pub fn set_speed_divider(
        &mut self,
        module: ModuleRef,
        speed_divider: u16,
    ) -> Result<(), ProtocolError> {
        self.get(module)?;
        self.send(Command::SetModuleSpeedDivider {
            module: module.module,
            speed_divider,
        })
    }
}

impl Controller<Box<dyn SerialPort>> {
    /// Open the serial port in `config` and announce every module type
    pub fn connect_serial(&mut self, config: &ConnectionConfig) -> Result<(), ProtocolError> {
        self.state = ConnectionState::Connecting;
        tracing::info!(port = %config.port_name, baud = config.baud_rate, "connecting");
        match open_port(config) {
            Ok(port) => self.connect(port),
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                Err(e)
            }
        }
    }
}

fn insert_name(names: &mut HashMap<String, UnitRef>, name: String, unit: UnitRef) {
    if let Some(previous) = names.insert(name.clone(), unit) {
        tracing::warn!(%name, ?previous, ?unit, "name registered twice, keeping the later one");
    }
}

fn unknown_module(module: ModuleRef) -> ProtocolError {
    ProtocolError::UnknownUnit(format!("module #{}", module.module))
}

fn unknown_sub_module(sub: SubModuleRef) -> ProtocolError {
    ProtocolError::UnknownUnit(format!("module #{} sub-module #{}", sub.module, sub.sub_module))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::ModuleKind;
    use pretty_assertions::assert_eq;

    fn rig() -> Controller<Vec<u8>> {
        let mut controller = Controller::with_modules(vec![
            ModuleDefinition::named("Right1", ModuleKind::EightBy7Seg),
            ModuleDefinition::named("tail", ModuleKind::TwoByFourBy7Seg)
                .with_sub_modules(["tail1", "tail2"]),
        ])
        .unwrap();
        controller.attach(Vec::new());
        controller
    }

    fn sent(controller: &Controller<Vec<u8>>) -> Vec<u8> {
        controller.transport().cloned().unwrap_or_default()
    }

    #[test]
    fn test_register_assigns_positions_and_names() {
        let controller = rig();
        assert_eq!(controller.modules().count(), 2);
        assert_eq!(controller.lookup("Right1"), Some(UnitRef::Module(ModuleRef::new(0))));
        assert_eq!(controller.lookup("tail"), Some(UnitRef::Module(ModuleRef::new(1))));
        assert_eq!(
            controller.lookup("tail2"),
            Some(UnitRef::SubModule(SubModuleRef::new(1, 1)))
        );
        assert_eq!(controller.module_at(1), Some(ModuleRef::new(1)));
        assert_eq!(controller.module_at(2), None);
    }

    #[test]
    fn test_single_sub_module_names_are_ignored() {
        let controller: Controller<Vec<u8>> = Controller::with_modules(vec![
            ModuleDefinition::named("solo", ModuleKind::EightBy7Seg).with_sub_modules(["digit"]),
        ])
        .unwrap();
        assert_eq!(controller.lookup("digit"), None);
    }

    #[test]
    fn test_register_too_many_modules_keeps_previous_chain() {
        let mut controller = rig();
        let err = controller
            .register(vec![ModuleDefinition::new(ModuleKind::Generic); 65])
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::OutOfRange {
                field: "module_index",
                value: 64,
                ..
            }
        ));
        assert_eq!(controller.modules().count(), 2);
        assert!(controller.lookup("tail1").is_some());
    }

    #[test]
    fn test_reserved_slot_keeps_positions() {
        let mut controller: Controller<Vec<u8>> = Controller::with_modules(vec![
            Some(ModuleDefinition::named("Right1", ModuleKind::EightBy7Seg)),
            None,
            Some(ModuleDefinition::named("Right2", ModuleKind::EightBy7Seg)),
        ])
        .unwrap();
        controller.attach(Vec::new());

        assert_eq!(controller.slot_count(), 3);
        assert_eq!(controller.modules().count(), 2);
        assert_eq!(controller.module_at(1), None);
        assert_eq!(controller.module_ref("Right2").unwrap(), ModuleRef::new(2));
        assert!(controller.set_intensity(ModuleRef::new(1), 4).is_err());

        controller.configure_module_types().unwrap();
        assert_eq!(
            sent(&controller),
            vec![0xFD, 0x3A, 0x00, 0x03, 0xFE, 0xFD, 0x3A, 0x02, 0x03, 0xFE]
        );
    }

    #[test]
    fn test_reregister_replaces_everything() {
        let mut controller = rig();
        controller
            .register(vec![ModuleDefinition::named("Left1", ModuleKind::EightBy7Seg)])
            .unwrap();
        assert_eq!(controller.modules().count(), 1);
        assert_eq!(controller.lookup("Right1"), None);
        assert_eq!(controller.lookup("Left1"), Some(UnitRef::Module(ModuleRef::new(0))));
    }

    #[test]
    fn test_set_intensity_dedups() {
        let mut controller = rig();
        let right1 = controller.module_ref("Right1").unwrap();
        assert!(controller.set_intensity(right1, 7).unwrap());
        assert!(!controller.set_intensity(right1, 7).unwrap());
        assert_eq!(sent(&controller), vec![0xFD, 0x46, 0x00, 0x07, 0xFE]);
        assert_eq!(controller.intensity(right1).unwrap(), 7);
    }

    #[test]
    fn test_immediate_target_uses_immediate_opcode() {
        let mut controller = rig();
        let tail1 = controller.sub_module_ref("tail1").unwrap();
        assert!(controller.set_target(tail1, -1, true).unwrap());
        assert_eq!(
            sent(&controller),
            vec![0xFD, 0x45, 0x01, 0x00, 0xFC, 0xFF, 0xFC, 0xFF, 0xFC, 0xFF, 0xFC, 0xFF, 0xFE]
        );
    }

    #[test]
    fn test_main_target_forbidden_on_split_module() {
        let mut controller = rig();
        let tail = controller.module_ref("tail").unwrap();
        let err = controller.set_main_target(tail, 5, false).unwrap_err();
        assert!(matches!(err, ProtocolError::UnsupportedOperation(_)));
        assert!(sent(&controller).is_empty());
        assert_eq!(controller.target(SubModuleRef::new(1, 0)).unwrap(), 0);
    }

    #[test]
    fn test_unknown_sub_module_handle() {
        let mut controller = rig();
        let err = controller
            .set_target(SubModuleRef::new(0, 1), 10, false)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownUnit(_)));
        assert!(controller.sub_module_of(ModuleRef::new(1), 2).is_err());
        assert_eq!(
            controller.sub_module_of(ModuleRef::new(1), 1).unwrap(),
            SubModuleRef::new(1, 1)
        );
    }

    #[test]
    fn test_not_connected_keeps_optimistic_cache() {
        let mut controller = rig();
        controller.detach();
        let right1 = controller.module_ref("Right1").unwrap();
        let err = controller.set_main_target(right1, 12, false).unwrap_err();
        assert!(matches!(err, ProtocolError::NotConnected));
        assert_eq!(controller.target(right1.main()).unwrap(), 12);
        assert_eq!(controller.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_configure_module_types() {
        let mut controller = rig();
        controller.configure_module_types().unwrap();
        assert_eq!(
            sent(&controller),
            vec![0xFD, 0x3A, 0x00, 0x03, 0xFE, 0xFD, 0x3A, 0x01, 0x04, 0xFE]
        );
    }

    #[test]
    fn test_speed_divider_and_reset() {
        let mut controller = rig();
        controller.set_speed_divider(ModuleRef::new(1), 300).unwrap();
        controller.reset_config().unwrap();
        assert_eq!(
            sent(&controller),
            vec![0xFD, 0x47, 0x01, 0x01, 0x2C, 0xFE, 0xFD, 0x32, 0xFE]
        );
        assert!(controller.set_speed_divider(ModuleRef::new(9), 1).is_err());
    }
}
