use crate::config::GasSorterConfig;
use crate::diagnostics::DiagnosticsModule;
use crate::fixed::Ticks;
use crate::module::{GasModule, ModuleSlot};
use crate::tank::TankTransferModule;
use std::collections::HashMap;

/// Builder for the module pipeline.
/// Three-phase lifecycle: registration -> mutation -> finalization.
#[derive(Debug, Default)]
pub struct ModuleRegistryBuilder {
    slots: Vec<ModuleSlot>,
}

impl ModuleRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase 1: Register a module. Registration order is dispatch order.
    /// Returns its index.
    pub fn register(&mut self, module: GasModule, enabled: bool, interval: Ticks) -> usize {
        self.slots.push(ModuleSlot::new(module, enabled, interval));
        self.slots.len() - 1
    }

    /// Phase 2: Adjust a registered slot by module name.
    pub fn mutate<F>(&mut self, name: &str, f: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut ModuleSlot),
    {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.module.name() == name)
            .ok_or(RegistryError::NotFound(name.to_string()))?;
        f(slot);
        Ok(())
    }

    /// Phase 3: Finalize. Fails if two modules share a name.
    pub fn build(self) -> Result<ModuleRegistry, RegistryError> {
        let mut name_to_index = HashMap::with_capacity(self.slots.len());
        for (index, slot) in self.slots.iter().enumerate() {
            let name = slot.module.name().to_string();
            if name_to_index.insert(name.clone(), index).is_some() {
                return Err(RegistryError::DuplicateModule(name));
            }
        }
        Ok(ModuleRegistry {
            slots: self.slots,
            name_to_index,
        })
    }
}

/// The module pipeline. The set and order of modules is frozen after build();
/// only the per-slot enabled flags and module state change afterwards.
#[derive(Debug)]
pub struct ModuleRegistry {
    slots: Vec<ModuleSlot>,
    name_to_index: HashMap<String, usize>,
}

impl ModuleRegistry {
    /// Tank transfer on every scan, then diagnostics (off until debug is
    /// switched on).
    pub fn standard(config: &GasSorterConfig) -> Self {
        let tanks = TankTransferModule::from_config(&config.transfer);
        let diagnostics = DiagnosticsModule::from_config(&config.diagnostics);
        Self {
            name_to_index: HashMap::from([
                (TankTransferModule::NAME.to_string(), 0),
                (DiagnosticsModule::NAME.to_string(), 1),
            ]),
            slots: vec![
                ModuleSlot::new(GasModule::TankTransfer(tanks), true, config.transfer.interval),
                ModuleSlot::new(
                    GasModule::Diagnostics(diagnostics),
                    false,
                    config.diagnostics.interval,
                ),
            ],
        }
    }

    pub fn slots(&self) -> &[ModuleSlot] {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut [ModuleSlot] {
        &mut self.slots
    }

    pub fn get(&self, name: &str) -> Option<&ModuleSlot> {
        let index = *self.name_to_index.get(name)?;
        self.slots.get(index)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ModuleSlot> {
        let index = *self.name_to_index.get(name)?;
        self.slots.get_mut(index)
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<(), RegistryError> {
        let slot = self
            .get_mut(name)
            .ok_or(RegistryError::NotFound(name.to_string()))?;
        slot.enabled = enabled;
        Ok(())
    }

    /// The first tank transfer module, if registered.
    pub fn tanks(&self) -> Option<&TankTransferModule> {
        self.slots.iter().find_map(|slot| match &slot.module {
            GasModule::TankTransfer(tanks) => Some(tanks),
            _ => None,
        })
    }

    /// The first diagnostics module, if registered.
    pub fn diagnostics(&self) -> Option<&DiagnosticsModule> {
        self.slots.iter().find_map(|slot| match &slot.module {
            GasModule::Diagnostics(diag) => Some(diag),
            _ => None,
        })
    }

    pub fn diagnostics_mut(&mut self) -> Option<&mut DiagnosticsModule> {
        self.slots.iter_mut().find_map(|slot| match &mut slot.module {
            GasModule::Diagnostics(diag) => Some(diag),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate module: {0}")]
    DuplicateModule(String),
    #[error("not found: {0}")]
    NotFound(String),
}
