use crate::traits::ModuleRegistry;
use crate::types::{ModuleId, ModuleInfo, ModuleStatus};

use super::{MockModuleRegistry, SimModuleRegistry};

/// Enum representing all module registry backends.
pub enum ModuleRegistryVariant {
    Sim(SimModuleRegistry),
    Mock(MockModuleRegistry),
}

impl ModuleRegistryVariant {
    pub fn new_sim() -> Self {
        ModuleRegistryVariant::Sim(SimModuleRegistry::new())
    }

    pub fn new_mock(mock: MockModuleRegistry) -> Self {
        ModuleRegistryVariant::Mock(mock)
    }

    pub fn as_sim_mut(&mut self) -> Option<&mut SimModuleRegistry> {
        match self {
            ModuleRegistryVariant::Sim(inner) => Some(inner),
            _ => None,
        }
    }
}

impl ModuleRegistry for ModuleRegistryVariant {
    fn name(&self) -> &'static str {
        match self {
            ModuleRegistryVariant::Sim(inner) => inner.name(),
            ModuleRegistryVariant::Mock(inner) => inner.name(),
        }
    }

    fn resolve_app(&self, name: &str) -> Result<ModuleId, ModuleStatus> {
        match self {
            ModuleRegistryVariant::Sim(inner) => inner.resolve_app(name),
            ModuleRegistryVariant::Mock(inner) => inner.resolve_app(name),
        }
    }

    fn resolve_lib(&self, name: &str) -> Result<ModuleId, ModuleStatus> {
        match self {
            ModuleRegistryVariant::Sim(inner) => inner.resolve_lib(name),
            ModuleRegistryVariant::Mock(inner) => inner.resolve_lib(name),
        }
    }

    fn module_info(&self, id: ModuleId) -> Result<ModuleInfo, ModuleStatus> {
        match self {
            ModuleRegistryVariant::Sim(inner) => inner.module_info(id),
            ModuleRegistryVariant::Mock(inner) => inner.module_info(id),
        }
    }
}
