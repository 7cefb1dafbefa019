use std::collections::HashMap;

use crate::traits::ModuleRegistry;
use crate::types::{ModuleId, ModuleInfo, ModuleStatus};

/// In-memory module registry of simulated applications and libraries.
pub struct SimModuleRegistry {
    next: u32,
    apps: HashMap<String, ModuleId>,
    libs: HashMap<String, ModuleId>,
    info: HashMap<ModuleId, ModuleInfo>,
}

impl SimModuleRegistry {
    pub fn new() -> Self {
        Self {
            next: 1,
            apps: HashMap::new(),
            libs: HashMap::new(),
            info: HashMap::new(),
        }
    }

    pub fn insert_app(&mut self, name: &str, addr: u32, size: u32) -> ModuleId {
        let id = ModuleId(self.next);
        self.next += 1;
        self.apps.insert(name.to_string(), id);
        self.info.insert(
            id,
            ModuleInfo {
                addr,
                size,
                valid: true,
            },
        );
        id
    }

    pub fn insert_lib(&mut self, name: &str, addr: u32, size: u32) -> ModuleId {
        let id = ModuleId(self.next);
        self.next += 1;
        self.libs.insert(name.to_string(), id);
        self.info.insert(
            id,
            ModuleInfo {
                addr,
                size,
                valid: true,
            },
        );
        id
    }

    /// Mark a module's address information unusable (e.g. unloaded text).
    pub fn invalidate(&mut self, id: ModuleId) {
        if let Some(info) = self.info.get_mut(&id) {
            info.valid = false;
        }
    }

    pub fn remove_app(&mut self, name: &str) {
        if let Some(id) = self.apps.remove(name) {
            self.info.remove(&id);
        }
    }
}

impl Default for SimModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleRegistry for SimModuleRegistry {
    fn name(&self) -> &'static str {
        "sim"
    }

    fn resolve_app(&self, name: &str) -> Result<ModuleId, ModuleStatus> {
        self.apps
            .get(name)
            .copied()
            .ok_or(ModuleStatus::ErrNameNotFound)
    }

    fn resolve_lib(&self, name: &str) -> Result<ModuleId, ModuleStatus> {
        self.libs
            .get(name)
            .copied()
            .ok_or(ModuleStatus::ErrNameNotFound)
    }

    fn module_info(&self, id: ModuleId) -> Result<ModuleInfo, ModuleStatus> {
        self.info
            .get(&id)
            .copied()
            .ok_or(ModuleStatus::ErrInfoUnavailable)
    }
}
