use std::cell::RefCell;
use std::collections::VecDeque;

use crate::traits::ModuleRegistry;
use crate::types::{ModuleId, ModuleInfo, ModuleStatus};

/// Scripted module registry for testing. Queues pop front-first; exhausted
/// queues fall back to not-found / unavailable.
#[derive(Default)]
pub struct MockModuleRegistry {
    pub app_results: RefCell<VecDeque<Result<ModuleId, ModuleStatus>>>,
    pub lib_results: RefCell<VecDeque<Result<ModuleId, ModuleStatus>>>,
    pub info_results: RefCell<VecDeque<Result<ModuleInfo, ModuleStatus>>>,
    pub lookups: RefCell<Vec<String>>,
}

impl MockModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModuleRegistry for MockModuleRegistry {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn resolve_app(&self, name: &str) -> Result<ModuleId, ModuleStatus> {
        self.lookups.borrow_mut().push(format!("app:{name}"));
        self.app_results
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(ModuleStatus::ErrNameNotFound))
    }

    fn resolve_lib(&self, name: &str) -> Result<ModuleId, ModuleStatus> {
        self.lookups.borrow_mut().push(format!("lib:{name}"));
        self.lib_results
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(ModuleStatus::ErrNameNotFound))
    }

    fn module_info(&self, id: ModuleId) -> Result<ModuleInfo, ModuleStatus> {
        self.lookups.borrow_mut().push(format!("info:{}", id.0));
        self.info_results
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(ModuleStatus::ErrInfoUnavailable))
    }
}
