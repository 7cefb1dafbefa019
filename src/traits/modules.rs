use crate::types::{ModuleId, ModuleInfo, ModuleStatus};

/// Module registry: resolves loaded applications and libraries by name and
/// reports where their code lives.
pub trait ModuleRegistry: Send {
    /// Identifier for logging/telemetry.
    fn name(&self) -> &'static str;

    fn resolve_app(&self, name: &str) -> Result<ModuleId, ModuleStatus>;

    fn resolve_lib(&self, name: &str) -> Result<ModuleId, ModuleStatus>;

    fn module_info(&self, id: ModuleId) -> Result<ModuleInfo, ModuleStatus>;
}
