pub mod mock;
pub mod sim;
pub mod variant;

pub use mock::MockModuleRegistry;
pub use sim::SimModuleRegistry;
pub use variant::ModuleRegistryVariant;
