pub mod mock;
pub mod sim;
pub mod variant;

pub use mock::MockBus;
pub use sim::SimBus;
pub use variant::MemBusVariant;
