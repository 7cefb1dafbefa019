pub mod mock;
pub mod sim;
pub mod variant;

pub use mock::MockTableService;
pub use sim::SimTableService;
pub use variant::TableServiceVariant;
