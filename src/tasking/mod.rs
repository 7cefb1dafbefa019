pub mod mock;
pub mod tokio_host;
pub mod variant;

pub use mock::MockTaskHost;
pub use tokio_host::TokioTaskHost;
pub use variant::ChildTaskHostVariant;
