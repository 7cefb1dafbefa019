pub mod child_task;
pub mod memory;
pub mod modules;
pub mod table_service;

pub use child_task::ChildTaskHost;
pub use child_task::TaskBody;
pub use memory::MemAccess;
pub use modules::ModuleRegistry;
pub use table_service::TableService;
