pub mod core;
mod tasks;

#[cfg(test)]
mod tests;

use std::sync::{Arc, Mutex};

use crate::tasking::ChildTaskHostVariant;

pub use core::{DomainCtl, Engine};
pub use tasks::SumWarden;

/// All monitor state behind one lock; child tasks and the run loop share it.
pub type SharedEngine = Arc<Mutex<Engine>>;
pub type SharedHost = Arc<Mutex<ChildTaskHostVariant>>;
