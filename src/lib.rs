//! Background data-integrity monitor.
//!
//! Walks six checksum domains (cFE core, OS core, Eeprom, user memory,
//! tables, applications) with a budgeted CRC per wakeup tick, compares
//! against stored baselines, and reports every miscompare as an event.

pub mod commands;
pub mod compute;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod membus;
pub mod mirror;
pub mod modreg;
pub mod recompute;
pub mod scheduler;
pub mod sync;
pub mod tableservice;
pub mod tasking;
pub mod telemetry;
pub mod traits;
pub mod types;
pub mod validate;

pub use commands::Command;
pub use config::BaseConfig;
pub use engine::{Engine, SharedEngine, SharedHost, SumWarden};
pub use error::WardenError;
