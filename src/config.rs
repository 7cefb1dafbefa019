use clap::Parser;
use serde::{Deserialize, Serialize};

/// Base configuration for the monitor.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "sumwarden", about = "Background data-integrity monitor")]
pub struct BaseConfig {
    /// Maximum bytes checksummed per background cycle.
    #[arg(long, default_value_t = 16 * 1024)]
    pub max_bytes_per_cycle: u32,

    /// Bytes per compute step inside a recompute child task.
    #[arg(long, default_value_t = 32 * 1024)]
    pub recompute_bytes_per_step: u32,

    /// Background wakeup period in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub tick_millis: u64,

    /// Entries in each of the Eeprom/Memory definition tables.
    #[arg(long, default_value_t = 16)]
    pub mem_table_entries: usize,

    /// Entries in each of the Tables/Apps definition tables.
    #[arg(long, default_value_t = 24)]
    pub name_table_entries: usize,

    /// Maximum characters per table-name component (`App.Table`);
    /// longer components are truncated.
    #[arg(long, default_value_t = 38)]
    pub max_name_component: usize,

    /// Application name used for table ownership checks.
    #[arg(long, default_value = "SUMWARDEN")]
    pub app_name: String,

    /// Eeprom definition table file (JSON array); built-in default when absent.
    #[arg(long)]
    pub eeprom_defs: Option<String>,

    /// Memory definition table file (JSON array).
    #[arg(long)]
    pub memory_defs: Option<String>,

    /// Tables definition table file (JSON array).
    #[arg(long)]
    pub tables_defs: Option<String>,

    /// Apps definition table file (JSON array).
    #[arg(long)]
    pub apps_defs: Option<String>,

    /// Warm-start mirror file for the enable/disable switches.
    #[arg(long)]
    pub mirror_path: Option<String>,

    /// Simulated cFE core text segment.
    #[arg(long, default_value_t = 0x0010_0000)]
    pub cfecore_addr: u32,
    #[arg(long, default_value_t = 0x0002_0000)]
    pub cfecore_size: u32,

    /// Simulated OS core text segment.
    #[arg(long, default_value_t = 0x0020_0000)]
    pub oscore_addr: u32,
    #[arg(long, default_value_t = 0x0001_0000)]
    pub oscore_size: u32,

    /// Upper bound of the simulated address space.
    #[arg(long, default_value_t = 0x0800_0000)]
    pub mem_limit: u32,
}

impl Default for BaseConfig {
    fn default() -> Self {
        BaseConfig {
            max_bytes_per_cycle: 16 * 1024,
            recompute_bytes_per_step: 32 * 1024,
            tick_millis: 1000,
            mem_table_entries: 16,
            name_table_entries: 24,
            max_name_component: 38,
            app_name: "SUMWARDEN".to_string(),
            eeprom_defs: None,
            memory_defs: None,
            tables_defs: None,
            apps_defs: None,
            mirror_path: None,
            cfecore_addr: 0x0010_0000,
            cfecore_size: 0x0002_0000,
            oscore_addr: 0x0020_0000,
            oscore_size: 0x0001_0000,
            mem_limit: 0x0800_0000,
        }
    }
}
