use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::types::OneShotRecord;

/// Initialize telemetry with tracing and logging.
pub fn init() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sumwarden=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Read-only housekeeping snapshot exposed to the telemetry layer.
/// Domain-indexed arrays follow `Domain::SCAN_ORDER`.
#[derive(Debug, Clone, Serialize)]
pub struct HkSnapshot {
    pub checksum_state: u16,
    pub domain_states: [u16; 6],
    pub cmd_counter: u8,
    pub cmd_err_counter: u8,
    pub domain_err_counters: [u16; 6],
    pub current_table: usize,
    pub current_entry: usize,
    pub pass_counter: u32,
    pub baselines: [u32; 6],
    pub recompute_in_progress: bool,
    pub oneshot_in_progress: bool,
    pub last_oneshot: OneShotRecord,
}
