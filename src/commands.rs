//! Operator command layer.
//!
//! Commands arrive over a kanal channel into the run loop. Contract per
//! command: bump `cmd_counter` or `cmd_err_counter`, emit exactly one primary
//! event, and honor the exclusivity gate before anything that starts a
//! resumable computation.

use crate::engine::{SharedEngine, SharedHost};
use crate::events::{EventId, Severity};
use crate::recompute::{cancel_oneshot, start_oneshot, start_recompute};
use crate::traits::MemAccess;
use crate::types::{Domain, EntryState};

#[derive(Debug, Clone)]
pub enum Command {
    EnableAll,
    DisableAll,
    EnableDomain(Domain),
    DisableDomain(Domain),
    EnableEntry(Domain, usize),
    DisableEntry(Domain, usize),
    ReportBaseline(Domain, usize),
    RecomputeBaseline(Domain, usize),
    GetEntryIdByAddress(Domain, u32),
    OneShot { addr: u32, size: u32, budget: u32 },
    CancelOneShot,
    SendHk,
}

pub fn dispatch(shared: &SharedEngine, host: &SharedHost, cmd: Command) {
    match cmd {
        Command::EnableAll => set_global(shared, EntryState::Enabled),
        Command::DisableAll => set_global(shared, EntryState::Disabled),
        Command::EnableDomain(domain) => set_domain(shared, domain, EntryState::Enabled),
        Command::DisableDomain(domain) => set_domain(shared, domain, EntryState::Disabled),
        Command::EnableEntry(domain, id) => set_entry(shared, domain, id, EntryState::Enabled),
        Command::DisableEntry(domain, id) => set_entry(shared, domain, id, EntryState::Disabled),
        Command::ReportBaseline(domain, id) => report_baseline(shared, domain, id),
        Command::RecomputeBaseline(domain, id) => {
            if validate_entry_id(shared, domain, id) {
                start_recompute(shared, host, domain, id);
            }
        }
        Command::GetEntryIdByAddress(domain, addr) => get_entry_id(shared, domain, addr),
        Command::OneShot { addr, size, budget } => {
            if validate_oneshot_range(shared, addr, size) {
                start_oneshot(shared, host, addr, size, budget);
            }
        }
        Command::CancelOneShot => cancel_oneshot(shared, host),
        Command::SendHk => send_hk(shared),
    }
}

fn set_global(shared: &SharedEngine, state: EntryState) {
    let mut engine = shared.lock().unwrap();
    engine.checksum_state = state;
    engine.persist_switches();
    engine.bump_cmd();
    engine.events.emit(
        EventId::CmdGlobalState,
        Severity::Info,
        format!("global checksumming {state:?}"),
    );
}

fn set_domain(shared: &SharedEngine, domain: Domain, state: EntryState) {
    let mut engine = shared.lock().unwrap();
    engine.domains[domain.slot()].state = state;
    engine.persist_switches();
    engine.bump_cmd();
    engine.events.emit(
        EventId::CmdDomainState,
        Severity::Info,
        format!("{domain} checksumming {state:?}"),
    );
}

fn set_entry(shared: &SharedEngine, domain: Domain, id: usize, state: EntryState) {
    let mut engine = shared.lock().unwrap();
    let definable = engine
        .results(domain)
        .get(id)
        .map(|e| e.state != EntryState::Empty)
        .unwrap_or(false);
    if !definable {
        engine.bump_cmd_err();
        engine.events.emit(
            EventId::CmdInvalidEntry,
            Severity::Error,
            format!("{domain} entry {id}: invalid or empty"),
        );
        return;
    }
    engine.results_mut(domain)[id].state = state;
    engine.set_def_state(domain, id, state);
    engine.bump_cmd();
    engine.events.emit(
        EventId::CmdEntryState,
        Severity::Info,
        format!("{domain} entry {id} {state:?}"),
    );
}

fn report_baseline(shared: &SharedEngine, domain: Domain, id: usize) {
    let mut engine = shared.lock().unwrap();
    let Some(entry) = engine.results(domain).get(id) else {
        engine.bump_cmd_err();
        engine.events.emit(
            EventId::CmdInvalidEntry,
            Severity::Error,
            format!("{domain} entry {id}: out of range"),
        );
        return;
    };
    let text = if entry.computed {
        format!(
            "{domain} entry {id} baseline: {:#010x}",
            entry.comparison
        )
    } else {
        format!("{domain} entry {id}: baseline not yet computed")
    };
    engine.bump_cmd();
    engine
        .events
        .emit(EventId::CmdBaselineReport, Severity::Info, text);
}

fn validate_entry_id(shared: &SharedEngine, domain: Domain, id: usize) -> bool {
    let mut engine = shared.lock().unwrap();
    let valid = engine
        .results(domain)
        .get(id)
        .map(|e| e.state != EntryState::Empty)
        .unwrap_or(false);
    if !valid {
        engine.bump_cmd_err();
        engine.events.emit(
            EventId::CmdInvalidEntry,
            Severity::Error,
            format!("{domain} entry {id}: invalid or empty"),
        );
    }
    valid
}

/// First non-Empty entry whose range covers `addr`. Exactly one result event
/// either way.
fn get_entry_id(shared: &SharedEngine, domain: Domain, addr: u32) {
    let mut engine = shared.lock().unwrap();
    if !matches!(domain, Domain::Eeprom | Domain::Memory) {
        engine.bump_cmd_err();
        engine.events.emit(
            EventId::CmdInvalidEntry,
            Severity::Error,
            format!("{domain}: entry lookup by address not supported"),
        );
        return;
    }
    let found = engine.results(domain).iter().position(|e| {
        e.state != EntryState::Empty
            && addr >= e.addr
            && addr < e.addr.saturating_add(e.len)
    });
    let text = match found {
        Some(id) => format!("{domain} address {addr:#010x} matches entry {id}"),
        None => format!("{domain} address {addr:#010x} matches no entry"),
    };
    engine.bump_cmd();
    engine
        .events
        .emit(EventId::CmdEntryIdResult, Severity::Info, text);
}

fn send_hk(shared: &SharedEngine) {
    let mut engine = shared.lock().unwrap();
    engine.bump_cmd();
    let snapshot = engine.hk_snapshot();
    let text = serde_json::to_string(&snapshot)
        .unwrap_or_else(|_| "housekeeping serialization failed".to_string());
    engine.events.emit(EventId::HkReport, Severity::Debug, text);
}

fn validate_oneshot_range(shared: &SharedEngine, addr: u32, size: u32) -> bool {
    let mut engine = shared.lock().unwrap();
    let valid = size > 0 && engine.bus.validate_range(addr, size);
    if !valid {
        engine.bump_cmd_err();
        engine.events.emit(
            EventId::OneShotError,
            Severity::Error,
            format!("one-shot rejected: invalid range addr {addr:#010x} size {size:#x}"),
        );
    }
    valid
}
