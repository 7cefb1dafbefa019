//! Incremental checksum engine.
//!
//! One call processes at most `budget` bytes of an entry, threading the
//! partial CRC accumulator through the platform primitive and advancing the
//! resume cursor. Completion either establishes the baseline (first pass) or
//! compares against it. Tables/Apps entries resolve a live address first;
//! resolution failure is `NotFound`, reported with one diagnostic event.

use crate::events::{EventId, EventLog, Severity};
use crate::traits::{MemAccess, ModuleRegistry, TableService};
use crate::types::{
    ModuleStatus, ResultEntry, StepOutcome, StepStatus, TableStatus,
};

/// One budgeted CRC step over `[addr, addr + len)` using the entry's cursor.
/// Returns the running value and whether the range is finished; cursor fields
/// are zeroed on completion.
fn step_region(
    bus: &dyn MemAccess,
    entry: &mut ResultEntry,
    addr: u32,
    len: u32,
    budget: u32,
) -> Result<(u32, bool), crate::error::WardenError> {
    let remaining = len.saturating_sub(entry.byte_offset);
    let take = remaining.min(budget);
    let value = bus.crc_range(addr + entry.byte_offset, take, entry.temp)?;
    entry.byte_offset += take;
    if entry.byte_offset >= len {
        entry.reset_cursor();
        Ok((value, true))
    } else {
        entry.temp = value;
        Ok((value, false))
    }
}

/// Completion bookkeeping shared by all domains: first completion records the
/// baseline, later completions compare against it.
fn finish_entry(entry: &mut ResultEntry, value: u32) -> StepOutcome {
    if !entry.computed {
        entry.computed = true;
        entry.comparison = value;
        return StepOutcome {
            status: StepStatus::Success,
            done: true,
            value,
        };
    }
    let status = if value == entry.comparison {
        StepStatus::Success
    } else {
        StepStatus::Miscompare
    };
    StepOutcome {
        status,
        done: true,
        value,
    }
}

/// Compute step for entries with a fixed address/length (CfeCore, OsCore,
/// Eeprom, Memory).
pub fn compute_mem_entry(
    bus: &dyn MemAccess,
    entry: &mut ResultEntry,
    budget: u32,
) -> Result<StepOutcome, crate::error::WardenError> {
    let (addr, len) = (entry.addr, entry.len);
    let (value, done) = step_region(bus, entry, addr, len, budget)?;
    if done {
        Ok(finish_entry(entry, value))
    } else {
        Ok(StepOutcome {
            status: StepStatus::Success,
            done: false,
            value,
        })
    }
}

/// Compute step for a Tables-domain entry: resolve the table's live region
/// through the table service, then checksum it.
pub fn compute_table_entry(
    tables: &mut dyn TableService,
    bus: &dyn MemAccess,
    entry: &mut ResultEntry,
    budget: u32,
    events: &mut EventLog,
) -> Result<StepOutcome, crate::error::WardenError> {
    let name = entry.name.clone();
    let mut share_status = TableStatus::Success;
    let mut info_status = TableStatus::Success;
    let mut addr_status = TableStatus::Success;

    let tref = entry.table.get_or_insert_with(Default::default);
    if tref.handle.is_none() {
        match tables.share(&name) {
            Ok(handle) => tref.handle = Some(handle),
            Err(status) => share_status = status,
        }
    }

    if let Err(status) = tables.get_info(&name) {
        info_status = status;
    }

    let mut region = None;
    let mut updated = false;
    if let Some(handle) = tref.handle {
        match tables.get_address(handle) {
            Ok(view) => {
                region = view.region;
                updated = view.updated;
                if region.is_none() {
                    addr_status = TableStatus::ErrNeverLoaded;
                }
            }
            Err(status) => {
                addr_status = status;
                if status == TableStatus::ErrUnregistered {
                    // stale share; force a fresh share on the next attempt
                    tref.handle = None;
                }
            }
        }
    } else {
        addr_status = TableStatus::ErrNeverLoaded;
    }

    let (addr, len) = match region {
        Some(region) => region,
        None => {
            events.emit(
                EventId::ComputeTablesNotFound,
                Severity::Error,
                format!(
                    "tables: problem getting table {name} info: \
                     share {share_status:?}, info {info_status:?}, addr {addr_status:?}"
                ),
            );
            return Ok(StepOutcome {
                status: StepStatus::NotFound,
                done: false,
                value: 0,
            });
        }
    };

    // Content changed since we last saw it: any partial or completed
    // computation is against stale bytes, so start over.
    if updated {
        entry.reset_cursor();
        entry.computed = false;
    }
    entry.addr = addr;
    entry.len = len;

    let step = step_region(bus, entry, addr, len, budget);
    if let Some(handle) = entry.table.as_ref().and_then(|t| t.handle) {
        tables.release_address(handle);
    }
    let (value, done) = step?;

    if done {
        Ok(finish_entry(entry, value))
    } else {
        Ok(StepOutcome {
            status: StepStatus::Success,
            done: false,
            value,
        })
    }
}

/// Compute step for an Apps-domain entry: resolve the module (application,
/// falling back to library) and checksum its code segment.
pub fn compute_app_entry(
    modules: &dyn ModuleRegistry,
    bus: &dyn MemAccess,
    entry: &mut ResultEntry,
    budget: u32,
    events: &mut EventLog,
) -> Result<StepOutcome, crate::error::WardenError> {
    let name = entry.name.clone();
    let mut app_status = ModuleStatus::Success;
    let mut lib_status = ModuleStatus::Success;
    let mut info_status = ModuleStatus::Success;

    let id = match modules.resolve_app(&name) {
        Ok(id) => Some(id),
        Err(status) => {
            app_status = status;
            match modules.resolve_lib(&name) {
                Ok(id) => Some(id),
                Err(status) => {
                    lib_status = status;
                    None
                }
            }
        }
    };

    let info = id.and_then(|id| match modules.module_info(id) {
        Ok(info) if info.valid => Some(info),
        Ok(_) => {
            info_status = ModuleStatus::ErrAddressInvalid;
            None
        }
        Err(status) => {
            info_status = status;
            None
        }
    });

    let info = match info {
        Some(info) => info,
        None => {
            events.emit(
                EventId::ComputeAppNotFound,
                Severity::Error,
                format!(
                    "apps: problem resolving module {name}: \
                     app {app_status:?}, lib {lib_status:?}, info {info_status:?}"
                ),
            );
            return Ok(StepOutcome {
                status: StepStatus::NotFound,
                done: false,
                value: 0,
            });
        }
    };

    entry.addr = info.addr;
    entry.len = info.size;
    let (value, done) = step_region(bus, entry, info.addr, info.size, budget)?;

    if done {
        Ok(finish_entry(entry, value))
    } else {
        Ok(StepOutcome {
            status: StepStatus::Success,
            done: false,
            value,
        })
    }
}
