//! Definition table validation.
//!
//! Each validator walks the candidate table once, tallying good, bad and
//! unused rows, emitting one event per finding and always exactly one summary
//! event. The caller gets the tally back either way; only `bad > 0` is an
//! error.

use crate::error::WardenError;
use crate::events::{EventId, EventLog, Severity};
use crate::traits::MemAccess;
use crate::types::{
    MemoryDefinition, NameDefinition, ValidationReport, STATE_DISABLED, STATE_EMPTY,
    STATE_ENABLED,
};

fn summarize(
    events: &mut EventLog,
    label: &str,
    report: ValidationReport,
) -> Result<ValidationReport, WardenError> {
    events.emit(
        EventId::ValidationSummary,
        Severity::Info,
        format!(
            "{label} definition table validation: good {}, bad {}, unused {}",
            report.good, report.bad, report.unused
        ),
    );
    if report.bad > 0 {
        Err(WardenError::Validation {
            good: report.good,
            bad: report.bad,
            unused: report.unused,
        })
    } else {
        Ok(report)
    }
}

/// Validate an Eeprom/Memory definition table: active rows must describe a
/// range the platform accepts.
pub fn validate_memory_defs(
    bus: &dyn MemAccess,
    label: &str,
    defs: &[MemoryDefinition],
    events: &mut EventLog,
) -> Result<ValidationReport, WardenError> {
    let mut report = ValidationReport::default();
    for (i, def) in defs.iter().enumerate() {
        match def.state {
            STATE_EMPTY => report.unused += 1,
            STATE_ENABLED | STATE_DISABLED => {
                if bus.validate_range(def.addr, def.len) {
                    report.good += 1;
                } else {
                    report.bad += 1;
                    events.emit(
                        EventId::ValidationRangeError,
                        Severity::Error,
                        format!(
                            "{label} entry {i}: illegal range, addr {:#010x} len {:#x}",
                            def.addr, def.len
                        ),
                    );
                }
            }
            other => {
                report.bad += 1;
                events.emit(
                    EventId::ValidationStateError,
                    Severity::Error,
                    format!("{label} entry {i}: illegal state {other}"),
                );
            }
        }
    }
    summarize(events, label, report)
}

/// Validate a Tables/Apps definition table: active rows need a non-empty name
/// with no duplicate among active rows.
pub fn validate_name_defs(
    label: &str,
    defs: &[NameDefinition],
    events: &mut EventLog,
) -> Result<ValidationReport, WardenError> {
    let mut report = ValidationReport::default();
    for (i, def) in defs.iter().enumerate() {
        match def.state {
            STATE_EMPTY => report.unused += 1,
            STATE_ENABLED | STATE_DISABLED => {
                if def.name.is_empty() {
                    report.bad += 1;
                    events.emit(
                        EventId::ValidationEmptyName,
                        Severity::Error,
                        format!("{label} entry {i}: empty name"),
                    );
                    continue;
                }
                let dup = defs[..i].iter().position(|prior| {
                    matches!(prior.state, STATE_ENABLED | STATE_DISABLED)
                        && prior.name == def.name
                });
                if let Some(j) = dup {
                    report.bad += 1;
                    events.emit(
                        EventId::ValidationDuplicateName,
                        Severity::Error,
                        format!(
                            "{label} entries {j} and {i}: duplicate name {}",
                            def.name
                        ),
                    );
                } else {
                    report.good += 1;
                }
            }
            other => {
                report.bad += 1;
                events.emit(
                    EventId::ValidationStateError,
                    Severity::Error,
                    format!("{label} entry {i}: illegal state {other}"),
                );
            }
        }
    }
    summarize(events, label, report)
}
