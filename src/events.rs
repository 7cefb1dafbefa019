//! Structured event reporting.
//!
//! Events are the operator-visible record of what the monitor observed: one
//! event per detection, one primary event per command. They are recorded in a
//! bounded in-memory log (so tests and telemetry can inspect them) and mirrored
//! to `tracing` at the matching level. Packet assembly and downstream transport
//! are external concerns.

use tracing::{debug, error, info};

/// Event severity, mapped onto tracing levels on emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventId {
    InitDone,
    Miscompare,
    ComputeTablesNotFound,
    ComputeAppNotFound,
    ValidationRangeError,
    ValidationStateError,
    ValidationEmptyName,
    ValidationDuplicateName,
    ValidationSummary,
    DefinitionTableEmpty,
    TableUpdateError,
    RecomputeStarted,
    RecomputeFinished,
    RecomputeError,
    OneShotStarted,
    OneShotFinished,
    OneShotError,
    CancelOneShot,
    CancelOneShotError,
    ChildTaskError,
    CmdBusy,
    CmdGlobalState,
    CmdDomainState,
    CmdEntryState,
    CmdBaselineReport,
    CmdEntryIdResult,
    CmdInvalidEntry,
    HkReport,
}

#[derive(Debug, Clone)]
pub struct Event {
    pub id: EventId,
    pub severity: Severity,
    pub text: String,
}

/// Bounded in-memory event log.
#[derive(Debug, Default)]
pub struct EventLog {
    entries: Vec<Event>,
}

/// Retention bound; old events are dropped, counters are the durable record.
const EVENT_LOG_CAP: usize = 256;

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, id: EventId, severity: Severity, text: String) {
        match severity {
            Severity::Debug => debug!(event = ?id, "{}", text),
            Severity::Info => info!(event = ?id, "{}", text),
            Severity::Error => error!(event = ?id, "{}", text),
        }
        self.entries.push(Event { id, severity, text });
        if self.entries.len() > EVENT_LOG_CAP {
            let excess = self.entries.len() - EVENT_LOG_CAP;
            self.entries.drain(..excess);
        }
    }

    pub fn entries(&self) -> &[Event] {
        &self.entries
    }

    pub fn count(&self, id: EventId) -> usize {
        self.entries.iter().filter(|e| e.id == id).count()
    }

    pub fn last(&self) -> Option<&Event> {
        self.entries.last()
    }

    pub fn last_of(&self, id: EventId) -> Option<&Event> {
        self.entries.iter().rev().find(|e| e.id == id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_records_and_counts() {
        let mut log = EventLog::new();
        log.emit(EventId::InitDone, Severity::Info, "up".into());
        log.emit(EventId::Miscompare, Severity::Error, "bad".into());
        log.emit(EventId::Miscompare, Severity::Error, "bad again".into());

        assert_eq!(log.count(EventId::Miscompare), 2);
        assert_eq!(log.count(EventId::InitDone), 1);
        assert_eq!(log.last().unwrap().text, "bad again");
    }

    #[test]
    fn test_log_is_bounded() {
        let mut log = EventLog::new();
        for i in 0..(EVENT_LOG_CAP + 10) {
            log.emit(EventId::HkReport, Severity::Debug, format!("{i}"));
        }
        assert_eq!(log.entries().len(), EVENT_LOG_CAP);
        assert_eq!(log.entries()[0].text, "10");
    }
}
