use serde::{Deserialize, Serialize};

/// Raw state codes as they appear in operator-authored definition tables.
pub const STATE_EMPTY: u16 = 0;
pub const STATE_ENABLED: u16 = 1;
pub const STATE_DISABLED: u16 = 2;

/// Entry state. `Undefined` carries the raw code so validation can report it;
/// it never persists past validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Empty,
    Enabled,
    Disabled,
    Undefined(u16),
}

impl Default for EntryState {
    fn default() -> Self {
        EntryState::Empty
    }
}

impl EntryState {
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            STATE_EMPTY => EntryState::Empty,
            STATE_ENABLED => EntryState::Enabled,
            STATE_DISABLED => EntryState::Disabled,
            other => EntryState::Undefined(other),
        }
    }

    pub fn raw(self) -> u16 {
        match self {
            EntryState::Empty => STATE_EMPTY,
            EntryState::Enabled => STATE_ENABLED,
            EntryState::Disabled => STATE_DISABLED,
            EntryState::Undefined(raw) => raw,
        }
    }
}

/// One of the six checksum domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    CfeCore,
    OsCore,
    Eeprom,
    Memory,
    Tables,
    Apps,
}

impl Domain {
    /// Round-robin scan order of the background scheduler.
    pub const SCAN_ORDER: [Domain; 6] = [
        Domain::CfeCore,
        Domain::OsCore,
        Domain::Eeprom,
        Domain::Memory,
        Domain::Tables,
        Domain::Apps,
    ];

    pub fn slot(self) -> usize {
        match self {
            Domain::CfeCore => 0,
            Domain::OsCore => 1,
            Domain::Eeprom => 2,
            Domain::Memory => 3,
            Domain::Tables => 4,
            Domain::Apps => 5,
        }
    }

    /// Domains backed by an operator-authored definition table.
    pub fn is_indexed(self) -> bool {
        !matches!(self, Domain::CfeCore | Domain::OsCore)
    }

    pub fn label(self) -> &'static str {
        match self {
            Domain::CfeCore => "cfe-core",
            Domain::OsCore => "os-core",
            Domain::Eeprom => "eeprom",
            Domain::Memory => "memory",
            Domain::Tables => "tables",
            Domain::Apps => "apps",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Definition entry for the Eeprom/Memory domains.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MemoryDefinition {
    pub state: u16,
    pub addr: u32,
    pub len: u32,
}

/// Definition entry for the Tables/Apps domains.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NameDefinition {
    pub state: u16,
    pub name: String,
}

/// Typed payload of a definition table held by the table service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DefTable {
    Memory(Vec<MemoryDefinition>),
    Name(Vec<NameDefinition>),
}

impl DefTable {
    pub fn entry_count(&self) -> usize {
        match self {
            DefTable::Memory(defs) => defs.len(),
            DefTable::Name(defs) => defs.len(),
        }
    }
}

/// What kind of payload a registered table carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    MemoryDefs,
    NameDefs,
}

/// Opaque handle to a registered or shared table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableHandle(pub u32);

/// Table service status codes, mapped verbatim from the external service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Success,
    InfoUpdated,
    ErrNeverLoaded,
    ErrUnregistered,
    Error,
}

impl TableStatus {
    pub fn is_ok(self) -> bool {
        matches!(self, TableStatus::Success | TableStatus::InfoUpdated)
    }
}

/// Snapshot returned by `TableService::get_address`.
#[derive(Debug, Clone)]
pub struct TableView {
    /// Typed definition payload, when the table is one of our definition tables.
    pub defs: Option<DefTable>,
    /// Live (address, size) of the table image in platform memory.
    pub region: Option<(u32, u32)>,
    /// True when the table content changed since the last `get_address`.
    pub updated: bool,
}

/// Metadata from `TableService::get_info`.
#[derive(Debug, Clone)]
pub struct TableInfo {
    pub size: u32,
    pub owner: String,
}

/// Module registry status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleStatus {
    Success,
    ErrNameNotFound,
    ErrInfoUnavailable,
    ErrAddressInvalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(pub u32);

#[derive(Debug, Clone, Copy)]
pub struct ModuleInfo {
    pub addr: u32,
    pub size: u32,
    pub valid: bool,
}

/// Handle to a spawned child task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u32);

/// Tables-domain bookkeeping attached to a result entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableRef {
    pub handle: Option<TableHandle>,
    pub is_owner: bool,
}

/// Live result entry: derived state, rebuilt wholesale from definitions.
#[derive(Debug, Clone, Default)]
pub struct ResultEntry {
    pub state: EntryState,
    pub computed: bool,
    pub addr: u32,
    pub len: u32,
    /// Stored baseline; trustworthy only when `computed`.
    pub comparison: u32,
    /// Resume cursor; < len while mid-computation, else 0.
    pub byte_offset: u32,
    /// Partial accumulator threaded through the CRC primitive.
    pub temp: u32,
    /// Target name (Tables/Apps domains).
    pub name: String,
    /// Tables-domain handle/ownership (None elsewhere).
    pub table: Option<TableRef>,
}

impl ResultEntry {
    pub fn reset_cursor(&mut self) {
        self.byte_offset = 0;
        self.temp = 0;
    }
}

/// Status of one budgeted compute step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Success,
    Miscompare,
    NotFound,
}

/// Outcome of one budgeted compute step over an entry.
#[derive(Debug, Clone, Copy)]
pub struct StepOutcome {
    pub status: StepStatus,
    pub done: bool,
    /// Latest checksum value (final value when `done`).
    pub value: u32,
}

/// Tally produced by definition table validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub good: u32,
    pub bad: u32,
    pub unused: u32,
}

/// Independent record of the last one-shot operation. Deliberately does not
/// alias any domain's scan state.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct OneShotRecord {
    pub addr: u32,
    pub size: u32,
    pub budget: u32,
    pub checksum: u32,
}

/// Move-only token for an entry claimed by a child task. Constructed when the
/// in-progress flag is set, consumed on cleanup; cannot be duplicated.
#[derive(Debug)]
pub struct EntryClaim {
    domain: Domain,
    entry: Option<usize>,
}

impl EntryClaim {
    pub(crate) fn new(domain: Domain, entry: Option<usize>) -> Self {
        Self { domain, entry }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn entry(&self) -> Option<usize> {
        self.entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_state_raw_round_trip() {
        assert_eq!(EntryState::from_raw(STATE_EMPTY), EntryState::Empty);
        assert_eq!(EntryState::from_raw(STATE_ENABLED), EntryState::Enabled);
        assert_eq!(EntryState::from_raw(STATE_DISABLED), EntryState::Disabled);
        assert_eq!(EntryState::from_raw(0xDEAD), EntryState::Undefined(0xDEAD));
        assert_eq!(EntryState::Undefined(0xDEAD).raw(), 0xDEAD);
    }

    #[test]
    fn test_scan_order_slots() {
        for (i, domain) in Domain::SCAN_ORDER.iter().enumerate() {
            assert_eq!(domain.slot(), i);
        }
    }
}
