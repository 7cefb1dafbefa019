use anyhow::Context;

use crate::config::BaseConfig;
use crate::events::{EventId, EventLog, Severity};
use crate::membus::MemBusVariant;
use crate::mirror::SwitchMirror;
use crate::modreg::ModuleRegistryVariant;
use crate::tableservice::TableServiceVariant;
use crate::telemetry::HkSnapshot;
use crate::traits::TableService;
use crate::types::{
    DefTable, Domain, EntryClaim, EntryState, MemoryDefinition, NameDefinition, OneShotRecord,
    ResultEntry, TableHandle, TableKind, TaskId, STATE_ENABLED,
};
use crate::validate::{validate_memory_defs, validate_name_defs};

/// Base address of the memory window our own definition tables are published
/// into, one 64 KiB slot per table, so the Tables domain can checksum them.
pub const DEF_TABLE_REGION_BASE: u32 = 0x0700_0000;
pub const DEF_TABLE_REGION_STRIDE: u32 = 0x0001_0000;

/// Per-domain control block.
#[derive(Debug, Clone, Copy)]
pub struct DomainCtl {
    pub state: EntryState,
    pub err_counter: u16,
    /// Telemetry baseline: final checksum for the singleton domains, sum of
    /// entry baselines for Eeprom/Memory, unused for Tables/Apps.
    pub baseline: u32,
}

impl Default for DomainCtl {
    fn default() -> Self {
        DomainCtl {
            state: EntryState::Enabled,
            err_counter: 0,
            baseline: 0,
        }
    }
}

/// All monitor state. Lives behind one `Arc<Mutex<_>>` owned by the run loop;
/// child tasks reach it through the same lock, one bounded step at a time.
pub struct Engine {
    pub config: BaseConfig,
    pub bus: MemBusVariant,
    pub tables: TableServiceVariant,
    pub modules: ModuleRegistryVariant,
    pub events: EventLog,

    /// Global master switch over the whole background cycle.
    pub checksum_state: EntryState,
    pub domains: [DomainCtl; 6],

    pub cfecore: ResultEntry,
    pub oscore: ResultEntry,
    pub eeprom_results: Vec<ResultEntry>,
    pub memory_results: Vec<ResultEntry>,
    pub tables_results: Vec<ResultEntry>,
    pub apps_results: Vec<ResultEntry>,

    /// Working copies of the operator definition tables; the source the
    /// result entries are rebuilt from.
    pub eeprom_defs: Vec<MemoryDefinition>,
    pub memory_defs: Vec<MemoryDefinition>,
    pub tables_defs: Vec<NameDefinition>,
    pub apps_defs: Vec<NameDefinition>,
    /// Handles of the four registered definition tables, indexed
    /// Eeprom/Memory/Tables/Apps.
    pub def_handles: [Option<TableHandle>; 4],

    pub current_table: usize,
    pub current_entry: usize,
    pub pass_counter: u32,
    pub cmd_counter: u8,
    pub cmd_err_counter: u8,

    pub recompute_in_progress: bool,
    pub oneshot_in_progress: bool,
    /// Present exactly while a recompute child task owns an entry.
    pub child_claim: Option<EntryClaim>,
    pub child_task_id: Option<TaskId>,
    pub oneshot: OneShotRecord,
}

/// Names of the four definition tables, `def_handles` order.
pub const DEF_TABLE_NAMES: [&str; 4] = ["EepromDefTbl", "MemoryDefTbl", "TablesDefTbl", "AppDefTbl"];

/// `def_handles` slot for an indexed domain.
pub fn def_slot(domain: Domain) -> Option<usize> {
    domain.slot().checked_sub(2)
}

fn sized<T: Clone + Default>(mut defs: Vec<T>, entries: usize) -> Vec<T> {
    defs.resize(entries, T::default());
    defs
}

fn load_json_defs<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<Vec<T>> {
    let raw = std::fs::read(path).with_context(|| format!("reading definition table {path}"))?;
    serde_json::from_slice(&raw).with_context(|| format!("parsing definition table {path}"))
}

impl Engine {
    /// Bare engine over caller-chosen service backends. Result tables start
    /// empty; definitions are all-Empty at the configured sizes.
    pub fn new(
        config: BaseConfig,
        bus: MemBusVariant,
        tables: TableServiceVariant,
        modules: ModuleRegistryVariant,
    ) -> Self {
        let mem_n = config.mem_table_entries;
        let name_n = config.name_table_entries;
        let cfecore = ResultEntry {
            state: EntryState::Enabled,
            addr: config.cfecore_addr,
            len: config.cfecore_size,
            ..Default::default()
        };
        let oscore = ResultEntry {
            state: EntryState::Enabled,
            addr: config.oscore_addr,
            len: config.oscore_size,
            ..Default::default()
        };
        Engine {
            config,
            bus,
            tables,
            modules,
            events: EventLog::new(),
            checksum_state: EntryState::Enabled,
            domains: [DomainCtl::default(); 6],
            cfecore,
            oscore,
            eeprom_results: vec![ResultEntry::default(); mem_n],
            memory_results: vec![ResultEntry::default(); mem_n],
            tables_results: vec![ResultEntry::default(); name_n],
            apps_results: vec![ResultEntry::default(); name_n],
            eeprom_defs: vec![MemoryDefinition::default(); mem_n],
            memory_defs: vec![MemoryDefinition::default(); mem_n],
            tables_defs: vec![NameDefinition::default(); name_n],
            apps_defs: vec![NameDefinition::default(); name_n],
            def_handles: [None; 4],
            current_table: 0,
            current_entry: 0,
            pass_counter: 0,
            cmd_counter: 0,
            cmd_err_counter: 0,
            recompute_in_progress: false,
            oneshot_in_progress: false,
            child_claim: None,
            child_task_id: None,
            oneshot: OneShotRecord::default(),
        }
    }

    /// Full simulated bring-up: provision platform memory, load or default
    /// the four definition tables, validate (a bad table falls back to empty),
    /// register and publish them, build the result tables, restore the switch
    /// mirror.
    pub fn initialize(config: BaseConfig) -> anyhow::Result<Self> {
        let bus = MemBusVariant::new_sim(config.mem_limit);
        let tables = TableServiceVariant::new_sim(&config.app_name);
        let modules = ModuleRegistryVariant::new_sim();
        let mut engine = Engine::new(config, bus, tables, modules);

        if let Some(sim) = engine.bus.as_sim_mut() {
            sim.provision(engine.config.cfecore_addr, engine.config.cfecore_size)?;
            sim.provision(engine.config.oscore_addr, engine.config.oscore_size)?;
        }

        engine.load_definition_tables()?;
        engine.register_definition_tables()?;
        for domain in [Domain::Eeprom, Domain::Memory, Domain::Tables, Domain::Apps] {
            engine.process_new_definition_table(domain);
        }

        engine.restore_switch_mirror();
        engine.events.emit(
            EventId::InitDone,
            Severity::Info,
            format!("{} initialized", engine.config.app_name),
        );
        Ok(engine)
    }

    fn load_definition_tables(&mut self) -> anyhow::Result<()> {
        let mem_n = self.config.mem_table_entries;
        let name_n = self.config.name_table_entries;

        let eeprom = match self.config.eeprom_defs.clone() {
            Some(path) => sized(load_json_defs(&path)?, mem_n),
            None => sized(default_eeprom_defs(), mem_n),
        };
        let memory = match self.config.memory_defs.clone() {
            Some(path) => sized(load_json_defs(&path)?, mem_n),
            None => sized(default_memory_defs(), mem_n),
        };
        let tables = match self.config.tables_defs.clone() {
            Some(path) => sized(load_json_defs(&path)?, name_n),
            None => vec![NameDefinition::default(); name_n],
        };
        let apps = match self.config.apps_defs.clone() {
            Some(path) => sized(load_json_defs(&path)?, name_n),
            None => vec![NameDefinition::default(); name_n],
        };

        // Active ranges need backing memory before validation can pass.
        if let Some(sim) = self.bus.as_sim_mut() {
            for def in eeprom.iter().chain(memory.iter()) {
                if def.state == STATE_ENABLED && def.len > 0 {
                    sim.provision(def.addr, def.len)?;
                }
            }
        }

        self.eeprom_defs = match validate_memory_defs(&self.bus, "eeprom", &eeprom, &mut self.events)
        {
            Ok(_) => eeprom,
            Err(_) => vec![MemoryDefinition::default(); mem_n],
        };
        self.memory_defs = match validate_memory_defs(&self.bus, "memory", &memory, &mut self.events)
        {
            Ok(_) => memory,
            Err(_) => vec![MemoryDefinition::default(); mem_n],
        };
        self.tables_defs = match validate_name_defs("tables", &tables, &mut self.events) {
            Ok(_) => tables,
            Err(_) => vec![NameDefinition::default(); name_n],
        };
        self.apps_defs = match validate_name_defs("apps", &apps, &mut self.events) {
            Ok(_) => apps,
            Err(_) => vec![NameDefinition::default(); name_n],
        };
        Ok(())
    }

    fn register_definition_tables(&mut self) -> anyhow::Result<()> {
        for (slot, short) in DEF_TABLE_NAMES.iter().enumerate() {
            let name = format!("{}.{short}", self.config.app_name);
            let kind = if slot < 2 { TableKind::MemoryDefs } else { TableKind::NameDefs };
            let handle = self
                .tables
                .register(&name, kind)
                .map_err(|status| anyhow::anyhow!("registering {name}: {status:?}"))?;
            self.def_handles[slot] = Some(handle);

            let defs = self.def_table_payload(slot);
            let status = self.tables.load(handle, defs);
            if !status.is_ok() {
                anyhow::bail!("loading {name}: {status:?}");
            }
            // Absorb the initial load; routine management handles later ones.
            self.tables.manage(handle);
            self.tables.get_address(handle).ok();
            self.tables.release_address(handle);
            self.publish_def_table(slot)?;
        }
        Ok(())
    }

    fn def_table_payload(&self, slot: usize) -> DefTable {
        match slot {
            0 => DefTable::Memory(self.eeprom_defs.clone()),
            1 => DefTable::Memory(self.memory_defs.clone()),
            2 => DefTable::Name(self.tables_defs.clone()),
            _ => DefTable::Name(self.apps_defs.clone()),
        }
    }

    /// Serialize a definition table into its platform memory slot so the
    /// Tables domain can checksum it like any other table.
    pub fn publish_def_table(&mut self, slot: usize) -> anyhow::Result<()> {
        let payload = serde_json::to_vec(&self.def_table_payload(slot))?;
        let addr = DEF_TABLE_REGION_BASE + slot as u32 * DEF_TABLE_REGION_STRIDE;
        let size = payload.len() as u32;
        if let Some(sim) = self.bus.as_sim_mut() {
            sim.install(addr, payload)?;
        }
        if let (Some(handle), Some(sim)) =
            (self.def_handles[slot], self.tables.as_sim_mut())
        {
            sim.set_region(handle, addr, size);
        }
        Ok(())
    }

    /// One budgeted compute step for `(domain, idx)`, dispatched to the
    /// domain's resolution strategy with the right service seams borrowed.
    pub fn compute_step(
        &mut self,
        domain: Domain,
        idx: usize,
        budget: u32,
    ) -> Result<crate::types::StepOutcome, crate::error::WardenError> {
        use crate::compute::{compute_app_entry, compute_mem_entry, compute_table_entry};
        let Engine {
            bus,
            tables,
            modules,
            events,
            cfecore,
            oscore,
            eeprom_results,
            memory_results,
            tables_results,
            apps_results,
            ..
        } = self;
        let entry = match domain {
            Domain::CfeCore => cfecore,
            Domain::OsCore => oscore,
            Domain::Eeprom => &mut eeprom_results[idx],
            Domain::Memory => &mut memory_results[idx],
            Domain::Tables => &mut tables_results[idx],
            Domain::Apps => &mut apps_results[idx],
        };
        match domain {
            Domain::Tables => compute_table_entry(tables, bus, entry, budget, events),
            Domain::Apps => compute_app_entry(modules, bus, entry, budget, events),
            _ => compute_mem_entry(bus, entry, budget),
        }
    }

    pub fn results(&self, domain: Domain) -> &[ResultEntry] {
        match domain {
            Domain::CfeCore => std::slice::from_ref(&self.cfecore),
            Domain::OsCore => std::slice::from_ref(&self.oscore),
            Domain::Eeprom => &self.eeprom_results,
            Domain::Memory => &self.memory_results,
            Domain::Tables => &self.tables_results,
            Domain::Apps => &self.apps_results,
        }
    }

    pub fn results_mut(&mut self, domain: Domain) -> &mut [ResultEntry] {
        match domain {
            Domain::CfeCore => std::slice::from_mut(&mut self.cfecore),
            Domain::OsCore => std::slice::from_mut(&mut self.oscore),
            Domain::Eeprom => &mut self.eeprom_results,
            Domain::Memory => &mut self.memory_results,
            Domain::Tables => &mut self.tables_results,
            Domain::Apps => &mut self.apps_results,
        }
    }

    /// Write an entry state through to the working definition copy, so a
    /// later rebuild does not resurrect the old state.
    pub fn set_def_state(&mut self, domain: Domain, id: usize, state: EntryState) {
        let raw = state.raw();
        match domain {
            Domain::Eeprom => {
                if let Some(def) = self.eeprom_defs.get_mut(id) {
                    def.state = raw;
                }
            }
            Domain::Memory => {
                if let Some(def) = self.memory_defs.get_mut(id) {
                    def.state = raw;
                }
            }
            Domain::Tables => {
                if let Some(def) = self.tables_defs.get_mut(id) {
                    def.state = raw;
                }
            }
            Domain::Apps => {
                if let Some(def) = self.apps_defs.get_mut(id) {
                    def.state = raw;
                }
            }
            Domain::CfeCore | Domain::OsCore => {}
        }
    }

    /// Paired definition state for a result entry, when the domain has one.
    pub fn def_state(&self, domain: Domain, id: usize) -> Option<EntryState> {
        let raw = match domain {
            Domain::Eeprom => self.eeprom_defs.get(id).map(|d| d.state),
            Domain::Memory => self.memory_defs.get(id).map(|d| d.state),
            Domain::Tables => self.tables_defs.get(id).map(|d| d.state),
            Domain::Apps => self.apps_defs.get(id).map(|d| d.state),
            Domain::CfeCore | Domain::OsCore => None,
        };
        raw.map(EntryState::from_raw)
    }

    /// Whether `(domain, entry)` is currently claimed by a child task.
    pub fn claimed(&self, domain: Domain, entry: usize) -> bool {
        match &self.child_claim {
            Some(claim) => claim.domain() == domain && claim.entry() == Some(entry),
            None => false,
        }
    }

    pub fn bump_cmd(&mut self) {
        self.cmd_counter = self.cmd_counter.wrapping_add(1);
    }

    pub fn bump_cmd_err(&mut self) {
        self.cmd_err_counter = self.cmd_err_counter.wrapping_add(1);
    }

    pub fn hk_snapshot(&self) -> HkSnapshot {
        HkSnapshot {
            checksum_state: self.checksum_state.raw(),
            domain_states: std::array::from_fn(|i| self.domains[i].state.raw()),
            cmd_counter: self.cmd_counter,
            cmd_err_counter: self.cmd_err_counter,
            domain_err_counters: std::array::from_fn(|i| self.domains[i].err_counter),
            current_table: self.current_table,
            current_entry: self.current_entry,
            pass_counter: self.pass_counter,
            baselines: std::array::from_fn(|i| self.domains[i].baseline),
            recompute_in_progress: self.recompute_in_progress,
            oneshot_in_progress: self.oneshot_in_progress,
            last_oneshot: self.oneshot,
        }
    }

    fn restore_switch_mirror(&mut self) {
        let Some(path) = self.config.mirror_path.clone() else {
            return;
        };
        if let Some(mirror) = SwitchMirror::load(&path) {
            self.checksum_state = EntryState::from_raw(mirror.checksum_state);
            for (ctl, raw) in self.domains.iter_mut().zip(mirror.domain_states) {
                ctl.state = EntryState::from_raw(raw);
            }
        }
    }

    /// Rewrite the switch mirror after a switch change. No-op without a
    /// configured mirror path; write failures are logged, never fatal.
    pub fn persist_switches(&mut self) {
        let Some(path) = self.config.mirror_path.clone() else {
            return;
        };
        let mirror = SwitchMirror {
            checksum_state: self.checksum_state.raw(),
            domain_states: std::array::from_fn(|i| self.domains[i].state.raw()),
        };
        if let Err(err) = mirror.save(&path) {
            tracing::warn!("switch mirror write failed: {err:#}");
        }
    }
}

fn default_eeprom_defs() -> Vec<MemoryDefinition> {
    vec![MemoryDefinition {
        state: STATE_ENABLED,
        addr: 0x0040_0000,
        len: 0x4000,
    }]
}

fn default_memory_defs() -> Vec<MemoryDefinition> {
    vec![MemoryDefinition {
        state: STATE_ENABLED,
        addr: 0x0050_0000,
        len: 0x4000,
    }]
}
