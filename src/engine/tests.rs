//! Unit tests for the scan scheduler and table syncer, driven through mock
//! service seams so every tick is fully deterministic.

use crate::config::BaseConfig;
use crate::events::EventId;
use crate::membus::{MemBusVariant, MockBus};
use crate::modreg::{MockModuleRegistry, ModuleRegistryVariant};
use crate::tableservice::{MockTableService, TableServiceVariant};
use crate::types::{
    Domain, EntryClaim, EntryState, ResultEntry, TableStatus, TableView,
};

use super::Engine;

fn small_config() -> BaseConfig {
    BaseConfig {
        max_bytes_per_cycle: 1024,
        mem_table_entries: 4,
        name_table_entries: 4,
        cfecore_size: 512,
        oscore_size: 512,
        ..Default::default()
    }
}

fn mock_engine(bus: MockBus) -> Engine {
    Engine::new(
        small_config(),
        MemBusVariant::new_mock(bus),
        TableServiceVariant::new_mock(MockTableService::new()),
        ModuleRegistryVariant::new_mock(MockModuleRegistry::new()),
    )
}

fn enabled_entry(addr: u32, len: u32) -> ResultEntry {
    ResultEntry {
        state: EntryState::Enabled,
        addr,
        len,
        ..Default::default()
    }
}

#[test]
fn test_global_switch_stops_the_cycle() {
    let mut engine = mock_engine(MockBus::new());
    engine.checksum_state = EntryState::Disabled;

    engine.background_check_cycle();

    assert_eq!(engine.current_table, 0);
    assert!(engine.bus.as_mock().unwrap().calls().is_empty());
}

#[test]
fn test_disabled_domain_advances_without_computing() {
    let mut engine = mock_engine(MockBus::new());
    engine.domains[Domain::CfeCore.slot()].state = EntryState::Disabled;

    engine.background_check_cycle();

    assert_eq!(engine.current_table, 1);
    assert!(engine.bus.as_mock().unwrap().calls().is_empty());
}

#[test]
fn test_budget_bounds_each_tick() {
    let mut engine = mock_engine(MockBus::new());
    engine.cfecore.len = 3 * engine.config.max_bytes_per_cycle;

    engine.background_check_cycle();
    engine.background_check_cycle();
    assert_eq!(engine.current_table, 0, "mid-entry, cursor must stay");

    engine.background_check_cycle();
    assert_eq!(engine.current_table, 1, "third step completes the entry");

    let calls = engine.bus.as_mock().unwrap().calls();
    assert_eq!(calls.len(), 3);
    for (_, len, _) in calls {
        assert_eq!(len, engine.config.max_bytes_per_cycle);
    }
}

#[test]
fn test_full_pass_bumps_pass_counter() {
    let mut engine = mock_engine(MockBus::new());
    // no enabled entries anywhere in the indexed domains
    for _ in 0..6 {
        engine.background_check_cycle();
    }
    assert_eq!(engine.current_table, 0);
    assert_eq!(engine.pass_counter, 1);
}

#[test]
fn test_singleton_miscompare_counts_and_advances() {
    let bus = MockBus::returning(&[0xAAAA, 0xBBBB]);
    let mut engine = mock_engine(bus);

    engine.background_check_cycle();
    assert!(engine.cfecore.computed);
    assert_eq!(engine.cfecore.comparison, 0xAAAA);

    engine.current_table = 0;
    engine.background_check_cycle();

    assert_eq!(engine.domains[Domain::CfeCore.slot()].err_counter, 1);
    assert_eq!(engine.events.count(EventId::Miscompare), 1);
    assert_eq!(engine.current_table, 1, "miscompare never stalls a singleton");
}

#[test]
fn test_indexed_miscompare_counts_and_moves_on() {
    let bus = MockBus::returning(&[0x1111, 0x2222]);
    let mut engine = mock_engine(bus);
    engine.current_table = Domain::Eeprom.slot();
    engine.eeprom_results[1] = enabled_entry(0x1000, 16);

    engine.background_check_cycle();
    assert_eq!(engine.eeprom_results[1].comparison, 0x1111);

    engine.current_entry = 1;
    engine.background_check_cycle();

    assert_eq!(engine.domains[Domain::Eeprom.slot()].err_counter, 1);
    assert_eq!(engine.events.count(EventId::Miscompare), 1);
    assert_eq!(engine.current_entry, 2, "miscompare advances past the entry");
    assert_eq!(engine.current_table, Domain::Eeprom.slot());
}

#[test]
fn test_persistent_miscompare_does_not_starve_the_round_robin() {
    // distinct CRC values so the single entry miscompares on every pass
    let bus = MockBus::returning(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    let mut engine = mock_engine(bus);
    for domain in Domain::SCAN_ORDER {
        if domain != Domain::Eeprom {
            engine.domains[domain.slot()].state = EntryState::Disabled;
        }
    }
    engine.eeprom_results[0] = enabled_entry(0x1000, 16);

    // 7 ticks per pass: compute, leave-domain, 5 disabled domains
    for _ in 0..70 {
        engine.background_check_cycle();
    }

    assert_eq!(engine.pass_counter, 10, "scan keeps cycling");
    assert_eq!(engine.domains[Domain::Eeprom.slot()].err_counter, 9);
    assert_eq!(
        engine.events.count(EventId::Miscompare),
        9,
        "one event per detection, not per tick"
    );
}

#[test]
fn test_scan_skips_disabled_and_claimed_entries() {
    let mut engine = mock_engine(MockBus::new());
    engine.current_table = Domain::Eeprom.slot();
    engine.eeprom_results[0] = enabled_entry(0x1000, 8);
    engine.eeprom_results[0].state = EntryState::Disabled;
    engine.eeprom_results[1] = enabled_entry(0x2000, 8);
    engine.child_claim = Some(EntryClaim::new(Domain::Eeprom, Some(1)));
    engine.eeprom_results[2] = enabled_entry(0x3000, 8);

    engine.background_check_cycle();

    let calls = engine.bus.as_mock().unwrap().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, 0x3000, "only the unclaimed enabled entry runs");
}

#[test]
fn test_memory_domain_publishes_summed_baseline() {
    let bus = MockBus::returning(&[0x10, 0x20]);
    let mut engine = mock_engine(bus);
    engine.current_table = Domain::Memory.slot();
    engine.memory_results[0] = enabled_entry(0x1000, 8);
    engine.memory_results[2] = enabled_entry(0x2000, 8);

    engine.background_check_cycle();
    engine.background_check_cycle();
    assert_eq!(engine.current_table, Domain::Memory.slot());

    // cursor is past the last enabled entry; this tick publishes the sum
    engine.background_check_cycle();
    assert_eq!(engine.current_table, Domain::Tables.slot());
    assert_eq!(engine.domains[Domain::Memory.slot()].baseline, 0x30);
}

#[test]
fn test_apps_not_found_counts_and_moves_on() {
    let mut engine = mock_engine(MockBus::new());
    engine.current_table = Domain::Apps.slot();
    engine.apps_results[0] = ResultEntry {
        state: EntryState::Enabled,
        name: "GONE".to_string(),
        ..Default::default()
    };

    engine.background_check_cycle();

    assert_eq!(engine.domains[Domain::Apps.slot()].err_counter, 1);
    assert_eq!(engine.events.count(EventId::ComputeAppNotFound), 1);
    assert_eq!(engine.current_entry, 1, "not-found advances past the entry");
    assert_eq!(engine.current_table, Domain::Apps.slot());
}

#[test]
fn test_routine_update_rebuilds_on_new_image() {
    let mut tables = MockTableService::new();
    // Eeprom def table: manage reports a fresh image carrying one enabled row
    tables.manage_results.push_back(TableStatus::InfoUpdated);
    tables.get_address_results.push_back(Ok(TableView {
        defs: Some(crate::types::DefTable::Memory(vec![crate::types::MemoryDefinition {
            state: crate::types::STATE_ENABLED,
            addr: 0x4000,
            len: 32,
        }])),
        region: None,
        updated: true,
    }));

    let mut engine = Engine::new(
        small_config(),
        MemBusVariant::new_mock(MockBus::new()),
        TableServiceVariant::new_mock(tables),
        ModuleRegistryVariant::new_mock(MockModuleRegistry::new()),
    );
    engine.def_handles[0] = Some(crate::types::TableHandle(7));
    engine.eeprom_results[0] = ResultEntry {
        state: EntryState::Enabled,
        computed: true,
        comparison: 0xDEAD,
        byte_offset: 4,
        ..enabled_entry(0x9999, 8)
    };

    let status = engine.handle_routine_table_updates();

    assert_eq!(status, TableStatus::Success);
    assert_eq!(engine.eeprom_defs[0].addr, 0x4000);
    let rebuilt = &engine.eeprom_results[0];
    assert_eq!(rebuilt.addr, 0x4000);
    assert!(!rebuilt.computed, "rebuild clears computed baselines");
    assert_eq!(rebuilt.byte_offset, 0);
}

#[test]
fn test_routine_update_failure_does_not_block_other_domains() {
    let mut tables = MockTableService::new();
    // first domain errors on get_address, the rest never load
    tables
        .get_address_results
        .push_back(Err(TableStatus::Error));

    let mut engine = Engine::new(
        small_config(),
        MemBusVariant::new_mock(MockBus::new()),
        TableServiceVariant::new_mock(tables),
        ModuleRegistryVariant::new_mock(MockModuleRegistry::new()),
    );
    for slot in 0..4 {
        engine.def_handles[slot] = Some(crate::types::TableHandle(slot as u32 + 1));
    }

    let status = engine.handle_routine_table_updates();

    assert!(!status.is_ok());
    assert_eq!(engine.events.count(EventId::TableUpdateError), 4);
    let mock = engine.tables.as_mock().unwrap();
    assert_eq!(mock.call_count("manage"), 4, "every domain is still managed");
}

#[test]
fn test_rebuild_reports_empty_definition_table() {
    let mut engine = mock_engine(MockBus::new());
    engine.process_new_definition_table(Domain::Eeprom);
    assert_eq!(engine.events.count(EventId::DefinitionTableEmpty), 1);
}
