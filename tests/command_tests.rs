//! Command layer contract: every command bumps exactly one counter and emits
//! exactly one primary event.

use std::sync::{Arc, Mutex};

use sumwarden::commands::dispatch;
use sumwarden::engine::{SharedEngine, SharedHost};
use sumwarden::events::EventId;
use sumwarden::membus::{MemBusVariant, MockBus};
use sumwarden::modreg::{MockModuleRegistry, ModuleRegistryVariant};
use sumwarden::tableservice::{MockTableService, TableServiceVariant};
use sumwarden::tasking::ChildTaskHostVariant;
use sumwarden::types::{Domain, EntryState, ResultEntry, STATE_DISABLED, STATE_ENABLED};
use sumwarden::{BaseConfig, Command, Engine};

fn setup() -> (SharedEngine, SharedHost) {
    let config = BaseConfig {
        mem_table_entries: 4,
        name_table_entries: 4,
        ..Default::default()
    };
    let mut engine = Engine::new(
        config,
        MemBusVariant::new_mock(MockBus::new()),
        TableServiceVariant::new_mock(MockTableService::new()),
        ModuleRegistryVariant::new_mock(MockModuleRegistry::new()),
    );
    engine.eeprom_defs[1].state = STATE_ENABLED;
    engine.eeprom_defs[1].addr = 0x2000;
    engine.eeprom_defs[1].len = 0x100;
    engine.eeprom_results[1] = ResultEntry {
        state: EntryState::Enabled,
        addr: 0x2000,
        len: 0x100,
        ..Default::default()
    };
    (
        Arc::new(Mutex::new(engine)),
        Arc::new(Mutex::new(ChildTaskHostVariant::new_mock())),
    )
}

#[test]
fn test_global_and_domain_switch_commands() {
    let (shared, host) = setup();

    dispatch(&shared, &host, Command::DisableAll);
    dispatch(&shared, &host, Command::DisableDomain(Domain::Memory));
    dispatch(&shared, &host, Command::EnableAll);

    let engine = shared.lock().unwrap();
    assert_eq!(engine.checksum_state, EntryState::Enabled);
    assert_eq!(engine.domains[Domain::Memory.slot()].state, EntryState::Disabled);
    assert_eq!(engine.cmd_counter, 3);
    assert_eq!(engine.cmd_err_counter, 0);
    assert_eq!(engine.events.count(EventId::CmdGlobalState), 2);
    assert_eq!(engine.events.count(EventId::CmdDomainState), 1);
}

#[test]
fn test_entry_state_writes_through_to_definitions() {
    let (shared, host) = setup();

    dispatch(&shared, &host, Command::DisableEntry(Domain::Eeprom, 1));

    let engine = shared.lock().unwrap();
    assert_eq!(engine.eeprom_results[1].state, EntryState::Disabled);
    assert_eq!(engine.eeprom_defs[1].state, STATE_DISABLED);
    assert_eq!(engine.cmd_counter, 1);
    assert_eq!(engine.events.count(EventId::CmdEntryState), 1);
}

#[test]
fn test_entry_commands_reject_empty_and_out_of_range_ids() {
    let (shared, host) = setup();

    dispatch(&shared, &host, Command::EnableEntry(Domain::Eeprom, 0));
    dispatch(&shared, &host, Command::EnableEntry(Domain::Eeprom, 99));

    let engine = shared.lock().unwrap();
    assert_eq!(engine.cmd_counter, 0);
    assert_eq!(engine.cmd_err_counter, 2);
    assert_eq!(engine.events.count(EventId::CmdInvalidEntry), 2);
}

#[test]
fn test_baseline_report_before_and_after_compute() {
    let (shared, host) = setup();

    dispatch(&shared, &host, Command::ReportBaseline(Domain::Eeprom, 1));
    {
        let mut engine = shared.lock().unwrap();
        let event = engine.events.last_of(EventId::CmdBaselineReport).unwrap();
        assert!(event.text.contains("not yet computed"));
        engine.eeprom_results[1].computed = true;
        engine.eeprom_results[1].comparison = 0xBEEF;
    }

    dispatch(&shared, &host, Command::ReportBaseline(Domain::Eeprom, 1));

    let engine = shared.lock().unwrap();
    let event = engine.events.last_of(EventId::CmdBaselineReport).unwrap();
    assert!(event.text.contains("0x0000beef"));
    assert_eq!(engine.cmd_counter, 2);
}

#[test]
fn test_entry_id_lookup_by_address() {
    let (shared, host) = setup();

    dispatch(&shared, &host, Command::GetEntryIdByAddress(Domain::Eeprom, 0x2080));
    dispatch(&shared, &host, Command::GetEntryIdByAddress(Domain::Eeprom, 0x9000));

    let engine = shared.lock().unwrap();
    assert_eq!(engine.events.count(EventId::CmdEntryIdResult), 2);
    let texts: Vec<_> = engine
        .events
        .entries()
        .iter()
        .filter(|e| e.id == EventId::CmdEntryIdResult)
        .map(|e| e.text.clone())
        .collect();
    assert!(texts[0].contains("entry 1"));
    assert!(texts[1].contains("no entry"));
}

#[test]
fn test_entry_id_lookup_rejects_name_domains() {
    let (shared, host) = setup();

    dispatch(&shared, &host, Command::GetEntryIdByAddress(Domain::Apps, 0x2080));

    let engine = shared.lock().unwrap();
    assert_eq!(engine.cmd_err_counter, 1);
    assert_eq!(engine.events.count(EventId::CmdInvalidEntry), 1);
}

#[test]
fn test_recompute_command_validates_the_entry() {
    let (shared, host) = setup();

    dispatch(&shared, &host, Command::RecomputeBaseline(Domain::Eeprom, 0));

    let engine = shared.lock().unwrap();
    assert_eq!(engine.cmd_err_counter, 1);
    assert!(!engine.recompute_in_progress);
    assert_eq!(host.lock().unwrap().as_mock_mut().unwrap().pending_count(), 0);
}

#[test]
fn test_oneshot_command_rejects_an_invalid_range() {
    let (shared, host) = setup();

    // zero size never validates
    dispatch(
        &shared,
        &host,
        Command::OneShot {
            addr: 0x2000,
            size: 0,
            budget: 0,
        },
    );

    let engine = shared.lock().unwrap();
    assert_eq!(engine.cmd_err_counter, 1);
    assert!(!engine.oneshot_in_progress);
    assert_eq!(engine.events.count(EventId::OneShotError), 1);
}

#[test]
fn test_send_hk_reports_a_serializable_snapshot() {
    let (shared, host) = setup();

    dispatch(&shared, &host, Command::SendHk);

    let engine = shared.lock().unwrap();
    let event = engine.events.last_of(EventId::HkReport).unwrap();
    let snapshot: serde_json::Value = serde_json::from_str(&event.text).unwrap();
    assert_eq!(snapshot["cmd_counter"], 1);
    assert_eq!(snapshot["pass_counter"], 0);
    assert_eq!(snapshot["domain_states"].as_array().unwrap().len(), 6);
}