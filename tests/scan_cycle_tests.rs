//! End-to-end scan tests over the simulated platform: bring-up, baseline
//! establishment, corruption detection and warm start.

use sumwarden::events::EventId;
use sumwarden::types::{Domain, EntryState, NameDefinition, STATE_ENABLED};
use sumwarden::{BaseConfig, Engine};

fn test_config() -> BaseConfig {
    BaseConfig {
        max_bytes_per_cycle: 4096,
        mem_table_entries: 4,
        name_table_entries: 4,
        cfecore_size: 0x1000,
        oscore_size: 0x1000,
        ..Default::default()
    }
}

fn run_until<F: Fn(&Engine) -> bool>(engine: &mut Engine, max_ticks: usize, done: F) {
    for _ in 0..max_ticks {
        if done(engine) {
            return;
        }
        engine.background_check_cycle();
    }
    panic!("condition not reached within {max_ticks} ticks");
}

#[test]
fn test_initialize_brings_up_the_sim() {
    let engine = Engine::initialize(test_config()).unwrap();

    assert_eq!(engine.events.count(EventId::InitDone), 1);
    assert!(engine.def_handles.iter().all(|h| h.is_some()));
    // built-in defaults carry one enabled row per memory domain
    assert_eq!(engine.eeprom_defs[0].state, STATE_ENABLED);
    assert_eq!(engine.memory_defs[0].state, STATE_ENABLED);
    assert_eq!(engine.events.count(EventId::ValidationSummary), 4);
}

#[test]
fn test_first_pass_establishes_all_baselines() {
    let mut engine = Engine::initialize(test_config()).unwrap();

    run_until(&mut engine, 200, |e| e.pass_counter >= 1);

    assert!(engine.cfecore.computed);
    assert!(engine.oscore.computed);
    assert!(engine.eeprom_results[0].computed);
    assert!(engine.memory_results[0].computed);
    assert_eq!(engine.events.count(EventId::Miscompare), 0);
    assert_ne!(engine.domains[Domain::CfeCore.slot()].baseline, 0);
}

#[test]
fn test_corruption_is_detected_on_a_later_pass() {
    let mut engine = Engine::initialize(test_config()).unwrap();
    run_until(&mut engine, 200, |e| e.pass_counter >= 1);
    engine.events.clear();

    let eeprom_addr = engine.eeprom_defs[0].addr;
    engine
        .bus
        .as_sim_mut()
        .unwrap()
        .write(eeprom_addr + 0x10, &[0xAA, 0x55, 0xAA, 0x55])
        .unwrap();

    let slot = Domain::Eeprom.slot();
    run_until(&mut engine, 500, |e| e.domains[slot].err_counter > 0);

    let event = engine.events.last_of(EventId::Miscompare).unwrap();
    assert!(event.text.contains("eeprom"));
    // detection does not overwrite the stored baseline
    assert!(engine.eeprom_results[0].computed);
}

#[test]
fn test_tables_domain_checksums_a_foreign_table() {
    let mut engine = Engine::initialize(test_config()).unwrap();
    engine
        .bus
        .as_sim_mut()
        .unwrap()
        .provision(0x0060_0000, 256)
        .unwrap();
    engine
        .tables
        .as_sim_mut()
        .unwrap()
        .register_raw("OTHER.ParamTbl", "OTHER", 0x0060_0000, 256)
        .unwrap();
    engine.tables_defs[0] = NameDefinition {
        state: STATE_ENABLED,
        name: "OTHER.ParamTbl".to_string(),
    };
    engine.process_new_definition_table(Domain::Tables);

    engine.current_table = Domain::Tables.slot();
    engine.background_check_cycle();

    let entry = &engine.tables_results[0];
    assert!(entry.computed);
    assert_eq!(entry.addr, 0x0060_0000);
    assert_eq!(entry.len, 256);
    assert!(!entry.table.as_ref().unwrap().is_owner);
}

#[test]
fn test_apps_domain_checksums_a_loaded_module() {
    let mut engine = Engine::initialize(test_config()).unwrap();
    engine
        .bus
        .as_sim_mut()
        .unwrap()
        .provision(0x0070_0000, 128)
        .unwrap();
    engine
        .modules
        .as_sim_mut()
        .unwrap()
        .insert_app("SC", 0x0070_0000, 128);
    engine.apps_defs[0] = NameDefinition {
        state: STATE_ENABLED,
        name: "SC".to_string(),
    };
    engine.process_new_definition_table(Domain::Apps);

    engine.current_table = Domain::Apps.slot();
    engine.background_check_cycle();

    let entry = &engine.apps_results[0];
    assert!(entry.computed);
    assert_eq!(entry.addr, 0x0070_0000);
    assert_eq!(entry.len, 128);
}

#[test]
fn test_long_table_name_components_are_truncated() {
    let mut engine = Engine::initialize(test_config()).unwrap();
    let long = "X".repeat(60);
    engine.tables_defs[0] = NameDefinition {
        state: STATE_ENABLED,
        name: format!("{long}.{long}"),
    };
    engine.process_new_definition_table(Domain::Tables);

    let name = &engine.tables_results[0].name;
    let max = engine.config.max_name_component;
    assert!(name.split('.').all(|part| part.len() <= max));
    assert_eq!(name.split('.').count(), 2);
}

#[test]
fn test_switch_mirror_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config();
    config.mirror_path = Some(dir.path().join("switches.json").to_str().unwrap().to_string());

    let mut engine = Engine::initialize(config.clone()).unwrap();
    engine.checksum_state = EntryState::Disabled;
    engine.domains[Domain::Tables.slot()].state = EntryState::Disabled;
    engine.persist_switches();
    drop(engine);

    let restarted = Engine::initialize(config).unwrap();
    assert_eq!(restarted.checksum_state, EntryState::Disabled);
    assert_eq!(
        restarted.domains[Domain::Tables.slot()].state,
        EntryState::Disabled
    );
    assert_eq!(
        restarted.domains[Domain::Eeprom.slot()].state,
        EntryState::Enabled
    );
}
