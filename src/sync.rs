//! Definition/result table consistency.
//!
//! The result tables are derived state: whenever a definition table gets a
//! new image, the paired result table is rebuilt from it wholesale. Routine
//! management runs once per tick and also reconciles Tables-domain share
//! handles whose targets have gone away.

use crate::engine::core::{def_slot, Engine};
use crate::events::{EventId, Severity};
use crate::traits::TableService;
use crate::types::{
    Domain, EntryState, ResultEntry, TableRef, TableStatus, STATE_EMPTY,
};
use crate::validate::{validate_memory_defs, validate_name_defs};

/// Truncate each dot-separated component of an `App.Table` name to at most
/// `max` bytes, backing off to a char boundary so multi-byte names stay valid
/// UTF-8. Overlong components are an operator nuisance, not an error.
fn truncate_components(name: &str, max: usize) -> String {
    name.split('.')
        .map(|part| {
            let mut end = part.len().min(max);
            while !part.is_char_boundary(end) {
                end -= 1;
            }
            &part[..end]
        })
        .collect::<Vec<_>>()
        .join(".")
}

impl Engine {
    /// Rebuild a domain's result table from its working definition copy.
    /// Copies state and target, clears every computed value and cursor.
    pub fn process_new_definition_table(&mut self, domain: Domain) {
        let max = self.config.max_name_component;
        let app_name = self.config.app_name.clone();
        let mut active = 0usize;

        match domain {
            Domain::Eeprom | Domain::Memory => {
                let defs = if domain == Domain::Eeprom {
                    self.eeprom_defs.clone()
                } else {
                    self.memory_defs.clone()
                };
                let results = self.results_mut(domain);
                for (entry, def) in results.iter_mut().zip(defs.iter()) {
                    *entry = ResultEntry {
                        state: EntryState::from_raw(def.state),
                        addr: def.addr,
                        len: def.len,
                        ..Default::default()
                    };
                    if def.state != STATE_EMPTY {
                        active += 1;
                    }
                }
            }
            Domain::Tables => {
                let defs = self.tables_defs.clone();
                let names: Vec<Option<(String, bool)>> = defs
                    .iter()
                    .map(|def| {
                        if def.state == STATE_EMPTY {
                            return None;
                        }
                        let name = truncate_components(&def.name, max);
                        let is_owner = self
                            .tables
                            .get_info(&name)
                            .map(|info| info.owner == app_name)
                            .unwrap_or(false);
                        Some((name, is_owner))
                    })
                    .collect();
                for (i, def) in defs.iter().enumerate() {
                    let mut entry = ResultEntry {
                        state: EntryState::from_raw(def.state),
                        ..Default::default()
                    };
                    if let Some((name, is_owner)) = &names[i] {
                        entry.name = name.clone();
                        let handle = self.tables.share(name).ok();
                        entry.table = Some(TableRef {
                            handle,
                            is_owner: *is_owner,
                        });
                        active += 1;
                    }
                    self.tables_results[i] = entry;
                }
            }
            Domain::Apps => {
                let defs = self.apps_defs.clone();
                for (entry, def) in self.apps_results.iter_mut().zip(defs.iter()) {
                    *entry = ResultEntry {
                        state: EntryState::from_raw(def.state),
                        name: def.name.clone(),
                        ..Default::default()
                    };
                    if def.state != STATE_EMPTY {
                        active += 1;
                    }
                }
            }
            Domain::CfeCore | Domain::OsCore => return,
        }

        if active == 0 {
            self.events.emit(
                EventId::DefinitionTableEmpty,
                Severity::Info,
                format!("{domain} definition table has no active entries"),
            );
        }
    }

    /// Once per tick: cycle each definition table through the table service
    /// (release, manage, re-acquire) and rebuild on a new image. A failing
    /// domain is logged and skipped; the others still run. Returns the last
    /// non-success status, if any.
    pub fn handle_routine_table_updates(&mut self) -> TableStatus {
        let mut last_bad = None;
        for domain in [Domain::Eeprom, Domain::Memory, Domain::Tables, Domain::Apps] {
            let Some(slot) = def_slot(domain) else {
                continue;
            };
            let Some(handle) = self.def_handles[slot] else {
                continue;
            };

            self.tables.release_address(handle);
            let managed = self.tables.manage(handle);
            let status = match self.tables.get_address(handle) {
                Ok(view) => {
                    if view.updated || managed == TableStatus::InfoUpdated {
                        let adopted = match view.defs {
                            Some(defs) => self.adopt_definition_table(domain, defs),
                            None => false,
                        };
                        if adopted {
                            self.process_new_definition_table(domain);
                            if let Err(err) = self.publish_def_table(slot) {
                                tracing::warn!("republishing {domain} definitions failed: {err:#}");
                            }
                        }
                    }
                    self.tables.release_address(handle);
                    if managed.is_ok() { TableStatus::Success } else { managed }
                }
                Err(status) => status,
            };
            if !status.is_ok() {
                self.events.emit(
                    EventId::TableUpdateError,
                    Severity::Error,
                    format!("{domain} definition table management failed: {status:?}"),
                );
                last_bad = Some(status);
            }
        }

        self.reconcile_table_handles();
        last_bad.unwrap_or(TableStatus::Success)
    }

    /// Validate a newly activated definition image and, if it passes, replace
    /// the working copy (padded to the configured table size). A bad image is
    /// rejected and the previous definitions stay live.
    fn adopt_definition_table(&mut self, domain: Domain, defs: crate::types::DefTable) -> bool {
        use crate::types::DefTable;
        match (domain, defs) {
            (Domain::Eeprom, DefTable::Memory(mut defs)) => {
                defs.resize(self.config.mem_table_entries, Default::default());
                if validate_memory_defs(&self.bus, "eeprom", &defs, &mut self.events).is_err() {
                    return false;
                }
                self.eeprom_defs = defs;
                true
            }
            (Domain::Memory, DefTable::Memory(mut defs)) => {
                defs.resize(self.config.mem_table_entries, Default::default());
                if validate_memory_defs(&self.bus, "memory", &defs, &mut self.events).is_err() {
                    return false;
                }
                self.memory_defs = defs;
                true
            }
            (Domain::Tables, DefTable::Name(mut defs)) => {
                defs.resize(self.config.name_table_entries, Default::default());
                if validate_name_defs("tables", &defs, &mut self.events).is_err() {
                    return false;
                }
                self.tables_defs = defs;
                true
            }
            (Domain::Apps, DefTable::Name(mut defs)) => {
                defs.resize(self.config.name_table_entries, Default::default());
                if validate_name_defs("apps", &defs, &mut self.events).is_err() {
                    return false;
                }
                self.apps_defs = defs;
                true
            }
            _ => false,
        }
    }

    /// Drop share handles to tables that no longer exist, so the next compute
    /// attempt re-shares instead of poking a dead handle.
    fn reconcile_table_handles(&mut self) {
        let Engine {
            tables,
            tables_results,
            ..
        } = self;
        for entry in tables_results.iter_mut() {
            let Some(tref) = entry.table.as_mut() else {
                continue;
            };
            if tref.handle.is_none() || entry.name.is_empty() {
                continue;
            }
            if matches!(
                tables.get_info(&entry.name),
                Err(TableStatus::ErrUnregistered)
            ) {
                if let Some(handle) = tref.handle.take() {
                    tables.release_address(handle);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::truncate_components;

    #[test]
    fn test_truncate_clips_each_component() {
        assert_eq!(truncate_components("LONGAPPNAME.Tbl", 4), "LONG.Tbl");
        assert_eq!(truncate_components("APP.VERYLONGTABLE", 4), "APP.VERY");
        assert_eq!(truncate_components("APP.Tbl", 8), "APP.Tbl");
    }

    #[test]
    fn test_truncate_backs_off_to_a_char_boundary() {
        // 'é' is two bytes; a cut inside it must move back to the boundary
        assert_eq!(truncate_components("aaaéé.Tbl", 4), "aaa.Tbl");
        assert_eq!(truncate_components("ééé", 3), "é");
        assert_eq!(truncate_components("ééé", 4), "éé");
    }
}
