//! Background round-robin scan.
//!
//! One budgeted compute call per wakeup tick, walking the six domains in
//! `Domain::SCAN_ORDER`. Dispatch goes through a fixed descriptor table;
//! adding a domain means adding a row, not a branch.

use crate::engine::core::Engine;
use crate::events::{EventId, Severity};
use crate::types::{Domain, EntryState, StepStatus};

type ScanFn = fn(&mut Engine);

const SCAN_DISPATCH: [(Domain, ScanFn); 6] = [
    (Domain::CfeCore, scan_cfecore),
    (Domain::OsCore, scan_oscore),
    (Domain::Eeprom, scan_eeprom),
    (Domain::Memory, scan_memory),
    (Domain::Tables, scan_tables),
    (Domain::Apps, scan_apps),
];

fn scan_cfecore(engine: &mut Engine) {
    engine.scan_singleton(Domain::CfeCore);
}

fn scan_oscore(engine: &mut Engine) {
    engine.scan_singleton(Domain::OsCore);
}

fn scan_eeprom(engine: &mut Engine) {
    engine.scan_indexed(Domain::Eeprom);
}

fn scan_memory(engine: &mut Engine) {
    engine.scan_indexed(Domain::Memory);
}

fn scan_tables(engine: &mut Engine) {
    engine.scan_indexed(Domain::Tables);
}

fn scan_apps(engine: &mut Engine) {
    engine.scan_indexed(Domain::Apps);
}

impl Engine {
    /// One background tick. Bounded by `max_bytes_per_cycle`; never blocks.
    pub fn background_check_cycle(&mut self) {
        if self.checksum_state != EntryState::Enabled {
            return;
        }
        let (domain, scan) = SCAN_DISPATCH[self.current_table];
        if self.domains[domain.slot()].state != EntryState::Enabled {
            self.go_to_next_table();
            return;
        }
        scan(self);
    }

    /// Advance the round-robin to the next domain. Completing a full pass
    /// bumps the pass counter.
    pub fn go_to_next_table(&mut self) {
        self.current_entry = 0;
        self.current_table = (self.current_table + 1) % Domain::SCAN_ORDER.len();
        if self.current_table == 0 {
            self.pass_counter = self.pass_counter.wrapping_add(1);
        }
    }

    fn scan_singleton(&mut self, domain: Domain) {
        let budget = self.config.max_bytes_per_cycle;
        if self.claimed(domain, 0) || self.results(domain)[0].state != EntryState::Enabled {
            self.go_to_next_table();
            return;
        }

        let baseline = self.results(domain)[0].comparison;
        match self.compute_step(domain, 0, budget) {
            Ok(out) if !out.done => {}
            Ok(out) => {
                let slot = domain.slot();
                match out.status {
                    StepStatus::Miscompare => {
                        self.domains[slot].err_counter += 1;
                        self.events.emit(
                            EventId::Miscompare,
                            Severity::Error,
                            format!(
                                "{domain} miscompare: baseline {baseline:#010x}, \
                                 computed {:#010x}",
                                out.value
                            ),
                        );
                    }
                    _ => self.domains[slot].baseline = out.value,
                }
                self.go_to_next_table();
            }
            Err(err) => {
                tracing::error!("{domain} checksum step failed: {err}");
                self.go_to_next_table();
            }
        }
    }

    fn scan_indexed(&mut self, domain: Domain) {
        let budget = self.config.max_bytes_per_cycle;
        let len = self.results(domain).len();

        let mut idx = self.current_entry;
        while idx < len {
            let eligible = self.results(domain)[idx].state == EntryState::Enabled
                && !self.claimed(domain, idx);
            if eligible {
                break;
            }
            idx += 1;
        }
        if idx >= len {
            self.finish_domain_scan(domain);
            return;
        }
        self.current_entry = idx;

        let baseline = self.results(domain)[idx].comparison;
        match self.compute_step(domain, idx, budget) {
            Ok(out) if out.status == StepStatus::NotFound => {
                // Diagnostic event already came from the compute layer; move
                // on instead of retrying every tick.
                self.domains[domain.slot()].err_counter += 1;
                self.advance_entry(domain, len);
            }
            Ok(out) if !out.done => {}
            Ok(out) => {
                if out.status == StepStatus::Miscompare {
                    self.domains[domain.slot()].err_counter += 1;
                    self.events.emit(
                        EventId::Miscompare,
                        Severity::Error,
                        format!(
                            "{domain} entry {idx} miscompare: baseline {baseline:#010x}, \
                             computed {:#010x}",
                            out.value
                        ),
                    );
                }
                // one event per detection; the entry is re-verified on the
                // next full pass
                self.advance_entry(domain, len);
            }
            Err(err) => {
                tracing::error!("{domain} entry {idx} checksum step failed: {err}");
                self.advance_entry(domain, len);
            }
        }
    }

    fn advance_entry(&mut self, domain: Domain, len: usize) {
        self.current_entry += 1;
        if self.current_entry >= len {
            self.finish_domain_scan(domain);
        }
    }

    /// Leaving an indexed domain: Eeprom/Memory publish the sum of entry
    /// baselines as the domain baseline telemetry field.
    fn finish_domain_scan(&mut self, domain: Domain) {
        if matches!(domain, Domain::Eeprom | Domain::Memory) {
            let sum = self
                .results(domain)
                .iter()
                .filter(|e| e.computed)
                .fold(0u32, |acc, e| acc.wrapping_add(e.comparison));
            self.domains[domain.slot()].baseline = sum;
        }
        self.go_to_next_table();
    }
}
