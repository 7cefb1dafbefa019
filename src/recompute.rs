//! Recompute and one-shot child tasks.
//!
//! At most one child task exists at a time; the in-progress flags are the
//! single source of truth for that. Flag check-and-set and the spawn request
//! happen under one engine lock acquisition, so two commands racing each
//! other cannot both start. Task bodies re-take the lock for every bounded
//! step and bail out as soon as their flag is cleared, which is what makes
//! cancellation safe for a blocking task.

use crate::engine::{SharedEngine, SharedHost};
use crate::events::{EventId, Severity};
use crate::traits::ChildTaskHost;
use crate::types::{Domain, EntryClaim, OneShotRecord, StepStatus};

/// Exclusivity gate. Bumps the error counter and reports busy when a child
/// task already owns the engine.
pub fn check_recompute_oneshot(engine: &mut crate::engine::core::Engine) -> bool {
    if engine.recompute_in_progress || engine.oneshot_in_progress {
        engine.bump_cmd_err();
        engine.events.emit(
            EventId::CmdBusy,
            Severity::Error,
            "recompute or one-shot already in progress".to_string(),
        );
        true
    } else {
        false
    }
}

/// Start a baseline recompute for one entry. The caller has validated the
/// entry id; this claims it, resets its computed state and hands the loop to
/// a child task.
pub fn start_recompute(
    shared: &SharedEngine,
    host: &SharedHost,
    domain: Domain,
    entry_id: usize,
) {
    let mut engine = shared.lock().unwrap();
    if check_recompute_oneshot(&mut engine) {
        return;
    }

    engine.recompute_in_progress = true;
    engine.child_claim = Some(EntryClaim::new(domain, Some(entry_id)));
    {
        let entry = &mut engine.results_mut(domain)[entry_id];
        entry.computed = false;
        entry.reset_cursor();
    }

    let body_shared = shared.clone();
    let body = Box::new(move || recompute_body(&body_shared, domain, entry_id));
    match host.lock().unwrap().spawn("recompute", body) {
        Ok(id) => {
            engine.child_task_id = Some(id);
            engine.bump_cmd();
            engine.events.emit(
                EventId::RecomputeStarted,
                Severity::Debug,
                format!("recompute started: {domain} entry {entry_id}"),
            );
        }
        Err(err) => {
            engine.recompute_in_progress = false;
            engine.child_claim = None;
            engine.bump_cmd_err();
            engine.events.emit(
                EventId::ChildTaskError,
                Severity::Error,
                format!("recompute child task creation failed: {err}"),
            );
        }
    }
}

fn recompute_body(shared: &SharedEngine, domain: Domain, entry_id: usize) {
    loop {
        let mut engine = shared.lock().unwrap();
        if !engine.recompute_in_progress {
            // cancelled from outside; flags already reset
            return;
        }
        let budget = engine.config.recompute_bytes_per_step;

        match engine.compute_step(domain, entry_id, budget) {
            Ok(out) if out.done => {
                let value = out.value;
                if !domain.is_indexed() {
                    engine.domains[domain.slot()].baseline = value;
                }
                if let Some(state) = engine.def_state(domain, entry_id) {
                    engine.results_mut(domain)[entry_id].state = state;
                }
                engine.events.emit(
                    EventId::RecomputeFinished,
                    Severity::Info,
                    format!(
                        "recompute finished: {domain} entry {entry_id}, \
                         baseline {value:#010x}"
                    ),
                );
                finish_recompute(&mut engine);
                return;
            }
            Ok(out) if out.status == StepStatus::NotFound => {
                engine.events.emit(
                    EventId::RecomputeError,
                    Severity::Error,
                    format!("recompute failed: {domain} entry {entry_id} not found"),
                );
                finish_recompute(&mut engine);
                return;
            }
            Ok(_) => {
                // partial step; drop the lock so the tick loop can run
            }
            Err(err) => {
                engine.events.emit(
                    EventId::RecomputeError,
                    Severity::Error,
                    format!("recompute failed: {domain} entry {entry_id}: {err}"),
                );
                finish_recompute(&mut engine);
                return;
            }
        }
    }
}

fn finish_recompute(engine: &mut crate::engine::core::Engine) {
    engine.recompute_in_progress = false;
    engine.child_claim = None;
    engine.child_task_id = None;
}

/// Start a one-shot checksum over a caller-given range. The record is
/// independent of any scan entry. A zero budget means the whole range in one
/// step.
pub fn start_oneshot(
    shared: &SharedEngine,
    host: &SharedHost,
    addr: u32,
    size: u32,
    budget: u32,
) {
    let mut engine = shared.lock().unwrap();
    if check_recompute_oneshot(&mut engine) {
        return;
    }

    let budget = if budget == 0 {
        engine.config.max_bytes_per_cycle
    } else {
        budget
    };
    engine.oneshot_in_progress = true;
    engine.oneshot = OneShotRecord {
        addr,
        size,
        budget,
        checksum: 0,
    };

    let body_shared = shared.clone();
    let body = Box::new(move || oneshot_body(&body_shared, addr, size, budget));
    match host.lock().unwrap().spawn("oneshot", body) {
        Ok(id) => {
            engine.child_task_id = Some(id);
            engine.bump_cmd();
            engine.events.emit(
                EventId::OneShotStarted,
                Severity::Debug,
                format!("one-shot started: addr {addr:#010x}, size {size:#x}"),
            );
        }
        Err(err) => {
            engine.oneshot_in_progress = false;
            engine.bump_cmd_err();
            engine.events.emit(
                EventId::ChildTaskError,
                Severity::Error,
                format!("one-shot child task creation failed: {err}"),
            );
        }
    }
}

/// Runs the whole range to completion within one invocation, still one
/// bounded step per lock acquisition.
fn oneshot_body(shared: &SharedEngine, addr: u32, size: u32, budget: u32) {
    use crate::traits::MemAccess;

    let mut offset = 0u32;
    let mut partial = 0u32;
    loop {
        let mut engine = shared.lock().unwrap();
        if !engine.oneshot_in_progress {
            return;
        }
        let take = (size - offset).min(budget);
        match engine.bus.crc_range(addr + offset, take, partial) {
            Ok(value) => {
                offset += take;
                partial = value;
            }
            Err(err) => {
                engine.events.emit(
                    EventId::OneShotError,
                    Severity::Error,
                    format!("one-shot failed at offset {offset:#x}: {err}"),
                );
                engine.oneshot_in_progress = false;
                engine.child_task_id = None;
                return;
            }
        }
        if offset >= size {
            engine.oneshot.checksum = partial;
            engine.events.emit(
                EventId::OneShotFinished,
                Severity::Info,
                format!(
                    "one-shot finished: addr {addr:#010x}, size {size:#x}, \
                     checksum {partial:#010x}"
                ),
            );
            engine.oneshot_in_progress = false;
            engine.child_task_id = None;
            return;
        }
    }
}

/// Tear down whichever child task is live and reset both in-progress flags.
pub fn cancel_oneshot(shared: &SharedEngine, host: &SharedHost) {
    let mut engine = shared.lock().unwrap();
    if !engine.recompute_in_progress && !engine.oneshot_in_progress {
        engine.bump_cmd_err();
        engine.events.emit(
            EventId::CancelOneShotError,
            Severity::Error,
            "cancel: no recompute or one-shot in progress".to_string(),
        );
        return;
    }

    let deleted = match engine.child_task_id {
        Some(id) => host.lock().unwrap().delete(id),
        None => Ok(()),
    };
    match deleted {
        Ok(()) => {
            engine.recompute_in_progress = false;
            engine.oneshot_in_progress = false;
            engine.child_claim = None;
            engine.child_task_id = None;
            engine.bump_cmd();
            engine.events.emit(
                EventId::CancelOneShot,
                Severity::Info,
                "recompute/one-shot cancelled".to_string(),
            );
        }
        Err(err) => {
            engine.bump_cmd_err();
            engine.events.emit(
                EventId::CancelOneShotError,
                Severity::Error,
                format!("cancel failed: {err}"),
            );
        }
    }
}
