//! Run loop: command intake plus the periodic background tick.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use kanal::{AsyncReceiver, AsyncSender};
use tracing::{span, Level};

use crate::commands::{dispatch, Command};
use crate::config::BaseConfig;
use crate::tasking::ChildTaskHostVariant;

use super::{Engine, SharedEngine, SharedHost};

pub struct SumWarden {
    engine: SharedEngine,
    host: SharedHost,
    cmd_tx: AsyncSender<Command>,
    cmd_rx: AsyncReceiver<Command>,
}

impl SumWarden {
    pub fn new(config: BaseConfig) -> anyhow::Result<Self> {
        let engine = Engine::initialize(config)?;
        let (cmd_tx, cmd_rx) = kanal::unbounded_async();
        Ok(SumWarden {
            engine: Arc::new(Mutex::new(engine)),
            host: Arc::new(Mutex::new(ChildTaskHostVariant::new_tokio())),
            cmd_tx,
            cmd_rx,
        })
    }

    pub fn engine(&self) -> SharedEngine {
        self.engine.clone()
    }

    pub fn command_sender(&self) -> AsyncSender<Command> {
        self.cmd_tx.clone()
    }

    /// Main loop: a command wakes us immediately; otherwise the tick timeout
    /// runs one round of table management and one background checksum cycle.
    /// Exits when every command sender is gone.
    pub async fn run(&self) {
        let span = span!(Level::INFO, "warden_loop");
        let _enter = span.enter();
        let tick = Duration::from_millis(self.engine.lock().unwrap().config.tick_millis);

        loop {
            match tokio::time::timeout(tick, self.cmd_rx.recv()).await {
                Ok(Ok(cmd)) => dispatch(&self.engine, &self.host, cmd),
                Ok(Err(_)) => break,
                Err(_) => {
                    {
                        let mut engine = self.engine.lock().unwrap();
                        engine.handle_routine_table_updates();
                        engine.background_check_cycle();
                    }
                    self.host.lock().unwrap().reap();
                }
            }
        }
    }
}
