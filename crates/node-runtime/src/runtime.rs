//! # Node Runtime
//!
//! Opens the controller over a file-backed block log and runs three tasks:
//!
//! ```text
//!  ┌──────────────┐  every 500 ms   ┌────────────┐
//!  │ production   │ ──────────────▶ │ Controller │ ──signals──▶ SignalBus
//!  └──────────────┘                 └────────────┘                  │
//!  ┌──────────────┐  every N s            ▲                         ▼
//!  │ status       │ ──────────────────────┘               ┌──────────────┐
//!  └──────────────┘                                       │ signal log   │
//!                                                         └──────────────┘
//! ```
//!
//! The controller is single-writer: every task takes the same mutex.

use anyhow::{Context, Result};
use dc_05_controller::{
    ActionDispatcher, Controller, ControllerDeps, FileBlockLog, MemoryStateDb,
};
use parking_lot::Mutex;
use shared_bus::{ChainSignal, SignalBus, SignalFilter};
use shared_types::{BlockTimestamp, BLOCK_INTERVAL_MS};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::NodeConfig;
use crate::producer::BlockProducer;

/// The running node.
pub struct NodeRuntime {
    config: NodeConfig,
    controller: Arc<Mutex<Controller>>,
    bus: Arc<SignalBus>,
    producer: Arc<BlockProducer>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl NodeRuntime {
    /// Open (or create) the chain in `config.data_dir`.
    ///
    /// State is kept in memory, so every start replays the block log.
    pub fn open(config: NodeConfig) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("cannot create data dir {:?}", config.data_dir))?;

        let log_path = config.block_log_path();
        let block_log = FileBlockLog::open(&log_path)
            .with_context(|| format!("cannot open block log {log_path:?}"))?;
        let bus = Arc::new(SignalBus::new());

        let controller = Controller::open(
            config.chain.clone(),
            &config.genesis,
            ControllerDeps {
                state_db: Box::new(MemoryStateDb::new()),
                block_log: Box::new(block_log),
                bus: bus.clone(),
                dispatcher: ActionDispatcher::with_system_handlers(),
            },
        )
        .context("failed to open controller")?;

        let producer = BlockProducer::from_config(&config)?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            controller: Arc::new(Mutex::new(controller)),
            bus,
            producer: Arc::new(producer),
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Shared controller handle.
    pub fn controller(&self) -> Arc<Mutex<Controller>> {
        Arc::clone(&self.controller)
    }

    /// Signal bus the controller publishes on.
    pub fn bus(&self) -> Arc<SignalBus> {
        Arc::clone(&self.bus)
    }

    /// Spawn the production, status and signal-log tasks.
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        {
            let controller = self.controller.lock();
            info!(
                chain_id = %controller.chain_id(),
                head = controller.head_block_num(),
                lib = controller.last_irreversible_block_num(),
                producers = ?self.producer.producers().collect::<Vec<_>>(),
                data_dir = ?self.config.data_dir,
                "Node started"
            );
        }

        let mut handles = vec![self.spawn_status(), self.spawn_signal_log()];
        if self.producer.is_empty() {
            info!("No local producers configured, following only");
        } else {
            handles.push(self.spawn_production());
        }
        handles
    }

    fn spawn_production(&self) -> JoinHandle<()> {
        let controller = self.controller();
        let producer = Arc::clone(&self.producer);
        let mut shutdown = self.shutdown_rx.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(BLOCK_INTERVAL_MS));
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let now = current_slot();
                        let mut controller = controller.lock();
                        if let Err(err) = producer.maybe_produce(&mut controller, now) {
                            warn!(slot = now.slot(), error = %err, "Block production failed");
                        }
                    }
                    _ = shutdown.changed() => {
                        info!("Production loop stopped");
                        break;
                    }
                }
            }
        })
    }

    fn spawn_status(&self) -> JoinHandle<()> {
        let controller = self.controller();
        let period = Duration::from_secs(self.config.status_interval_secs);
        let mut shutdown = self.shutdown_rx.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let controller = controller.lock();
                        info!(
                            head = controller.head_block_num(),
                            producer = %controller.head_block_producer(),
                            lib = controller.last_irreversible_block_num(),
                            schedule_version = controller.active_producers().version,
                            queued = controller.pending_transaction_count(),
                            reversible = controller.fork_db().len(),
                            "Chain status"
                        );
                    }
                    _ = shutdown.changed() => break,
                }
            }
        })
    }

    fn spawn_signal_log(&self) -> JoinHandle<()> {
        let mut signals = self.bus.subscribe(SignalFilter::blocks());
        let mut shutdown = self.shutdown_rx.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    signal = signals.recv() => match signal {
                        Some(ChainSignal::BlockConfirmed { block_id }) => {
                            debug!(block_num = block_id.block_num(), id = %block_id, "Block irreversible");
                        }
                        Some(signal) => debug!(?signal, "Block signal"),
                        None => break,
                    },
                    _ = shutdown.changed() => break,
                }
            }
        })
    }

    /// Stop every task and wait for them.
    pub async fn shutdown(&self, handles: Vec<JoinHandle<()>>) {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Task ended abnormally");
            }
        }

        let controller = self.controller.lock();
        info!(
            head = controller.head_block_num(),
            lib = controller.last_irreversible_block_num(),
            "Shutdown complete"
        );
    }
}

/// Slot containing the current wall-clock time.
pub fn current_slot() -> BlockTimestamp {
    let unix_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();
    BlockTimestamp::from_unix_millis(unix_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc_05_controller::GenesisConfig;

    fn make_config(dir: &std::path::Path) -> NodeConfig {
        NodeConfig {
            genesis: GenesisConfig::devnet(1, "runtime"),
            producers: vec![GenesisConfig::producer_name(0).unwrap()],
            data_dir: dir.to_path_buf(),
            ..NodeConfig::default()
        }
    }

    #[test]
    fn test_open_creates_block_log() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = NodeRuntime::open(make_config(dir.path())).unwrap();

        assert_eq!(runtime.controller().lock().head_block_num(), 1);
        assert!(dir.path().join(crate::config::BLOCK_LOG_FILE).exists());
    }

    #[test]
    fn test_reopen_replays_produced_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let config = make_config(dir.path());
        let head_id = {
            let runtime = NodeRuntime::open(config.clone()).unwrap();
            let producer = BlockProducer::from_config(&config).unwrap();
            let controller = runtime.controller();
            let mut controller = controller.lock();
            for slot in 1..=3 {
                producer
                    .maybe_produce(&mut controller, BlockTimestamp::from_slot(slot))
                    .unwrap()
                    .unwrap();
            }
            controller.head_block_id()
        };

        // A single producer makes every block irreversible immediately.
        let reopened = NodeRuntime::open(config).unwrap();
        let controller = reopened.controller();
        let controller = controller.lock();
        assert_eq!(controller.head_block_num(), 4);
        assert_eq!(controller.head_block_id(), head_id);
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = make_config(dir.path());
        config.producers.clear();
        let runtime = NodeRuntime::open(config).unwrap();

        let handles = runtime.start();
        assert_eq!(handles.len(), 2);
        runtime.shutdown(handles).await;
    }
}
