//! Receiver orchestration -- assembly, lifecycle, and periodic reporting.
//!
//! The [`Orchestrator`] is the central coordinator of `logvault-daemon`.
//! It opens the store, builds the write queue and the enabled receivers,
//! manages startup/shutdown ordering, and runs the background flush and
//! statistics tasks.
//!
//! # Startup Order
//!
//! 1. Syslog UDP receiver
//! 2. HTTP API receiver
//! 3. SNMP trap receiver
//!
//! Bind failures on the datagram receivers (typically the privileged
//! ports 514/162) disable that receiver with a warning; an HTTP bind
//! failure aborts startup. Shutdown stops receivers in reverse order and
//! drains the write queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;
use metrics::gauge;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use logvault_core::config::LogvaultConfig;
use logvault_core::metrics as m;
use logvault_core::pipeline::DynReceiver;
use logvault_core::types::LogSource;
use logvault_ingest::parser::{SyslogParser, TrapParser};
use logvault_ingest::receiver::{
    HttpReceiver, HttpReceiverConfig, IngestCounters, UdpLogReceiver, UdpReceiverConfig,
};
use logvault_storage::{LogStore, WriteQueue};

/// Interval of the queue flush ticker. Must stay below the configured
/// flush interval so the time trigger fires promptly.
const FLUSH_TICK_MS: u64 = 200;

/// Interval between statistics reports.
const STATS_INTERVAL: Duration = Duration::from_secs(10);

/// The daemon orchestrator.
///
/// Owns the store (by value, behind the shared handle), the write queue,
/// the aggregate counters, and all receivers.
pub struct Orchestrator {
    config: LogvaultConfig,
    store: Arc<Mutex<LogStore>>,
    queue: Arc<WriteQueue>,
    counters: Arc<IngestCounters>,
    /// Receivers in startup order. Entries that fail to bind are removed.
    receivers: Vec<(&'static str, Box<dyn DynReceiver>)>,
    running: AtomicBool,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    start_time: Instant,
}

impl Orchestrator {
    /// Validate configuration, open storage, and assemble the queue and
    /// the enabled receivers.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails or the
    /// database cannot be opened. Both are fatal init failures.
    pub async fn build(config: LogvaultConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        let store = LogStore::open(&config.storage.db_path)
            .map_err(|e| anyhow::anyhow!("failed to open storage: {}", e))?;
        tracing::info!(db_path = %config.storage.db_path, "storage opened");

        let store = Arc::new(Mutex::new(store));
        let queue = Arc::new(WriteQueue::new(
            Arc::clone(&store),
            config.queue.batch_size,
            Duration::from_millis(config.queue.flush_interval_ms),
        ));
        let counters = Arc::new(IngestCounters::new());

        let mut receivers: Vec<(&'static str, Box<dyn DynReceiver>)> = Vec::new();
        if config.syslog.enabled {
            receivers.push((
                "syslog",
                Box::new(UdpLogReceiver::new(
                    UdpReceiverConfig::syslog(&config.syslog.bind_addr),
                    LogSource::Syslog,
                    Arc::new(SyslogParser::new()),
                    Arc::clone(&queue),
                    Arc::clone(&counters),
                )),
            ));
        }
        if config.rest.enabled {
            receivers.push((
                "rest",
                Box::new(HttpReceiver::new(
                    HttpReceiverConfig {
                        bind_addr: config.rest.bind_addr.clone(),
                    },
                    Arc::clone(&store),
                    Arc::clone(&counters),
                )),
            ));
        }
        if config.snmp.enabled {
            receivers.push((
                "snmp",
                Box::new(UdpLogReceiver::new(
                    UdpReceiverConfig::snmp(&config.snmp.bind_addr),
                    LogSource::Snmp,
                    Arc::new(TrapParser::new()),
                    Arc::clone(&queue),
                    Arc::clone(&counters),
                )),
            ));
        }

        tracing::info!(receivers = receivers.len(), "orchestrator initialized");

        Ok(Self {
            config,
            store,
            queue,
            counters,
            receivers,
            running: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
            tasks: Vec::new(),
            start_time: Instant::now(),
        })
    }

    /// Start the enabled receivers and the background tasks.
    ///
    /// Datagram receiver bind failures are recoverable: the receiver is
    /// dropped with a warning and the rest keep running. An HTTP bind
    /// failure rolls back already-started receivers and aborts.
    pub async fn start(&mut self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let mut started: Vec<(&'static str, Box<dyn DynReceiver>)> = Vec::new();
        for (name, mut receiver) in self.receivers.drain(..) {
            match receiver.start().await {
                Ok(()) => {
                    tracing::info!(receiver = name, "receiver started");
                    started.push((name, receiver));
                }
                Err(e) if name == "rest" => {
                    tracing::error!(receiver = name, error = %e, "HTTP receiver failed to start");
                    for (rolled_back, mut receiver) in started.drain(..).rev() {
                        if let Err(stop_err) = receiver.stop().await {
                            tracing::error!(
                                receiver = rolled_back,
                                error = %stop_err,
                                "rollback stop failed"
                            );
                        }
                    }
                    self.running.store(false, Ordering::SeqCst);
                    return Err(anyhow::anyhow!("failed to start HTTP receiver: {}", e));
                }
                Err(e) => {
                    // Privileged-port bind failure: disable this receiver,
                    // keep the others.
                    tracing::warn!(receiver = name, error = %e, "receiver disabled");
                }
            }
        }
        self.receivers = started;

        if self.receivers.is_empty() {
            self.running.store(false, Ordering::SeqCst);
            return Err(anyhow::anyhow!("no receiver could be started"));
        }

        self.tasks.push(spawn_flush_ticker(
            Arc::clone(&self.queue),
            self.shutdown.clone(),
        ));
        self.tasks.push(spawn_stats_reporter(
            Arc::clone(&self.counters),
            Arc::clone(&self.queue),
            self.shutdown.clone(),
            self.config.metrics.enabled,
            self.start_time,
        ));

        Ok(())
    }

    /// Start everything and block until a shutdown signal arrives.
    pub async fn run(&mut self) -> Result<()> {
        self.start().await?;

        tracing::info!("entering main loop, waiting for shutdown signal");
        let signal = wait_for_shutdown_signal().await?;
        tracing::info!(signal, "shutdown signal received");

        self.stop().await
    }

    /// Stop receivers in reverse startup order, stop background tasks,
    /// and drain the write queue.
    pub async fn stop(&mut self) -> Result<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        for (name, receiver) in self.receivers.iter_mut().rev() {
            if let Err(e) = receiver.stop().await {
                tracing::error!(receiver = *name, error = %e, "failed to stop receiver");
            } else {
                tracing::info!(receiver = *name, "receiver stopped");
            }
        }

        self.shutdown.cancel();
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }

        match self.queue.force_flush().await {
            Ok(drained) if drained > 0 => tracing::info!(drained, "write queue drained"),
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "failed to drain write queue"),
        }

        self.report_stats().await;
        Ok(())
    }

    /// Log one statistics snapshot.
    async fn report_stats(&self) {
        let received = self.counters.received();
        let written = self.counters.written() + self.queue.flushed_total();
        let errors = self.counters.errors();
        let batches = self.queue.batch_count();
        let queued = self.queue.len().await;
        tracing::info!(received, written, errors, batches, queued, "ingest statistics");
    }

    /// Number of receivers currently registered (after start: started ones).
    pub fn receiver_count(&self) -> usize {
        self.receivers.len()
    }

    /// Shared counters handle.
    pub fn counters(&self) -> Arc<IngestCounters> {
        Arc::clone(&self.counters)
    }

    /// Shared write queue handle.
    pub fn queue(&self) -> Arc<WriteQueue> {
        Arc::clone(&self.queue)
    }

    /// Shared store handle.
    pub fn store(&self) -> Arc<Mutex<LogStore>> {
        Arc::clone(&self.store)
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Spawn the ticker that drives the queue's time-based flush trigger.
fn spawn_flush_ticker(queue: Arc<WriteQueue>, shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(FLUSH_TICK_MS));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = queue.try_flush().await {
                        tracing::error!(error = %e, "periodic flush failed");
                    }
                }
                _ = shutdown.cancelled() => {
                    tracing::debug!("flush ticker shutting down");
                    break;
                }
            }
        }
    })
}

/// Spawn the task that reports aggregate counters every 10 seconds.
fn spawn_stats_reporter(
    counters: Arc<IngestCounters>,
    queue: Arc<WriteQueue>,
    shutdown: CancellationToken,
    metrics_enabled: bool,
    start_time: Instant,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(STATS_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // the first tick fires immediately; skip it so the first report
        // covers a full interval
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let received = counters.received();
                    let written = counters.written() + queue.flushed_total();
                    let errors = counters.errors();
                    let batches = queue.batch_count();
                    let queued = queue.len().await;
                    tracing::info!(received, written, errors, batches, queued, "ingest statistics");

                    if metrics_enabled {
                        gauge!(m::DAEMON_UPTIME_SECONDS)
                            .set(start_time.elapsed().as_secs() as f64);
                    }
                }
                _ = shutdown.cancelled() => {
                    tracing::debug!("stats reporter shutting down");
                    break;
                }
            }
        }
    })
}
