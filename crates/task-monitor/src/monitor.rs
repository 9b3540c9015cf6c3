use crate::recovery::{RecoveryCoordinator, RecoveryCounters};
use crate::stats::{MonitoringStats, RecoveryStats};
use crate::{assignments, detectors, snapshot, MonitorConfig, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use task_monitor_store::SharedStore;
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

#[derive(Default)]
struct LoopState {
    running: bool,
    last_check: Option<DateTime<Utc>>,
    shutdown: Option<oneshot::Sender<()>>,
}

/// The top-level controller: ticks the detect-and-recover cycle on a fixed
/// interval and answers read-only stats queries at any time.
///
/// Used behind an `Arc`; the loop runs on one spawned task while `start`,
/// `stop`, and `stats` are called from host threads, synchronized through
/// the internal state lock. Each cycle runs its snapshot, detection, and
/// recovery steps sequentially; cycles never overlap.
pub struct WorkerMonitor {
    store: Arc<dyn SharedStore>,
    config: MonitorConfig,
    recovery: RecoveryCoordinator,
    counters: Arc<Mutex<RecoveryCounters>>,
    state: Mutex<LoopState>,
}

impl WorkerMonitor {
    pub fn new(store: Arc<dyn SharedStore>, config: MonitorConfig) -> Self {
        let counters = Arc::new(Mutex::new(RecoveryCounters::default()));
        let recovery = RecoveryCoordinator::new(
            store.clone(),
            config.max_retries,
            config.result_ttl(),
            counters.clone(),
        );
        WorkerMonitor {
            store,
            config,
            recovery,
            counters,
            state: Mutex::new(LoopState::default()),
        }
    }

    pub fn with_defaults(store: Arc<dyn SharedStore>) -> Self {
        WorkerMonitor::new(store, MonitorConfig::default())
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Launch the monitoring loop. A no-op when already running.
    pub fn start(self: &Arc<Self>) {
        let shutdown_rx = {
            let mut state = self.state.lock();
            if state.running {
                debug!("monitor already running; start is a no-op");
                return;
            }
            let (tx, rx) = oneshot::channel();
            state.running = true;
            state.shutdown = Some(tx);
            rx
        };

        info!(
            "starting worker monitor (heartbeat timeout {}s, task timeout {}s, interval {}s)",
            self.config.heartbeat_timeout_secs,
            self.config.task_timeout_secs,
            self.config.check_interval_secs
        );
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            monitor.run_loop(shutdown_rx).await;
        });
    }

    /// Ask the loop to exit after its current tick. Cooperative: an
    /// in-flight store call or recovery action is never interrupted.
    pub fn stop(&self) {
        let shutdown = self.state.lock().shutdown.take();
        match shutdown {
            Some(tx) => {
                let _ = tx.send(());
                info!("worker monitor stop requested");
            }
            None => debug!("monitor not running; stop is a no-op"),
        }
    }

    async fn run_loop(&self, mut shutdown: oneshot::Receiver<()>) {
        let mut interval = tokio::time::interval(self.config.check_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        // Retried on the next tick; nothing here is fatal.
                        warn!("monitoring cycle aborted: {}", e);
                    }
                    self.state.lock().last_check = Some(Utc::now());
                }
                _ = &mut shutdown => break,
            }
        }

        let mut state = self.state.lock();
        state.running = false;
        state.shutdown = None;
        info!("worker monitor stopped");
    }

    /// One full detect-and-recover cycle.
    ///
    /// Dead-worker cleanup runs before stuck-task recovery. An error means
    /// the heartbeat keys could not be enumerated and no action was taken.
    pub async fn run_cycle(&self) -> Result<()> {
        let snapshot = snapshot::read_heartbeats(self.store.as_ref()).await?;
        let now = Utc::now();
        let assignments = assignments::derive_assignments(&snapshot, now);

        let dead = detectors::find_dead_workers(&snapshot, now, self.config.heartbeat_timeout());
        if !dead.is_empty() {
            warn!("detected {} dead worker(s): {:?}", dead.len(), dead);
        }
        for worker_id in &dead {
            self.recovery.recover_dead_worker(worker_id, &assignments).await;
        }

        let stuck =
            detectors::find_stuck_tasks(&assignments, &snapshot, now, self.config.task_timeout());
        if !stuck.is_empty() {
            warn!("detected {} stuck task(s)", stuck.len());
        }
        for assignment in &stuck {
            self.recovery
                .recover_stuck_task(assignment, now, self.config.task_timeout())
                .await;
        }

        Ok(())
    }

    /// Re-run the read-only detection path for reporting.
    ///
    /// Observation only: no heartbeat is deleted and no task is requeued, no
    /// matter what the detectors find.
    pub async fn stats(&self) -> Result<MonitoringStats> {
        let snapshot = snapshot::read_heartbeats(self.store.as_ref()).await?;
        let now = Utc::now();
        let assignments = assignments::derive_assignments(&snapshot, now);
        let dead = detectors::find_dead_workers(&snapshot, now, self.config.heartbeat_timeout());
        let stuck =
            detectors::find_stuck_tasks(&assignments, &snapshot, now, self.config.task_timeout());

        let (running, last_check) = {
            let state = self.state.lock();
            (state.running, state.last_check)
        };
        let recovery = RecoveryStats::from(&*self.counters.lock());

        Ok(MonitoringStats {
            active_workers: snapshot.len(),
            active_tasks: assignments.len(),
            dead_workers: dead.len(),
            stuck_tasks: stuck.len(),
            running,
            last_check,
            config: self.config.clone(),
            recovery,
        })
    }
}
