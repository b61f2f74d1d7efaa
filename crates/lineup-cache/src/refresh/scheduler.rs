//! Refresh scheduler
//!
//! The polling half of the dual-channel freshness strategy. A background
//! task refreshes the cached roster on a short timer whenever the poll gate
//! allows, coalesces duplicate refresh requests, retries transient failures
//! a bounded number of times, and keeps the last good snapshot on exhaustion
//! (stale-while-error).

use lineup_core::events::RefreshFailedEvent;
use lineup_core::{LineupTransport, RetreatId, RosterEvent, RosterSnapshot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::refresh::PollGate;
use crate::store::SharedRosterStore;

/// How often the loop re-checks the gate and the timer
const TICK: Duration = Duration::from_millis(250);

/// Configuration for the refresh scheduler
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Timed refresh interval while the gate is open
    pub interval: Duration,
    /// Refreshes requested within this window of the last one coalesce
    pub dedup_window: Duration,
    /// Retry attempts per refresh before giving up
    pub retry_attempts: u32,
    /// Fixed delay between retries
    pub retry_backoff: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            dedup_window: Duration::from_secs(1),
            retry_attempts: 3,
            retry_backoff: Duration::from_millis(1500),
        }
    }
}

impl From<&lineup_common::PollingConfig> for RefreshConfig {
    fn from(config: &lineup_common::PollingConfig) -> Self {
        Self {
            interval: config.interval(),
            dedup_window: config.dedup_window(),
            retry_attempts: config.retry_attempts,
            retry_backoff: config.retry_backoff(),
        }
    }
}

/// Scheduler errors
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("Refresh scheduler is not running")]
    NotRunning,
}

enum Command {
    Refresh,
    Shutdown,
}

/// Background polling task for one retreat's roster
pub struct RefreshScheduler {
    retreat_id: RetreatId,
    running: Arc<AtomicBool>,
    control_tx: mpsc::Sender<Command>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    /// Spawn the polling task.
    ///
    /// The first refresh fires on the next tick (the "on mount" refresh),
    /// gate permitting.
    pub fn start(
        retreat_id: RetreatId,
        store: SharedRosterStore,
        transport: Arc<dyn LineupTransport>,
        gate: Arc<dyn PollGate>,
        config: RefreshConfig,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let (control_tx, control_rx) = mpsc::channel(16);

        let worker = Worker {
            retreat_id,
            store,
            transport,
            gate,
            config,
            running: running.clone(),
        };
        let handle = tokio::spawn(worker.run(control_rx));

        tracing::debug!(retreat_id = %retreat_id, "Refresh scheduler started");

        Self {
            retreat_id,
            running,
            control_tx,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Request an immediate refresh (reconnect, manual refresh button).
    ///
    /// Coalesced with the timed refreshes through the same dedup window.
    pub async fn refresh_now(&self) -> Result<(), RefreshError> {
        self.control_tx
            .send(Command::Refresh)
            .await
            .map_err(|_| RefreshError::NotRunning)
    }

    /// Whether the scheduler loop is alive
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the polling task and wait for it to finish
    pub async fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.control_tx.send(Command::Shutdown).await;

        let handle = self.handle.lock().expect("scheduler handle lock").take();
        if let Some(handle) = handle {
            handle.await.ok();
        }
        tracing::debug!(retreat_id = %self.retreat_id, "Refresh scheduler stopped");
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Ok(mut guard) = self.handle.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

impl std::fmt::Debug for RefreshScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshScheduler")
            .field("retreat_id", &self.retreat_id)
            .field("running", &self.is_running())
            .finish()
    }
}

struct Worker {
    retreat_id: RetreatId,
    store: SharedRosterStore,
    transport: Arc<dyn LineupTransport>,
    gate: Arc<dyn PollGate>,
    config: RefreshConfig,
    running: Arc<AtomicBool>,
}

impl Worker {
    async fn run(self, mut control_rx: mpsc::Receiver<Command>) {
        // Backdate so the first open-gate tick refreshes immediately
        let mut last_started = Instant::now()
            .checked_sub(self.config.interval)
            .unwrap_or_else(Instant::now);

        while self.running.load(Ordering::SeqCst) {
            tokio::select! {
                () = tokio::time::sleep(TICK) => {
                    if self.gate.should_pause() {
                        continue;
                    }
                    if last_started.elapsed() >= self.config.interval {
                        last_started = Instant::now();
                        self.refresh().await;
                    }
                }
                cmd = control_rx.recv() => {
                    match cmd {
                        Some(Command::Refresh) => {
                            // Coalesce: a refresh that just ran (or is due to
                            // the in-flight one that queued behind us) covers
                            // this request
                            if last_started.elapsed() < self.config.dedup_window {
                                tracing::trace!(
                                    retreat_id = %self.retreat_id,
                                    "Refresh request coalesced"
                                );
                                continue;
                            }
                            last_started = Instant::now();
                            self.refresh().await;
                        }
                        Some(Command::Shutdown) | None => break,
                    }
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        tracing::debug!(retreat_id = %self.retreat_id, "Refresh loop ended");
    }

    /// One refresh: bounded retries, stale-response guard, stale-while-error
    async fn refresh(&self) {
        let seen_version = self.store.version(self.retreat_id);

        let mut last_error = None;
        for attempt in 1..=self.config.retry_attempts {
            match self.transport.fetch_roster(self.retreat_id).await {
                Ok(records) => {
                    let snapshot = RosterSnapshot::new(self.retreat_id, records);
                    let applied = self.store.install_if_unchanged(snapshot, seen_version);
                    tracing::trace!(
                        retreat_id = %self.retreat_id,
                        applied,
                        "Roster refreshed"
                    );
                    return;
                }
                Err(e) => {
                    tracing::debug!(
                        retreat_id = %self.retreat_id,
                        attempt,
                        error = %e,
                        "Refresh attempt failed"
                    );
                    last_error = Some(e);
                    if attempt < self.config.retry_attempts {
                        tokio::time::sleep(self.config.retry_backoff).await;
                    }
                }
            }
        }

        // Retries exhausted: keep the last good snapshot, tell subscribers
        let message = last_error.map_or_else(String::new, |e| e.to_string());
        tracing::warn!(
            retreat_id = %self.retreat_id,
            error = %message,
            "Refresh failed after retries, serving stale snapshot"
        );
        self.store.publish(RosterEvent::RefreshFailed(RefreshFailedEvent::new(
            self.retreat_id,
            message,
        )));
    }
}
