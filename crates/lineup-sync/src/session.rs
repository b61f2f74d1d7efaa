//! Lineup session
//!
//! The composition a host embeds for one retreat's board: the roster store,
//! the polling scheduler, and (when configured) the push bridge, wired
//! together with the degraded-mode fallback the core guarantees.
//!
//! Data flow: push broadcasts and poll refreshes land in the store; views
//! subscribe to store events; mutations go through [`SyncOrchestrator`]
//! over the best available transport.

use std::sync::{Arc, Mutex};

use lineup_api::HttpTransport;
use lineup_cache::{PollGate, RefreshConfig, RefreshScheduler, RosterStore, SharedRosterStore};
use lineup_common::AppConfig;
use lineup_core::events::ChannelDegradedEvent;
use lineup_core::{
    ApiResult, DomainError, LineupTransport, RetreatId, RosterEvent, RosterSnapshot,
};
use lineup_gateway::{PushBridge, PushBridgeConfig};
use tokio::task::JoinHandle;

use crate::orchestrator::SyncOrchestrator;

/// One open lineup board
pub struct LineupSession {
    retreat_id: RetreatId,
    store: SharedRosterStore,
    http: Arc<dyn LineupTransport>,
    bridge: Option<Arc<PushBridge>>,
    /// Whether `close` also disposes the bridge (set when the session built
    /// its own stack via [`LineupSession::from_config`])
    owns_bridge: bool,
    scheduler: RefreshScheduler,
    forward: Mutex<Option<JoinHandle<()>>>,
}

impl LineupSession {
    /// Open the board: fetch the initial snapshot (push room join, falling
    /// back to HTTP when the channel is unavailable), start forwarding
    /// broadcasts into the store, and start the polling scheduler.
    ///
    /// `http` is the polling/fallback transport; `bridge` is optional - a
    /// `None` runs polling-only from the start.
    pub async fn open(
        retreat_id: RetreatId,
        store: SharedRosterStore,
        http: Arc<dyn LineupTransport>,
        bridge: Option<Arc<PushBridge>>,
        gate: Arc<dyn PollGate>,
        refresh_config: RefreshConfig,
    ) -> ApiResult<Self> {
        let snapshot = Self::initial_snapshot(retreat_id, &store, &http, bridge.as_ref()).await?;
        let _ = store.install(snapshot);

        // Forward record-updated broadcasts into the store. The task handle
        // is aborted on close, so no update can land after teardown.
        let forward = bridge.as_ref().map(|bridge| {
            let mut updates = bridge.updates();
            let store = store.clone();
            tokio::spawn(async move {
                while let Ok(record) = updates.recv().await {
                    if let Err(e) = store.apply_record(retreat_id, record) {
                        tracing::debug!(error = %e, "Dropped broadcast for unknown snapshot");
                    }
                }
            })
        });

        let scheduler = RefreshScheduler::start(
            retreat_id,
            store.clone(),
            http.clone(),
            gate,
            refresh_config,
        );

        tracing::info!(retreat_id = %retreat_id, "Lineup session opened");

        Ok(Self {
            retreat_id,
            store,
            http,
            bridge,
            owns_bridge: false,
            scheduler,
            forward: Mutex::new(forward),
        })
    }

    /// Build the whole stack from loaded configuration: HTTP transport,
    /// push bridge (when a push URL is configured), and a fresh store.
    ///
    /// A session opened this way owns its bridge and disposes it on
    /// [`LineupSession::close`]. Applications sharing one bridge across
    /// several boards construct the pieces themselves and use
    /// [`LineupSession::open`].
    pub async fn from_config(
        config: &AppConfig,
        retreat_id: RetreatId,
        gate: Arc<dyn PollGate>,
    ) -> ApiResult<Self> {
        let http = HttpTransport::from_config(&config.server)
            .map_err(|e| DomainError::RequestFailed(e.to_string()))?;
        let bridge = PushBridgeConfig::from_config(&config.push).map(PushBridge::connect);
        let store = RosterStore::new_shared();

        let mut session = Self::open(
            retreat_id,
            store,
            Arc::new(http),
            bridge,
            gate,
            RefreshConfig::from(&config.polling),
        )
        .await?;
        session.owns_bridge = true;
        Ok(session)
    }

    async fn initial_snapshot(
        retreat_id: RetreatId,
        store: &SharedRosterStore,
        http: &Arc<dyn LineupTransport>,
        bridge: Option<&Arc<PushBridge>>,
    ) -> ApiResult<RosterSnapshot> {
        if let Some(bridge) = bridge {
            match bridge.join_room(retreat_id).await {
                Ok(snapshot) => return Ok(snapshot),
                // Channel problems degrade to HTTP; real rejections surface
                Err(
                    DomainError::ChannelUnavailable
                    | DomainError::AckTimeout { .. }
                    | DomainError::RequestFailed(_),
                ) => {
                    tracing::warn!(
                        retreat_id = %retreat_id,
                        "Push channel unavailable for join, loading over HTTP"
                    );
                    store.publish(RosterEvent::ChannelDegraded(ChannelDegradedEvent::new(
                        retreat_id,
                    )));
                }
                Err(e) => return Err(e),
            }
        }

        let records = http.fetch_roster(retreat_id).await?;
        Ok(RosterSnapshot::new(retreat_id, records))
    }

    pub fn retreat_id(&self) -> RetreatId {
        self.retreat_id
    }

    pub fn store(&self) -> &SharedRosterStore {
        &self.store
    }

    /// Whether mutations currently ride the push channel
    pub fn realtime(&self) -> bool {
        self.bridge.as_ref().is_some_and(|b| b.is_connected())
    }

    /// An orchestrator over the best transport available right now:
    /// the push channel while it is live, HTTP otherwise.
    pub fn orchestrator(&self) -> SyncOrchestrator {
        let transport: Arc<dyn LineupTransport> = match &self.bridge {
            Some(bridge) if bridge.is_connected() => bridge.clone(),
            _ => self.http.clone(),
        };
        SyncOrchestrator::new(self.store.clone(), transport)
    }

    /// Close the board: stop forwarding, leave the room, stop polling.
    ///
    /// The bridge itself stays up - it belongs to the application, which may
    /// have other boards open; disposing it is the owner's shutdown call.
    pub async fn close(&self) {
        if let Some(handle) = self.forward.lock().expect("forward handle lock").take() {
            handle.abort();
        }
        if let Some(bridge) = &self.bridge {
            if self.owns_bridge {
                bridge.shutdown().await;
            } else {
                bridge.leave_room(self.retreat_id).await;
            }
        }
        self.scheduler.shutdown().await;
        self.store.evict(self.retreat_id);

        tracing::info!(retreat_id = %self.retreat_id, "Lineup session closed");
    }
}

impl Drop for LineupSession {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.forward.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

impl std::fmt::Debug for LineupSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineupSession")
            .field("retreat_id", &self.retreat_id)
            .field("realtime", &self.realtime())
            .finish()
    }
}
