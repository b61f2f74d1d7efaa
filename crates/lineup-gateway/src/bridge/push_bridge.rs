//! Push bridge
//!
//! Owns the WebSocket connection to the lineup backend. A supervisor task
//! connects, re-joins rooms, pumps frames, and reconnects with backoff when
//! the socket drops. Requests resolve through ack correlation with a timeout
//! guard; `record-updated` broadcasts fan out over a broadcast channel.
//!
//! When the connection cannot be (re-)established within the retry budget
//! the bridge flags itself degraded - once - and every request fails fast
//! with `ChannelUnavailable` so callers fall back to the HTTP transport.

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use lineup_core::{
    ApiResult, DomainError, GbsNumber, LineupRecord, LineupTransport, MemoId, MemoInput, RecordId,
    RetreatId, RosterSnapshot,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

use crate::bridge::ReconnectBackoff;
use crate::protocol::{AckPayload, PushEnvelope, PushEvent};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Bridge configuration
#[derive(Debug, Clone)]
pub struct PushBridgeConfig {
    /// WebSocket URL of the push endpoint
    pub url: String,
    /// How long a request waits for its acknowledgement
    pub ack_timeout: Duration,
    /// Base delay for reconnection backoff
    pub reconnect_base: Duration,
    /// Cap for reconnection backoff
    pub reconnect_max: Duration,
    /// Reconnection attempts before degrading
    pub reconnect_attempts: u32,
}

impl PushBridgeConfig {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ack_timeout: Duration::from_secs(5),
            reconnect_base: Duration::from_secs(1),
            reconnect_max: Duration::from_secs(30),
            reconnect_attempts: 10,
        }
    }

    /// Build from loaded configuration; `None` when no push URL is set
    /// (polling-only deployment)
    pub fn from_config(push: &lineup_common::PushConfig) -> Option<Self> {
        push.url.as_ref().map(|url| Self {
            url: url.clone(),
            ack_timeout: push.ack_timeout(),
            reconnect_base: Duration::from_millis(push.reconnect_base_ms),
            reconnect_max: Duration::from_millis(push.reconnect_max_ms),
            reconnect_attempts: push.reconnect_attempts,
        })
    }
}

/// Coarse connection state for hosts that surface it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Supervisor is trying to (re-)establish the socket
    Connecting,
    /// Socket is live; requests and broadcasts flow
    Connected,
    /// Retry budget spent; polling is the sole freshness source
    Degraded,
    /// Shut down by the owner
    Closed,
}

enum Command {
    Send(PushEnvelope),
    Shutdown,
}

enum ConnEnd {
    Dropped,
    Closed,
}

/// The push channel bridge
///
/// Constructed once at application start and injected wherever needed; tests
/// construct their own against a mock server. There is no process-global
/// instance.
pub struct PushBridge {
    config: PushBridgeConfig,
    client_id: Uuid,
    control_tx: mpsc::Sender<Command>,
    pending: Arc<DashMap<u64, oneshot::Sender<AckPayload>>>,
    next_ack: AtomicU64,
    rooms: Arc<RwLock<HashSet<RetreatId>>>,
    updates_tx: broadcast::Sender<LineupRecord>,
    connected: Arc<AtomicBool>,
    degraded: Arc<AtomicBool>,
    closed: AtomicBool,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl PushBridge {
    /// Spawn the bridge and start connecting.
    ///
    /// Returns immediately; the supervisor establishes the socket in the
    /// background. Callers that need the channel up before proceeding gate on
    /// their first `join_room` instead.
    pub fn connect(config: PushBridgeConfig) -> Arc<Self> {
        let client_id = Uuid::new_v4();
        let (control_tx, control_rx) = mpsc::channel(64);
        let (updates_tx, _) = broadcast::channel(256);
        let pending = Arc::new(DashMap::new());
        let rooms = Arc::new(RwLock::new(HashSet::new()));
        let connected = Arc::new(AtomicBool::new(false));
        let degraded = Arc::new(AtomicBool::new(false));

        let supervisor = Supervisor {
            config: config.clone(),
            client_id,
            pending: pending.clone(),
            rooms: rooms.clone(),
            updates_tx: updates_tx.clone(),
            connected: connected.clone(),
            degraded: degraded.clone(),
        };
        let handle = tokio::spawn(supervisor.run(control_rx));

        tracing::debug!(client_id = %client_id, url = %config.url, "Push bridge starting");

        Arc::new(Self {
            config,
            client_id,
            control_tx,
            pending,
            next_ack: AtomicU64::new(0),
            rooms,
            updates_tx,
            connected,
            degraded,
            closed: AtomicBool::new(false),
            supervisor: Mutex::new(Some(handle)),
        })
    }

    /// Current connection state
    pub fn state(&self) -> BridgeState {
        if self.closed.load(Ordering::SeqCst) {
            BridgeState::Closed
        } else if self.degraded.load(Ordering::SeqCst) {
            BridgeState::Degraded
        } else if self.connected.load(Ordering::SeqCst) {
            BridgeState::Connected
        } else {
            BridgeState::Connecting
        }
    }

    /// Whether the socket is currently live
    pub fn is_connected(&self) -> bool {
        self.state() == BridgeState::Connected
    }

    /// Whether the bridge has given up on the channel
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    /// Wait for the initial connect to settle, up to `timeout`.
    ///
    /// Returns `true` once connected; `false` on degradation or timeout.
    /// Callers that skip this simply start degraded and recover later.
    pub async fn wait_connected(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match self.state() {
                BridgeState::Connected => return true,
                BridgeState::Degraded | BridgeState::Closed => return false,
                BridgeState::Connecting => {
                    if tokio::time::Instant::now() >= deadline {
                        return false;
                    }
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }

    /// Subscribe to `record-updated` broadcasts from other room members
    #[must_use]
    pub fn updates(&self) -> broadcast::Receiver<LineupRecord> {
        self.updates_tx.subscribe()
    }

    /// Join a retreat's room; the ack carries the current snapshot.
    ///
    /// The room is remembered and re-joined automatically after reconnects.
    pub async fn join_room(&self, retreat_id: RetreatId) -> ApiResult<RosterSnapshot> {
        let ack = self
            .request(PushEvent::JoinRoom, json!({ "retreatId": retreat_id }))
            .await?;
        let records = ack.into_records()?;

        let _ = self.rooms.write().await.insert(retreat_id);
        tracing::debug!(retreat_id = %retreat_id, "Joined room");

        Ok(RosterSnapshot::new(retreat_id, records))
    }

    /// Leave a retreat's room (fire-and-forget) and forget it
    pub async fn leave_room(&self, retreat_id: RetreatId) {
        let _ = self.rooms.write().await.remove(&retreat_id);
        if self.is_connected() {
            let _ = self
                .control_tx
                .send(Command::Send(PushEnvelope::leave_room(retreat_id)))
                .await;
        }
        tracing::debug!(retreat_id = %retreat_id, "Left room");
    }

    /// Send one request and await its acknowledgement.
    ///
    /// The timeout guard means a dropped connection can never strand a
    /// caller: worst case is an `AckTimeout` after `ack_timeout`.
    pub async fn request(&self, event: PushEvent, data: Value) -> ApiResult<AckPayload> {
        if !self.is_connected() {
            return Err(DomainError::ChannelUnavailable);
        }

        let id = self.next_ack.fetch_add(1, Ordering::SeqCst) + 1;
        let (tx, rx) = oneshot::channel();
        let _ = self.pending.insert(id, tx);

        let envelope = PushEnvelope::request(event, id, data);
        if self.control_tx.send(Command::Send(envelope)).await.is_err() {
            let _ = self.pending.remove(&id);
            return Err(DomainError::ChannelUnavailable);
        }

        match tokio::time::timeout(self.config.ack_timeout, rx).await {
            Ok(Ok(payload)) => Ok(payload),
            // Connection dropped and pending acks were failed
            Ok(Err(_)) => Err(DomainError::ChannelUnavailable),
            Err(_) => {
                let _ = self.pending.remove(&id);
                tracing::warn!(event = %event, ack = id, "Request timed out waiting for ack");
                Err(DomainError::AckTimeout {
                    timeout_ms: self.config.ack_timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Leave all rooms, close the socket, and stop the supervisor
    pub async fn shutdown(&self) {
        let rooms: Vec<RetreatId> = self.rooms.write().await.drain().collect();
        if self.is_connected() {
            for retreat_id in rooms {
                let _ = self
                    .control_tx
                    .send(Command::Send(PushEnvelope::leave_room(retreat_id)))
                    .await;
            }
        }

        self.closed.store(true, Ordering::SeqCst);
        let _ = self.control_tx.send(Command::Shutdown).await;

        let handle = self.supervisor.lock().expect("supervisor handle lock").take();
        if let Some(handle) = handle {
            handle.await.ok();
        }
        tracing::debug!(client_id = %self.client_id, "Push bridge shut down");
    }
}

impl Drop for PushBridge {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.supervisor.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

impl std::fmt::Debug for PushBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushBridge")
            .field("client_id", &self.client_id)
            .field("state", &self.state())
            .field("pending", &self.pending.len())
            .finish()
    }
}

#[async_trait]
impl LineupTransport for PushBridge {
    async fn fetch_roster(&self, retreat_id: RetreatId) -> ApiResult<Vec<LineupRecord>> {
        // Joining is idempotent server-side; the ack carries the roster
        let snapshot = self.join_room(retreat_id).await?;
        Ok(snapshot.records)
    }

    async fn update_gbs_number(
        &self,
        _retreat_id: RetreatId,
        record_id: RecordId,
        gbs_number: Option<GbsNumber>,
    ) -> ApiResult<LineupRecord> {
        let ack = self
            .request(
                PushEvent::UpdateGbsNumber,
                json!({ "recordId": record_id, "gbsNumber": gbs_number }),
            )
            .await?;
        ack.into_record()
    }

    async fn create_memo(
        &self,
        _retreat_id: RetreatId,
        record_id: RecordId,
        input: MemoInput,
    ) -> ApiResult<LineupRecord> {
        let ack = self
            .request(
                PushEvent::CreateMemo,
                json!({ "recordId": record_id, "memo": input.memo, "color": input.color }),
            )
            .await?;
        ack.into_record()
    }

    async fn update_memo(
        &self,
        _retreat_id: RetreatId,
        memo_id: MemoId,
        input: MemoInput,
    ) -> ApiResult<LineupRecord> {
        let ack = self
            .request(
                PushEvent::UpdateMemo,
                json!({ "memoId": memo_id, "memo": input.memo, "color": input.color }),
            )
            .await?;
        ack.into_record()
    }

    async fn delete_memo(
        &self,
        _retreat_id: RetreatId,
        memo_id: MemoId,
    ) -> ApiResult<LineupRecord> {
        let ack = self
            .request(PushEvent::DeleteMemo, json!({ "memoId": memo_id }))
            .await?;
        ack.into_record()
    }

    fn describe(&self) -> &'static str {
        "push"
    }
}

/// Background task owning the socket
struct Supervisor {
    config: PushBridgeConfig,
    client_id: Uuid,
    pending: Arc<DashMap<u64, oneshot::Sender<AckPayload>>>,
    rooms: Arc<RwLock<HashSet<RetreatId>>>,
    updates_tx: broadcast::Sender<LineupRecord>,
    connected: Arc<AtomicBool>,
    degraded: Arc<AtomicBool>,
}

impl Supervisor {
    async fn run(self, mut control_rx: mpsc::Receiver<Command>) {
        let mut backoff = ReconnectBackoff::new(
            self.config.reconnect_base,
            self.config.reconnect_max,
            self.config.reconnect_attempts,
        );

        loop {
            match connect_async(self.config.url.as_str()).await {
                Ok((socket, _)) => {
                    backoff.reset();
                    self.connected.store(true, Ordering::SeqCst);
                    tracing::info!(client_id = %self.client_id, "Push channel connected");

                    let end = self.run_connection(socket, &mut control_rx).await;

                    self.connected.store(false, Ordering::SeqCst);
                    self.fail_pending();

                    match end {
                        ConnEnd::Closed => return,
                        ConnEnd::Dropped => {
                            tracing::warn!(client_id = %self.client_id, "Push channel dropped");
                        }
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        client_id = %self.client_id,
                        error = %e,
                        attempt = backoff.attempts() + 1,
                        "Push channel connect failed"
                    );
                }
            }

            let Some(delay) = backoff.next_delay() else {
                // Retry budget spent: degrade once and leave polling in charge
                self.degraded.store(true, Ordering::SeqCst);
                self.fail_pending();
                tracing::warn!(
                    client_id = %self.client_id,
                    "Push channel unavailable, continuing in polling-only mode"
                );
                return;
            };

            if self.sleep_or_shutdown(delay, &mut control_rx).await {
                return;
            }
        }
    }

    /// Wait out the backoff delay, still honoring shutdown. Returns `true`
    /// when the bridge was shut down during the wait.
    async fn sleep_or_shutdown(
        &self,
        delay: Duration,
        control_rx: &mut mpsc::Receiver<Command>,
    ) -> bool {
        let deadline = tokio::time::Instant::now() + delay;
        loop {
            tokio::select! {
                () = tokio::time::sleep_until(deadline) => return false,
                cmd = control_rx.recv() => match cmd {
                    Some(Command::Send(envelope)) => {
                        tracing::trace!(%envelope, "Dropping frame while disconnected");
                    }
                    Some(Command::Shutdown) | None => return true,
                }
            }
        }
    }

    /// Pump one live connection until it drops or the bridge shuts down
    async fn run_connection(
        &self,
        socket: Socket,
        control_rx: &mut mpsc::Receiver<Command>,
    ) -> ConnEnd {
        let (mut sink, mut stream) = socket.split();

        // Re-join all rooms so broadcasts resume after a reconnect
        let rooms: Vec<RetreatId> = self.rooms.read().await.iter().copied().collect();
        for retreat_id in rooms {
            let envelope =
                PushEnvelope::emit(PushEvent::JoinRoom, json!({ "retreatId": retreat_id }));
            match envelope.to_json() {
                Ok(frame) => {
                    if sink.send(Message::Text(frame)).await.is_err() {
                        return ConnEnd::Dropped;
                    }
                    tracing::debug!(retreat_id = %retreat_id, "Re-joined room");
                }
                Err(e) => tracing::error!(error = %e, "Failed to encode re-join frame"),
            }
        }

        loop {
            tokio::select! {
                cmd = control_rx.recv() => match cmd {
                    Some(Command::Send(envelope)) => {
                        let frame = match envelope.to_json() {
                            Ok(frame) => frame,
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to encode frame");
                                continue;
                            }
                        };
                        if sink.send(Message::Text(frame)).await.is_err() {
                            return ConnEnd::Dropped;
                        }
                    }
                    Some(Command::Shutdown) | None => {
                        let _ = sink.send(Message::Close(None)).await;
                        return ConnEnd::Closed;
                    }
                },
                msg = stream.next() => match msg {
                    Some(Ok(Message::Text(text))) => self.handle_frame(&text),
                    Some(Ok(Message::Close(_))) | None => return ConnEnd::Dropped,
                    Some(Ok(_)) => {} // ping/pong/binary: nothing to do
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Push channel read error");
                        return ConnEnd::Dropped;
                    }
                }
            }
        }
    }

    /// Route one inbound frame
    fn handle_frame(&self, text: &str) {
        let envelope = match PushEnvelope::from_json(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed frame");
                return;
            }
        };

        if let Some((id, payload)) = envelope.as_ack() {
            match self.pending.remove(&id) {
                Some((_, tx)) => {
                    let _ = tx.send(payload);
                }
                None => tracing::debug!(ack = id, "Ack with no waiting request"),
            }
            return;
        }

        if let Some(record) = envelope.as_record_updated() {
            tracing::trace!(record_id = %record.id, "Record update broadcast");
            let _ = self.updates_tx.send(record);
            return;
        }

        tracing::debug!(event = %envelope.event, "Unexpected event from server");
    }

    /// Fail every pending request by dropping its reply slot
    fn fail_pending(&self) {
        if !self.pending.is_empty() {
            tracing::debug!(count = self.pending.len(), "Failing pending requests");
            self.pending.clear();
        }
    }
}
