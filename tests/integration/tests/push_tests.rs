//! Push channel bridge against an in-process WebSocket server

use std::sync::Arc;
use std::time::Duration;

use integration_tests::{participant, sample_roster, MockPushServer, MockTransport};
use lineup_cache::{AlwaysActive, RefreshConfig, RosterStore};
use lineup_core::{
    DomainError, GbsNumber, Gender, LineupTransport, RecordId, RetreatId,
};
use lineup_gateway::{PushBridge, PushBridgeConfig, PushEvent};
use lineup_sync::LineupSession;
use tokio::net::TcpListener;

const RETREAT: RetreatId = RetreatId::new(7);

fn bridge_config(url: &str) -> PushBridgeConfig {
    PushBridgeConfig {
        url: url.to_string(),
        ack_timeout: Duration::from_millis(500),
        reconnect_base: Duration::from_millis(50),
        reconnect_max: Duration::from_millis(200),
        reconnect_attempts: 5,
    }
}

async fn connected_bridge(server: &MockPushServer) -> Arc<PushBridge> {
    let bridge = PushBridge::connect(bridge_config(&server.url));
    assert!(
        bridge.wait_connected(Duration::from_secs(2)).await,
        "bridge should connect to the mock server"
    );
    bridge
}

#[tokio::test]
async fn join_room_acks_with_the_snapshot() {
    let transport = MockTransport::new(sample_roster());
    let server = MockPushServer::start(transport).await.unwrap();
    let bridge = connected_bridge(&server).await;

    let snapshot = bridge.join_room(RETREAT).await.unwrap();
    assert_eq!(snapshot.retreat_id, RETREAT);
    assert_eq!(snapshot.len(), 6);

    bridge.shutdown().await;
}

#[tokio::test]
async fn broadcasts_reach_subscribers() {
    let transport = MockTransport::new(sample_roster());
    let server = MockPushServer::start(transport.clone()).await.unwrap();
    let bridge = connected_bridge(&server).await;
    bridge.join_room(RETREAT).await.unwrap();

    let mut updates = bridge.updates();

    // Another client's write, broadcast to the room
    let updated = transport.server_apply(RecordId::new(42), |r| {
        r.gbs_number = Some(GbsNumber::new(3).unwrap());
    });
    server.broadcast(&updated);

    let received = tokio::time::timeout(Duration::from_secs(2), updates.recv())
        .await
        .expect("broadcast within timeout")
        .expect("broadcast channel open");
    assert_eq!(received.id, RecordId::new(42));
    assert_eq!(received.gbs_number, Some(GbsNumber::new(3).unwrap()));

    bridge.shutdown().await;
}

#[tokio::test]
async fn mutations_resolve_via_ack_not_broadcast() {
    let transport = MockTransport::new(sample_roster());
    let server = MockPushServer::start(transport.clone()).await.unwrap();
    let bridge = connected_bridge(&server).await;
    bridge.join_room(RETREAT).await.unwrap();

    let confirmed = bridge
        .update_gbs_number(RETREAT, RecordId::new(43), Some(GbsNumber::new(4).unwrap()))
        .await
        .unwrap();
    assert_eq!(confirmed.gbs_number, Some(GbsNumber::new(4).unwrap()));

    // The write landed on the backend
    assert_eq!(
        transport.server_record(RecordId::new(43)).unwrap().gbs_number,
        Some(GbsNumber::new(4).unwrap())
    );

    bridge.shutdown().await;
}

#[tokio::test]
async fn error_acks_surface_as_server_rejections() {
    let transport = MockTransport::new(sample_roster());
    let server = MockPushServer::start(transport).await.unwrap();
    let bridge = connected_bridge(&server).await;
    bridge.join_room(RETREAT).await.unwrap();

    // Record 1 is a leader; the backend refuses
    let err = bridge
        .update_gbs_number(RETREAT, RecordId::new(1), Some(GbsNumber::new(9).unwrap()))
        .await
        .unwrap_err();
    match err {
        DomainError::ServerRejected { code, .. } => {
            assert_eq!(code, "LEADER_ASSIGNMENT_FORBIDDEN");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    bridge.shutdown().await;
}

#[tokio::test]
async fn silent_server_times_out_instead_of_hanging() {
    // A server that accepts the socket but never acks
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let silent = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                use futures_util::StreamExt;
                let Ok(mut socket) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                while let Some(Ok(_)) = socket.next().await {}
            });
        }
    });

    let bridge = PushBridge::connect(bridge_config(&format!("ws://{addr}")));
    assert!(bridge.wait_connected(Duration::from_secs(2)).await);

    let err = bridge
        .request(PushEvent::UpdateGbsNumber, serde_json::json!({"recordId": 1}))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::AckTimeout { .. }));

    bridge.shutdown().await;
    silent.abort();
}

#[tokio::test]
async fn dropped_connection_reconnects_and_rejoins() {
    let transport = MockTransport::new(sample_roster());
    let server = MockPushServer::start(transport.clone()).await.unwrap();
    let bridge = connected_bridge(&server).await;
    bridge.join_room(RETREAT).await.unwrap();
    assert_eq!(server.client_count(), 1);

    // Server drops every client; the bridge must come back and re-join
    server.disconnect_all();
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(bridge.is_connected(), "bridge should have reconnected");
    assert_eq!(server.client_count(), 1);

    // Broadcasts flow again after the rejoin
    let mut updates = bridge.updates();
    let updated = transport.server_apply(RecordId::new(44), |r| {
        r.gbs_number = Some(GbsNumber::new(6).unwrap());
    });
    server.broadcast(&updated);

    let received = tokio::time::timeout(Duration::from_secs(2), updates.recv())
        .await
        .expect("broadcast after reconnect")
        .expect("broadcast channel open");
    assert_eq!(received.id, RecordId::new(44));

    bridge.shutdown().await;
}

#[tokio::test]
async fn session_over_push_applies_broadcasts_to_the_store() {
    let transport = MockTransport::new(sample_roster());
    let server = MockPushServer::start(transport.clone()).await.unwrap();
    let bridge = connected_bridge(&server).await;

    let store = RosterStore::new_shared();
    let session = LineupSession::open(
        RETREAT,
        store.clone(),
        transport.clone() as Arc<dyn LineupTransport>,
        Some(bridge.clone()),
        Arc::new(AlwaysActive),
        RefreshConfig {
            // Polling stays configured but slow; push carries this test
            interval: Duration::from_secs(60),
            ..RefreshConfig::default()
        },
    )
    .await
    .unwrap();

    assert!(session.realtime());
    assert_eq!(session.orchestrator().transport().describe(), "push");
    assert_eq!(store.snapshot(RETREAT).unwrap().len(), 6);

    // A remote write broadcast into the room lands in the cache
    let mut events = store.subscribe();
    let updated = transport.server_apply(RecordId::new(42), |r| {
        r.gbs_number = Some(GbsNumber::new(8).unwrap());
    });
    server.broadcast(&updated);

    let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("store event within timeout")
        .expect("store channel open");
    assert_eq!(event.event_type(), "RECORD_UPDATED");

    let snap = store.snapshot(RETREAT).unwrap();
    assert_eq!(
        snap.find(RecordId::new(42)).unwrap().gbs_number,
        Some(GbsNumber::new(8).unwrap())
    );

    session.close().await;
    bridge.shutdown().await;
}

#[tokio::test]
async fn session_falls_back_to_http_when_channel_is_down() {
    let transport = MockTransport::new(vec![participant(9, "solo", Gender::Male)]);

    // Nothing listens on this port; the bridge degrades
    let bridge = PushBridge::connect(PushBridgeConfig {
        url: "ws://127.0.0.1:1".to_string(),
        ack_timeout: Duration::from_millis(200),
        reconnect_base: Duration::from_millis(10),
        reconnect_max: Duration::from_millis(20),
        reconnect_attempts: 1,
    });

    let store = RosterStore::new_shared();
    let session = LineupSession::open(
        RETREAT,
        store.clone(),
        transport.clone() as Arc<dyn LineupTransport>,
        Some(bridge.clone()),
        Arc::new(AlwaysActive),
        RefreshConfig::default(),
    )
    .await
    .unwrap();

    // Same roster state, obtained over HTTP
    assert_eq!(store.snapshot(RETREAT).unwrap().len(), 1);
    assert_eq!(session.orchestrator().transport().describe(), "mock");

    session.close().await;
    bridge.shutdown().await;
}
