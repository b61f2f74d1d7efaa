//! End-to-end properties of the synchronization core over the mock backend

use std::sync::{Arc, Mutex};
use std::time::Duration;

use integration_tests::{sample_roster, MockTransport};
use lineup_cache::{AlwaysActive, RefreshConfig, RosterStore};
use lineup_core::{
    DomainError, GbsNumber, LineupTransport, RecordId, RetreatId, RosterSnapshot,
};
use lineup_sync::{
    CommitOutcome, Debouncer, EditorState, FieldEditor, FieldKind, Indicator, LineupSession,
    SyncOrchestrator,
};

const RETREAT: RetreatId = RetreatId::new(7);

fn setup() -> (Arc<MockTransport>, Arc<RosterStore>, Arc<SyncOrchestrator>) {
    let transport = MockTransport::new(sample_roster());
    let store = RosterStore::new_shared();
    store.install(RosterSnapshot::new(RETREAT, transport.server_roster()));
    let orchestrator = Arc::new(SyncOrchestrator::new(
        store.clone(),
        transport.clone() as Arc<dyn LineupTransport>,
    ));
    (transport, store, orchestrator)
}

/// Drive one editor commit through the orchestrator, reporting back to the
/// editor the way a host component does.
async fn run_commit(
    editor: &Arc<Mutex<FieldEditor>>,
    orchestrator: &Arc<SyncOrchestrator>,
    record_id: RecordId,
) {
    let outcome = editor.lock().unwrap().commit();
    let CommitOutcome::Save(value) = outcome else {
        return;
    };
    let parsed = match GbsNumber::parse_assignment(&value) {
        Ok(parsed) => parsed,
        Err(_) => return,
    };
    match orchestrator.assign_gbs_number(RETREAT, record_id, parsed).await {
        Ok(confirmed) => {
            let display = confirmed
                .gbs_number
                .map(|n| n.to_string())
                .unwrap_or_default();
            editor.lock().unwrap().save_succeeded(display);
        }
        Err(_) => editor.lock().unwrap().save_failed(),
    }
}

// =============================================================================
// The worked example: record 42, user types "7", idle window elapses
// =============================================================================

#[tokio::test(start_paused = true)]
async fn example_scenario_single_put_after_idle_window() {
    let (transport, store, orchestrator) = setup();
    let record_id = RecordId::new(42);

    let editor = Arc::new(Mutex::new(FieldEditor::new(
        FieldKind::Assignment,
        record_id,
        "",
        false,
    )));
    let mut debouncer = Debouncer::new(Debouncer::AUTOSAVE_DELAY);

    {
        let mut e = editor.lock().unwrap();
        assert!(e.begin_edit());
        e.input("7");
    }
    let task_editor = editor.clone();
    let task_orchestrator = orchestrator.clone();
    debouncer.call(async move {
        run_commit(&task_editor, &task_orchestrator, record_id).await;
    });

    // Wait past the idle window
    tokio::time::sleep(Duration::from_millis(2500)).await;

    // Exactly one request, carrying 7
    assert_eq!(transport.call_count("update-gbs"), 1);
    assert_eq!(transport.calls(), vec!["update-gbs 42 Some(7)".to_string()]);

    // Cache shows the confirmed value; editor is idle with a success tick
    let snap = store.snapshot(RETREAT).unwrap();
    assert_eq!(
        snap.find(record_id).unwrap().gbs_number,
        Some(GbsNumber::new(7).unwrap())
    );
    let mut e = editor.lock().unwrap();
    assert_eq!(e.state(), EditorState::Idle);
    assert_eq!(e.take_indicator(), Some(Indicator::Saved));
}

// =============================================================================
// Debounce coalescing: N rapid keystrokes, one request with the final value
// =============================================================================

#[tokio::test(start_paused = true)]
async fn rapid_keystrokes_issue_one_save_with_final_value() {
    let (transport, _, orchestrator) = setup();
    let record_id = RecordId::new(43);

    let editor = Arc::new(Mutex::new(FieldEditor::new(
        FieldKind::Assignment,
        record_id,
        "",
        false,
    )));
    let mut debouncer = Debouncer::new(Debouncer::AUTOSAVE_DELAY);

    editor.lock().unwrap().begin_edit();
    for keystroke in ["1", "12", "127"] {
        editor.lock().unwrap().input(keystroke);
        let task_editor = editor.clone();
        let task_orchestrator = orchestrator.clone();
        debouncer.call(async move {
            run_commit(&task_editor, &task_orchestrator, record_id).await;
        });
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    tokio::time::sleep(Duration::from_secs(3)).await;

    assert_eq!(transport.call_count("update-gbs"), 1);
    assert_eq!(transport.calls(), vec!["update-gbs 43 Some(127)".to_string()]);
}

// =============================================================================
// Blur commit cancels the deferred save: no double-save race
// =============================================================================

#[tokio::test(start_paused = true)]
async fn blur_commit_cancels_pending_autosave() {
    let (transport, _, orchestrator) = setup();
    let record_id = RecordId::new(44);

    let editor = Arc::new(Mutex::new(FieldEditor::new(
        FieldKind::Assignment,
        record_id,
        "",
        false,
    )));
    let mut debouncer = Debouncer::new(Debouncer::AUTOSAVE_DELAY);

    editor.lock().unwrap().begin_edit();
    editor.lock().unwrap().input("3");
    let task_editor = editor.clone();
    let task_orchestrator = orchestrator.clone();
    debouncer.call(async move {
        run_commit(&task_editor, &task_orchestrator, record_id).await;
    });

    // Blur before the idle window: flush path commits synchronously
    debouncer.cancel();
    run_commit(&editor, &orchestrator, record_id).await;

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(transport.call_count("update-gbs"), 1);
}

// =============================================================================
// Rollback: a failed mutation restores the pre-mutation cache value
// =============================================================================

#[tokio::test]
async fn failed_save_rolls_cache_back() {
    let (transport, store, orchestrator) = setup();
    let before = store.snapshot(RETREAT).unwrap();

    transport.fail_next();
    let err = orchestrator
        .assign_gbs_number(RETREAT, RecordId::new(42), Some(GbsNumber::new(9).unwrap()))
        .await
        .unwrap_err();
    assert!(err.is_transport());

    assert_eq!(store.snapshot(RETREAT).unwrap(), before);
}

// =============================================================================
// Leader immutability: editor refuses, orchestrator refuses, no request
// =============================================================================

#[tokio::test]
async fn leader_assignment_is_a_noop() {
    let (transport, store, orchestrator) = setup();
    let leader_id = RecordId::new(1);

    let mut editor = FieldEditor::new(FieldKind::Assignment, leader_id, "1", true);
    assert!(!editor.begin_edit());

    let err = orchestrator
        .assign_gbs_number(RETREAT, leader_id, Some(GbsNumber::new(3).unwrap()))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::LeaderAssignmentForbidden(_)));
    assert_eq!(transport.call_count("update-gbs"), 0);

    // The leader's server-managed assignment is untouched
    let snap = store.snapshot(RETREAT).unwrap();
    assert_eq!(
        snap.find(leader_id).unwrap().gbs_number,
        Some(GbsNumber::new(1).unwrap())
    );
}

// =============================================================================
// Idempotent unassignment
// =============================================================================

#[tokio::test]
async fn unassigning_twice_equals_once() {
    let (_, store, orchestrator) = setup();
    let id = RecordId::new(42);

    orchestrator
        .assign_gbs_number(RETREAT, id, Some(GbsNumber::new(4).unwrap()))
        .await
        .unwrap();

    orchestrator.assign_gbs_number(RETREAT, id, None).await.unwrap();
    let once = store.snapshot(RETREAT).unwrap();

    orchestrator.assign_gbs_number(RETREAT, id, None).await.unwrap();
    assert_eq!(store.snapshot(RETREAT).unwrap(), once);
}

// =============================================================================
// Conflict buffering: concurrent remote edit while typing
// =============================================================================

#[tokio::test]
async fn concurrent_remote_edit_buffers_and_escape_adopts() {
    let (transport, store, _) = setup();
    let record_id = RecordId::new(42);

    let mut editor = FieldEditor::new(FieldKind::Assignment, record_id, "", false);
    editor.begin_edit();
    editor.input("7");

    // Another staff member assigns 5; their write reaches us as a broadcast
    let remote = transport.server_apply(record_id, |r| {
        r.gbs_number = Some(GbsNumber::new(5).unwrap());
    });
    store.apply_record(RETREAT, remote).unwrap();

    // Host forwards the new confirmed value to the editor
    let snap = store.snapshot(RETREAT).unwrap();
    let incoming = snap
        .find(record_id)
        .unwrap()
        .gbs_number
        .map(|n| n.to_string())
        .unwrap_or_default();
    editor.external_update(incoming);

    // Draft intact, conflict visible
    assert_eq!(editor.draft(), "7");
    assert_eq!(editor.state(), EditorState::ConflictPending);
    assert_eq!(editor.buffered_value(), Some("5"));

    // Escape adopts the incoming value
    editor.cancel();
    assert_eq!(editor.draft(), "5");
    assert_eq!(editor.state(), EditorState::Idle);
}

// =============================================================================
// Degraded-mode transparency: polling alone converges to the same state
// =============================================================================

#[tokio::test(start_paused = true)]
async fn polling_only_session_observes_remote_changes() {
    let transport = MockTransport::new(sample_roster());
    let store = RosterStore::new_shared();

    let session = LineupSession::open(
        RETREAT,
        store.clone(),
        transport.clone() as Arc<dyn LineupTransport>,
        None,
        Arc::new(AlwaysActive),
        RefreshConfig {
            interval: Duration::from_secs(3),
            ..RefreshConfig::default()
        },
    )
    .await
    .unwrap();
    assert!(!session.realtime());

    // A remote write lands on the backend only
    transport.server_apply(RecordId::new(44), |r| {
        r.gbs_number = Some(GbsNumber::new(2).unwrap());
    });

    // The next poll picks it up - later than push would, but the same state
    tokio::time::sleep(Duration::from_secs(7)).await;
    let snap = store.snapshot(RETREAT).unwrap();
    assert_eq!(
        snap.find(RecordId::new(44)).unwrap().gbs_number,
        Some(GbsNumber::new(2).unwrap())
    );

    session.close().await;
}

// =============================================================================
// Memo round trip over the orchestrator
// =============================================================================

#[tokio::test]
async fn memo_create_update_delete_round_trip() {
    let (transport, store, orchestrator) = setup();
    let id = RecordId::new(43);

    let created = orchestrator
        .save_memo(RETREAT, id, "pickup at station", None)
        .await
        .unwrap();
    let memo_id = created.memo_id.expect("server assigned memo id");
    assert_eq!(transport.call_count("create-memo"), 1);

    orchestrator
        .save_memo(RETREAT, id, "pickup at 9am", Some("yellow".to_string()))
        .await
        .unwrap();
    assert_eq!(transport.call_count("update-memo"), 1);
    assert_eq!(
        transport.server_record(id).unwrap().memo.as_deref(),
        Some("pickup at 9am")
    );

    orchestrator.save_memo(RETREAT, id, "", None).await.unwrap();
    assert_eq!(transport.call_count("delete-memo"), 1);

    let snap = store.snapshot(RETREAT).unwrap();
    let record = snap.find(id).unwrap();
    assert!(record.memo.is_none());
    assert_ne!(record.memo_id, Some(memo_id));

    // The record itself persists
    assert_eq!(record.id, id);
}
