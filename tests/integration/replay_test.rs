//! Audit trail replay agrees with live state

use crate::common::{user, Harness};
use binary_ledger::audit::{read_events, AuditLog, AuditRecorder, RecorderConfig, ReplayState};
use binary_ledger::clock::ManualClock;
use binary_ledger::market::StatusKind;
use binary_ledger::{
    AccountId, InMemoryCustody, LedgerSettings, MarketLedger, Side, StaticAuthority,
};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_replay_matches_live_totals() {
    let h = Harness::new().await;
    let alice = user("alice");
    let bob = user("bob");
    let carol = user("carol");

    let rain = h.open_market().await;
    let snow = h.open_market().await;
    h.ledger.acquire(&alice, rain, Side::Yes, 10_000).await.unwrap();
    h.ledger.acquire(&bob, rain, Side::No, 30_000).await.unwrap();
    h.ledger.release(&bob, rain, Side::No, 4_000).await.unwrap();
    h.ledger.acquire(&carol, snow, Side::Yes, 7_000).await.unwrap();
    h.ledger.withdraw_fees(&h.admin).await.unwrap();
    h.ledger.cancel(&h.admin, snow).await.unwrap();
    h.ledger.claim(&carol, snow).await.unwrap();
    h.end_trading();
    h.ledger.resolve(&h.admin, rain, false).await.unwrap();
    h.ledger.claim(&bob, rain).await.unwrap();
    h.ledger.acquire(&alice, h.open_market().await, Side::No, 1_000).await.unwrap();

    let events = h.ledger.audit_events().await;
    let state = ReplayState::from_events(&events);
    assert!(state.violations().is_empty(), "{:?}", state.violations());
    assert_eq!(state.events_applied(), events.len());
    assert_eq!(state.treasury(), h.ledger.fee_balance().await);

    for snapshot in h.ledger.list_markets().await {
        let replayed = state.market(snapshot.id).unwrap();
        assert_eq!(replayed.status, snapshot.status);
        assert_eq!(replayed.total_yes, snapshot.total_yes);
        assert_eq!(replayed.total_no, snapshot.total_no);
        assert_eq!(replayed.vault, snapshot.vault);
        assert_eq!(replayed.question, snapshot.question);
    }
    let rain_state = state.market(rain).unwrap();
    assert_eq!(rain_state.status, StatusKind::Resolved);
    assert_eq!(rain_state.position(Side::Yes, &AccountId::from("alice")), 9_800);
}

#[tokio::test]
async fn test_recorded_file_replays() {
    let temp_dir = TempDir::new().unwrap();
    let recorder = AuditRecorder::new(RecorderConfig {
        output_path: temp_dir.path().join("ledger.jsonl"),
        buffer_size: 2,
        flush_interval_secs: 60,
    });

    let custody = Arc::new(InMemoryCustody::new());
    custody.fund(&AccountId::from("alice"), 10_000).await;
    let ledger = MarketLedger::with_audit(
        LedgerSettings::default(),
        Arc::new(StaticAuthority::new(["admin"])),
        custody,
        Arc::new(ManualClock::default()),
        AuditLog::with_sink(recorder.sink()),
    );
    let admin = user("admin");
    let id = ledger.create_market(&admin, "Q?", 60, 0).await.unwrap();
    ledger.acquire(&user("alice"), id, Side::Yes, 5_000).await.unwrap();
    ledger.pause(&admin).await.unwrap();
    let live = ledger.get_market(id).await.unwrap();
    drop(ledger);

    let path = recorder.output_path().to_path_buf();
    let stats = recorder.shutdown().await.unwrap();
    assert_eq!(stats.events_written, 3);
    assert_eq!(stats.write_errors, 0);

    let events = read_events(&path).unwrap();
    let state = ReplayState::from_events(&events);
    assert!(state.violations().is_empty());
    assert_eq!(state.market(id).unwrap().total_yes, live.total_yes);
    assert_eq!(state.treasury(), 100);
}
