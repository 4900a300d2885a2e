//! Custody failures leave the ledger untouched

use crate::common::{user, Harness, FUNDING};
use binary_ledger::custody::CustodyError;
use binary_ledger::{InMemoryCustody, LedgerError, LedgerSettings, Side};
use std::time::Duration;

#[tokio::test]
async fn test_insufficient_collateral() {
    let h = Harness::new().await;
    let id = h.open_market().await;

    let err = h
        .ledger
        .acquire(&user("alice"), id, Side::Yes, FUNDING + 1)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Custody(CustodyError::InsufficientFunds { .. })
    ));
    assert!(!err.is_transient());

    let snap = h.ledger.get_market(id).await.unwrap();
    assert_eq!(snap.total_yes, 0);
    assert_eq!(snap.vault, 0);
    assert_eq!(h.ledger.fee_balance().await, 0);
}

#[tokio::test]
async fn test_offline_custody_is_transient() {
    let h = Harness::new().await;
    let alice = user("alice");
    let id = h.open_market().await;
    h.ledger.acquire(&alice, id, Side::Yes, 1_000).await.unwrap();
    let events = h.ledger.audit_events().await.len();

    h.custody.set_offline(true);
    let err = h.ledger.release(&alice, id, Side::Yes, 500).await.unwrap_err();
    assert!(err.is_transient());
    let err = h.ledger.withdraw_fees(&h.admin).await.unwrap_err();
    assert!(err.is_transient());

    assert_eq!(h.ledger.get_market(id).await.unwrap().total_yes, 980);
    assert_eq!(h.ledger.fee_balance().await, 20);
    assert_eq!(h.ledger.audit_events().await.len(), events);

    h.custody.set_offline(false);
    assert_eq!(h.ledger.release(&alice, id, Side::Yes, 500).await.unwrap().payout, 500);
    assert_eq!(h.ledger.withdraw_fees(&h.admin).await.unwrap(), 20);
}

#[tokio::test]
async fn test_custody_timeout_leaves_state_unchanged() {
    let settings = LedgerSettings {
        custody_timeout: Duration::from_millis(20),
        ..LedgerSettings::default()
    };
    let custody = InMemoryCustody::new().with_latency(Duration::from_millis(500));
    let h = Harness::with_custody(custody, settings).await;
    let id = h.open_market().await;

    let err = h
        .ledger
        .acquire(&user("alice"), id, Side::Yes, 1_000)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::CustodyTimeout(_)));
    assert!(err.is_transient());

    let snap = h.ledger.get_market(id).await.unwrap();
    assert_eq!(snap.total_yes, 0);
    assert_eq!(snap.vault, 0);
    assert!(h.custody.transfers().await.is_empty());
}
