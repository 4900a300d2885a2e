//! Authority and pause behaviour

use crate::common::{user, Harness, WEEK};
use binary_ledger::audit::EventKind;
use binary_ledger::{LedgerError, Side};
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_authority_only_operations() {
    let h = Harness::new().await;
    let mallory = user("mallory");

    let err = h
        .ledger
        .create_market(&mallory, "Q?", WEEK, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized(_)));

    let id = h.open_market().await;
    h.end_trading();
    let err = h.ledger.resolve(&mallory, id, true).await.unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized(_)));
    let err = h.ledger.withdraw_fees(&mallory).await.unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized(_)));
    let err = h.ledger.pause(&mallory).await.unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized(_)));
    assert_err!(h.ledger.unpause(&mallory).await);
    assert!(!h.ledger.is_paused());
}

#[tokio::test]
async fn test_pause_and_resume() {
    let h = Harness::new().await;
    let alice = user("alice");
    let id = h.open_market().await;
    h.ledger.acquire(&alice, id, Side::Yes, 1_000).await.unwrap();

    assert!(h.ledger.pause(&h.admin).await.unwrap());
    assert!(!h.ledger.pause(&h.admin).await.unwrap());

    let before = h.ledger.get_market(id).await.unwrap();
    let err = h.ledger.acquire(&alice, id, Side::Yes, 1_000).await.unwrap_err();
    assert!(matches!(err, LedgerError::Paused));
    let err = h.ledger.release(&alice, id, Side::Yes, 10).await.unwrap_err();
    assert!(matches!(err, LedgerError::Paused));
    assert_eq!(h.ledger.get_market(id).await.unwrap(), before);

    // Cancel and claims still work while paused
    h.ledger.cancel(&h.admin, id).await.unwrap();
    assert_eq!(h.ledger.claim(&alice, id).await.unwrap().payout, 980);

    assert!(assert_ok!(h.ledger.unpause(&h.admin).await));
    let next = h.open_market().await;
    assert_ok!(h.ledger.acquire(&alice, next, Side::No, 100).await);

    let pauses = h
        .ledger
        .audit_events()
        .await
        .into_iter()
        .filter(|e| matches!(e.kind, EventKind::Paused { .. } | EventKind::Unpaused { .. }))
        .count();
    assert_eq!(pauses, 2);
}
