//! End-to-end market lifecycle

use crate::common::{user, Harness, FUNDING, WEEK};
use binary_ledger::market::StatusKind;
use binary_ledger::settlement::ClaimKind;
use binary_ledger::trade::{Acquired, Released};
use binary_ledger::{AccountId, LedgerError, MarketId, Side};
use chrono::Duration;

#[tokio::test]
async fn test_full_lifecycle() {
    let h = Harness::new().await;
    let alice = user("alice");
    let bob = user("bob");

    let id = h.open_market().await;
    assert_eq!(id, MarketId(1));
    let snap = h.ledger.get_market(id).await.unwrap();
    assert_eq!(snap.status, StatusKind::Open);
    assert_eq!(snap.end_time, snap.created_at + Duration::seconds(WEEK as i64));

    let a = h.ledger.acquire(&alice, id, Side::Yes, 100_000000).await.unwrap();
    assert_eq!(a, Acquired { credited: 98_000000, fee: 2_000000 });
    let b = h.ledger.acquire(&bob, id, Side::No, 200_000000).await.unwrap();
    assert_eq!(b, Acquired { credited: 196_000000, fee: 4_000000 });

    let snap = h.ledger.get_market(id).await.unwrap();
    assert_eq!(snap.total_yes, 98_000000);
    assert_eq!(snap.total_no, 196_000000);
    assert!(snap.vault >= snap.total_yes + snap.total_no);
    assert_eq!(h.ledger.fee_balance().await, 6_000000);

    let err = h.ledger.resolve(&h.admin, id, true).await.unwrap_err();
    assert!(matches!(err, LedgerError::BettingNotEnded(_)));

    h.end_trading();
    h.ledger.resolve(&h.admin, id, true).await.unwrap();
    let err = h.ledger.resolve(&h.admin, id, false).await.unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyResolved(_)));

    let claimed = h.ledger.claim(&alice, id).await.unwrap();
    assert_eq!(claimed.payout, 98_000000);
    assert_eq!(claimed.kind, ClaimKind::Winnings { side: Side::Yes });
    assert_eq!(h.external("alice").await, FUNDING - 2_000000);

    let err = h.ledger.claim(&bob, id).await.unwrap_err();
    assert!(matches!(err, LedgerError::NoWinningShares));
    let err = h.ledger.claim(&alice, id).await.unwrap_err();
    assert!(matches!(err, LedgerError::NoWinningShares));

    assert_eq!(h.ledger.withdraw_fees(&h.admin).await.unwrap(), 6_000000);
    assert_eq!(h.ledger.withdraw_fees(&h.admin).await.unwrap(), 0);
    assert_eq!(h.external("admin").await, 6_000000);

    let snap = h.ledger.get_market(id).await.unwrap();
    assert_eq!(snap.status, StatusKind::Resolved);
    assert_eq!(snap.outcome, Some(true));
    assert_eq!(snap.total_yes, 0);
    assert_eq!(snap.total_no, 196_000000);
    assert!(h.ledger.check_invariants(id).await.unwrap().is_ok());
}

#[tokio::test]
async fn test_acquire_release_round_trip() {
    let h = Harness::new().await;
    let carol = user("carol");
    let id = h.open_market().await;

    h.ledger.acquire(&carol, id, Side::Yes, 1_000).await.unwrap();
    let held = h
        .ledger
        .position(id, Side::Yes, &AccountId::from("carol"))
        .await
        .unwrap();
    assert_eq!(held, 980);

    let err = h.ledger.release(&carol, id, Side::Yes, 981).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientBalance { requested: 981, available: 980 }));
    let err = h.ledger.release(&carol, id, Side::No, 1).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientBalance { .. }));

    let released = h.ledger.release(&carol, id, Side::Yes, 500).await.unwrap();
    assert_eq!(released, Released { payout: 500, fee: 0 });
    let released = h.ledger.release(&carol, id, Side::Yes, 480).await.unwrap();
    assert_eq!(released.payout, 480);

    let snap = h.ledger.get_market(id).await.unwrap();
    assert_eq!(snap.total_yes, 0);
    assert_eq!(snap.vault, 0);
    assert_eq!(h.external("carol").await, FUNDING - 20);
    assert!(h.ledger.check_invariants(id).await.unwrap().is_ok());
}

#[tokio::test]
async fn test_trading_window_and_validation() {
    let h = Harness::new().await;
    let alice = user("alice");

    let err = h
        .ledger
        .create_market(&h.admin, " \t ", WEEK, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidQuestion));
    let err = h.ledger.create_market(&h.admin, "Q?", 0, 0).await.unwrap_err();
    assert!(matches!(err, LedgerError::InvalidDuration(0)));

    let id = h.open_market().await;
    let err = h.ledger.acquire(&alice, id, Side::Yes, 0).await.unwrap_err();
    assert!(matches!(err, LedgerError::ZeroAmount));

    h.clock.advance(Duration::seconds(WEEK as i64 - 1));
    h.ledger.acquire(&alice, id, Side::Yes, 50).await.unwrap();
    h.clock.advance(Duration::seconds(1));
    let err = h.ledger.acquire(&alice, id, Side::Yes, 50).await.unwrap_err();
    assert!(matches!(err, LedgerError::BettingClosed(_)));
    let err = h.ledger.release(&alice, id, Side::Yes, 1).await.unwrap_err();
    assert!(matches!(err, LedgerError::BettingClosed(_)));

    h.ledger.resolve(&h.admin, id, false).await.unwrap();
    let err = h.ledger.acquire(&alice, id, Side::No, 10).await.unwrap_err();
    assert!(matches!(err, LedgerError::MarketNotOpen(_)));
}

#[tokio::test]
async fn test_cancel_refunds_net_balances() {
    let h = Harness::new().await;
    let alice = user("alice");
    let bob = user("bob");
    let id = h.open_market().await;

    h.ledger.acquire(&alice, id, Side::Yes, 100).await.unwrap();
    h.ledger.acquire(&alice, id, Side::No, 50).await.unwrap();
    let err = h.ledger.cancel(&alice, id).await.unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized(_)));
    h.ledger.cancel(&h.admin, id).await.unwrap();

    let snap = h.ledger.get_market(id).await.unwrap();
    assert_eq!(snap.status, StatusKind::Cancelled);
    assert!(snap.outcome.is_none());
    assert!(snap.resolution_time.is_some());

    let claimed = h.ledger.claim(&alice, id).await.unwrap();
    assert_eq!(claimed.payout, 98 + 49);
    assert_eq!(claimed.kind, ClaimKind::Refund { yes: 98, no: 49 });
    assert_eq!(h.external("alice").await, FUNDING - 3);

    let err = h.ledger.claim(&bob, id).await.unwrap_err();
    assert!(matches!(err, LedgerError::NothingToRefund));
    assert_eq!(h.ledger.get_market(id).await.unwrap().vault, 0);
    assert_eq!(h.ledger.fee_balance().await, 3);
}

#[tokio::test]
async fn test_list_markets_and_probability() {
    let h = Harness::new().await;
    let first = h.open_market().await;
    let second = h.open_market().await;
    h.ledger.acquire(&user("alice"), second, Side::Yes, 100).await.unwrap();
    h.ledger.acquire(&user("bob"), second, Side::No, 300).await.unwrap();

    let markets = h.ledger.list_markets().await;
    assert_eq!(markets.len(), 2);
    assert_eq!(markets[0].id, first);
    assert!(markets[0].yes_probability().is_none());
    assert_eq!(
        markets[1].yes_probability(),
        Some(rust_decimal::Decimal::from(98) / rust_decimal::Decimal::from(98 + 294))
    );
}
