//! Concurrent callers on shared markets

use crate::common::{user, Harness, FUNDING};
use binary_ledger::audit::ReplayState;
use binary_ledger::{AccountId, LedgerError, MarketId, Side};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_acquires_keep_totals() {
    let h = Arc::new(Harness::new().await);
    let id = h.open_market().await;

    let mut handles = Vec::new();
    for i in 0..50u64 {
        let h = h.clone();
        handles.push(tokio::spawn(async move {
            let (who, side) = if i % 2 == 0 {
                ("alice", Side::Yes)
            } else {
                ("bob", Side::No)
            };
            h.ledger.acquire(&user(who), id, side, 1_000).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let snap = h.ledger.get_market(id).await.unwrap();
    assert_eq!(snap.total_yes, 25 * 980);
    assert_eq!(snap.total_no, 25 * 980);
    assert_eq!(snap.vault, 50 * 980);
    assert_eq!(h.ledger.fee_balance().await, 50 * 20);
    assert_eq!(h.external("alice").await, FUNDING - 25_000);
    assert!(h.ledger.check_invariants(id).await.unwrap().is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_claims_pay_once() {
    let h = Arc::new(Harness::new().await);
    let id = h.open_market().await;
    h.ledger.acquire(&user("alice"), id, Side::Yes, 1_000).await.unwrap();
    h.end_trading();
    h.ledger.resolve(&h.admin, id, true).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let h = h.clone();
        handles.push(tokio::spawn(async move {
            h.ledger.claim(&user("alice"), id).await
        }));
    }

    let mut paid = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(claimed) => paid += claimed.payout,
            Err(LedgerError::NoWinningShares) => rejected += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(paid, 980);
    assert_eq!(rejected, 9);
    assert_eq!(h.external("alice").await, FUNDING - 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_releases_never_overdraw() {
    let h = Arc::new(Harness::new().await);
    let id = h.open_market().await;
    h.ledger.acquire(&user("bob"), id, Side::No, 1_000).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let h = h.clone();
        handles.push(tokio::spawn(async move {
            h.ledger.release(&user("bob"), id, Side::No, 300).await
        }));
    }
    let mut ok = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            ok += 1;
        }
    }
    // 980 held: three releases of 300 fit
    assert_eq!(ok, 3);
    let held = h
        .ledger
        .position(id, Side::No, &AccountId::from("bob"))
        .await
        .unwrap();
    assert_eq!(held, 80);
    assert!(h.ledger.check_invariants(id).await.unwrap().is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fee_sweep_during_trading() {
    let h = Arc::new(Harness::new().await);
    let id = h.open_market().await;

    let trader = {
        let h = h.clone();
        tokio::spawn(async move {
            for _ in 0..20 {
                h.ledger.acquire(&user("carol"), id, Side::Yes, 500).await.unwrap();
            }
        })
    };
    let mut swept = 0u64;
    for _ in 0..10 {
        swept += h.ledger.withdraw_fees(&h.admin).await.unwrap();
        tokio::task::yield_now().await;
    }
    trader.await.unwrap();
    swept += h.ledger.withdraw_fees(&h.admin).await.unwrap();

    assert_eq!(swept, 20 * 10);
    assert_eq!(h.ledger.fee_balance().await, 0);
    assert_eq!(h.external("admin").await, 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_acquire_racing_creation_is_logged_after_it() {
    let h = Arc::new(Harness::new().await);

    let creator = {
        let h = h.clone();
        tokio::spawn(async move { h.open_market().await })
    };
    let mut buyers = Vec::new();
    for _ in 0..4 {
        let h = h.clone();
        buyers.push(tokio::spawn(async move {
            h.ledger
                .acquire(&user("alice"), MarketId(1), Side::Yes, 1_000)
                .await
        }));
    }

    let id = creator.await.unwrap();
    assert_eq!(id, MarketId(1));
    for buyer in buyers {
        match buyer.await.unwrap() {
            Ok(_) | Err(LedgerError::MarketNotFound(_)) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    let events = h.ledger.audit_events().await;
    let state = ReplayState::from_events(&events);
    assert!(state.violations().is_empty(), "{:?}", state.violations());
}
