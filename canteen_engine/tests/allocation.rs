mod support;

use std::collections::BTreeSet;

use canteen_engine::{db_types::ScopeKey, traits::SequenceAllocator};
use futures_util::future::join_all;
use support::prepare_env::prepare_test_env;

const NUM_ALLOCATIONS: i64 = 20;

#[tokio::test]
async fn concurrent_allocations_have_no_gaps_or_repeats() {
    let env = prepare_test_env().await;
    let scope = ScopeKey::new("C1", "2024-6-1");
    let calls = (0..NUM_ALLOCATIONS).map(|_| env.db.allocate(&scope));
    let tokens = join_all(calls).await.into_iter().map(|r| r.expect("allocation failed")).collect::<Vec<_>>();
    let unique = tokens.iter().copied().collect::<BTreeSet<_>>();
    assert_eq!(unique.len(), tokens.len(), "Duplicate tokens issued: {tokens:?}");
    assert_eq!(unique, (1..=NUM_ALLOCATIONS).collect::<BTreeSet<_>>());
    assert_eq!(env.db.last_token(&scope).await.unwrap(), Some(NUM_ALLOCATIONS));
}

#[tokio::test]
async fn scopes_are_independent() {
    let env = prepare_test_env().await;
    let c1_today = ScopeKey::new("C1", "2024-6-1");
    let c1_tomorrow = ScopeKey::new("C1", "2024-6-2");
    let c2_today = ScopeKey::new("C2", "2024-6-1");

    assert_eq!(env.db.last_token(&c1_today).await.unwrap(), None);
    assert_eq!(env.db.allocate(&c1_today).await.unwrap(), 1);
    assert_eq!(env.db.allocate(&c1_today).await.unwrap(), 2);
    assert_eq!(env.db.allocate(&c1_tomorrow).await.unwrap(), 1);
    assert_eq!(env.db.allocate(&c2_today).await.unwrap(), 1);
    assert_eq!(env.db.allocate(&c1_today).await.unwrap(), 3);
    assert_eq!(env.db.last_token(&c1_tomorrow).await.unwrap(), Some(1));
    assert_eq!(env.db.last_token(&c2_today).await.unwrap(), Some(1));
}
