//! Integration tests for the batch jobs.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use sqlx::PgPool;
use ujamaa_common::{Currency, RankTier};
use ujamaa_jobs::{free_votes, rank};
use ujamaa_ledger::{LedgerStore, MemberIdentity, MemberStore, VoteStore};
use uuid::Uuid;

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    LedgerStore::new(pool.clone()).migrate().await.ok()?;
    Some(pool)
}

fn fresh_member(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

async fn seed_member(pool: &PgPool, member_id: &str) {
    MemberStore::new(pool.clone())
        .upsert(&MemberIdentity {
            member_id: member_id.to_string(),
            provider: "google".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn rank_refresh_rewrites_the_cached_columns() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let id = fresh_member("ranker");
    seed_member(&pool, &id).await;
    let members = MemberStore::new(pool.clone());
    let ledger = LedgerStore::new(pool.clone());
    ledger
        .append(Currency::Star, &id, 350, "seed")
        .await
        .unwrap();

    // Fresh member still carries the default cache
    let before = members.require(&id).await.unwrap();
    assert_eq!(before.star_total, 0);

    let stats = rank::refresh_ranks(&pool).await.unwrap();
    assert!(stats.members_scanned >= 1);

    let after = members.require(&id).await.unwrap();
    assert_eq!(after.star_total, 350);
    assert_eq!(after.rank(), RankTier::Builder);

    // A spend demotes on the next refresh
    ledger
        .append(Currency::Star, &id, -100, "contest_vote:talent")
        .await
        .unwrap();
    rank::refresh_ranks(&pool).await.unwrap();

    let demoted = members.require(&id).await.unwrap();
    assert_eq!(demoted.star_total, 250);
    assert_eq!(demoted.rank(), RankTier::Contributor);

    // A refresh with nothing moved leaves the cache alone
    rank::refresh_ranks(&pool).await.unwrap();
    let steady = members.require(&id).await.unwrap();
    assert_eq!(steady.star_total, 250);
    assert_eq!(steady.rank(), RankTier::Contributor);
}

#[tokio::test]
async fn monthly_top_up_grants_one_vote_and_never_refills() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let id = fresh_member("freevoter");
    seed_member(&pool, &id).await;
    let votes = VoteStore::new(pool.clone());
    let month = "2097-02";

    free_votes::top_up_month(&pool, month).await.unwrap();
    assert_eq!(votes.free_votes_remaining(&id, month).await.unwrap(), 1);

    // Re-running the job changes nothing
    free_votes::top_up_month(&pool, month).await.unwrap();
    assert_eq!(votes.free_votes_remaining(&id, month).await.unwrap(), 1);

    // A spent allowance stays spent on re-run
    sqlx::query(
        "UPDATE monthly_free_votes SET free_votes_remaining = 0
         WHERE member_id = $1 AND month_key = $2",
    )
    .bind(&id)
    .bind(month)
    .execute(&pool)
    .await
    .unwrap();

    free_votes::top_up_month(&pool, month).await.unwrap();
    assert_eq!(votes.free_votes_remaining(&id, month).await.unwrap(), 0);
}
