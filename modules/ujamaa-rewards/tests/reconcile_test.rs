//! Integration tests for the share-to-star reconciliation engine.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use sqlx::PgPool;
use std::sync::Arc;
use ujamaa_ledger::LedgerStore;
use ujamaa_notify::{InboxStore, NoopSink, NotifyRouter};
use ujamaa_rewards::{Reconciler, SHARE_CONVERSION_REASON};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    LedgerStore::new(pool.clone()).migrate().await.ok()?;
    Some(pool)
}

/// Fresh member id per test so concurrently running tests never share rows.
fn fresh_member(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

async fn seed_member(pool: &PgPool, member_id: &str) {
    sqlx::query("INSERT INTO members (member_id) VALUES ($1) ON CONFLICT DO NOTHING")
        .bind(member_id)
        .execute(pool)
        .await
        .unwrap();
}

/// Insert `count` unawarded shares one row at a time, oldest first.
/// Returns the share ids in insertion order.
async fn seed_shares(pool: &PgPool, member_id: &str, count: usize) -> Vec<i64> {
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO share_events (member_id, platform) VALUES ($1, 'facebook') RETURNING id",
        )
        .bind(member_id)
        .fetch_one(pool)
        .await
        .unwrap();
        ids.push(id);
    }
    ids
}

/// Net STARs this member earned from share conversion.
async fn conversion_total(pool: &PgPool, member_id: &str) -> i64 {
    let (total,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(delta), 0) FROM star_transactions WHERE member_id = $1 AND reason = $2",
    )
    .bind(member_id)
    .bind(SHARE_CONVERSION_REASON)
    .fetch_one(pool)
    .await
    .unwrap();
    total
}

async fn share_split(pool: &PgPool, member_id: &str) -> (i64, i64) {
    let (awarded, unawarded): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE awarded),
            COUNT(*) FILTER (WHERE NOT awarded)
        FROM share_events WHERE member_id = $1
        "#,
    )
    .bind(member_id)
    .fetch_one(pool)
    .await
    .unwrap();
    (awarded, unawarded)
}

fn reconciler(pool: &PgPool) -> Reconciler {
    Reconciler::new(pool.clone(), Arc::new(NoopSink))
}

/// Install a trigger that aborts any star_transactions insert for one member,
/// simulating a storage failure mid-transaction. Names are per-call so two
/// fused tests don't fight over the function.
async fn install_star_fuse(pool: &PgPool, name: &str, member_id: &str) {
    let create_fn = format!(
        r#"
        CREATE OR REPLACE FUNCTION {name}() RETURNS trigger AS $$
        BEGIN
            IF NEW.member_id = '{member_id}' THEN
                RAISE EXCEPTION 'simulated storage failure for {member_id}';
            END IF;
            RETURN NEW;
        END;
        $$ LANGUAGE plpgsql
        "#
    );
    sqlx::query(&create_fn).execute(pool).await.unwrap();

    let drop_trg = format!("DROP TRIGGER IF EXISTS {name}_trg ON star_transactions");
    sqlx::query(&drop_trg).execute(pool).await.unwrap();

    let create_trg = format!(
        "CREATE TRIGGER {name}_trg BEFORE INSERT ON star_transactions \
         FOR EACH ROW EXECUTE FUNCTION {name}()"
    );
    sqlx::query(&create_trg).execute(pool).await.unwrap();
}

async fn remove_star_fuse(pool: &PgPool, name: &str) {
    let drop_trg = format!("DROP TRIGGER IF EXISTS {name}_trg ON star_transactions");
    sqlx::query(&drop_trg).execute(pool).await.unwrap();
    let drop_fn = format!("DROP FUNCTION IF EXISTS {name}()");
    sqlx::query(&drop_fn).execute(pool).await.unwrap();
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn seven_shares_pay_two_stars_and_leave_one() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let member = fresh_member("conv");
    seed_member(&pool, &member).await;
    seed_shares(&pool, &member, 7).await;

    reconciler(&pool).run().await.unwrap();

    assert_eq!(conversion_total(&pool, &member).await, 2);
    assert_eq!(share_split(&pool, &member).await, (6, 1));
}

#[tokio::test]
async fn second_pass_is_a_no_op() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let member = fresh_member("idem");
    seed_member(&pool, &member).await;
    seed_shares(&pool, &member, 7).await;

    let engine = reconciler(&pool);
    engine.run().await.unwrap();
    engine.run().await.unwrap();
    engine.run().await.unwrap();

    // Re-running converts nothing further: still one conversion credit of 2,
    // still exactly one share waiting for two more.
    assert_eq!(conversion_total(&pool, &member).await, 2);
    assert_eq!(share_split(&pool, &member).await, (6, 1));

    let (rows,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM star_transactions WHERE member_id = $1 AND reason = $2",
    )
    .bind(&member)
    .bind(SHARE_CONVERSION_REASON)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn below_rate_awards_nothing() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let member = fresh_member("below");
    seed_member(&pool, &member).await;
    seed_shares(&pool, &member, 2).await;

    reconciler(&pool).run().await.unwrap();

    assert_eq!(conversion_total(&pool, &member).await, 0);
    assert_eq!(share_split(&pool, &member).await, (0, 2));
}

#[tokio::test]
async fn member_with_no_shares_gets_no_rows_and_no_notification() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let member = fresh_member("quiet");
    seed_member(&pool, &member).await;

    let engine = Reconciler::new(
        pool.clone(),
        Arc::new(NotifyRouter::new(vec![Box::new(InboxStore::new(
            pool.clone(),
        ))])),
    );
    engine.run().await.unwrap();

    assert_eq!(conversion_total(&pool, &member).await, 0);
    let (notifications,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE member_id = $1")
            .bind(&member)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(notifications, 0);
}

#[tokio::test]
async fn oldest_shares_are_consumed_first() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let member = fresh_member("order");
    seed_member(&pool, &member).await;
    let ids = seed_shares(&pool, &member, 5).await;

    reconciler(&pool).run().await.unwrap();

    let awarded: Vec<(i64,)> = sqlx::query_as(
        "SELECT id FROM share_events WHERE member_id = $1 AND awarded ORDER BY id",
    )
    .bind(&member)
    .fetch_all(&pool)
    .await
    .unwrap();
    let awarded: Vec<i64> = awarded.into_iter().map(|(id,)| id).collect();

    // The three oldest of the five, exactly.
    assert_eq!(awarded, ids[..3].to_vec());
}

#[tokio::test]
async fn award_notifies_the_member_inbox() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let member = fresh_member("notif");
    seed_member(&pool, &member).await;
    seed_shares(&pool, &member, 3).await;

    let engine = Reconciler::new(
        pool.clone(),
        Arc::new(NotifyRouter::new(vec![Box::new(InboxStore::new(
            pool.clone(),
        ))])),
    );
    engine.run().await.unwrap();

    let inbox = InboxStore::new(pool.clone());
    let notifications = inbox.list(&member, 10).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].category, "star_award");
    assert_eq!(notifications[0].payload["delta"], 1);
}

#[tokio::test]
async fn storage_failure_applies_nothing_for_that_member() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let member = fresh_member("fused");
    seed_member(&pool, &member).await;
    seed_shares(&pool, &member, 6).await;
    install_star_fuse(&pool, "fuse_partial", &member).await;

    let outcome = reconciler(&pool).run().await.unwrap();

    // The append failed, so the whole member transaction rolled back:
    // no star rows, no consumed shares, and the pass recorded the failure.
    assert_eq!(conversion_total(&pool, &member).await, 0);
    assert_eq!(share_split(&pool, &member).await, (0, 6));
    assert!(outcome.stats.failures >= 1);

    remove_star_fuse(&pool, "fuse_partial").await;

    // With the fault gone the next pass settles the backlog.
    reconciler(&pool).run().await.unwrap();
    assert_eq!(conversion_total(&pool, &member).await, 2);
    assert_eq!(share_split(&pool, &member).await, (6, 0));
}

#[tokio::test]
async fn one_failing_member_does_not_block_the_others() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let broken = fresh_member("broken");
    let healthy = fresh_member("healthy");
    seed_member(&pool, &broken).await;
    seed_member(&pool, &healthy).await;
    seed_shares(&pool, &broken, 6).await;
    seed_shares(&pool, &healthy, 3).await;
    install_star_fuse(&pool, "fuse_isolation", &broken).await;

    let outcome = reconciler(&pool).run().await.unwrap();

    assert!(outcome.stats.failures >= 1);
    assert_eq!(conversion_total(&pool, &broken).await, 0);
    assert_eq!(share_split(&pool, &broken).await, (0, 6));
    assert_eq!(conversion_total(&pool, &healthy).await, 1);
    assert_eq!(share_split(&pool, &healthy).await, (3, 0));

    remove_star_fuse(&pool, "fuse_isolation").await;
}

#[tokio::test]
async fn stars_match_consumed_shares_exactly() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let member = fresh_member("conserve");
    seed_member(&pool, &member).await;
    seed_shares(&pool, &member, 11).await;

    let engine = reconciler(&pool);
    engine.run().await.unwrap();
    seed_shares(&pool, &member, 4).await;
    engine.run().await.unwrap();

    // 15 shares seeded in total: every committed STAR accounts for exactly
    // three consumed shares, whatever the pass boundaries were.
    let stars = conversion_total(&pool, &member).await;
    let (awarded, unawarded) = share_split(&pool, &member).await;
    assert_eq!(awarded, stars * 3);
    assert_eq!(awarded + unawarded, 15);
    assert_eq!(stars, 5);
}
