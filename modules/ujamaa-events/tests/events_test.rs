//! Integration tests for the event log, review lifecycle, and AI metrics.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use sqlx::PgPool;
use ujamaa_common::{SharePlatform, UjamaaError};
use ujamaa_events::{
    ActivityEvent, EventLog, MetricKind, NewReview, ReviewStatus, ReviewStore,
};
use ujamaa_ledger::LedgerStore;
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
    sqlx::query("INSERT INTO members (member_id) VALUES ($1) ON CONFLICT DO NOTHING")
        .bind(member_id)
        .execute(pool)
        .await
        .unwrap();
}

#[tokio::test]
async fn share_append_lands_unawarded() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let id = fresh_member("share");
    seed_member(&pool, &id).await;
    let log = EventLog::new(pool.clone());

    let event = log
        .append_share(
            &id,
            SharePlatform::Tiktok,
            Some("https://tiktok.com/v/1"),
            None,
        )
        .await
        .unwrap();

    assert_eq!(event.platform, "tiktok");
    assert!(!event.awarded);
    assert_eq!(event.share_url.as_deref(), Some("https://tiktok.com/v/1"));

    let shares = log.shares_for_member(&id, 10).await.unwrap();
    assert_eq!(shares.len(), 1);
}

#[tokio::test]
async fn pending_counts_only_include_members_at_the_threshold() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let rich = fresh_member("pend-rich");
    let poor = fresh_member("pend-poor");
    seed_member(&pool, &rich).await;
    seed_member(&pool, &poor).await;
    let log = EventLog::new(pool.clone());

    for _ in 0..4 {
        log.append_share(&rich, SharePlatform::Facebook, None, None)
            .await
            .unwrap();
    }
    for _ in 0..2 {
        log.append_share(&poor, SharePlatform::Facebook, None, None)
            .await
            .unwrap();
    }

    let pending = log.pending_share_counts(3).await.unwrap();
    let rich_entry = pending.iter().find(|p| p.member_id == rich);
    assert_eq!(rich_entry.map(|p| p.unawarded), Some(4));
    assert!(pending.iter().all(|p| p.member_id != poor));
}

#[tokio::test]
async fn lock_returns_oldest_first_and_mark_flips_exactly_those() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let id = fresh_member("lock");
    seed_member(&pool, &id).await;
    let log = EventLog::new(pool.clone());

    let mut ids = Vec::new();
    for _ in 0..4 {
        let e = log
            .append_share(&id, SharePlatform::Instagram, None, None)
            .await
            .unwrap();
        ids.push(e.id);
    }

    let mut tx = pool.begin().await.unwrap();
    let locked = EventLog::lock_unawarded(&mut tx, &id).await.unwrap();
    let locked_ids: Vec<i64> = locked.iter().map(|e| e.id).collect();
    assert_eq!(locked_ids, ids);

    let flipped = EventLog::mark_awarded(&mut tx, &ids[..3]).await.unwrap();
    assert_eq!(flipped, 3);
    tx.commit().await.unwrap();

    let remaining = EventLog::lock_unawarded(&mut pool.acquire().await.unwrap(), &id)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, ids[3]);
}

#[tokio::test]
async fn activity_appends_store_the_tagged_payload() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let id = fresh_member("act");
    seed_member(&pool, &id).await;
    let log = EventLog::new(pool.clone());

    let stored = log
        .append_activity(
            &id,
            &ActivityEvent::DailyPracticeComplete {
                language: "swahili".into(),
                streak_days: 12,
            },
        )
        .await
        .unwrap();

    assert_eq!(stored.event_type, "language:daily_practice_complete");
    assert_eq!(stored.payload["type"], "daily_practice_complete");
    assert_eq!(stored.payload["streak_days"], 12);

    let recent = log.recent_activity(&id, 10).await.unwrap();
    assert_eq!(recent.len(), 1);
}

#[tokio::test]
async fn review_lifecycle_pending_to_approved_once() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let id = fresh_member("review");
    seed_member(&pool, &id).await;
    let reviews = ReviewStore::new(pool.clone());

    let review = reviews
        .submit(NewReview {
            member_id: id.clone(),
            business_name: "Mama Asha Kitchen".into(),
            business_address: "12 Market Rd".into(),
            service_type: "restaurant".into(),
            what_makes_special: "Best jollof in the district".into(),
            video_url: "https://example.com/v/asha".into(),
            self_score: 4,
            checklist: serde_json::json!({"steady_camera": true, "clear_audio": true}),
        })
        .await
        .unwrap();

    assert_eq!(review.status(), ReviewStatus::Pending);
    assert!(review.reviewed_at.is_none());

    let approved = reviews.approve(review.id).await.unwrap();
    assert_eq!(approved.status(), ReviewStatus::Approved);
    assert!(approved.reviewed_at.is_some());

    // A second approval loses against the status guard.
    let err = reviews.approve(review.id).await.unwrap_err();
    assert!(matches!(err, UjamaaError::NotFound(_)));
}

#[tokio::test]
async fn approve_in_rolls_back_with_the_transaction() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let id = fresh_member("rollback");
    seed_member(&pool, &id).await;
    let reviews = ReviewStore::new(pool.clone());

    let review = reviews
        .submit(NewReview {
            member_id: id.clone(),
            business_name: "Zuri Tailoring".into(),
            business_address: "8 Weaver St".into(),
            service_type: "tailor".into(),
            what_makes_special: "Same-day fittings".into(),
            video_url: "https://example.com/v/zuri".into(),
            self_score: 3,
            checklist: serde_json::json!({"steady_camera": true}),
        })
        .await
        .unwrap();

    let mut tx = pool.begin().await.unwrap();
    let approved = ReviewStore::approve_in(&mut tx, review.id).await.unwrap();
    assert_eq!(approved.status(), ReviewStatus::Approved);
    tx.rollback().await.unwrap();

    // The rollback undid the flip, so the review is still approvable.
    let fetched = reviews.get(review.id).await.unwrap().unwrap();
    assert_eq!(fetched.status(), ReviewStatus::Pending);
    reviews.approve(review.id).await.unwrap();
}

#[tokio::test]
async fn rejected_review_cannot_be_approved() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let id = fresh_member("reject");
    seed_member(&pool, &id).await;
    let reviews = ReviewStore::new(pool.clone());

    let review = reviews
        .submit(NewReview {
            member_id: id.clone(),
            business_name: "Kofi Cuts".into(),
            business_address: "3 Unity Ave".into(),
            service_type: "barber".into(),
            what_makes_special: "Open at dawn".into(),
            video_url: "https://example.com/v/kofi".into(),
            self_score: 2,
            checklist: serde_json::json!({}),
        })
        .await
        .unwrap();

    reviews.reject(review.id).await.unwrap();
    assert!(reviews.approve(review.id).await.is_err());
}

#[tokio::test]
async fn metrics_record_and_read_back_newest_first() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let id = fresh_member("metric");
    seed_member(&pool, &id).await;
    let metrics = ujamaa_events::AiMetricStore::new(pool.clone());

    metrics
        .record(&id, MetricKind::Motion, 81.5, None)
        .await
        .unwrap();
    metrics
        .record(
            &id,
            MetricKind::Motion,
            64.0,
            Some(serde_json::json!({"session": "warmup"})),
        )
        .await
        .unwrap();

    let latest = metrics.latest(&id, MetricKind::Motion, 10).await.unwrap();
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[0].score, 64.0);
    assert_eq!(latest[0].metric_type, "motion");
}
