use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ujamaa_common::Config;
use ujamaa_jobs::{free_votes, rank};
use ujamaa_ledger::{month_key, LedgerStore};
use ujamaa_notify::{AdminWebhook, InboxStore, NotifyRouter, NotifySink};
use ujamaa_rewards::Reconciler;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ujamaa=info".parse()?))
        .init();

    let job = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "reconcile".to_string());

    let config = Config::jobs_from_env();
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    // Migrations are idempotent
    LedgerStore::new(pool.clone()).migrate().await?;

    match job.as_str() {
        "reconcile" => {
            let notifier = build_notifier(&pool, &config);
            let outcome = Reconciler::new(pool.clone(), notifier).run().await?;
            info!("Reconcile job done. {}", outcome.stats);
        }
        "rank" => {
            let stats = rank::refresh_ranks(&pool).await?;
            info!("Rank refresh done. {stats}");
        }
        "free-votes" => {
            let month = month_key(chrono::Utc::now());
            let stats = free_votes::top_up_month(&pool, &month).await?;
            info!(month = month.as_str(), "Free vote top-up done. {stats}");
        }
        other => anyhow::bail!("Unknown job '{other}' (expected reconcile, rank, or free-votes)"),
    }

    Ok(())
}

/// Inbox sink always; admin webhook only when configured.
fn build_notifier(pool: &PgPool, config: &Config) -> Arc<dyn NotifySink> {
    let mut sinks: Vec<Box<dyn NotifySink>> = vec![Box::new(InboxStore::new(pool.clone()))];
    match &config.admin_webhook_url {
        Some(url) => {
            info!("Admin webhook notifications enabled");
            sinks.push(Box::new(AdminWebhook::new(url.clone())));
        }
        None => info!("No ADMIN_WEBHOOK_URL set, admin webhook disabled"),
    }
    Arc::new(NotifyRouter::new(sinks))
}
