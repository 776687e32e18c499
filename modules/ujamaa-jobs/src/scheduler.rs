//! The background job loop.
//!
//! One reconciliation pass per interval, a rank refresh once per day, and a
//! free-vote top-up when the calendar month rolls over. Assumes a single
//! process owns the loop; the per-member row locks keep a second instance
//! correct, just wasteful.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::Mutex;
use tracing::{error, info};

use ujamaa_common::Config;
use ujamaa_ledger::month_key;
use ujamaa_notify::NotifySink;
use ujamaa_rewards::Reconciler;

use crate::{free_votes, rank};

/// Start the job loop in a background task. Returns immediately.
///
/// A reconciliation pass still running when the next tick fires is skipped,
/// not queued.
pub fn start_scheduler(pool: PgPool, notifier: Arc<dyn NotifySink>, config: &Config) {
    let interval_secs = config.reconcile_interval_secs.max(1);
    let rank_every = Duration::from_secs(config.rank_refresh_interval_secs.max(interval_secs));
    info!(interval_secs, "Starting ledger job loop");

    let reconcile_lock = Arc::new(Mutex::new(()));
    tokio::spawn(async move {
        let mut last_rank_refresh: Option<Instant> = None;
        let mut last_votes_month: Option<String> = None;

        loop {
            match reconcile_lock.clone().try_lock_owned() {
                Ok(guard) => {
                    let reconciler = Reconciler::new(pool.clone(), notifier.clone());
                    tokio::spawn(async move {
                        let _guard = guard;
                        if let Err(e) = reconciler.run().await {
                            error!(error = %e, "Reconciliation pass failed");
                        }
                    });
                }
                Err(_) => {
                    info!("Reconciliation still running, skipping this tick");
                }
            }

            if rank_refresh_due(last_rank_refresh, rank_every) {
                match rank::refresh_ranks(&pool).await {
                    Ok(stats) => {
                        info!("Rank refresh complete. {stats}");
                        last_rank_refresh = Some(Instant::now());
                    }
                    Err(e) => error!(error = %e, "Rank refresh failed"),
                }
            }

            let month = month_key(Utc::now());
            if free_votes_due(last_votes_month.as_deref(), &month) {
                match free_votes::top_up_month(&pool, &month).await {
                    Ok(stats) => {
                        info!(month = month.as_str(), "Free vote top-up complete. {stats}");
                        last_votes_month = Some(month);
                    }
                    Err(e) => {
                        error!(month = month.as_str(), error = %e, "Free vote top-up failed")
                    }
                }
            }

            tokio::time::sleep(Duration::from_secs(interval_secs)).await;
        }
    });
}

fn rank_refresh_due(last: Option<Instant>, every: Duration) -> bool {
    match last {
        Some(at) => at.elapsed() >= every,
        None => true,
    }
}

fn free_votes_due(last_month: Option<&str>, current_month: &str) -> bool {
    last_month != Some(current_month)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_runs_both_periodic_jobs() {
        assert!(rank_refresh_due(None, Duration::from_secs(86_400)));
        assert!(free_votes_due(None, "2025-06"));
    }

    #[test]
    fn rank_refresh_waits_out_its_interval() {
        let just_ran = Some(Instant::now());
        assert!(!rank_refresh_due(just_ran, Duration::from_secs(86_400)));
        assert!(rank_refresh_due(just_ran, Duration::ZERO));
    }

    #[test]
    fn free_votes_fire_only_on_month_rollover() {
        assert!(!free_votes_due(Some("2025-06"), "2025-06"));
        assert!(free_votes_due(Some("2025-06"), "2025-07"));
    }

    #[tokio::test]
    async fn held_lock_skips_instead_of_waiting() {
        let lock = Arc::new(Mutex::new(()));
        let held = lock.clone().try_lock_owned().unwrap();
        assert!(lock.clone().try_lock_owned().is_err());
        drop(held);
        assert!(lock.clone().try_lock_owned().is_ok());
    }
}
