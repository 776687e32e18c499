//! Background jobs: the reconciliation scheduler plus the batch jobs it
//! drives (rank refresh, monthly free votes). Also home of the one-shot
//! `jobs` binary for manual runs.

pub mod free_votes;
pub mod rank;
pub mod scheduler;

pub use free_votes::{top_up_month, FreeVoteStats, FREE_VOTES_PER_MONTH};
pub use rank::{refresh_ranks, RankStats};
pub use scheduler::start_scheduler;
