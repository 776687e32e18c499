//! Member ledgers and balances.
//!
//! Three append-only transaction tables (STAR, BD, XP) plus the members table
//! they hang off. A balance is always `SUM(delta)` over a member's rows;
//! transaction rows are never updated or deleted. The only mutable columns in
//! this crate are the cached `star_total` / `star_rank` on members, refreshed
//! by the rank job.

pub mod members;
pub mod store;
pub mod types;
pub mod votes;

pub use members::MemberStore;
pub use store::LedgerStore;
pub use types::{Balances, FeedEntry, LedgerEntry, Member, MemberIdentity};
pub use votes::{month_key, PayWith, VoteReceipt, VoteStore, STAR_COST_PER_VOTE};
