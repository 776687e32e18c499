//! Best-effort notification fan-out.
//!
//! Everything here is advisory: a failed or dropped notification never fails
//! the operation that triggered it. Sinks log and swallow their own errors;
//! the router makes sure one broken sink can't starve the others.

pub mod inbox;
pub mod noop;
pub mod registry;
pub mod router;
pub mod sink;
pub mod types;
pub mod webhook;

pub use inbox::InboxStore;
pub use noop::NoopSink;
pub use registry::SessionRegistry;
pub use router::NotifyRouter;
pub use sink::NotifySink;
pub use types::{Notification, StoredNotification};
pub use webhook::AdminWebhook;
