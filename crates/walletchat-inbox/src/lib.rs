//! Inbox aggregation and unread-count reconciliation.
//!
//! Everything here is synchronous and talks to storage only through
//! [`ChatStore`], so the HTTP layer can run it inside `spawn_blocking` and
//! tests can swap in an in-memory store.

pub mod aggregator;
pub mod communities;
pub mod conversation;
pub mod error;
pub mod store;
pub mod timestamp;
pub mod watermark;

#[cfg(test)]
mod test_support;

pub use aggregator::ConversationAggregator;
pub use communities::{CommunityResolver, DefaultCommunity};
pub use error::{InboxError, Result};
pub use store::ChatStore;
pub use watermark::WatermarkTracker;
