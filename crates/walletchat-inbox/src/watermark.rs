use chrono::{DateTime, Utc};
use tracing::debug;

use walletchat_types::models::GroupChatMessage;

use crate::error::Result;
use crate::store::ChatStore;

/// Per-(wallet, community) "last read" bookkeeping.
///
/// Fetching a community's history is what marks it read: the watermark moves
/// to the instant of the fetch. Every operation takes that instant from the
/// caller and uses it for both the watermark write and the count, so a
/// message landing between the two statements is counted on the next read
/// instead of being lost.
pub struct WatermarkTracker<'a, S: ChatStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ChatStore + ?Sized> WatermarkTracker<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Marks the community read at `now` and returns the previous watermark.
    ///
    /// `None` means the pair had never been read, so the whole history counts
    /// as unread for this call. When two requests race on a fresh pair only
    /// one insert wins; the other falls through to re-read and advance.
    pub fn get_or_init_watermark(
        &self,
        wallet: &str,
        community: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>> {
        if self.store.insert_watermark_if_absent(wallet, community, now)? {
            debug!("First read of '{}' by '{}'", community, wallet);
            return Ok(None);
        }

        let previous = self
            .store
            .find_watermark(wallet, community)?
            .map(|w| w.last_read_at);
        self.store.upsert_watermark(wallet, community, now)?;
        Ok(previous)
    }

    /// Messages in `community` with `since < sent_at <= until`; with no
    /// `since`, everything up to `until`.
    pub fn count_unread_since(
        &self,
        community: &str,
        since: Option<DateTime<Utc>>,
        until: DateTime<Utc>,
    ) -> Result<usize> {
        let messages = self.store.find_group_messages_since(community, since)?;
        Ok(messages.iter().filter(|m| m.sent_at <= until).count())
    }

    /// Like [`Self::count_unread_since`], minus the wallet's own posts.
    fn count_unread_for(
        &self,
        wallet: &str,
        community: &str,
        since: Option<DateTime<Utc>>,
        until: DateTime<Utc>,
    ) -> Result<usize> {
        let messages = self.store.find_group_messages_since(community, since)?;
        Ok(messages
            .iter()
            .filter(|m| m.sent_at <= until && m.from_addr != wallet)
            .count())
    }

    /// Unread count that also marks the community read.
    pub fn unread_for_community(
        &self,
        wallet: &str,
        community: &str,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let previous = self.get_or_init_watermark(wallet, community, now)?;
        self.count_unread_for(wallet, community, previous, now)
    }

    /// Unread count without touching the watermark.
    pub fn peek_unread(&self, wallet: &str, community: &str, now: DateTime<Utc>) -> Result<usize> {
        let since = self
            .store
            .find_watermark(wallet, community)?
            .map(|w| w.last_read_at);
        self.count_unread_for(wallet, community, since, now)
    }

    /// The full community history, marking it read at `now`.
    pub fn fetch_history(
        &self,
        wallet: &str,
        community: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<GroupChatMessage>> {
        self.get_or_init_watermark(wallet, community, now)?;
        Ok(self.store.find_group_messages_since(community, None)?)
    }
}
