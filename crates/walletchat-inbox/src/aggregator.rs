use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use walletchat_types::api::{InboxEntry, LastMessage};
use walletchat_types::models::{
    ChatMessage, ContentType, ContextType, GroupChatMessage, UnreadSettings,
};

use crate::error::Result;
use crate::store::{ChatStore, community_logo_or_empty, display_name_or_empty};
use crate::watermark::WatermarkTracker;

/// Builds a wallet's inbox: one entry per direct-message counterpart and one
/// per bookmarked community, newest activity first.
pub struct ConversationAggregator<'a, S: ChatStore + ?Sized> {
    store: &'a S,
}

/// Running state for one direct conversation while scanning messages.
struct DirectThread<'m> {
    latest: &'m ChatMessage,
    unread: usize,
}

impl<'a, S: ChatStore + ?Sized> ConversationAggregator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Inbox for `owner` as of `now`. Read-only: community watermarks are
    /// consulted, never advanced.
    pub fn inbox(&self, owner: &str, now: DateTime<Utc>) -> Result<Vec<InboxEntry>> {
        let mut entries = self.direct_entries(owner)?;
        entries.extend(self.community_entries(owner, now)?);
        sort_inbox(&mut entries);

        debug!("Inbox for '{}': {} conversations", owner, entries.len());
        Ok(entries)
    }

    fn direct_entries(&self, owner: &str) -> Result<Vec<InboxEntry>> {
        let mut messages = self.store.find_direct_messages(owner)?;
        messages.sort_by_key(|m| m.id);

        // Counterparts in order of first appearance, so equal timestamps
        // resolve the same way on every request.
        let mut order: Vec<&str> = Vec::new();
        let mut threads: HashMap<&str, DirectThread<'_>> = HashMap::new();

        for msg in &messages {
            let Some(counterpart) = msg.counterpart_of(owner) else {
                continue;
            };
            let unread = usize::from(msg.from_addr == counterpart && !msg.read);

            match threads.get_mut(counterpart) {
                Some(thread) => {
                    thread.unread += unread;
                    if (msg.sent_at, msg.id) > (thread.latest.sent_at, thread.latest.id) {
                        thread.latest = msg;
                    }
                }
                None => {
                    order.push(counterpart);
                    threads.insert(counterpart, DirectThread { latest: msg, unread });
                }
            }
        }

        let entries = order
            .into_iter()
            .filter_map(|counterpart| {
                let thread = threads.remove(counterpart)?;
                Some(InboxEntry {
                    conversation_key: counterpart.to_string(),
                    context_type: ContextType::DirectMessage,
                    last_message: Some(direct_summary(thread.latest)),
                    last_message_at: Some(thread.latest.sent_at),
                    unread_count: thread.unread,
                    display_name: display_name_or_empty(self.store, counterpart),
                    logo: String::new(),
                })
            })
            .collect();

        Ok(entries)
    }

    fn community_entries(&self, owner: &str, now: DateTime<Utc>) -> Result<Vec<InboxEntry>> {
        let tracker = WatermarkTracker::new(self.store);
        let bookmarks = self.store.find_bookmarks(owner)?;
        let mut entries = Vec::with_capacity(bookmarks.len());

        for bookmark in bookmarks {
            let community = bookmark.community;
            let context_type = ContextType::for_community(&community);

            let Some(latest) = self.store.find_latest_group_message(&community)? else {
                entries.push(InboxEntry {
                    conversation_key: community,
                    context_type,
                    last_message: None,
                    last_message_at: None,
                    unread_count: 0,
                    display_name: String::new(),
                    logo: String::new(),
                });
                continue;
            };

            let unread_count = tracker.peek_unread(owner, &community, now)?;
            let display_name = display_name_or_empty(self.store, &community);
            let logo = community_logo_or_empty(self.store, &community, &display_name);

            entries.push(InboxEntry {
                last_message: Some(group_summary(&latest)),
                last_message_at: Some(latest.sent_at),
                conversation_key: community,
                context_type,
                unread_count,
                display_name,
                logo,
            });
        }

        Ok(entries)
    }

    /// Total unread badge for `owner`, restricted to the kinds enabled in
    /// `settings`. Community counts do not advance watermarks.
    pub fn total_unread(
        &self,
        owner: &str,
        settings: UnreadSettings,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let mut total = 0;

        if settings.nft || settings.community {
            let tracker = WatermarkTracker::new(self.store);
            for bookmark in self.store.find_bookmarks(owner)? {
                let wanted = match ContextType::for_community(&bookmark.community) {
                    ContextType::NftThread => settings.nft,
                    _ => settings.community,
                };
                if wanted {
                    total += tracker.peek_unread(owner, &bookmark.community, now)?;
                }
            }
        }

        if settings.dm {
            total += self
                .store
                .find_direct_messages(owner)?
                .iter()
                .filter(|m| m.to_addr == owner && m.from_addr != owner && !m.read)
                .count();
        }

        Ok(total)
    }

    /// [`Self::total_unread`] using the wallet's saved settings, all kinds
    /// when none were saved.
    pub fn total_unread_for_wallet(&self, owner: &str, now: DateTime<Utc>) -> Result<usize> {
        let settings = self.store.find_unread_settings(owner)?.unwrap_or_default();
        self.total_unread(owner, settings, now)
    }
}

/// Newest first; entries without activity last. The sort is stable, so ties
/// keep the order entries were produced in.
pub fn sort_inbox(entries: &mut [InboxEntry]) {
    entries.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
}

fn direct_summary(msg: &ChatMessage) -> LastMessage {
    LastMessage {
        id: msg.id,
        from_addr: msg.from_addr.clone(),
        to_addr: msg.to_addr.clone(),
        nft_addr: msg.nft_addr.clone(),
        nft_id: msg.nft_id.clone(),
        message: msg.message.clone(),
        timestamp: msg.timestamp.clone(),
        content_type: ContentType::Message,
        read: msg.read,
    }
}

fn group_summary(msg: &GroupChatMessage) -> LastMessage {
    LastMessage {
        id: msg.id,
        from_addr: msg.from_addr.clone(),
        to_addr: String::new(),
        nft_addr: None,
        nft_id: None,
        message: msg.message.clone(),
        timestamp: msg.timestamp.clone(),
        content_type: msg.content_type,
        read: false,
    }
}
