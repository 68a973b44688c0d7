use chrono::{DateTime, SecondsFormat, Utc};
use tracing::info;

use walletchat_types::api::{CommunityLanding, JoinedCommunity};
use walletchat_types::models::{ContentType, GroupChatMessage, NewGroupMessage};

use crate::error::{InboxError, Result};
use crate::store::{ChatStore, community_logo_or_empty, display_name_or_empty};
use crate::watermark::WatermarkTracker;

/// The community every wallet is enrolled into on first contact.
#[derive(Debug, Clone)]
pub struct DefaultCommunity {
    pub address: String,
    pub name: String,
}

pub struct CommunityResolver<'a, S: ChatStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ChatStore + ?Sized> CommunityResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Every community `wallet` has joined, with its latest message and the
    /// wallet's unread count. Watermarks are not advanced.
    pub fn joined_communities(
        &self,
        wallet: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<JoinedCommunity>> {
        let tracker = WatermarkTracker::new(self.store);
        let mut joined = Vec::new();

        for bookmark in self.store.find_bookmarks(wallet)? {
            let summary = match self.store.find_latest_group_message(&bookmark.community)? {
                Some(latest) => JoinedCommunity {
                    id: bookmark.id,
                    unread_count: tracker.peek_unread(wallet, &bookmark.community, now)?,
                    wallet: bookmark.wallet,
                    community: bookmark.community,
                    last_message: latest.message,
                    last_timestamp: latest.timestamp,
                    last_message_at: Some(latest.sent_at),
                },
                None => JoinedCommunity {
                    id: bookmark.id,
                    wallet: bookmark.wallet,
                    community: bookmark.community,
                    last_message: String::new(),
                    last_timestamp: String::new(),
                    last_message_at: None,
                    unread_count: 0,
                },
            };
            joined.push(summary);
        }

        Ok(joined)
    }

    /// Enrolls `wallet` into `community` with a welcome message. Returns
    /// `false` if the wallet was already a member, in which case nothing is
    /// written.
    pub fn enter_community(
        &self,
        wallet: &str,
        community: &str,
        community_name: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let welcome = NewGroupMessage {
            community: community.to_string(),
            from_addr: wallet.to_string(),
            message: format!("Welcome {} to {}!", wallet, community_name),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            sent_at: now,
            content_type: ContentType::Welcome,
        };

        let joined_now = self.store.enroll_member(wallet, &welcome)?;
        if joined_now {
            info!("Enrolled '{}' into '{}'", wallet, community);
        }
        Ok(joined_now)
    }

    /// Landing view of a community for `wallet`. Reading it marks the
    /// community read; the default community also auto-enrolls the wallet.
    pub fn community_landing(
        &self,
        wallet: &str,
        community: &str,
        default: &DefaultCommunity,
        now: DateTime<Utc>,
    ) -> Result<CommunityLanding> {
        let is_default = community == default.address;

        let joined = if is_default {
            self.enter_community(wallet, community, &default.name, now)?;
            true
        } else {
            self.store.is_bookmarked(wallet, community)?
        };

        let messages = WatermarkTracker::new(self.store).fetch_history(wallet, community, now)?;
        let has_messaged = messages
            .iter()
            .any(|m| m.from_addr == wallet && m.content_type == ContentType::Message);

        let name = if is_default {
            default.name.clone()
        } else {
            display_name_or_empty(self.store, community)
        };
        let logo = community_logo_or_empty(self.store, community, &name);

        Ok(CommunityLanding {
            members: self.store.count_members(community)?,
            name,
            logo,
            verified: is_default,
            joined,
            has_messaged,
            messages,
        })
    }

    /// Posts a member message. Anything not explicitly a welcome is stored as
    /// a plain message.
    pub fn post_message(
        &self,
        community: &str,
        from: &str,
        message: &str,
        timestamp: &str,
        content_type: Option<ContentType>,
        now: DateTime<Utc>,
    ) -> Result<GroupChatMessage> {
        if community.trim().is_empty() || from.trim().is_empty() {
            return Err(InboxError::InvalidInput("community and sender are required".into()));
        }
        if message.is_empty() {
            return Err(InboxError::InvalidInput("message is empty".into()));
        }

        let stored = self.store.create_group_message(&NewGroupMessage {
            community: community.to_string(),
            from_addr: from.to_string(),
            message: message.to_string(),
            timestamp: timestamp.to_string(),
            sent_at: now,
            content_type: content_type.unwrap_or_default(),
        })?;
        Ok(stored)
    }

    pub fn bookmark(&self, wallet: &str, community: &str) -> Result<bool> {
        if wallet.trim().is_empty() || community.trim().is_empty() {
            return Err(InboxError::InvalidInput("wallet and community are required".into()));
        }
        Ok(self.store.create_bookmark(wallet, community)?)
    }

    pub fn unbookmark(&self, wallet: &str, community: &str) -> Result<bool> {
        Ok(self.store.delete_bookmark(wallet, community)?)
    }

    pub fn is_bookmarked(&self, wallet: &str, community: &str) -> Result<bool> {
        Ok(self.store.is_bookmarked(wallet, community)?)
    }
}
