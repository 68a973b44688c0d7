use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ContentType, ContextType, GroupChatMessage, UnreadSettings};

// -- Inbox --

/// One row of a wallet's inbox: the latest activity in a direct conversation,
/// an NFT thread or a community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxEntry {
    /// Counterpart address for direct messages, community address otherwise.
    pub conversation_key: String,
    pub context_type: ContextType,
    pub last_message: Option<LastMessage>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: usize,
    pub display_name: String,
    pub logo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMessage {
    pub id: i64,
    pub from_addr: String,
    /// Empty for community messages.
    pub to_addr: String,
    pub nft_addr: Option<String>,
    pub nft_id: Option<String>,
    pub message: String,
    pub timestamp: String,
    pub content_type: ContentType,
    pub read: bool,
}

// -- Direct messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendChatMessageRequest {
    pub from_addr: String,
    pub to_addr: String,
    #[serde(default)]
    pub nft_addr: Option<String>,
    #[serde(default)]
    pub nft_id: Option<String>,
    pub message: String,
    /// Client wall-clock string; the server instant is stamped separately.
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkReadRequest {
    pub timestamp: String,
    pub read: bool,
}

/// One NFT thread in a wallet's sidebar: a sender talking about a specific
/// token, and how many of those messages are still unread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftSidebarEntry {
    pub from_addr: String,
    pub nft_addr: String,
    pub nft_id: String,
    pub unread: usize,
}

// -- Community messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateGroupMessageRequest {
    pub community: String,
    pub from_addr: String,
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub content_type: Option<ContentType>,
}

#[derive(Debug, Serialize)]
pub struct CommunityLanding {
    pub name: String,
    pub members: usize,
    pub logo: String,
    pub verified: bool,
    pub joined: bool,
    pub has_messaged: bool,
    pub messages: Vec<GroupChatMessage>,
}

// -- Bookmarks --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookmarkRequest {
    pub wallet: String,
    pub community: String,
}

/// A joined community with its most recent message, as listed under a
/// wallet's bookmarks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinedCommunity {
    pub id: i64,
    pub wallet: String,
    pub community: String,
    pub last_message: String,
    pub last_timestamp: String,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: usize,
}

// -- Names --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetNameRequest {
    pub address: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct NameResponse {
    pub address: String,
    pub name: String,
}

// -- Unread counters --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnreadSettingsRequest {
    pub dm: bool,
    pub nft: bool,
    pub community: bool,
}

impl From<UnreadSettingsRequest> for UnreadSettings {
    fn from(req: UnreadSettingsRequest) -> Self {
        Self {
            dm: req.dm,
            nft: req.nft,
            community: req.community,
        }
    }
}
