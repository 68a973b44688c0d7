use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A 1:1 message between two wallets, optionally scoped to an NFT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub from_addr: String,
    pub to_addr: String,
    pub nft_addr: Option<String>,
    pub nft_id: Option<String>,
    pub message: String,
    /// Wall-clock string as supplied by the sending client.
    pub timestamp: String,
    /// Server-side instant the message was stored.
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}

impl ChatMessage {
    /// The other participant from `owner`'s point of view, or `None` for a
    /// note-to-self or a message that does not involve `owner` at all.
    pub fn counterpart_of(&self, owner: &str) -> Option<&str> {
        if self.from_addr == owner && self.to_addr != owner {
            Some(&self.to_addr)
        } else if self.to_addr == owner && self.from_addr != owner {
            Some(&self.from_addr)
        } else {
            None
        }
    }

    /// Whether this message is scoped to the given NFT.
    pub fn is_about_nft(&self, nft_addr: &str, nft_id: &str) -> bool {
        self.nft_addr.as_deref() == Some(nft_addr) && self.nft_id.as_deref() == Some(nft_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Message,
    Welcome,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Welcome => "welcome",
        }
    }

    /// Legacy rows predate the column and carry arbitrary values; anything
    /// that is not a welcome is a plain message.
    pub fn from_stored(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("welcome") {
            Self::Welcome
        } else {
            Self::Message
        }
    }
}

/// A message posted into a community or NFT-collection thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupChatMessage {
    pub id: i64,
    pub community: String,
    pub from_addr: String,
    pub message: String,
    pub timestamp: String,
    pub sent_at: DateTime<Utc>,
    pub content_type: ContentType,
}

/// Membership of a wallet in a community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: i64,
    pub wallet: String,
    pub community: String,
}

/// "Read up to here" marker for a (wallet, community) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadWatermark {
    pub wallet: String,
    pub community: String,
    pub last_read_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    DirectMessage,
    NftThread,
    Community,
}

impl ContextType {
    /// Collection threads are keyed by a hex contract address, named
    /// communities by a plain slug.
    pub fn for_community(address: &str) -> Self {
        if address.starts_with("0x") {
            Self::NftThread
        } else {
            Self::Community
        }
    }
}

/// Which conversation kinds contribute to a wallet's total unread badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadSettings {
    pub dm: bool,
    pub nft: bool,
    pub community: bool,
}

impl Default for UnreadSettings {
    fn default() -> Self {
        Self {
            dm: true,
            nft: true,
            community: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnreadKind {
    #[serde(alias = "DM")]
    Dm,
    Nft,
    Community,
    All,
}

impl UnreadKind {
    pub fn settings(&self) -> UnreadSettings {
        match self {
            Self::Dm => UnreadSettings { dm: true, nft: false, community: false },
            Self::Nft => UnreadSettings { dm: false, nft: true, community: false },
            Self::Community => UnreadSettings { dm: false, nft: false, community: true },
            Self::All => UnreadSettings::default(),
        }
    }
}

// -- Inserts --

#[derive(Debug, Clone)]
pub struct NewDirectMessage {
    pub from_addr: String,
    pub to_addr: String,
    pub nft_addr: Option<String>,
    pub nft_id: Option<String>,
    pub message: String,
    pub timestamp: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGroupMessage {
    pub community: String,
    pub from_addr: String,
    pub message: String,
    pub timestamp: String,
    pub sent_at: DateTime<Utc>,
    pub content_type: ContentType,
}
