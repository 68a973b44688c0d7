//! Database row types. These map directly to SQLite rows and are converted
//! to the shared models only after their timestamps parse.

use tracing::warn;

use walletchat_inbox::InboxError;
use walletchat_inbox::timestamp::parse_timestamp;
use walletchat_types::models::{ChatMessage, ContentType, GroupChatMessage};

pub struct ChatRow {
    pub id: i64,
    pub from_addr: String,
    pub to_addr: String,
    pub nft_addr: Option<String>,
    pub nft_id: Option<String>,
    pub message: String,
    pub timestamp: String,
    pub sent_at: String,
    pub msg_read: bool,
}

impl ChatRow {
    pub fn into_message(self) -> Result<ChatMessage, InboxError> {
        Ok(ChatMessage {
            sent_at: parse_timestamp(&self.sent_at)?,
            id: self.id,
            from_addr: self.from_addr,
            to_addr: self.to_addr,
            nft_addr: self.nft_addr,
            nft_id: self.nft_id,
            message: self.message,
            timestamp: self.timestamp,
            read: self.msg_read,
        })
    }
}

pub struct GroupRow {
    pub id: i64,
    pub community: String,
    pub from_addr: String,
    pub message: String,
    pub timestamp: String,
    pub sent_at: String,
    pub content_type: String,
}

impl GroupRow {
    pub fn into_message(self) -> Result<GroupChatMessage, InboxError> {
        Ok(GroupChatMessage {
            sent_at: parse_timestamp(&self.sent_at)?,
            content_type: ContentType::from_stored(&self.content_type),
            id: self.id,
            community: self.community,
            from_addr: self.from_addr,
            message: self.message,
            timestamp: self.timestamp,
        })
    }
}

/// Converts rows, dropping (and logging) any whose timestamp is unreadable so
/// one bad record cannot take down a whole listing.
pub fn skip_malformed<R, T>(
    table: &str,
    rows: Vec<R>,
    id_of: impl Fn(&R) -> i64,
    convert: impl Fn(R) -> Result<T, InboxError>,
) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| {
            let id = id_of(&row);
            match convert(row) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Skipping {} row {}: {}", table, id, e);
                    None
                }
            }
        })
        .collect()
}
