use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::warn;

use walletchat_types::models::{
    Bookmark, ChatMessage, GroupChatMessage, NewDirectMessage, NewGroupMessage, ReadWatermark,
    UnreadSettings,
};

/// Persistence collaborator for the inbox core.
///
/// Implementations serialize individual statements but only the methods that
/// say so are atomic across statements. Rows whose stored timestamp fails to
/// parse are skipped by every read.
pub trait ChatStore: Send + Sync {
    // -- Direct messages --

    /// Every message where `address` is sender or recipient, ascending by id.
    fn find_direct_messages(&self, address: &str) -> Result<Vec<ChatMessage>>;

    /// Messages `from -> to` that are still unread.
    fn find_unread_direct_messages(&self, from: &str, to: &str) -> Result<Vec<ChatMessage>>;

    /// Every direct message scoped to one NFT, whoever sent it, ascending by id.
    fn find_nft_messages(&self, nft_addr: &str, nft_id: &str) -> Result<Vec<ChatMessage>>;

    fn create_direct_message(&self, msg: &NewDirectMessage) -> Result<ChatMessage>;

    /// Sets the read flag on messages `from -> to` carrying the given client
    /// timestamp. Returns the number of rows touched.
    fn mark_direct_read(&self, from: &str, to: &str, timestamp: &str, read: bool) -> Result<usize>;

    /// Deletes every message `from -> to`. Returns the number of rows removed.
    fn delete_direct_messages(&self, from: &str, to: &str) -> Result<usize>;

    // -- Bookmarks --

    fn find_bookmarks(&self, wallet: &str) -> Result<Vec<Bookmark>>;

    fn is_bookmarked(&self, wallet: &str, community: &str) -> Result<bool>;

    /// Returns `false` when the pair was already bookmarked.
    fn create_bookmark(&self, wallet: &str, community: &str) -> Result<bool>;

    /// Returns `false` when there was nothing to delete.
    fn delete_bookmark(&self, wallet: &str, community: &str) -> Result<bool>;

    fn count_members(&self, community: &str) -> Result<usize>;

    // -- Community messages --

    /// The most recently inserted message of a community.
    fn find_latest_group_message(&self, community: &str) -> Result<Option<GroupChatMessage>>;

    /// Messages with `sent_at > since` (all of them for `None`), ascending by id.
    fn find_group_messages_since(
        &self,
        community: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<GroupChatMessage>>;

    fn create_group_message(&self, msg: &NewGroupMessage) -> Result<GroupChatMessage>;

    /// Atomically bookmarks `welcome.community` for `wallet`, stores the
    /// welcome message and a watermark at `welcome.sent_at`. Does nothing and
    /// returns `false` if the bookmark already exists.
    fn enroll_member(&self, wallet: &str, welcome: &NewGroupMessage) -> Result<bool>;

    // -- Read watermarks --

    fn find_watermark(&self, wallet: &str, community: &str) -> Result<Option<ReadWatermark>>;

    /// Creates the watermark row unless one exists. Exactly one of several
    /// concurrent callers sees `true`.
    fn insert_watermark_if_absent(
        &self,
        wallet: &str,
        community: &str,
        at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Creates or advances the watermark. Never moves an existing row backwards.
    fn upsert_watermark(&self, wallet: &str, community: &str, at: DateTime<Utc>) -> Result<()>;

    // -- Names and logos --

    fn find_display_name(&self, address: &str) -> Result<Option<String>>;

    fn set_display_name(&self, address: &str, name: &str) -> Result<()>;

    /// Base64 image data registered under `name`.
    fn find_logo(&self, name: &str) -> Result<Option<String>>;

    // -- Unread settings --

    fn find_unread_settings(&self, wallet: &str) -> Result<Option<UnreadSettings>>;

    fn save_unread_settings(&self, wallet: &str, settings: UnreadSettings) -> Result<()>;
}

/// Name lookup that never fails the caller.
pub fn display_name_or_empty<S: ChatStore + ?Sized>(store: &S, address: &str) -> String {
    match store.find_display_name(address) {
        Ok(name) => name.unwrap_or_default(),
        Err(e) => {
            warn!("Display name lookup for '{}' failed: {}", address, e);
            String::new()
        }
    }
}

/// Logo for a community: registered under its display name, or under the
/// community address itself. Never fails the caller.
pub fn community_logo_or_empty<S: ChatStore + ?Sized>(
    store: &S,
    community: &str,
    display_name: &str,
) -> String {
    let keys = [display_name, community];
    for key in keys.into_iter().filter(|k| !k.is_empty()) {
        match store.find_logo(key) {
            Ok(Some(logo)) => return logo,
            Ok(None) => {}
            Err(e) => {
                warn!("Logo lookup for '{}' failed: {}", key, e);
                return String::new();
            }
        }
    }
    String::new()
}
