use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, anyhow};
use chrono::{DateTime, TimeZone, Utc};

use walletchat_types::models::{
    Bookmark, ChatMessage, ContentType, GroupChatMessage, NewDirectMessage, NewGroupMessage,
    ReadWatermark, UnreadSettings,
};

use crate::store::ChatStore;

/// Seconds after a fixed epoch, so tests read as "T=10" rather than dates.
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::seconds(secs)
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    direct: Vec<ChatMessage>,
    group: Vec<GroupChatMessage>,
    bookmarks: Vec<Bookmark>,
    watermarks: HashMap<(String, String), DateTime<Utc>>,
    names: HashMap<String, String>,
    logos: HashMap<String, String>,
    settings: HashMap<String, UnreadSettings>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// `ChatStore` over plain vectors. Flip `fail_reads`/`fail_lookups` to
/// simulate an unreachable backing store.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    pub fail_reads: AtomicBool,
    pub fail_lookups: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dm(&self, from: &str, to: &str, sent: i64, read: bool) -> i64 {
        let msg = self
            .create_direct_message(&NewDirectMessage {
                from_addr: from.into(),
                to_addr: to.into(),
                nft_addr: None,
                nft_id: None,
                message: format!("{from} -> {to} @ {sent}"),
                timestamp: sent.to_string(),
                sent_at: at(sent),
            })
            .unwrap();
        if read {
            self.mark_direct_read(from, to, &msg.timestamp, true).unwrap();
        }
        msg.id
    }

    pub fn nft_dm(&self, from: &str, to: &str, sent: i64, nft: (&str, &str)) -> i64 {
        self.create_direct_message(&NewDirectMessage {
            from_addr: from.into(),
            to_addr: to.into(),
            nft_addr: Some(nft.0.into()),
            nft_id: Some(nft.1.into()),
            message: format!("{from} -> {to} about {}#{}", nft.0, nft.1),
            timestamp: sent.to_string(),
            sent_at: at(sent),
        })
        .unwrap()
        .id
    }

    pub fn post(&self, community: &str, from: &str, sent: i64) -> i64 {
        self.create_group_message(&NewGroupMessage {
            community: community.into(),
            from_addr: from.into(),
            message: format!("{from} in {community} @ {sent}"),
            timestamp: sent.to_string(),
            sent_at: at(sent),
            content_type: ContentType::Message,
        })
        .unwrap()
        .id
    }

    pub fn set_logo(&self, name: &str, data: &str) {
        self.tables.lock().unwrap().logos.insert(name.into(), data.into());
    }

    pub fn group_messages(&self, community: &str) -> Vec<GroupChatMessage> {
        self.find_group_messages_since(community, None).unwrap()
    }

    fn tables(&self) -> Result<std::sync::MutexGuard<'_, Tables>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("store offline"));
        }
        self.tables.lock().map_err(|e| anyhow!("lock poisoned: {}", e))
    }
}

impl ChatStore for MemoryStore {
    fn find_direct_messages(&self, address: &str) -> Result<Vec<ChatMessage>> {
        Ok(self
            .tables()?
            .direct
            .iter()
            .filter(|m| m.from_addr == address || m.to_addr == address)
            .cloned()
            .collect())
    }

    fn find_unread_direct_messages(&self, from: &str, to: &str) -> Result<Vec<ChatMessage>> {
        Ok(self
            .tables()?
            .direct
            .iter()
            .filter(|m| m.from_addr == from && m.to_addr == to && !m.read)
            .cloned()
            .collect())
    }

    fn find_nft_messages(&self, nft_addr: &str, nft_id: &str) -> Result<Vec<ChatMessage>> {
        Ok(self
            .tables()?
            .direct
            .iter()
            .filter(|m| m.is_about_nft(nft_addr, nft_id))
            .cloned()
            .collect())
    }

    fn create_direct_message(&self, msg: &NewDirectMessage) -> Result<ChatMessage> {
        let mut t = self.tables()?;
        let stored = ChatMessage {
            id: t.next_id(),
            from_addr: msg.from_addr.clone(),
            to_addr: msg.to_addr.clone(),
            nft_addr: msg.nft_addr.clone(),
            nft_id: msg.nft_id.clone(),
            message: msg.message.clone(),
            timestamp: msg.timestamp.clone(),
            sent_at: msg.sent_at,
            read: false,
        };
        t.direct.push(stored.clone());
        Ok(stored)
    }

    fn mark_direct_read(&self, from: &str, to: &str, timestamp: &str, read: bool) -> Result<usize> {
        let mut t = self.tables()?;
        let mut touched = 0;
        for m in t
            .direct
            .iter_mut()
            .filter(|m| m.from_addr == from && m.to_addr == to && m.timestamp == timestamp)
        {
            m.read = read;
            touched += 1;
        }
        Ok(touched)
    }

    fn delete_direct_messages(&self, from: &str, to: &str) -> Result<usize> {
        let mut t = self.tables()?;
        let before = t.direct.len();
        t.direct.retain(|m| !(m.from_addr == from && m.to_addr == to));
        Ok(before - t.direct.len())
    }

    fn find_bookmarks(&self, wallet: &str) -> Result<Vec<Bookmark>> {
        Ok(self
            .tables()?
            .bookmarks
            .iter()
            .filter(|b| b.wallet == wallet)
            .cloned()
            .collect())
    }

    fn is_bookmarked(&self, wallet: &str, community: &str) -> Result<bool> {
        Ok(self
            .tables()?
            .bookmarks
            .iter()
            .any(|b| b.wallet == wallet && b.community == community))
    }

    fn create_bookmark(&self, wallet: &str, community: &str) -> Result<bool> {
        let mut t = self.tables()?;
        if t.bookmarks.iter().any(|b| b.wallet == wallet && b.community == community) {
            return Ok(false);
        }
        let id = t.next_id();
        t.bookmarks.push(Bookmark {
            id,
            wallet: wallet.into(),
            community: community.into(),
        });
        Ok(true)
    }

    fn delete_bookmark(&self, wallet: &str, community: &str) -> Result<bool> {
        let mut t = self.tables()?;
        let before = t.bookmarks.len();
        t.bookmarks.retain(|b| !(b.wallet == wallet && b.community == community));
        Ok(t.bookmarks.len() < before)
    }

    fn count_members(&self, community: &str) -> Result<usize> {
        Ok(self
            .tables()?
            .bookmarks
            .iter()
            .filter(|b| b.community == community)
            .count())
    }

    fn find_latest_group_message(&self, community: &str) -> Result<Option<GroupChatMessage>> {
        Ok(self
            .tables()?
            .group
            .iter()
            .filter(|m| m.community == community)
            .max_by_key(|m| m.id)
            .cloned())
    }

    fn find_group_messages_since(
        &self,
        community: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<GroupChatMessage>> {
        Ok(self
            .tables()?
            .group
            .iter()
            .filter(|m| m.community == community)
            .filter(|m| since.is_none_or(|s| m.sent_at > s))
            .cloned()
            .collect())
    }

    fn create_group_message(&self, msg: &NewGroupMessage) -> Result<GroupChatMessage> {
        let mut t = self.tables()?;
        let stored = GroupChatMessage {
            id: t.next_id(),
            community: msg.community.clone(),
            from_addr: msg.from_addr.clone(),
            message: msg.message.clone(),
            timestamp: msg.timestamp.clone(),
            sent_at: msg.sent_at,
            content_type: msg.content_type,
        };
        t.group.push(stored.clone());
        Ok(stored)
    }

    fn enroll_member(&self, wallet: &str, welcome: &NewGroupMessage) -> Result<bool> {
        let mut t = self.tables()?;
        if t.bookmarks.iter().any(|b| b.wallet == wallet && b.community == welcome.community) {
            return Ok(false);
        }
        let bookmark_id = t.next_id();
        t.bookmarks.push(Bookmark {
            id: bookmark_id,
            wallet: wallet.into(),
            community: welcome.community.clone(),
        });
        let message_id = t.next_id();
        t.group.push(GroupChatMessage {
            id: message_id,
            community: welcome.community.clone(),
            from_addr: welcome.from_addr.clone(),
            message: welcome.message.clone(),
            timestamp: welcome.timestamp.clone(),
            sent_at: welcome.sent_at,
            content_type: welcome.content_type,
        });
        t.watermarks
            .entry((wallet.into(), welcome.community.clone()))
            .or_insert(welcome.sent_at);
        Ok(true)
    }

    fn find_watermark(&self, wallet: &str, community: &str) -> Result<Option<ReadWatermark>> {
        Ok(self
            .tables()?
            .watermarks
            .get(&(wallet.to_string(), community.to_string()))
            .map(|&last_read_at| ReadWatermark {
                wallet: wallet.into(),
                community: community.into(),
                last_read_at,
            }))
    }

    fn insert_watermark_if_absent(
        &self,
        wallet: &str,
        community: &str,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut t = self.tables()?;
        let key = (wallet.to_string(), community.to_string());
        if t.watermarks.contains_key(&key) {
            return Ok(false);
        }
        t.watermarks.insert(key, at);
        Ok(true)
    }

    fn upsert_watermark(&self, wallet: &str, community: &str, at: DateTime<Utc>) -> Result<()> {
        let mut t = self.tables()?;
        let entry = t
            .watermarks
            .entry((wallet.to_string(), community.to_string()))
            .or_insert(at);
        if at > *entry {
            *entry = at;
        }
        Ok(())
    }

    fn find_display_name(&self, address: &str) -> Result<Option<String>> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(anyhow!("name service offline"));
        }
        Ok(self.tables()?.names.get(address).cloned())
    }

    fn set_display_name(&self, address: &str, name: &str) -> Result<()> {
        self.tables()?.names.insert(address.into(), name.into());
        Ok(())
    }

    fn find_logo(&self, name: &str) -> Result<Option<String>> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(anyhow!("image service offline"));
        }
        Ok(self.tables()?.logos.get(name).cloned())
    }

    fn find_unread_settings(&self, wallet: &str) -> Result<Option<UnreadSettings>> {
        Ok(self.tables()?.settings.get(wallet).copied())
    }

    fn save_unread_settings(&self, wallet: &str, settings: UnreadSettings) -> Result<()> {
        self.tables()?.settings.insert(wallet.into(), settings);
        Ok(())
    }
}
