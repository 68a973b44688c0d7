use chrono::{DateTime, Utc};
use tracing::info;

use walletchat_types::api::NftSidebarEntry;
use walletchat_types::models::{ChatMessage, NewDirectMessage};

use crate::error::{InboxError, Result};
use crate::store::ChatStore;

/// Both directions of the conversation between `a` and `b`, oldest first.
pub fn conversation_between<S: ChatStore + ?Sized>(
    store: &S,
    a: &str,
    b: &str,
) -> Result<Vec<ChatMessage>> {
    let mut messages: Vec<ChatMessage> = store
        .find_direct_messages(a)?
        .into_iter()
        .filter(|m| m.counterpart_of(a) == Some(b))
        .collect();
    oldest_first(&mut messages);
    Ok(messages)
}

/// Unread messages `from -> to`.
pub fn unread_between<S: ChatStore + ?Sized>(store: &S, from: &str, to: &str) -> Result<usize> {
    Ok(store.find_unread_direct_messages(from, to)?.len())
}

fn oldest_first(messages: &mut [ChatMessage]) {
    messages.sort_by(|x, y| x.sent_at.cmp(&y.sent_at).then(x.id.cmp(&y.id)));
}

/// Both directions between `a` and `b` about one NFT, oldest first.
pub fn nft_conversation_between<S: ChatStore + ?Sized>(
    store: &S,
    a: &str,
    b: &str,
    nft_addr: &str,
    nft_id: &str,
) -> Result<Vec<ChatMessage>> {
    let mut messages: Vec<ChatMessage> = store
        .find_nft_messages(nft_addr, nft_id)?
        .into_iter()
        .filter(|m| m.counterpart_of(a) == Some(b))
        .collect();
    oldest_first(&mut messages);
    Ok(messages)
}

/// Everything `address` sent or received about one NFT, oldest first.
pub fn nft_conversations_of<S: ChatStore + ?Sized>(
    store: &S,
    address: &str,
    nft_addr: &str,
    nft_id: &str,
) -> Result<Vec<ChatMessage>> {
    let mut messages: Vec<ChatMessage> = store
        .find_nft_messages(nft_addr, nft_id)?
        .into_iter()
        .filter(|m| m.from_addr == address || m.to_addr == address)
        .collect();
    oldest_first(&mut messages);
    Ok(messages)
}

/// Every message about one NFT, across all wallets, oldest first.
pub fn nft_context<S: ChatStore + ?Sized>(
    store: &S,
    nft_addr: &str,
    nft_id: &str,
) -> Result<Vec<ChatMessage>> {
    let mut messages = store.find_nft_messages(nft_addr, nft_id)?;
    oldest_first(&mut messages);
    Ok(messages)
}

/// Unread messages to `address` about one NFT.
pub fn nft_unread<S: ChatStore + ?Sized>(
    store: &S,
    address: &str,
    nft_addr: &str,
    nft_id: &str,
) -> Result<usize> {
    Ok(store
        .find_nft_messages(nft_addr, nft_id)?
        .iter()
        .filter(|m| m.to_addr == address && m.from_addr != address && !m.read)
        .count())
}

/// NFT threads addressed to `address`: one entry per (sender, contract,
/// token), in order of first message, each with its unread count.
pub fn nft_sidebar<S: ChatStore + ?Sized>(
    store: &S,
    address: &str,
) -> Result<Vec<NftSidebarEntry>> {
    let mut messages = store.find_direct_messages(address)?;
    messages.sort_by_key(|m| m.id);

    let mut sidebar: Vec<NftSidebarEntry> = Vec::new();
    for msg in &messages {
        if msg.to_addr != address || msg.from_addr == address {
            continue;
        }
        let (Some(nft_addr), Some(nft_id)) = (&msg.nft_addr, &msg.nft_id) else {
            continue;
        };

        let unread = usize::from(!msg.read);
        match sidebar.iter_mut().find(|e| {
            e.from_addr == msg.from_addr && &e.nft_addr == nft_addr && &e.nft_id == nft_id
        }) {
            Some(entry) => entry.unread += unread,
            None => sidebar.push(NftSidebarEntry {
                from_addr: msg.from_addr.clone(),
                nft_addr: nft_addr.clone(),
                nft_id: nft_id.clone(),
                unread,
            }),
        }
    }

    Ok(sidebar)
}

/// Stores a direct message stamped with `now`. The id comes from the store.
pub fn send_direct<S: ChatStore + ?Sized>(
    store: &S,
    from: &str,
    to: &str,
    nft: Option<(String, String)>,
    message: &str,
    timestamp: &str,
    now: DateTime<Utc>,
) -> Result<ChatMessage> {
    if from.trim().is_empty() || to.trim().is_empty() {
        return Err(InboxError::InvalidInput("sender and recipient are required".into()));
    }
    if message.is_empty() {
        return Err(InboxError::InvalidInput("message is empty".into()));
    }

    let (nft_addr, nft_id) = match nft {
        Some((addr, id)) => (Some(addr), Some(id)),
        None => (None, None),
    };

    let stored = store.create_direct_message(&NewDirectMessage {
        from_addr: from.to_string(),
        to_addr: to.to_string(),
        nft_addr,
        nft_id,
        message: message.to_string(),
        timestamp: timestamp.to_string(),
        sent_at: now,
    })?;
    Ok(stored)
}

/// Flips the read flag on the message(s) `from -> to` sent at `timestamp`.
pub fn mark_read<S: ChatStore + ?Sized>(
    store: &S,
    from: &str,
    to: &str,
    timestamp: &str,
    read: bool,
) -> Result<usize> {
    match store.mark_direct_read(from, to, timestamp, read)? {
        0 => Err(InboxError::NotFound),
        n => Ok(n),
    }
}

/// Removes every message `from -> to`; the opposite direction is kept.
pub fn delete_conversation<S: ChatStore + ?Sized>(store: &S, from: &str, to: &str) -> Result<usize> {
    let removed = store.delete_direct_messages(from, to)?;
    info!("Deleted {} messages from '{}' to '{}'", removed, from, to);
    Ok(removed)
}
