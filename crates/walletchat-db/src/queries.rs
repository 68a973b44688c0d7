use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use tracing::warn;

use walletchat_inbox::ChatStore;
use walletchat_inbox::timestamp::{format_timestamp, parse_timestamp};
use walletchat_types::models::{
    Bookmark, ChatMessage, GroupChatMessage, NewDirectMessage, NewGroupMessage, ReadWatermark,
    UnreadSettings,
};

use crate::Database;
use crate::models::{ChatRow, GroupRow, skip_malformed};

const CHAT_COLUMNS: &str =
    "id, from_addr, to_addr, nft_addr, nft_id, message, timestamp, sent_at, msg_read";
const GROUP_COLUMNS: &str = "id, community, from_addr, message, timestamp, sent_at, content_type";

impl Database {
    /// Registers base64 logo data under a name. Logos are provisioned by
    /// operators; no HTTP route writes them.
    pub fn set_logo(&self, name: &str, base64_data: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO logos (name, base64_data) VALUES (?1, ?2)
                 ON CONFLICT(name) DO UPDATE SET base64_data = excluded.base64_data",
                (name, base64_data),
            )?;
            Ok(())
        })
    }
}

impl ChatStore for Database {
    // -- Direct messages --

    fn find_direct_messages(&self, address: &str) -> Result<Vec<ChatMessage>> {
        self.with_conn(|conn| {
            query_chat_rows(
                conn,
                &format!(
                    "SELECT {CHAT_COLUMNS} FROM chat_messages
                     WHERE from_addr = ?1 OR to_addr = ?1
                     ORDER BY id"
                ),
                params![address],
            )
        })
    }

    fn find_unread_direct_messages(&self, from: &str, to: &str) -> Result<Vec<ChatMessage>> {
        self.with_conn(|conn| {
            query_chat_rows(
                conn,
                &format!(
                    "SELECT {CHAT_COLUMNS} FROM chat_messages
                     WHERE from_addr = ?1 AND to_addr = ?2 AND msg_read = 0
                     ORDER BY id"
                ),
                params![from, to],
            )
        })
    }

    fn find_nft_messages(&self, nft_addr: &str, nft_id: &str) -> Result<Vec<ChatMessage>> {
        self.with_conn(|conn| {
            query_chat_rows(
                conn,
                &format!(
                    "SELECT {CHAT_COLUMNS} FROM chat_messages
                     WHERE nft_addr = ?1 AND nft_id = ?2
                     ORDER BY id"
                ),
                params![nft_addr, nft_id],
            )
        })
    }

    fn create_direct_message(&self, msg: &NewDirectMessage) -> Result<ChatMessage> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chat_messages (from_addr, to_addr, nft_addr, nft_id, message, timestamp, sent_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    msg.from_addr,
                    msg.to_addr,
                    msg.nft_addr,
                    msg.nft_id,
                    msg.message,
                    msg.timestamp,
                    format_timestamp(msg.sent_at),
                ],
            )?;

            Ok(ChatMessage {
                id: conn.last_insert_rowid(),
                from_addr: msg.from_addr.clone(),
                to_addr: msg.to_addr.clone(),
                nft_addr: msg.nft_addr.clone(),
                nft_id: msg.nft_id.clone(),
                message: msg.message.clone(),
                timestamp: msg.timestamp.clone(),
                sent_at: msg.sent_at,
                read: false,
            })
        })
    }

    fn mark_direct_read(&self, from: &str, to: &str, timestamp: &str, read: bool) -> Result<usize> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE chat_messages SET msg_read = ?4
                 WHERE from_addr = ?1 AND to_addr = ?2 AND timestamp = ?3",
                params![from, to, timestamp, read],
            )?;
            Ok(updated)
        })
    }

    fn delete_direct_messages(&self, from: &str, to: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM chat_messages WHERE from_addr = ?1 AND to_addr = ?2",
                (from, to),
            )?;
            Ok(deleted)
        })
    }

    // -- Bookmarks --

    fn find_bookmarks(&self, wallet: &str) -> Result<Vec<Bookmark>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, wallet, community FROM bookmarks WHERE wallet = ?1 ORDER BY id",
            )?;
            let rows = stmt
                .query_map([wallet], |row| {
                    Ok(Bookmark {
                        id: row.get(0)?,
                        wallet: row.get(1)?,
                        community: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn is_bookmarked(&self, wallet: &str, community: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM bookmarks WHERE wallet = ?1 AND community = ?2",
                    (wallet, community),
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    fn create_bookmark(&self, wallet: &str, community: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO bookmarks (wallet, community) VALUES (?1, ?2)",
                (wallet, community),
            )?;
            Ok(inserted == 1)
        })
    }

    fn delete_bookmark(&self, wallet: &str, community: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM bookmarks WHERE wallet = ?1 AND community = ?2",
                (wallet, community),
            )?;
            Ok(deleted > 0)
        })
    }

    fn count_members(&self, community: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM bookmarks WHERE community = ?1",
                [community],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
    }

    // -- Community messages --

    fn find_latest_group_message(&self, community: &str) -> Result<Option<GroupChatMessage>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {GROUP_COLUMNS} FROM group_messages WHERE community = ?1 ORDER BY id DESC"
            ))?;
            let rows = stmt.query_map([community], group_row)?;

            // Newest row whose timestamp is readable
            for row in rows {
                let row = row?;
                let id = row.id;
                match row.into_message() {
                    Ok(msg) => return Ok(Some(msg)),
                    Err(e) => warn!("Skipping group_messages row {}: {}", id, e),
                }
            }
            Ok(None)
        })
    }

    fn find_group_messages_since(
        &self,
        community: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<GroupChatMessage>> {
        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {GROUP_COLUMNS} FROM group_messages WHERE community = ?1 ORDER BY id"
            ))?;
            let rows = stmt
                .query_map([community], group_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        // Compared after parsing: legacy rows use a different text format.
        let messages = skip_malformed("group_messages", rows, |r| r.id, GroupRow::into_message)
            .into_iter()
            .filter(|m| since.is_none_or(|s| m.sent_at > s))
            .collect();
        Ok(messages)
    }

    fn create_group_message(&self, msg: &NewGroupMessage) -> Result<GroupChatMessage> {
        self.with_conn(|conn| insert_group_message(conn, msg))
    }

    fn enroll_member(&self, wallet: &str, welcome: &NewGroupMessage) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let inserted = tx.execute(
                "INSERT OR IGNORE INTO bookmarks (wallet, community) VALUES (?1, ?2)",
                (wallet, &welcome.community),
            )?;
            if inserted == 0 {
                return Ok(false);
            }

            insert_group_message(&tx, welcome)?;
            tx.execute(
                "INSERT OR IGNORE INTO read_watermarks (wallet, community, last_read_at)
                 VALUES (?1, ?2, ?3)",
                (wallet, &welcome.community, format_timestamp(welcome.sent_at)),
            )?;

            tx.commit()?;
            Ok(true)
        })
    }

    // -- Read watermarks --

    fn find_watermark(&self, wallet: &str, community: &str) -> Result<Option<ReadWatermark>> {
        let raw = self.with_conn(|conn| query_watermark(conn, wallet, community))?;

        Ok(raw.and_then(|raw| match parse_timestamp(&raw) {
            Ok(last_read_at) => Some(ReadWatermark {
                wallet: wallet.to_string(),
                community: community.to_string(),
                last_read_at,
            }),
            Err(e) => {
                warn!("Ignoring watermark for '{}' in '{}': {}", wallet, community, e);
                None
            }
        }))
    }

    fn insert_watermark_if_absent(
        &self,
        wallet: &str,
        community: &str,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO read_watermarks (wallet, community, last_read_at)
                 VALUES (?1, ?2, ?3)",
                (wallet, community, format_timestamp(at)),
            )?;
            Ok(inserted == 1)
        })
    }

    fn upsert_watermark(&self, wallet: &str, community: &str, at: DateTime<Utc>) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let advance = match query_watermark(&tx, wallet, community)? {
                None => true,
                Some(raw) => match parse_timestamp(&raw) {
                    Ok(current) => at > current,
                    Err(e) => {
                        warn!("Replacing unreadable watermark for '{}' in '{}': {}", wallet, community, e);
                        true
                    }
                },
            };

            if advance {
                tx.execute(
                    "INSERT INTO read_watermarks (wallet, community, last_read_at)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(wallet, community) DO UPDATE SET last_read_at = excluded.last_read_at",
                    (wallet, community, format_timestamp(at)),
                )?;
            }

            tx.commit()?;
            Ok(())
        })
    }

    // -- Names and logos --

    fn find_display_name(&self, address: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT name FROM address_names WHERE address = ?1",
                [address],
                |row| row.get(0),
            )
            .optional()
        })
    }

    fn set_display_name(&self, address: &str, name: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO address_names (address, name) VALUES (?1, ?2)
                 ON CONFLICT(address) DO UPDATE SET name = excluded.name",
                (address, name),
            )?;
            Ok(())
        })
    }

    fn find_logo(&self, name: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT base64_data FROM logos WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .optional()
        })
    }

    // -- Unread settings --

    fn find_unread_settings(&self, wallet: &str) -> Result<Option<UnreadSettings>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT dm, nft, community FROM unread_settings WHERE wallet = ?1",
                [wallet],
                |row| {
                    Ok(UnreadSettings {
                        dm: row.get(0)?,
                        nft: row.get(1)?,
                        community: row.get(2)?,
                    })
                },
            )
            .optional()
        })
    }

    fn save_unread_settings(&self, wallet: &str, settings: UnreadSettings) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO unread_settings (wallet, dm, nft, community) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(wallet) DO UPDATE SET
                    dm = excluded.dm, nft = excluded.nft, community = excluded.community",
                params![wallet, settings.dm, settings.nft, settings.community],
            )?;
            Ok(())
        })
    }
}

fn query_chat_rows(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<ChatMessage>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, |row| {
            Ok(ChatRow {
                id: row.get(0)?,
                from_addr: row.get(1)?,
                to_addr: row.get(2)?,
                nft_addr: row.get(3)?,
                nft_id: row.get(4)?,
                message: row.get(5)?,
                timestamp: row.get(6)?,
                sent_at: row.get(7)?,
                msg_read: row.get(8)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(skip_malformed("chat_messages", rows, |r| r.id, ChatRow::into_message))
}

fn group_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GroupRow> {
    Ok(GroupRow {
        id: row.get(0)?,
        community: row.get(1)?,
        from_addr: row.get(2)?,
        message: row.get(3)?,
        timestamp: row.get(4)?,
        sent_at: row.get(5)?,
        content_type: row.get(6)?,
    })
}

fn insert_group_message(conn: &Connection, msg: &NewGroupMessage) -> Result<GroupChatMessage> {
    conn.execute(
        "INSERT INTO group_messages (community, from_addr, message, timestamp, sent_at, content_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            msg.community,
            msg.from_addr,
            msg.message,
            msg.timestamp,
            format_timestamp(msg.sent_at),
            msg.content_type.as_str(),
        ],
    )?;

    Ok(GroupChatMessage {
        id: conn.last_insert_rowid(),
        community: msg.community.clone(),
        from_addr: msg.from_addr.clone(),
        message: msg.message.clone(),
        timestamp: msg.timestamp.clone(),
        sent_at: msg.sent_at,
        content_type: msg.content_type,
    })
}

fn query_watermark(conn: &Connection, wallet: &str, community: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT last_read_at FROM read_watermarks WHERE wallet = ?1 AND community = ?2",
        (wallet, community),
        |row| row.get(0),
    )
    .optional()
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
