use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE chat_messages (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                from_addr   TEXT NOT NULL,
                to_addr     TEXT NOT NULL,
                nft_addr    TEXT,
                nft_id      TEXT,
                message     TEXT NOT NULL,
                timestamp   TEXT NOT NULL DEFAULT '',
                sent_at     TEXT NOT NULL DEFAULT (datetime('now')),
                msg_read    INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_chat_messages_from ON chat_messages(from_addr, to_addr);
            CREATE INDEX idx_chat_messages_to ON chat_messages(to_addr, msg_read);

            CREATE TABLE group_messages (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                community       TEXT NOT NULL,
                from_addr       TEXT NOT NULL,
                message         TEXT NOT NULL,
                timestamp       TEXT NOT NULL DEFAULT '',
                sent_at         TEXT NOT NULL DEFAULT (datetime('now')),
                content_type    TEXT NOT NULL DEFAULT 'message'
            );

            CREATE INDEX idx_group_messages_community ON group_messages(community, id);

            CREATE TABLE bookmarks (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                wallet      TEXT NOT NULL,
                community   TEXT NOT NULL,
                UNIQUE(wallet, community)
            );

            CREATE INDEX idx_bookmarks_community ON bookmarks(community);

            CREATE TABLE read_watermarks (
                wallet          TEXT NOT NULL,
                community       TEXT NOT NULL,
                last_read_at    TEXT NOT NULL,
                PRIMARY KEY (wallet, community)
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (names, logos, unread settings)");
        conn.execute_batch(
            "
            CREATE TABLE address_names (
                address     TEXT PRIMARY KEY,
                name        TEXT NOT NULL
            );

            CREATE TABLE logos (
                name        TEXT PRIMARY KEY,
                base64_data TEXT NOT NULL
            );

            CREATE TABLE unread_settings (
                wallet      TEXT PRIMARY KEY,
                dm          INTEGER NOT NULL DEFAULT 1,
                nft         INTEGER NOT NULL DEFAULT 1,
                community   INTEGER NOT NULL DEFAULT 1
            );

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    if version < 3 {
        info!("Running migration v3 (NFT thread index)");
        conn.execute_batch(
            "
            CREATE INDEX idx_chat_messages_nft ON chat_messages(nft_addr, nft_id);

            INSERT INTO schema_version (version) VALUES (3);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
