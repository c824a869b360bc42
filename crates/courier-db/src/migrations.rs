use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS clients (
            id          BLOB PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            public_key  BLOB NOT NULL,
            last_seen   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS messages (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            to_client   BLOB NOT NULL,
            from_client BLOB NOT NULL,
            kind        INTEGER NOT NULL,
            content     BLOB NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_recipient
            ON messages(to_client);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
