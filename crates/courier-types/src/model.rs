use crate::ClientId;

/// A registered client as the store knows it. Rows are created by
/// registration and never deleted; `last_seen` is the only mutable column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: ClientId,
    pub username: String,
    pub public_key: Vec<u8>,
    pub last_seen: String,
}

/// A queued message as the store knows it. The id is the store's
/// autoincrement rowid, so insertion order and id order agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub id: i64,
    pub to: ClientId,
    pub from: ClientId,
    pub kind: u8,
    pub content: Vec<u8>,
}
