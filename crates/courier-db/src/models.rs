//! Row mapping between SQLite and the domain models in courier-types.
//! Client ids live in BLOB columns; the 16-byte length is enforced here so
//! a corrupt blob fails the row mapping instead of producing a bogus id.

use courier_types::{CLIENT_ID_LEN, Client, ClientId, StoredMessage};
use rusqlite::Row;

pub(crate) fn client_id_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<ClientId> {
    let bytes: [u8; CLIENT_ID_LEN] = row.get(idx)?;
    Ok(ClientId::from_bytes(bytes))
}

/// Map a `SELECT id, username, public_key, last_seen` row.
pub(crate) fn client_from_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: client_id_column(row, 0)?,
        username: row.get(1)?,
        public_key: row.get(2)?,
        last_seen: row.get(3)?,
    })
}

/// Map a `SELECT id, to_client, from_client, kind, content` row.
pub(crate) fn message_from_row(row: &Row<'_>) -> rusqlite::Result<StoredMessage> {
    Ok(StoredMessage {
        id: row.get(0)?,
        to: client_id_column(row, 1)?,
        from: client_id_column(row, 2)?,
        kind: row.get(3)?,
        content: row.get(4)?,
    })
}
