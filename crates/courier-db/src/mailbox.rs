//! The mailbox store: messages queued for recipients that have not fetched
//! them yet. Message rows belong to this store alone; endpoint validation
//! goes through the registry.

use std::sync::Arc;

use courier_types::{ClientId, StoredMessage};
use rusqlite::params;
use thiserror::Error;

use crate::models::message_from_row;
use crate::registry::ClientRegistry;
use crate::{Database, StoreError};

#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("unknown recipient {0}")]
    UnknownRecipient(ClientId),
    #[error("unknown sender {0}")]
    UnknownSender(ClientId),
    #[error("unknown client {0}")]
    UnknownClient(ClientId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct MailboxStore {
    db: Arc<Database>,
    registry: ClientRegistry,
}

impl MailboxStore {
    pub fn new(db: Arc<Database>, registry: ClientRegistry) -> Self {
        Self { db, registry }
    }

    /// Queue a message for `to`. Both endpoints must be registered; nothing
    /// is stored when either check fails.
    pub fn send(
        &self,
        to: &ClientId,
        from: &ClientId,
        kind: u8,
        content: &[u8],
    ) -> Result<(), MailboxError> {
        if !self.registry.exists_by_id(to)? {
            return Err(MailboxError::UnknownRecipient(*to));
        }
        if !self.registry.exists_by_id(from)? {
            return Err(MailboxError::UnknownSender(*from));
        }

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (to_client, from_client, kind, content) VALUES (?1, ?2, ?3, ?4)",
                params![to.as_bytes(), from.as_bytes(), kind, content],
            )?;
            Ok(())
        })?;
        Ok(())
    }

    /// Drain the mailbox: return every message queued for `client` in
    /// insertion order and delete exactly the returned rows.
    ///
    /// Read and delete run inside one lock acquisition, so a message is
    /// never handed out twice and never lost between the two steps. Once
    /// this returns the rows are gone; delivery is at most once.
    pub fn fetch_and_clear(&self, client: &ClientId) -> Result<Vec<StoredMessage>, MailboxError> {
        if !self.registry.exists_by_id(client)? {
            return Err(MailboxError::UnknownClient(*client));
        }

        let messages = self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, to_client, from_client, kind, content
                 FROM messages WHERE to_client = ?1 ORDER BY id",
            )?;
            let messages = stmt
                .query_map([client.as_bytes()], message_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            if !messages.is_empty() {
                // Every accessor goes through the connection lock, so no row
                // can be queued between the read above and this delete;
                // deleting by recipient removes exactly the rows just read,
                // whatever their number.
                conn.execute(
                    "DELETE FROM messages WHERE to_client = ?1",
                    [client.as_bytes()],
                )?;
            }

            Ok(messages)
        })?;

        Ok(messages)
    }

    /// Remove one message by id. Removing an id that is not there is a
    /// no-op.
    pub fn delete(&self, message_id: i64) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM messages WHERE id = ?1", [message_id])?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_types::PUBLIC_KEY_LEN;

    fn mailbox() -> (MailboxStore, ClientId, ClientId) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let registry = ClientRegistry::new(db.clone());
        let key: Vec<u8> = (0..PUBLIC_KEY_LEN).map(|i| (i % 251) as u8).collect();
        let alice = registry.register("alice", &key).unwrap();
        let bob = registry.register("bob", &key).unwrap();
        (MailboxStore::new(db, registry), alice, bob)
    }

    fn message_count(store: &MailboxStore) -> i64 {
        store
            .db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?)
            })
            .unwrap()
    }

    #[test]
    fn send_then_fetch_returns_the_message_once() {
        let (store, alice, bob) = mailbox();
        store.send(&alice, &bob, 1, b"hi").unwrap();

        let messages = store.fetch_and_clear(&alice).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].to, alice);
        assert_eq!(messages[0].from, bob);
        assert_eq!(messages[0].kind, 1);
        assert_eq!(messages[0].content, b"hi");

        // The drain removed the row; a second fetch finds nothing.
        assert!(store.fetch_and_clear(&alice).unwrap().is_empty());
        assert_eq!(message_count(&store), 0);
    }

    #[test]
    fn fetch_on_empty_mailbox_is_empty() {
        let (store, alice, _) = mailbox();
        assert!(store.fetch_and_clear(&alice).unwrap().is_empty());
        assert!(store.fetch_and_clear(&alice).unwrap().is_empty());
    }

    #[test]
    fn send_to_unknown_recipient_stores_nothing() {
        let (store, _, bob) = mailbox();
        let err = store
            .send(&ClientId::generate(), &bob, 1, b"lost")
            .unwrap_err();
        assert!(matches!(err, MailboxError::UnknownRecipient(_)));
        assert_eq!(message_count(&store), 0);
    }

    #[test]
    fn send_from_unknown_sender_stores_nothing() {
        let (store, alice, _) = mailbox();
        let err = store
            .send(&alice, &ClientId::generate(), 1, b"lost")
            .unwrap_err();
        assert!(matches!(err, MailboxError::UnknownSender(_)));
        assert_eq!(message_count(&store), 0);
    }

    #[test]
    fn fetch_for_unknown_client_is_an_error() {
        let (store, _, _) = mailbox();
        let err = store.fetch_and_clear(&ClientId::generate()).unwrap_err();
        assert!(matches!(err, MailboxError::UnknownClient(_)));
    }

    #[test]
    fn fetch_preserves_send_order() {
        let (store, alice, bob) = mailbox();
        store.send(&alice, &bob, 1, b"first").unwrap();
        store.send(&alice, &bob, 2, b"second").unwrap();
        store.send(&alice, &bob, 1, b"third").unwrap();

        let messages = store.fetch_and_clear(&alice).unwrap();
        let contents: Vec<&[u8]> = messages.iter().map(|m| m.content.as_slice()).collect();
        assert_eq!(contents, vec![&b"first"[..], b"second", b"third"]);
        assert!(messages.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn fetch_leaves_other_mailboxes_alone() {
        let (store, alice, bob) = mailbox();
        store.send(&alice, &bob, 1, b"for alice").unwrap();
        store.send(&bob, &alice, 1, b"for bob").unwrap();

        assert_eq!(store.fetch_and_clear(&alice).unwrap().len(), 1);
        assert_eq!(message_count(&store), 1);

        let remaining = store.fetch_and_clear(&bob).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].content, b"for bob");
    }

    #[test]
    fn huge_mailbox_still_drains() {
        let (store, alice, bob) = mailbox();

        // More rows than the 32766 host parameters SQLite allows in one
        // statement, so the drain must not spend a parameter per row.
        let queued = 32_767usize;
        store
            .db
            .with_conn(|conn| {
                let mut stmt = conn.prepare(
                    "INSERT INTO messages (to_client, from_client, kind, content)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;
                for _ in 0..queued {
                    stmt.execute(params![alice.as_bytes(), bob.as_bytes(), 1u8, b"bulk"])?;
                }
                Ok(())
            })
            .unwrap();

        let messages = store.fetch_and_clear(&alice).unwrap();
        assert_eq!(messages.len(), queued);
        assert_eq!(message_count(&store), 0);
    }

    #[test]
    fn empty_content_is_allowed() {
        let (store, alice, bob) = mailbox();
        store.send(&alice, &bob, 3, b"").unwrap();

        let messages = store.fetch_and_clear(&alice).unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].content.is_empty());
    }

    #[test]
    fn delete_is_idempotent() {
        let (store, alice, bob) = mailbox();
        store.send(&alice, &bob, 1, b"once").unwrap();
        let id = store.fetch_and_clear(&alice).unwrap()[0].id;

        // Already drained, both of these hit nothing.
        store.delete(id).unwrap();
        store.delete(9999).unwrap();
        assert_eq!(message_count(&store), 0);
    }
}
