//! The client registry: who is registered, under which name, with which
//! public key. Clients are created by registration and never removed.

use std::sync::Arc;

use courier_types::{Client, ClientId};
use rusqlite::{OptionalExtension, params};
use thiserror::Error;

use crate::models::{client_from_row, client_id_column};
use crate::{Database, StoreError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("username {0:?} is already registered")]
    UsernameTaken(String),
    #[error("unknown client {0}")]
    UnknownClient(ClientId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Handle over the clients table. Cheap to clone; every clone shares the
/// same underlying connection.
#[derive(Clone)]
pub struct ClientRegistry {
    db: Arc<Database>,
}

impl ClientRegistry {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Register a username with its public key and assign a fresh id.
    ///
    /// The existence check and the insert run inside one lock acquisition,
    /// so racing registrations of the same name see exactly one winner. The
    /// UNIQUE constraint on username is the store-level backstop.
    pub fn register(&self, username: &str, public_key: &[u8]) -> Result<ClientId, RegistryError> {
        let id = ClientId::generate();
        let inserted = self.db.with_conn(|conn| {
            let taken: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM clients WHERE username = ?1)",
                [username],
                |row| row.get(0),
            )?;
            if taken {
                return Ok(false);
            }
            conn.execute(
                "INSERT INTO clients (id, username, public_key) VALUES (?1, ?2, ?3)",
                params![id.as_bytes(), username, public_key],
            )?;
            Ok(true)
        })?;

        if inserted {
            Ok(id)
        } else {
            Err(RegistryError::UsernameTaken(username.to_string()))
        }
    }

    pub fn exists_by_id(&self, id: &ClientId) -> Result<bool, StoreError> {
        self.db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM clients WHERE id = ?1)",
                [id.as_bytes()],
                |row| row.get(0),
            )?)
        })
    }

    pub fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        self.db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM clients WHERE username = ?1)",
                [username],
                |row| row.get(0),
            )?)
        })
    }

    /// Load a full client row, or None when the id is unregistered.
    pub fn get(&self, id: &ClientId) -> Result<Option<Client>, StoreError> {
        self.db.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, username, public_key, last_seen FROM clients WHERE id = ?1",
                    [id.as_bytes()],
                    client_from_row,
                )
                .optional()?)
        })
    }

    /// The stored public key of a client.
    pub fn get_public_key(&self, id: &ClientId) -> Result<Vec<u8>, RegistryError> {
        let key: Option<Vec<u8>> = self.db.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT public_key FROM clients WHERE id = ?1",
                    [id.as_bytes()],
                    |row| row.get(0),
                )
                .optional()?)
        })?;
        key.ok_or(RegistryError::UnknownClient(*id))
    }

    /// Every registered client as (id, username). No particular order is
    /// guaranteed.
    pub fn list_all(&self) -> Result<Vec<(ClientId, String)>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, username FROM clients")?;
            let rows = stmt
                .query_map([], |row| Ok((client_id_column(row, 0)?, row.get(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Stamp a client's last_seen with the current time.
    pub fn touch(&self, id: &ClientId) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE clients SET last_seen = datetime('now') WHERE id = ?1",
                [id.as_bytes()],
            )?;
            Ok(())
        })
    }
}
