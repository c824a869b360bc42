//! Shared domain types for the courier relay.
//!
//! Everything here is protocol-agnostic and store-agnostic: the wire codec,
//! the persistence layer and the relay all speak in terms of these types.

pub mod id;
pub mod model;

pub use id::{CLIENT_ID_LEN, ClientId};
pub use model::{Client, StoredMessage};

/// Size of a client public key blob, in bytes. Keys are opaque to the relay;
/// the length is the only thing it validates.
pub const PUBLIC_KEY_LEN: usize = 160;

/// Width of the fixed username field on the wire. Usernames shorter than
/// this are NUL-padded; the stored name is always shorter than or equal to it.
pub const USERNAME_LEN: usize = 255;
