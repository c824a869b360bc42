//! The relay: a TCP accept loop that serves exactly one request per
//! connection against the client registry and the mailbox store.

pub mod handler;
pub mod relay;
pub mod transform;

pub use relay::Relay;
pub use transform::{ContentTransform, Passthrough};
