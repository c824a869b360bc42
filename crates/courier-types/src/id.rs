use std::fmt;

use uuid::Uuid;

/// Length of a client identifier in bytes.
pub const CLIENT_ID_LEN: usize = 16;

/// A 128-bit client identifier, assigned by the server at registration.
///
/// The canonical in-memory form is the raw 16-byte array; it is written to
/// the wire verbatim and stored as a BLOB. Hex rendering exists only for
/// logs and error messages.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId([u8; CLIENT_ID_LEN]);

impl ClientId {
    /// The all-zero identifier a client sends before it has registered.
    pub const ZERO: ClientId = ClientId([0u8; CLIENT_ID_LEN]);

    /// Allocate a fresh random identifier. Collision probability is treated
    /// as negligible; callers do not re-check.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().into_bytes())
    }

    pub const fn from_bytes(bytes: [u8; CLIENT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Build an id from a slice. Returns `None` unless the slice is exactly
    /// 16 bytes.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        slice.try_into().ok().map(Self)
    }

    pub const fn as_bytes(&self) -> &[u8; CLIENT_ID_LEN] {
        &self.0
    }

    pub const fn into_bytes(self) -> [u8; CLIENT_ID_LEN] {
        self.0
    }
}

impl From<[u8; CLIENT_ID_LEN]> for ClientId {
    fn from(bytes: [u8; CLIENT_ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for ClientId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientId({})", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct() {
        let a = ClientId::generate();
        let b = ClientId::generate();
        assert_ne!(a, b);
        assert_ne!(a, ClientId::ZERO);
    }

    #[test]
    fn from_slice_requires_exact_length() {
        assert!(ClientId::from_slice(&[0u8; 16]).is_some());
        assert!(ClientId::from_slice(&[0u8; 15]).is_none());
        assert!(ClientId::from_slice(&[0u8; 17]).is_none());
    }

    #[test]
    fn displays_as_hex() {
        let id = ClientId::from_bytes([0xAB; 16]);
        assert_eq!(id.to_string(), "ab".repeat(16));
    }
}
