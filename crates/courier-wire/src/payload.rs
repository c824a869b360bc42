//! Per-operation payload layouts, shared by the relay and the client
//! library. Each type knows how to encode itself and how to parse the raw
//! payload of its frame; multi-record payloads (client list, fetched
//! messages) are plain concatenations with no separator or count prefix.

use courier_types::{CLIENT_ID_LEN, ClientId, PUBLIC_KEY_LEN, USERNAME_LEN};

use crate::error::WireError;

/// Fixed size of a registration payload: username field plus key.
pub const REGISTER_PAYLOAD_LEN: usize = USERNAME_LEN + PUBLIC_KEY_LEN;

/// Fixed prefix of a send-message payload: two ids, kind tag, content size.
pub const SEND_HEADER_LEN: usize = CLIENT_ID_LEN * 2 + 1 + 4;

/// One entry of a client-list payload: id plus fixed-width username.
pub const CLIENT_ENTRY_LEN: usize = CLIENT_ID_LEN + USERNAME_LEN;

/// Fixed prefix of one fetched-message record: sender id, message id, kind
/// tag, content size.
pub const MESSAGE_RECORD_HEADER_LEN: usize = CLIENT_ID_LEN + 4 + 1 + 4;

/// Size of a message-queued acknowledgement payload.
pub const MESSAGE_ACK_LEN: usize = CLIENT_ID_LEN + 4;

/// Decode a fixed-width username field: everything before the first NUL,
/// with non-ASCII bytes dropped rather than failing.
fn decode_username(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    field[..end]
        .iter()
        .filter(|b| b.is_ascii())
        .map(|&b| b as char)
        .collect()
}

/// Registration request payload: a 255-byte NUL-padded username followed by
/// a 160-byte public key. Exactly 415 bytes, no more, no less.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterPayload {
    pub username: String,
    pub public_key: Vec<u8>,
}

impl RegisterPayload {
    /// Build a payload client-side. Rejects usernames that do not fit the
    /// fixed field and keys of the wrong size before anything touches the
    /// network.
    pub fn new(username: impl Into<String>, public_key: Vec<u8>) -> Result<Self, WireError> {
        let username = username.into();
        if username.is_empty() || username.len() > USERNAME_LEN {
            return Err(WireError::InvalidPayload(format!(
                "username must be 1..={} bytes, got {}",
                USERNAME_LEN,
                username.len()
            )));
        }
        if public_key.len() != PUBLIC_KEY_LEN {
            return Err(WireError::InvalidPayload(format!(
                "public key must be exactly {} bytes, got {}",
                PUBLIC_KEY_LEN,
                public_key.len()
            )));
        }
        Ok(Self {
            username,
            public_key,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; REGISTER_PAYLOAD_LEN];
        let n = self.username.len().min(USERNAME_LEN);
        buf[..n].copy_from_slice(&self.username.as_bytes()[..n]);
        buf[USERNAME_LEN..].copy_from_slice(&self.public_key);
        buf
    }

    /// Parse a registration payload. The size must be exactly 415 bytes;
    /// the username is decoded via [`decode_username`] and must be
    /// non-empty afterwards.
    pub fn parse(payload: &[u8]) -> Result<Self, WireError> {
        if payload.len() != REGISTER_PAYLOAD_LEN {
            return Err(WireError::InvalidPayload(format!(
                "registration payload must be exactly {} bytes, got {}",
                REGISTER_PAYLOAD_LEN,
                payload.len()
            )));
        }

        let username = decode_username(&payload[..USERNAME_LEN]);
        if username.is_empty() {
            return Err(WireError::InvalidPayload("username is empty".into()));
        }

        Ok(Self {
            username,
            public_key: payload[USERNAME_LEN..].to_vec(),
        })
    }
}

/// One entry of a 2101 client-list response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientEntry {
    pub id: ClientId,
    pub username: String,
}

impl ClientEntry {
    /// Append this entry to a client-list payload.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.id.as_bytes());
        let mut name = [0u8; USERNAME_LEN];
        let n = self.username.len().min(USERNAME_LEN);
        name[..n].copy_from_slice(&self.username.as_bytes()[..n]);
        buf.extend_from_slice(&name);
    }

    /// Parse a whole client-list payload. An empty payload is an empty
    /// registry, not an error.
    pub fn parse_list(payload: &[u8]) -> Result<Vec<ClientEntry>, WireError> {
        if payload.len() % CLIENT_ENTRY_LEN != 0 {
            return Err(WireError::InvalidPayload(format!(
                "client list payload of {} bytes is not a multiple of {}",
                payload.len(),
                CLIENT_ENTRY_LEN
            )));
        }

        Ok(payload
            .chunks_exact(CLIENT_ENTRY_LEN)
            .map(|chunk| ClientEntry {
                id: ClientId::from_bytes(chunk[..CLIENT_ID_LEN].try_into().unwrap()),
                username: decode_username(&chunk[CLIENT_ID_LEN..]),
            })
            .collect())
    }
}

/// Send-message request payload: recipient, sender, kind tag, then
/// length-prefixed content. The declared content length must equal the
/// bytes that actually follow the fixed prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessagePayload {
    pub to: ClientId,
    pub from: ClientId,
    pub kind: u8,
    pub content: Vec<u8>,
}

impl SendMessagePayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(SEND_HEADER_LEN + self.content.len());
        buf.extend_from_slice(self.to.as_bytes());
        buf.extend_from_slice(self.from.as_bytes());
        buf.push(self.kind);
        buf.extend_from_slice(&(self.content.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.content);
        buf
    }

    pub fn parse(payload: &[u8]) -> Result<Self, WireError> {
        if payload.len() < SEND_HEADER_LEN {
            return Err(WireError::InvalidPayload(format!(
                "send payload must be at least {} bytes, got {}",
                SEND_HEADER_LEN,
                payload.len()
            )));
        }

        let to = ClientId::from_bytes(payload[0..16].try_into().unwrap());
        let from = ClientId::from_bytes(payload[16..32].try_into().unwrap());
        let kind = payload[32];
        let declared = u32::from_le_bytes(payload[33..37].try_into().unwrap()) as usize;
        let content = &payload[SEND_HEADER_LEN..];

        if content.len() != declared {
            return Err(WireError::InvalidPayload(format!(
                "content size mismatch: declared {}, got {}",
                declared,
                content.len()
            )));
        }

        Ok(Self {
            to,
            from,
            kind,
            content: content.to_vec(),
        })
    }
}

/// Acknowledgement payload for a queued message: the recipient id plus a
/// status word. The protocol reserves the status; it is always 1 today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageQueuedAck {
    pub to: ClientId,
    pub status: u32,
}

impl MessageQueuedAck {
    pub fn new(to: ClientId) -> Self {
        Self { to, status: 1 }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(MESSAGE_ACK_LEN);
        buf.extend_from_slice(self.to.as_bytes());
        buf.extend_from_slice(&self.status.to_le_bytes());
        buf
    }

    pub fn parse(payload: &[u8]) -> Result<Self, WireError> {
        if payload.len() != MESSAGE_ACK_LEN {
            return Err(WireError::InvalidPayload(format!(
                "ack payload must be exactly {} bytes, got {}",
                MESSAGE_ACK_LEN,
                payload.len()
            )));
        }
        Ok(Self {
            to: ClientId::from_bytes(payload[0..16].try_into().unwrap()),
            status: u32::from_le_bytes(payload[16..20].try_into().unwrap()),
        })
    }
}

/// One fetched message as it appears in a 2104 response payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub from: ClientId,
    /// Store id reduced modulo 2^32; the wire field is 4 bytes.
    pub id: u32,
    pub kind: u8,
    pub content: Vec<u8>,
}

impl MessageRecord {
    /// Reduce a store id to the 4-byte wire id field. Ids past
    /// `u32::MAX` wrap modulo 2^32.
    pub fn wire_id(store_id: i64) -> u32 {
        (store_id as u64 & 0xFFFF_FFFF) as u32
    }

    /// Append this record to a 2104 payload.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.from.as_bytes());
        buf.extend_from_slice(&self.id.to_le_bytes());
        buf.push(self.kind);
        buf.extend_from_slice(&(self.content.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.content);
    }

    /// Parse a whole 2104 payload. An empty payload is an empty mailbox.
    pub fn parse_list(payload: &[u8]) -> Result<Vec<MessageRecord>, WireError> {
        let mut records = Vec::new();
        let mut rest = payload;

        while !rest.is_empty() {
            if rest.len() < MESSAGE_RECORD_HEADER_LEN {
                return Err(WireError::InvalidPayload(format!(
                    "truncated message record: {} bytes left, header needs {}",
                    rest.len(),
                    MESSAGE_RECORD_HEADER_LEN
                )));
            }

            let from = ClientId::from_bytes(rest[0..16].try_into().unwrap());
            let id = u32::from_le_bytes(rest[16..20].try_into().unwrap());
            let kind = rest[20];
            let content_len = u32::from_le_bytes(rest[21..25].try_into().unwrap()) as usize;

            if rest.len() - MESSAGE_RECORD_HEADER_LEN < content_len {
                return Err(WireError::InvalidPayload(format!(
                    "truncated message record content: declared {}, got {}",
                    content_len,
                    rest.len() - MESSAGE_RECORD_HEADER_LEN
                )));
            }

            let end = MESSAGE_RECORD_HEADER_LEN + content_len;
            records.push(MessageRecord {
                from,
                id,
                kind,
                content: rest[MESSAGE_RECORD_HEADER_LEN..end].to_vec(),
            });
            rest = &rest[end..];
        }

        Ok(records)
    }
}
