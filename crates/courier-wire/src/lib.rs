//! Wire protocol for the courier relay.
//!
//! Two frame shapes, both little-endian, fixed header then payload:
//!
//! ```text
//! Request:   [0..16]  client id (16 bytes, verbatim)
//!            [16]     protocol version (u8)
//!            [17..19] request code (u16 LE)
//!            [19..23] payload size (u32 LE)
//!            [23..]   payload
//!
//! Response:  [0]      protocol version (u8)
//!            [1..3]   response code (u16 LE)
//!            [3..7]   payload size (u32 LE)
//!            [7..]    payload
//! ```
//!
//! The codec decodes frames; the per-operation payload layouts live in
//! [`payload`] and are shared by the relay and the client library.

pub mod codes;
pub mod error;
pub mod frame;
pub mod payload;

pub use codes::{RequestCode, ResponseCode};
pub use error::WireError;
pub use frame::{
    PROTOCOL_VERSION, REQUEST_HEADER_LEN, RESPONSE_HEADER_LEN, RequestFrame, ResponseFrame,
    decode_request, decode_response, encode_request, encode_request_raw_id, encode_response,
};
pub use payload::{
    CLIENT_ENTRY_LEN, MESSAGE_ACK_LEN, MESSAGE_RECORD_HEADER_LEN, REGISTER_PAYLOAD_LEN,
    SEND_HEADER_LEN, ClientEntry, MessageQueuedAck, MessageRecord, RegisterPayload,
    SendMessagePayload,
};
