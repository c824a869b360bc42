use courier_types::{CLIENT_ID_LEN, ClientId};

use crate::error::WireError;

/// Protocol version spoken by this implementation.
pub const PROTOCOL_VERSION: u8 = 1;

/// Request header size: 16-byte client id + version + code + payload size.
pub const REQUEST_HEADER_LEN: usize = CLIENT_ID_LEN + 1 + 2 + 4;

/// Response header size: version + code + payload size.
pub const RESPONSE_HEADER_LEN: usize = 1 + 2 + 4;

/// One decoded request frame. `code` stays raw here; mapping to a known
/// [`crate::RequestCode`] is the dispatcher's job so unknown codes remain
/// representable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    pub client_id: ClientId,
    pub version: u8,
    pub code: u16,
    pub payload: Vec<u8>,
}

/// One decoded response frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    pub version: u8,
    pub code: u16,
    pub payload: Vec<u8>,
}

/// Encode a request frame. The client id is written verbatim; all numeric
/// fields are little-endian.
pub fn encode_request(client_id: ClientId, version: u8, code: u16, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(REQUEST_HEADER_LEN + payload.len());
    buf.extend_from_slice(client_id.as_bytes());
    buf.push(version);
    buf.extend_from_slice(&code.to_le_bytes());
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Encode a request whose id field is arbitrary bytes: shorter ids are
/// NUL-padded to 16 bytes, longer ones truncated. Clients that have not
/// registered yet have no real id to put in the header.
pub fn encode_request_raw_id(client_id: &[u8], version: u8, code: u16, payload: &[u8]) -> Vec<u8> {
    let mut id = [0u8; CLIENT_ID_LEN];
    let n = client_id.len().min(CLIENT_ID_LEN);
    id[..n].copy_from_slice(&client_id[..n]);
    encode_request(ClientId::from_bytes(id), version, code, payload)
}

/// Decode a request frame.
///
/// Fails with [`WireError::FrameTooShort`] when fewer bytes than the header
/// are present, and [`WireError::PayloadTruncated`] when fewer bytes than
/// the declared payload size follow it. Bytes beyond the declared payload
/// size are ignored. The version byte is carried through unchecked; version
/// acceptance is relay policy, not codec policy.
pub fn decode_request(data: &[u8]) -> Result<RequestFrame, WireError> {
    if data.len() < REQUEST_HEADER_LEN {
        return Err(WireError::FrameTooShort {
            needed: REQUEST_HEADER_LEN,
            got: data.len(),
        });
    }

    let client_id = ClientId::from_bytes(data[0..16].try_into().unwrap());
    let version = data[16];
    let code = u16::from_le_bytes(data[17..19].try_into().unwrap());
    let payload_size = u32::from_le_bytes(data[19..23].try_into().unwrap()) as usize;

    if data.len() - REQUEST_HEADER_LEN < payload_size {
        return Err(WireError::PayloadTruncated {
            declared: payload_size,
            got: data.len() - REQUEST_HEADER_LEN,
        });
    }

    Ok(RequestFrame {
        client_id,
        version,
        code,
        payload: data[REQUEST_HEADER_LEN..REQUEST_HEADER_LEN + payload_size].to_vec(),
    })
}

/// Encode a response frame.
pub fn encode_response(version: u8, code: u16, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(RESPONSE_HEADER_LEN + payload.len());
    buf.push(version);
    buf.extend_from_slice(&code.to_le_bytes());
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Decode a response frame. Same length rules as [`decode_request`].
pub fn decode_response(data: &[u8]) -> Result<ResponseFrame, WireError> {
    if data.len() < RESPONSE_HEADER_LEN {
        return Err(WireError::FrameTooShort {
            needed: RESPONSE_HEADER_LEN,
            got: data.len(),
        });
    }

    let version = data[0];
    let code = u16::from_le_bytes(data[1..3].try_into().unwrap());
    let payload_size = u32::from_le_bytes(data[3..7].try_into().unwrap()) as usize;

    if data.len() - RESPONSE_HEADER_LEN < payload_size {
        return Err(WireError::PayloadTruncated {
            declared: payload_size,
            got: data.len() - RESPONSE_HEADER_LEN,
        });
    }

    Ok(ResponseFrame {
        version,
        code,
        payload: data[RESPONSE_HEADER_LEN..RESPONSE_HEADER_LEN + payload_size].to_vec(),
    })
}
