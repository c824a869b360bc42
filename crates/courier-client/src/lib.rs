//! Client library for the courier relay.
//!
//! Each call opens a fresh connection, performs exactly one
//! request/response exchange and closes, mirroring the relay's
//! one-request-per-connection contract. Register first; the assigned id is
//! kept on the client and used as the sender and mailbox identity.

use std::net::SocketAddr;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use courier_types::{CLIENT_ID_LEN, ClientId};
use courier_wire::{
    ClientEntry, MessageQueuedAck, MessageRecord, PROTOCOL_VERSION, RESPONSE_HEADER_LEN,
    RegisterPayload, RequestCode, ResponseCode, ResponseFrame, SendMessagePayload, WireError,
    decode_response, encode_request,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error("server error: {0}")]
    Server(String),
    #[error("unexpected response code {got}, expected {expected}")]
    UnexpectedResponse { expected: u16, got: u16 },
    #[error("not registered yet")]
    NotRegistered,
}

pub struct Client {
    addr: SocketAddr,
    id: Option<ClientId>,
}

impl Client {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr, id: None }
    }

    /// The id assigned at registration, if any.
    pub fn id(&self) -> Option<ClientId> {
        self.id
    }

    /// Register under `username`. On success the assigned id is kept for
    /// subsequent requests. Oversized usernames and keys are rejected here,
    /// before anything touches the network.
    pub async fn register(
        &mut self,
        username: &str,
        public_key: &[u8],
    ) -> Result<ClientId, ClientError> {
        let payload = RegisterPayload::new(username, public_key.to_vec())?;
        let response = self
            .exchange(RequestCode::Register, &payload.encode())
            .await?;
        let body = expect(ResponseCode::RegisterOk, response)?;

        let id = ClientId::from_slice(&body).ok_or_else(|| {
            WireError::InvalidPayload(format!(
                "registration response must carry a {}-byte id, got {}",
                CLIENT_ID_LEN,
                body.len()
            ))
        })?;
        self.id = Some(id);
        Ok(id)
    }

    /// Every client the relay knows, as (id, username).
    pub async fn list_clients(&self) -> Result<Vec<(ClientId, String)>, ClientError> {
        let response = self.exchange(RequestCode::ListClients, &[]).await?;
        let body = expect(ResponseCode::ClientList, response)?;
        let entries = ClientEntry::parse_list(&body)?;
        Ok(entries.into_iter().map(|e| (e.id, e.username)).collect())
    }

    /// The public key a peer registered with.
    pub async fn public_key_of(&self, id: &ClientId) -> Result<Vec<u8>, ClientError> {
        let response = self
            .exchange(RequestCode::GetPublicKey, id.as_bytes())
            .await?;
        expect(ResponseCode::PublicKey, response)
    }

    /// Queue a message for `to`. The sender id is this client's own, so a
    /// prior registration is required.
    pub async fn send_message(
        &self,
        to: &ClientId,
        kind: u8,
        content: &[u8],
    ) -> Result<(), ClientError> {
        let from = self.id.ok_or(ClientError::NotRegistered)?;
        let payload = SendMessagePayload {
            to: *to,
            from,
            kind,
            content: content.to_vec(),
        };
        let response = self
            .exchange(RequestCode::SendMessage, &payload.encode())
            .await?;
        let body = expect(ResponseCode::MessageQueued, response)?;
        MessageQueuedAck::parse(&body)?;
        Ok(())
    }

    /// Drain this client's mailbox. Messages returned here are gone from
    /// the relay.
    pub async fn fetch_messages(&self) -> Result<Vec<MessageRecord>, ClientError> {
        if self.id.is_none() {
            return Err(ClientError::NotRegistered);
        }
        let response = self.exchange(RequestCode::FetchMessages, &[]).await?;
        let body = expect(ResponseCode::Messages, response)?;
        Ok(MessageRecord::parse_list(&body)?)
    }

    /// One request/response exchange on a fresh connection.
    async fn exchange(
        &self,
        code: RequestCode,
        payload: &[u8],
    ) -> Result<ResponseFrame, ClientError> {
        let mut stream = TcpStream::connect(self.addr).await?;

        let header_id = self.id.unwrap_or(ClientId::ZERO);
        let request = encode_request(header_id, PROTOCOL_VERSION, code.as_u16(), payload);
        stream.write_all(&request).await?;

        let mut header = [0u8; RESPONSE_HEADER_LEN];
        stream.read_exact(&mut header).await?;
        let declared = u32::from_le_bytes(header[3..7].try_into().unwrap()) as usize;

        let mut raw = header.to_vec();
        raw.resize(RESPONSE_HEADER_LEN + declared, 0);
        stream.read_exact(&mut raw[RESPONSE_HEADER_LEN..]).await?;

        let response = decode_response(&raw)?;
        debug!("{:?} answered with code {}", code, response.code);
        Ok(response)
    }
}

fn expect(code: ResponseCode, response: ResponseFrame) -> Result<Vec<u8>, ClientError> {
    if response.code == ResponseCode::Error.as_u16() {
        return Err(ClientError::Server(
            String::from_utf8_lossy(&response.payload).into_owned(),
        ));
    }
    if response.code != code.as_u16() {
        return Err(ClientError::UnexpectedResponse {
            expected: code.as_u16(),
            got: response.code,
        });
    }
    Ok(response.payload)
}
