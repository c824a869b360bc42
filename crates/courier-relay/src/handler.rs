//! Per-connection request handling: one bounded read, one decoded request,
//! one response, close.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, error, warn};

use courier_types::{CLIENT_ID_LEN, ClientId};
use courier_wire::{
    CLIENT_ENTRY_LEN, ClientEntry, MessageQueuedAck, MessageRecord, PROTOCOL_VERSION,
    RegisterPayload, RequestCode, RequestFrame, ResponseCode, ResponseFrame, SendMessagePayload,
    WireError, decode_request, encode_response,
};

use crate::relay::Relay;

/// Size of the single request read. A request that does not fit in one
/// buffer is a protocol error by contract.
const READ_BUFFER_SIZE: usize = 1024;

pub(crate) async fn handle_connection(relay: Relay, mut stream: TcpStream) -> anyhow::Result<()> {
    stream.set_nodelay(true)?;

    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let n = stream.read(&mut buf).await?;
    if n == 0 {
        // Peer connected and left without sending anything.
        return Ok(());
    }

    let response = match decode_request(&buf[..n]) {
        Ok(request) => dispatch(&relay, request).await,
        Err(e) => error_response(&e.to_string()),
    };

    stream
        .write_all(&encode_response(
            response.version,
            response.code,
            &response.payload,
        ))
        .await?;
    Ok(())
}

/// Route one decoded request to its operation and shape the outcome into
/// the single response frame this connection gets.
async fn dispatch(relay: &Relay, request: RequestFrame) -> ResponseFrame {
    if request.version != PROTOCOL_VERSION {
        return error_response(&format!(
            "unsupported protocol version {}",
            request.version
        ));
    }

    let Some(code) = RequestCode::from_u16(request.code) else {
        return error_response(&format!("unknown request code {}", request.code));
    };

    debug!("request {:?} from client {}", code, request.client_id);

    // Store work is blocking rusqlite; keep it off the async runtime.
    let relay = relay.clone();
    match tokio::task::spawn_blocking(move || execute(&relay, code, request)).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => error_response(&e.to_string()),
        Err(e) => {
            error!("spawn_blocking join error: {}", e);
            error_response("internal relay error")
        }
    }
}

fn execute(
    relay: &Relay,
    code: RequestCode,
    request: RequestFrame,
) -> anyhow::Result<ResponseFrame> {
    match code {
        RequestCode::Register => {
            let payload = RegisterPayload::parse(&request.payload)?;
            let id = relay
                .registry()
                .register(&payload.username, &payload.public_key)?;
            Ok(response(ResponseCode::RegisterOk, id.as_bytes().to_vec()))
        }
        RequestCode::ListClients => {
            let clients = relay.registry().list_all()?;
            let mut body = Vec::with_capacity(clients.len() * CLIENT_ENTRY_LEN);
            for (id, username) in clients {
                ClientEntry { id, username }.encode_into(&mut body);
            }
            Ok(response(ResponseCode::ClientList, body))
        }
        RequestCode::GetPublicKey => {
            let id = parse_target_id(&request.payload)?;
            let key = relay.registry().get_public_key(&id)?;
            Ok(response(ResponseCode::PublicKey, key))
        }
        RequestCode::SendMessage => {
            let payload = SendMessagePayload::parse(&request.payload)?;
            let content = relay.transform().inbound(payload.content);
            relay
                .mailbox()
                .send(&payload.to, &payload.from, payload.kind, &content)?;
            let ack = MessageQueuedAck::new(payload.to);
            Ok(response(ResponseCode::MessageQueued, ack.encode()))
        }
        RequestCode::FetchMessages => {
            let messages = relay.mailbox().fetch_and_clear(&request.client_id)?;
            let mut body = Vec::new();
            for message in messages {
                let record = MessageRecord {
                    from: message.from,
                    id: MessageRecord::wire_id(message.id),
                    kind: message.kind,
                    content: relay.transform().outbound(message.content),
                };
                record.encode_into(&mut body);
            }
            Ok(response(ResponseCode::Messages, body))
        }
    }
}

/// The 602 payload is the target id; anything past the first 16 bytes is
/// ignored.
fn parse_target_id(payload: &[u8]) -> Result<ClientId, WireError> {
    if payload.len() < CLIENT_ID_LEN {
        return Err(WireError::InvalidPayload(format!(
            "client id payload must be at least {} bytes, got {}",
            CLIENT_ID_LEN,
            payload.len()
        )));
    }
    Ok(ClientId::from_bytes(
        payload[..CLIENT_ID_LEN].try_into().unwrap(),
    ))
}

fn response(code: ResponseCode, payload: Vec<u8>) -> ResponseFrame {
    ResponseFrame {
        version: PROTOCOL_VERSION,
        code: code.as_u16(),
        payload,
    }
}

fn error_response(text: &str) -> ResponseFrame {
    warn!("request failed: {}", text);
    response(ResponseCode::Error, text.as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use courier_db::{ClientRegistry, Database, MailboxStore};
    use courier_types::PUBLIC_KEY_LEN;

    fn test_relay() -> Relay {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let registry = ClientRegistry::new(db.clone());
        let mailbox = MailboxStore::new(db, registry.clone());
        Relay::new(registry, mailbox)
    }

    fn request(code: u16, payload: Vec<u8>) -> RequestFrame {
        RequestFrame {
            client_id: ClientId::ZERO,
            version: PROTOCOL_VERSION,
            code,
            payload,
        }
    }

    #[tokio::test]
    async fn rejects_unsupported_version() {
        let relay = test_relay();
        let mut req = request(RequestCode::ListClients.as_u16(), vec![]);
        req.version = 3;

        let resp = dispatch(&relay, req).await;
        assert_eq!(resp.code, ResponseCode::Error.as_u16());
        let text = String::from_utf8(resp.payload).unwrap();
        assert!(text.contains("unsupported protocol version"));
    }

    #[tokio::test]
    async fn rejects_unknown_request_code() {
        let relay = test_relay();
        let resp = dispatch(&relay, request(700, vec![])).await;

        assert_eq!(resp.code, ResponseCode::Error.as_u16());
        let text = String::from_utf8(resp.payload).unwrap();
        assert!(text.contains("unknown request code 700"));
    }

    #[tokio::test]
    async fn register_answers_with_a_fresh_id() {
        let relay = test_relay();
        let payload = RegisterPayload::new("alice", vec![7u8; PUBLIC_KEY_LEN]).unwrap();

        let req = request(RequestCode::Register.as_u16(), payload.encode());
        let resp = dispatch(&relay, req).await;
        assert_eq!(resp.code, ResponseCode::RegisterOk.as_u16());
        assert_eq!(resp.payload.len(), CLIENT_ID_LEN);
    }

    #[tokio::test]
    async fn get_public_key_rejects_short_payload() {
        let relay = test_relay();
        let req = request(RequestCode::GetPublicKey.as_u16(), vec![1, 2, 3]);
        let resp = dispatch(&relay, req).await;
        assert_eq!(resp.code, ResponseCode::Error.as_u16());
    }

    #[tokio::test]
    async fn get_public_key_ignores_trailing_payload_bytes() {
        let relay = test_relay();
        let key = vec![9u8; PUBLIC_KEY_LEN];
        let reg = RegisterPayload::new("alice", key.clone()).unwrap();
        let id = dispatch(&relay, request(RequestCode::Register.as_u16(), reg.encode()))
            .await
            .payload;

        let mut payload = id;
        payload.extend_from_slice(b"junk");
        let resp = dispatch(&relay, request(RequestCode::GetPublicKey.as_u16(), payload)).await;

        assert_eq!(resp.code, ResponseCode::PublicKey.as_u16());
        assert_eq!(resp.payload, key);
    }

    #[tokio::test]
    async fn empty_registry_lists_as_empty_payload() {
        let relay = test_relay();
        let resp = dispatch(&relay, request(RequestCode::ListClients.as_u16(), vec![])).await;

        assert_eq!(resp.code, ResponseCode::ClientList.as_u16());
        assert!(resp.payload.is_empty());
    }
}
