//! The accept loop. One task per connection; a failing connection never
//! takes the loop down.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use courier_db::{ClientRegistry, MailboxStore};

use crate::handler;
use crate::transform::{ContentTransform, Passthrough};

/// Shared state for all relay connections.
#[derive(Clone)]
pub struct Relay {
    inner: Arc<RelayInner>,
}

struct RelayInner {
    registry: ClientRegistry,
    mailbox: MailboxStore,
    transform: Arc<dyn ContentTransform>,
}

impl Relay {
    pub fn new(registry: ClientRegistry, mailbox: MailboxStore) -> Self {
        Self::with_transform(registry, mailbox, Arc::new(Passthrough))
    }

    /// Build a relay with a content transform hooked into the send and
    /// fetch paths.
    pub fn with_transform(
        registry: ClientRegistry,
        mailbox: MailboxStore,
        transform: Arc<dyn ContentTransform>,
    ) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                registry,
                mailbox,
                transform,
            }),
        }
    }

    pub(crate) fn registry(&self) -> &ClientRegistry {
        &self.inner.registry
    }

    pub(crate) fn mailbox(&self) -> &MailboxStore {
        &self.inner.mailbox
    }

    pub(crate) fn transform(&self) -> &dyn ContentTransform {
        self.inner.transform.as_ref()
    }

    /// Run the accept loop. Runs until the task is cancelled.
    pub async fn run(self, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    info!("new connection from {}", addr);
                    let relay = self.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handler::handle_connection(relay, stream).await {
                            warn!("connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("accept error: {}", e);
                }
            }
        }
    }
}
