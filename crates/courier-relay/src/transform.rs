/// Hook over message content on its way through the relay. Implementations
/// can rewrite content at rest (compression, encryption at the store
/// boundary) or hand it through untouched. Only message content passes
/// through here; headers, usernames and public keys never do.
pub trait ContentTransform: Send + Sync {
    /// Applied to content arriving on the send path, before it is stored.
    fn inbound(&self, content: Vec<u8>) -> Vec<u8>;

    /// Applied to stored content on the fetch path, before it is encoded
    /// into the response.
    fn outbound(&self, content: Vec<u8>) -> Vec<u8>;
}

/// Transform that stores and serves content exactly as received.
pub struct Passthrough;

impl ContentTransform for Passthrough {
    fn inbound(&self, content: Vec<u8>) -> Vec<u8> {
        content
    }

    fn outbound(&self, content: Vec<u8>) -> Vec<u8> {
        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_leaves_content_untouched() {
        let content = b"queued as-is".to_vec();
        assert_eq!(Passthrough.inbound(content.clone()), content);
        assert_eq!(Passthrough.outbound(content.clone()), content);
    }
}
