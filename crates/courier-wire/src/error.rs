use thiserror::Error;

/// Errors produced while decoding frames or per-operation payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Fewer bytes than a complete header.
    #[error("frame too short: need at least {needed} bytes, got {got}")]
    FrameTooShort { needed: usize, got: usize },

    /// The header declared more payload bytes than were actually present.
    #[error("payload truncated: declared {declared} bytes, got {got}")]
    PayloadTruncated { declared: usize, got: usize },

    /// A payload had the wrong shape for its operation.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}
