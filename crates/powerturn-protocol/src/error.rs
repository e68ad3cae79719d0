//! Error types for the protocol layer.
//!
//! Each powerturn crate defines its own error enum. A `ProtocolError`
//! always means a framing problem (bytes in, bytes out), never a game-rule
//! problem: rule violations are dropped silently by the host.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust value).
    ///
    /// Common causes: malformed JSON, an unknown `"type"` tag, or a
    /// truncated frame from the transport.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame decoded but is not acceptable at the protocol level,
    /// e.g. it arrived for a connection the host has never seen.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
