/// Errors raised while decoding a client frame.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("room name must not be empty")]
    EmptyRoom,
}
