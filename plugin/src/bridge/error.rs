use thiserror::Error;

use crate::bridge::ClientHandle;

pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("invalid websocket uri '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("websocket {0} is not connected")]
    NotConnected(ClientHandle),

    #[error("unknown websocket handle {0}")]
    UnknownHandle(ClientHandle),

    #[error("websocket handle space exhausted")]
    HandlesExhausted,

    #[error("invalid bridge configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl BridgeError {
    pub(crate) fn invalid_uri(uri: &str, reason: impl ToString) -> Self {
        Self::InvalidUri {
            uri: uri.to_string(),
            reason: reason.to_string(),
        }
    }
}
