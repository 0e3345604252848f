// error.rs - Errors surfaced at the engine boundary
//
// The simulation itself is total; only the background context and the wire
// format can fail.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The background context needs a running tokio runtime
    #[error("no tokio runtime available to host the engine")]
    NoRuntime,

    /// The engine has been terminated; the message had no effect
    #[error("engine terminated")]
    Closed,

    /// Inbound message could not be decoded
    #[error("malformed message: {0}")]
    Decode(#[from] serde_json::Error),

    /// IO error on a transport stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration value out of range
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
