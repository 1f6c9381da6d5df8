use std::io;

use thiserror::Error;

pub type Result<T, E = StompError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum StompError {
    #[error("could not connect to {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("peer closed the connection")]
    PeerClosed,
    #[error("frame cannot be encoded: {0}")]
    InvalidFrame(String),
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("bad script: {0}")]
    Script(String),
    #[error("bad script json: {0}")]
    Json(#[from] serde_json::Error),
}

impl StompError {
    /// True for failures on an established connection, as opposed to
    /// failures to reach the peer or to build a frame.
    pub fn is_io(&self) -> bool {
        matches!(self, StompError::Io(_) | StompError::PeerClosed)
    }
}
