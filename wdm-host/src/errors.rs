use std::io;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid node id: {0}")]
    InvalidNodeId(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

pub type Result<T> = std::result::Result<T, HostError>;
