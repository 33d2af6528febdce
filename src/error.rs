//! Error types for mailstand

use std::net::SocketAddr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid message index {index} (store holds {count})")]
    InvalidIndex { index: usize, count: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
