//! Transport error types

use std::net::SocketAddr;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransportError>;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to bind {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("socket already disposed")]
    AlreadyDisposed,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
