//! OSCore Transport Layer
//!
//! This crate provides the UDP receive loop that feeds an OSC dispatcher:
//! - [`OscSocket`]: one socket, one dedicated thread, cooperative shutdown
//! - [`ReceiveSink`]: the buffer + parse entry point the loop drives

pub mod error;
pub mod socket;
pub mod traits;

pub use error::{Result, TransportError};
pub use socket::{OscSocket, SocketConfig};
pub use traits::ReceiveSink;
