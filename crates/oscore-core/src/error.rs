//! Error types for OSCore

use thiserror::Error;

/// Result type alias for OSCore operations
pub type Result<T> = std::result::Result<T, Error>;

/// OSCore error types
#[derive(Error, Debug)]
pub enum Error {
    /// Address pattern could not be compiled into a matcher
    #[error("invalid pattern {pattern}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex_lite::Error,
    },

    /// Packet does not follow the OSC framing rules
    #[error("malformed packet: {0}")]
    Malformed(String),

    /// Packet claims more bytes than were received
    #[error("buffer too small: need {needed} bytes, have {have}")]
    BufferTooSmall { needed: usize, have: usize },

    /// Type tag character outside the supported set
    #[error("unknown type tag: {0:?}")]
    UnknownTypeTag(char),
}
