//! OSCore Core
//!
//! Receive-side building blocks for Open Sound Control.
//!
//! This crate provides:
//! - Zero-copy element reads over a shared receive buffer ([`OscMessage`])
//! - NTP timetags ([`Timestamp`])
//! - Address classification ([`address::classify`])
//! - Literal and pattern method registration ([`AddressSpace`])
//! - Packet framing ([`OscParser`]) and dispatch ([`OscServer`])

pub mod address;
pub mod address_space;
pub mod error;
pub mod message;
pub mod parser;
pub mod pattern;
pub mod server;
pub mod time;
pub mod types;

pub use address::AddressType;
pub use address_space::{AddressSpace, Method, MethodChain};
pub use error::{Error, Result};
pub use message::OscMessage;
pub use parser::OscParser;
pub use pattern::Matcher;
pub use server::OscServer;
pub use time::Timestamp;
pub use types::*;

/// Default OSC listening port
pub const DEFAULT_PORT: u16 = 9000;
