//! Dispatch of received packets to registered methods

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::address_space::{AddressSpace, Method};
use crate::parser::OscParser;
use crate::Result;

/// Default receive buffer size in bytes
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Owns the receive buffer and routes each parsed message to its methods.
///
/// The address space sits behind a mutex so methods can be registered from any
/// thread while the receive thread dispatches. The lock is never held while a
/// method runs, so methods may themselves register or remove methods.
pub struct OscServer {
    parser: OscParser,
    address_space: Arc<Mutex<AddressSpace>>,
    matched: Vec<Method>,
    pending: Vec<Method>,
}

impl Default for OscServer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

impl OscServer {
    pub fn new(buffer_size: usize) -> Self {
        Self::with_address_space(buffer_size, Arc::new(Mutex::new(AddressSpace::new())))
    }

    /// Create a server dispatching into an existing, possibly shared, address space
    pub fn with_address_space(buffer_size: usize, address_space: Arc<Mutex<AddressSpace>>) -> Self {
        Self {
            parser: OscParser::new(buffer_size),
            address_space,
            matched: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Shared handle to the address space
    pub fn address_space(&self) -> Arc<Mutex<AddressSpace>> {
        self.address_space.clone()
    }

    pub fn try_add_method(&self, address: &str, method: Method) -> Result<bool> {
        self.address_space.lock().try_add_method(address, method)
    }

    pub fn remove_method(&self, address: &str, method: &Method) -> bool {
        self.address_space.lock().remove_method(address, method)
    }

    pub fn remove_address_method(&self, address: &str) -> bool {
        self.address_space.lock().remove_address_method(address)
    }

    pub fn buffer_mut(&mut self) -> &mut [u8] {
        self.parser.buffer_mut()
    }

    /// Parse the first `len` bytes of the buffer and dispatch every message.
    ///
    /// Returns how many messages were parsed. Malformed packets are logged and
    /// dropped; messages that preceded the fault were still dispatched.
    pub fn parse_buffer(&mut self, len: usize) -> usize {
        let address_space = &self.address_space;
        let matched = &mut self.matched;
        let pending = &mut self.pending;

        let result = self.parser.parse(len, |message| {
            let address = message.address();
            pending.clear();
            {
                let mut space = address_space.lock();
                if let Some(chain) = space.methods(address) {
                    pending.extend(chain.iter().cloned());
                } else if space.try_match_pattern_handler(address, matched) {
                    pending.append(matched);
                }
            }

            if pending.is_empty() {
                trace!("no method registered for {}", address);
                return;
            }
            for method in pending.iter() {
                method.invoke(message);
            }
        });

        match result {
            Ok(count) => count,
            Err(e) => {
                debug!("dropping malformed packet ({} bytes): {}", len, e);
                0
            }
        }
    }
}
