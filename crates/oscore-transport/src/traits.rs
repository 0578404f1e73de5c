//! Receive-side trait definitions

use oscore_core::OscServer;

/// Consumer of datagrams written by the receive loop.
///
/// The loop receives straight into [`buffer_mut`](ReceiveSink::buffer_mut) and
/// then reports how many bytes arrived. Both calls happen on the loop's thread,
/// one datagram at a time.
pub trait ReceiveSink: Send + 'static {
    /// Buffer the next datagram is written into
    fn buffer_mut(&mut self) -> &mut [u8];

    /// Handle the first `len` bytes of the buffer
    fn parse_buffer(&mut self, len: usize);
}

impl ReceiveSink for OscServer {
    fn buffer_mut(&mut self) -> &mut [u8] {
        OscServer::buffer_mut(self)
    }

    fn parse_buffer(&mut self, len: usize) {
        OscServer::parse_buffer(self, len);
    }
}
