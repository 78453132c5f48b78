//! Transport layer abstraction for CH341A communication
//!
//! The chip is driven through one bulk-out endpoint that accepts command
//! packets and one bulk-in endpoint that returns response bytes. Both calls
//! block until the transfer completes or the backend's fixed timeout
//! expires. Implementations never retry: a failed transfer is reported as
//! [`Error::Transfer`](crate::Error::Transfer) or
//! [`Error::Timeout`](crate::Error::Timeout) and the caller abandons the
//! operation in progress.

use crate::error::Result;

/// Maximum size of one bulk packet, in either direction
pub const PACKET_LENGTH: usize = 32;

/// Synchronous request/response primitive over the chip's bulk endpoints
pub trait Transport {
    /// Send one command packet on the bulk-out endpoint
    ///
    /// Returns the number of bytes the device accepted.
    fn send(&mut self, data: &[u8]) -> Result<usize>;

    /// Receive up to `max_len` bytes from the bulk-in endpoint
    ///
    /// May return fewer bytes than requested; detecting a short read is the
    /// caller's job because only the caller knows how many bytes the
    /// command it sent should produce.
    fn receive(&mut self, max_len: usize) -> Result<Vec<u8>>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, data: &[u8]) -> Result<usize> {
        (**self).send(data)
    }

    fn receive(&mut self, max_len: usize) -> Result<Vec<u8>> {
        (**self).receive(max_len)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, data: &[u8]) -> Result<usize> {
        (**self).send(data)
    }

    fn receive(&mut self, max_len: usize) -> Result<Vec<u8>> {
        (**self).receive(max_len)
    }
}
