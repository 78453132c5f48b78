//! Per-operation state

use crate::error::Error;

/// Lifecycle of one top-level operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, nothing sent yet
    Idle,
    /// Frames are being exchanged
    InProgress,
    /// Every byte was transferred
    Done,
    /// Aborted by an error
    Failed,
}

/// Progress through the image of one read, write or erase
///
/// Owned by the operation that creates it and dropped when it returns.
/// The offset only moves forward.
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    offset: u32,
    remaining: usize,
    page_end: Option<u32>,
}

impl Session {
    /// Start tracking `len` bytes from offset 0
    pub fn new(len: usize) -> Self {
        Self {
            state: SessionState::Idle,
            offset: 0,
            remaining: len,
            page_end: None,
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Offset of the next byte to transfer
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Bytes still to transfer
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// End of the page the current write addresses, if writing
    pub fn page_end(&self) -> Option<u32> {
        self.page_end
    }

    /// Enter the in-progress state
    pub fn begin(&mut self) {
        debug_assert_eq!(self.state, SessionState::Idle);
        self.state = SessionState::InProgress;
    }

    /// Record the page the next write targets
    pub fn set_page_end(&mut self, end: u32) {
        self.page_end = Some(end);
    }

    /// Account for `n` transferred bytes
    pub fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.remaining);
        self.offset += n as u32;
        self.remaining -= n;
    }

    /// Mark the operation complete
    pub fn finish(&mut self) {
        debug_assert_eq!(self.remaining, 0);
        self.state = SessionState::Done;
    }

    /// Mark the operation failed and tag `err` with the current offset
    pub fn fail(&mut self, err: Error) -> Error {
        self.state = SessionState::Failed;
        log::debug!("Operation aborted at offset 0x{:05X}: {}", self.offset, err);
        err.at(self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let mut session = Session::new(64);
        assert_eq!(session.state(), SessionState::Idle);
        session.begin();
        session.advance(32);
        assert_eq!(session.offset(), 32);
        assert_eq!(session.remaining(), 32);
        session.advance(32);
        session.finish();
        assert_eq!(session.state(), SessionState::Done);
    }

    #[test]
    fn test_session_failure_carries_offset() {
        let mut session = Session::new(64);
        session.begin();
        session.advance(16);
        let err = session.fail(Error::Timeout);
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(err.offset(), Some(16));
        assert!(err.is_transport());
    }
}
