//! Error types for ch341eeprom-core
//!
//! The variants follow the layers an error can originate from: the device
//! catalog and USB device handling, the USB transfers themselves, and the
//! I2C handshake with the EEPROM. Operations that span many transfers wrap
//! the failing error in [`Error::AtOffset`] so the caller can report where
//! the operation stopped.

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    // Device errors
    /// EEPROM part name not present in the catalog
    #[error("unknown EEPROM type: {0}")]
    UnknownChip(String),

    /// No programmer with the expected USB IDs is attached
    #[error("programmer not found: {0}")]
    ProgrammerNotFound(String),

    /// The USB device could not be opened
    #[error("failed to open programmer: {0}")]
    OpenFailed(String),

    /// The USB interface or its endpoints could not be claimed
    #[error("failed to claim interface: {0}")]
    ClaimFailed(String),

    // Transport errors
    /// A bulk transfer failed
    #[error("USB transfer failed: {0}")]
    Transfer(String),

    /// A bulk transfer did not complete within the transport timeout
    #[error("USB transfer timed out")]
    Timeout,

    // Protocol errors
    /// The addressed I2C device did not acknowledge
    #[error("device 0x{0:02X} not acknowledging")]
    Nack(u8),

    /// The chip returned fewer bytes than the transaction requested
    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead {
        /// Bytes the transaction asked for
        expected: usize,
        /// Bytes actually received
        actual: usize,
    },

    // Caller errors
    /// A parameter is outside the range the operation accepts
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// An operation aborted part way through
    #[error("{source} (at offset 0x{offset:05X})")]
    AtOffset {
        /// Byte offset into the EEPROM image where the operation stopped
        offset: u32,
        /// The error that stopped it
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach the offset at which a top-level operation failed
    ///
    /// An error that already carries an offset is returned unchanged.
    pub fn at(self, offset: u32) -> Self {
        match self {
            Error::AtOffset { .. } => self,
            other => Error::AtOffset {
                offset,
                source: Box::new(other),
            },
        }
    }

    /// Offset at which the operation failed, if known
    pub fn offset(&self) -> Option<u32> {
        match self {
            Error::AtOffset { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// The underlying error with any offset wrapper removed
    pub fn root(&self) -> &Error {
        match self {
            Error::AtOffset { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the error came from the USB layer rather than the I2C bus
    pub fn is_transport(&self) -> bool {
        matches!(self.root(), Error::Transfer(_) | Error::Timeout)
    }

    /// Whether the addressed I2C device refused the transaction
    pub fn is_nack(&self) -> bool {
        matches!(self.root(), Error::Nack(_))
    }
}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_wrapping() {
        let err = Error::Nack(0x50).at(0x120);
        assert_eq!(err.offset(), Some(0x120));
        assert!(err.is_nack());
        assert!(!err.is_transport());
        assert_eq!(
            err.to_string(),
            "device 0x50 not acknowledging (at offset 0x00120)"
        );
    }

    #[test]
    fn test_offset_is_not_rewrapped() {
        let err = Error::Timeout.at(0x40).at(0x80);
        assert_eq!(err.offset(), Some(0x40));
        assert!(err.is_transport());
    }

    #[test]
    fn test_plain_error_has_no_offset() {
        let err = Error::ShortRead {
            expected: 31,
            actual: 12,
        };
        assert_eq!(err.offset(), None);
        assert_eq!(err.to_string(), "short read: expected 31 bytes, got 12");
    }
}
