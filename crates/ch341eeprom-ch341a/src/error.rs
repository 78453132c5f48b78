//! Error types for the CH341A transport

use ch341eeprom_core::error::Error as CoreError;
use nusb::transfer::TransferError;

/// Result type for CH341A operations
pub type Result<T> = std::result::Result<T, Ch341aError>;

/// Errors that can occur when using the CH341A
#[derive(Debug, thiserror::Error)]
pub enum Ch341aError {
    /// No device with the CH341A IDs at the requested index
    #[error("CH341A device not found (VID:1a86 PID:5512)")]
    DeviceNotFound,
    /// Failed to open device
    #[error("failed to open CH341A: {0}")]
    OpenFailed(String),
    /// Failed to claim the interface or its endpoints
    #[error("failed to claim interface: {0}")]
    ClaimFailed(String),
    /// USB transfer failed
    #[error("USB transfer failed: {0}")]
    TransferFailed(String),
    /// The transfer did not complete in time
    #[error("timeout during USB transfer")]
    Timeout,
}

impl From<TransferError> for Ch341aError {
    fn from(e: TransferError) -> Self {
        match e {
            // transfer_blocking cancels a transfer that runs out of time
            TransferError::Cancelled => Ch341aError::Timeout,
            other => Ch341aError::TransferFailed(other.to_string()),
        }
    }
}

impl From<Ch341aError> for CoreError {
    fn from(e: Ch341aError) -> Self {
        match e {
            Ch341aError::DeviceNotFound => {
                CoreError::ProgrammerNotFound("CH341A (VID:1a86 PID:5512)".into())
            }
            Ch341aError::OpenFailed(msg) => CoreError::OpenFailed(msg),
            Ch341aError::ClaimFailed(msg) => CoreError::ClaimFailed(msg),
            Ch341aError::TransferFailed(msg) => CoreError::Transfer(msg),
            Ch341aError::Timeout => CoreError::Timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_maps_to_core_timeout() {
        let err: CoreError = Ch341aError::from(TransferError::Cancelled).into();
        assert!(matches!(err, CoreError::Timeout));
        assert!(err.is_transport());
    }

    #[test]
    fn test_stall_is_transfer_failure() {
        let err: CoreError = Ch341aError::from(TransferError::Stall).into();
        assert!(matches!(err, CoreError::Transfer(_)));
    }

    #[test]
    fn test_not_found_is_device_error() {
        let err: CoreError = Ch341aError::DeviceNotFound.into();
        assert!(matches!(err, CoreError::ProgrammerNotFound(_)));
        assert!(!err.is_transport());
    }
}
