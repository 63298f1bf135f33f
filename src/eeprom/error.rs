// Licensed under the Apache-2.0 license

//! Error taxonomy shared by the engine and the thread-safe handle.

use core::fmt;

use super::common::ChipModel;

/// Errors returned by EEPROM operations.
///
/// `E` is the error type of the underlying bus.
#[derive(Debug, thiserror::Error)]
pub enum Error<E> {
    #[error("not initialized")]
    NotInitialized,
    #[error("already initialized")]
    AlreadyInitialized,
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("address range {address:#x}+{len} exceeds capacity of {capacity} bytes")]
    InvalidAddress {
        address: u32,
        len: usize,
        capacity: u32,
    },
    #[error("{0:?} uses block addressing, not supported")]
    NotSupported(ChipModel),
    #[error("failed to open bus device: {0:?}")]
    Open(E),
    #[error("bus operation failed: {0:?}")]
    Bus(E),
    #[error("device not responding")]
    DeviceNotResponding,
    #[error("operation not allowed: {0}")]
    OperationNotAllowed(&'static str),
    #[error("unexpected exception")]
    UnexpectedException,
}

impl<E> Error<E> {
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::NotInitialized => ErrorCode::NotInitialized,
            Error::AlreadyInitialized => ErrorCode::AlreadyInitialized,
            Error::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Error::InvalidAddress { .. } => ErrorCode::InvalidAddress,
            Error::NotSupported(_) => ErrorCode::NotSupported,
            Error::Open(_) => ErrorCode::FileOperationFailed,
            Error::Bus(_) => ErrorCode::BusOperationFailed,
            Error::DeviceNotResponding => ErrorCode::DeviceNotResponding,
            Error::OperationNotAllowed(_) => ErrorCode::OperationNotAllowed,
            Error::UnexpectedException => ErrorCode::UnexpectedException,
        }
    }

    /// Failures reported by the OS bus driver are `Linux`, the rest `Internal`.
    #[must_use]
    pub fn error_source(&self) -> ErrorSource {
        match self {
            Error::Open(_) | Error::Bus(_) => ErrorSource::Linux,
            _ => ErrorSource::Internal,
        }
    }

    #[must_use]
    pub fn status(&self) -> ErrorStatus {
        ErrorStatus {
            source: self.error_source(),
            code: self.code(),
        }
    }
}

impl<E: fmt::Debug> embedded_io::Error for Error<E> {
    fn kind(&self) -> embedded_io::ErrorKind {
        use embedded_io::ErrorKind;

        match self {
            Error::InvalidArgument(_) | Error::InvalidAddress { .. } => ErrorKind::InvalidInput,
            Error::NotSupported(_) => ErrorKind::Unsupported,
            Error::DeviceNotResponding => ErrorKind::TimedOut,
            Error::OperationNotAllowed(_) => ErrorKind::PermissionDenied,
            Error::NotInitialized => ErrorKind::NotConnected,
            Error::Open(_) => ErrorKind::NotFound,
            _ => ErrorKind::Other,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ErrorSource {
    #[default]
    Internal,
    Linux,
}

/// Stable numeric error codes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    #[default]
    NoError = 0,
    NotInitialized = 1,
    AlreadyInitialized = 2,
    InvalidArgument = 3,
    FileOperationFailed = 4,
    BusOperationFailed = 5,
    NotSupported = 6,
    DeviceNotResponding = 7,
    UnexpectedException = 8,
    InvalidAddress = 9,
    OperationNotAllowed = 10,
}

impl ErrorCode {
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            ErrorCode::NoError => "No error",
            ErrorCode::NotInitialized => "Not initialized",
            ErrorCode::AlreadyInitialized => "Already initialized",
            ErrorCode::InvalidArgument => "Bad argument",
            ErrorCode::FileOperationFailed => "File operation failed",
            ErrorCode::BusOperationFailed => "I2C operation failed",
            ErrorCode::NotSupported => "EEPROM not supported",
            ErrorCode::DeviceNotResponding => "EEPROM not responding",
            ErrorCode::UnexpectedException => "Unexpected exception",
            ErrorCode::InvalidAddress => "Invalid address",
            ErrorCode::OperationNotAllowed => "Operation not allowed",
        }
    }

    /// Inverse of `code as i32`.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Option<Self> {
        Some(match raw {
            0 => ErrorCode::NoError,
            1 => ErrorCode::NotInitialized,
            2 => ErrorCode::AlreadyInitialized,
            3 => ErrorCode::InvalidArgument,
            4 => ErrorCode::FileOperationFailed,
            5 => ErrorCode::BusOperationFailed,
            6 => ErrorCode::NotSupported,
            7 => ErrorCode::DeviceNotResponding,
            8 => ErrorCode::UnexpectedException,
            9 => ErrorCode::InvalidAddress,
            10 => ErrorCode::OperationNotAllowed,
            _ => return None,
        })
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Text for a raw error code, `"Undefined error"` for unknown values.
#[must_use]
pub fn error_string(raw: i32) -> &'static str {
    ErrorCode::from_raw(raw).map_or("Undefined error", ErrorCode::description)
}

/// Latched error record: where it came from and what it was.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorStatus {
    pub source: ErrorSource,
    pub code: ErrorCode,
}

impl ErrorStatus {
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.code != ErrorCode::NoError
    }
}
