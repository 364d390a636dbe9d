//! Error types for the Tiny-CAN library
//!
//! Every native return code passes through [`classify`], which turns it into
//! a [`TinyCanError::Driver`] carrying the decoded [`DriverErrorKind`], the raw
//! code and a message naming the call that failed.

use std::fmt;

use thiserror::Error;

use crate::constants::*;

/// Result type alias for Tiny-CAN operations
pub type Result<T> = std::result::Result<T, TinyCanError>;

/// Kind of failure reported by the native driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverErrorKind {
    DriverNotInitialized,
    InvalidParameter,
    InvalidIndex,
    InvalidChannel,
    /// General error, also used for any code the driver does not document
    General,
    FifoWrite,
    BufferWrite,
    FifoRead,
    BufferRead,
    VariableNotFound,
    VariableNotReadable,
    VariableReadBufferExceeded,
    VariableNotWritable,
    StringTooBig,
    MinimumUnderrun,
    MaximumExceeded,
    AccessDenied,
    InvalidCanSpeed,
    InvalidBaudRate,
    ValueNotSet,
    HardwareConnection,
    HardwareCommunication,
    HardwareParameter,
    MemoryLow,
    SystemResources,
    SystemCall,
    MainThreadBusy,
}

impl DriverErrorKind {
    /// Decode a native return code. Returns `None` for [`ERROR_OK`].
    pub fn from_code(code: i32) -> Option<Self> {
        use DriverErrorKind::*;

        let kind = match code {
            ERROR_OK => return None,
            ERROR_DRIVER_NOT_INITIALIZED => DriverNotInitialized,
            ERROR_INVALID_PARAMETER => InvalidParameter,
            ERROR_INVALID_INDEX => InvalidIndex,
            ERROR_INVALID_CHANNEL => InvalidChannel,
            ERROR_GENERAL => General,
            ERROR_FIFO_WRITE => FifoWrite,
            ERROR_BUFFER_WRITE => BufferWrite,
            ERROR_FIFO_READ => FifoRead,
            ERROR_BUFFER_READ => BufferRead,
            ERROR_VARIABLE_NOT_FOUND => VariableNotFound,
            ERROR_VARIABLE_NOT_READABLE => VariableNotReadable,
            ERROR_VARIABLE_READ_BUFFER_EXCEEDED => VariableReadBufferExceeded,
            ERROR_VARIABLE_NOT_WRITABLE => VariableNotWritable,
            ERROR_STRING_TOO_BIG => StringTooBig,
            ERROR_MINIMUM_UNDERRUN => MinimumUnderrun,
            ERROR_MAXIMUM_EXCEEDED => MaximumExceeded,
            ERROR_ACCESS_DENIED => AccessDenied,
            ERROR_INVALID_CAN_SPEED => InvalidCanSpeed,
            ERROR_INVALID_BAUD_RATE => InvalidBaudRate,
            ERROR_VALUE_NOT_SET => ValueNotSet,
            ERROR_HARDWARE_CONNECTION => HardwareConnection,
            ERROR_HARDWARE_COMMUNICATION => HardwareCommunication,
            ERROR_HARDWARE_PARAMETER => HardwareParameter,
            ERROR_MEMORY_LOW => MemoryLow,
            ERROR_SYSTEM_RESOURCES => SystemResources,
            ERROR_SYSTEM_CALL => SystemCall,
            ERROR_MAIN_THREAD_BUSY => MainThreadBusy,
            _ => General,
        };
        Some(kind)
    }

    /// Get a short description of this kind
    pub fn description(&self) -> &'static str {
        use DriverErrorKind::*;

        match self {
            DriverNotInitialized => "driver not initialized",
            InvalidParameter => "invalid parameter",
            InvalidIndex => "invalid index",
            InvalidChannel => "invalid CAN channel",
            General => "general error",
            FifoWrite => "error writing FIFO",
            BufferWrite => "error writing buffer",
            FifoRead => "error reading FIFO",
            BufferRead => "error reading buffer",
            VariableNotFound => "variable not found",
            VariableNotReadable => "variable not readable",
            VariableReadBufferExceeded => "variable read buffer exceeded",
            VariableNotWritable => "variable not writable",
            StringTooBig => "string too big",
            MinimumUnderrun => "minimum value underrun",
            MaximumExceeded => "maximum value exceeded",
            AccessDenied => "access denied",
            InvalidCanSpeed => "invalid CAN speed",
            InvalidBaudRate => "invalid baud rate",
            ValueNotSet => "value not set",
            HardwareConnection => "no connection to hardware",
            HardwareCommunication => "hardware communication error",
            HardwareParameter => "hardware sent wrong number of parameters",
            MemoryLow => "out of memory",
            SystemResources => "out of system resources",
            SystemCall => "system call failed",
            MainThreadBusy => "main thread busy",
        }
    }
}

impl fmt::Display for DriverErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Error types for Tiny-CAN operations
#[derive(Error, Debug)]
pub enum TinyCanError {
    /// A native driver call returned an error code
    #[error("{context}: {kind} (RC = {code})")]
    Driver {
        kind: DriverErrorKind,
        code: i32,
        context: String,
    },

    /// The receive queue is empty
    #[error("No message available")]
    NoMessage,

    /// The device list is shorter than the requested record
    #[error("Malformed descriptor for adapter {record}: expected {expected} bytes, got {actual}")]
    MalformedDescriptor {
        record: usize,
        expected: usize,
        actual: usize,
    },

    /// Frame payload exceeds 8 bytes
    #[error("Payload too long: {length} bytes (max 8)")]
    PayloadTooLong { length: usize },

    /// No enumerated adapter carries the requested serial number
    #[error("No adapter with serial number {0}")]
    AdapterNotFound(String),
}

impl TinyCanError {
    /// Check if this is the empty receive queue signal
    pub fn is_no_message(&self) -> bool {
        matches!(self, TinyCanError::NoMessage)
    }

    /// Get the driver error kind, if this error came from the driver
    pub fn driver_kind(&self) -> Option<DriverErrorKind> {
        match self {
            TinyCanError::Driver { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Get the raw native return code, if this error came from the driver
    pub fn code(&self) -> Option<i32> {
        match self {
            TinyCanError::Driver { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Check if the hardware connection or communication failed
    pub fn is_hardware_error(&self) -> bool {
        matches!(
            self.driver_kind(),
            Some(
                DriverErrorKind::HardwareConnection
                    | DriverErrorKind::HardwareCommunication
                    | DriverErrorKind::HardwareParameter
            )
        )
    }
}

/// Translate a native return code.
///
/// `ERROR_OK` yields `Ok(())`; any other code yields [`TinyCanError::Driver`].
/// The context message is only built on failure.
pub fn classify<F>(code: i32, context: F) -> Result<()>
where
    F: FnOnce() -> String,
{
    match DriverErrorKind::from_code(code) {
        None => Ok(()),
        Some(kind) => Err(TinyCanError::Driver {
            kind,
            code,
            context: context(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const NAMED: [(i32, DriverErrorKind); 27] = [
        (-1, DriverErrorKind::DriverNotInitialized),
        (-2, DriverErrorKind::InvalidParameter),
        (-3, DriverErrorKind::InvalidIndex),
        (-4, DriverErrorKind::InvalidChannel),
        (-5, DriverErrorKind::General),
        (-6, DriverErrorKind::FifoWrite),
        (-7, DriverErrorKind::BufferWrite),
        (-8, DriverErrorKind::FifoRead),
        (-9, DriverErrorKind::BufferRead),
        (-10, DriverErrorKind::VariableNotFound),
        (-11, DriverErrorKind::VariableNotReadable),
        (-12, DriverErrorKind::VariableReadBufferExceeded),
        (-13, DriverErrorKind::VariableNotWritable),
        (-14, DriverErrorKind::StringTooBig),
        (-15, DriverErrorKind::MinimumUnderrun),
        (-16, DriverErrorKind::MaximumExceeded),
        (-17, DriverErrorKind::AccessDenied),
        (-18, DriverErrorKind::InvalidCanSpeed),
        (-19, DriverErrorKind::InvalidBaudRate),
        (-20, DriverErrorKind::ValueNotSet),
        (-21, DriverErrorKind::HardwareConnection),
        (-22, DriverErrorKind::HardwareCommunication),
        (-23, DriverErrorKind::HardwareParameter),
        (-24, DriverErrorKind::MemoryLow),
        (-25, DriverErrorKind::SystemResources),
        (-26, DriverErrorKind::SystemCall),
        (-27, DriverErrorKind::MainThreadBusy),
    ];

    #[test]
    fn test_classify_ok() {
        assert!(classify(ERROR_OK, || unreachable!()).is_ok());
    }

    #[test]
    fn test_classify_named_codes() {
        for (code, expected) in NAMED {
            let err = classify(code, || format!("call {code}")).unwrap_err();
            assert_eq!(err.driver_kind(), Some(expected), "code {code}");
            assert_eq!(err.code(), Some(code));
        }
    }

    #[test]
    fn test_named_kinds_are_distinct() {
        let kinds: HashSet<_> = (-27..=-1)
            .map(|code| DriverErrorKind::from_code(code).unwrap())
            .collect();
        assert_eq!(kinds.len(), 27);
    }

    #[test]
    fn test_classify_out_of_range() {
        let err = classify(-28, || "open".to_string()).unwrap_err();
        assert_eq!(err.driver_kind(), Some(DriverErrorKind::General));
        assert_eq!(err.code(), Some(-28));

        let err = classify(i32::MIN, || "open".to_string()).unwrap_err();
        assert_eq!(err.code(), Some(i32::MIN));
    }

    #[test]
    fn test_error_message_names_call_and_code() {
        let err = classify(ERROR_INVALID_CAN_SPEED, || "Can't set bitrate".into()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Can't set bitrate: invalid CAN speed (RC = -18)"
        );
    }

    #[test]
    fn test_error_predicates() {
        assert!(TinyCanError::NoMessage.is_no_message());
        assert_eq!(TinyCanError::NoMessage.code(), None);

        let err = classify(ERROR_HARDWARE_CONNECTION, String::new).unwrap_err();
        assert!(err.is_hardware_error());
        assert!(!err.is_no_message());
    }
}
