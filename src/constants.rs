//! Tiny-CAN native driver constants
//!
//! This module contains the return codes, status codes, operating modes,
//! command masks and event masks understood by the native Tiny-CAN driver.

// ============================================================================
// Native Return Codes
// ============================================================================

/// Everything OK
pub const ERROR_OK: i32 = 0;
/// Driver not initialized
pub const ERROR_DRIVER_NOT_INITIALIZED: i32 = -1;
/// Invalid parameter
pub const ERROR_INVALID_PARAMETER: i32 = -2;
/// Invalid index
pub const ERROR_INVALID_INDEX: i32 = -3;
/// Invalid CAN channel
pub const ERROR_INVALID_CHANNEL: i32 = -4;
/// General error
pub const ERROR_GENERAL: i32 = -5;
/// Error while writing to FIFO
pub const ERROR_FIFO_WRITE: i32 = -6;
/// Error while writing to buffer
pub const ERROR_BUFFER_WRITE: i32 = -7;
/// Error while reading from FIFO
pub const ERROR_FIFO_READ: i32 = -8;
/// Error while reading from buffer
pub const ERROR_BUFFER_READ: i32 = -9;
/// Variable not found
pub const ERROR_VARIABLE_NOT_FOUND: i32 = -10;
/// Variable not readable
pub const ERROR_VARIABLE_NOT_READABLE: i32 = -11;
/// Variable read buffer exceeded
pub const ERROR_VARIABLE_READ_BUFFER_EXCEEDED: i32 = -12;
/// Variable not writable
pub const ERROR_VARIABLE_NOT_WRITABLE: i32 = -13;
/// String too big
pub const ERROR_STRING_TOO_BIG: i32 = -14;
/// Minimum value underrun
pub const ERROR_MINIMUM_UNDERRUN: i32 = -15;
/// Maximum value exceeded
pub const ERROR_MAXIMUM_EXCEEDED: i32 = -16;
/// Access denied
pub const ERROR_ACCESS_DENIED: i32 = -17;
/// Invalid CAN speed
pub const ERROR_INVALID_CAN_SPEED: i32 = -18;
/// Invalid baud rate
pub const ERROR_INVALID_BAUD_RATE: i32 = -19;
/// Value not set
pub const ERROR_VALUE_NOT_SET: i32 = -20;
/// No connection to the hardware
pub const ERROR_HARDWARE_CONNECTION: i32 = -21;
/// Hardware communication error
pub const ERROR_HARDWARE_COMMUNICATION: i32 = -22;
/// Hardware sent a wrong number of parameters
pub const ERROR_HARDWARE_PARAMETER: i32 = -23;
/// Lack of memory
pub const ERROR_MEMORY_LOW: i32 = -24;
/// Lack of system resources
pub const ERROR_SYSTEM_RESOURCES: i32 = -25;
/// System call returned an error
pub const ERROR_SYSTEM_CALL: i32 = -26;
/// Main thread busy
pub const ERROR_MAIN_THREAD_BUSY: i32 = -27;

// ============================================================================
// Driver Status (TDeviceStatus.DrvStatus)
// ============================================================================

/// Driver library not loaded
pub const DRV_NOT_LOAD: i32 = 0;
/// Driver not initialized
pub const DRV_STATUS_NOT_INIT: i32 = 1;
/// Driver initialized
pub const DRV_STATUS_INIT: i32 = 2;
/// Port not open
pub const DRV_STATUS_PORT_NOT_OPEN: i32 = 3;
/// Port open
pub const DRV_STATUS_PORT_OPEN: i32 = 4;
/// Connection to hardware established
pub const DRV_STATUS_DEVICE_FOUND: i32 = 5;
/// Device opened and initialized
pub const DRV_STATUS_CAN_OPEN: i32 = 6;
/// CAN bus running, transmitter only (unused by current firmware)
pub const DRV_STATUS_CAN_RUN_TX: i32 = 7;
/// CAN bus running
pub const DRV_STATUS_CAN_RUN: i32 = 8;

/// Get human-readable name for a driver status
pub fn driver_status_name(status: i32) -> &'static str {
    match status {
        DRV_NOT_LOAD => "NOT_LOAD",
        DRV_STATUS_NOT_INIT => "NOT_INIT",
        DRV_STATUS_INIT => "INIT",
        DRV_STATUS_PORT_NOT_OPEN => "PORT_NOT_OPEN",
        DRV_STATUS_PORT_OPEN => "PORT_OPEN",
        DRV_STATUS_DEVICE_FOUND => "DEVICE_FOUND",
        DRV_STATUS_CAN_OPEN => "CAN_OPEN",
        DRV_STATUS_CAN_RUN_TX => "CAN_RUN_TX",
        DRV_STATUS_CAN_RUN => "CAN_RUN",
        _ => "UNKNOWN",
    }
}

// ============================================================================
// CAN Controller Status (TDeviceStatus.CanStatus)
// ============================================================================

/// CAN controller OK
pub const CAN_STATUS_OK: u8 = 0;
/// CAN controller reports a CAN error
pub const CAN_STATUS_ERROR: u8 = 1;
/// CAN controller reports error warning
pub const CAN_STATUS_WARNING: u8 = 2;
/// CAN controller reports error passive
pub const CAN_STATUS_PASSIVE: u8 = 3;
/// CAN controller reports bus off
pub const CAN_STATUS_BUS_OFF: u8 = 4;
/// CAN controller status unknown
pub const CAN_STATUS_UNKNOWN: u8 = 5;

/// Get human-readable name for a CAN controller status
pub fn can_status_name(status: u8) -> &'static str {
    match status {
        CAN_STATUS_OK => "OK",
        CAN_STATUS_ERROR => "ERROR",
        CAN_STATUS_WARNING => "WARNING",
        CAN_STATUS_PASSIVE => "PASSIVE",
        CAN_STATUS_BUS_OFF => "BUS_OFF",
        _ => "UNKNOWN",
    }
}

// ============================================================================
// FIFO Status (TDeviceStatus.FifoStatus)
// ============================================================================

/// FIFO OK
pub const FIFO_OK: u8 = 0;
/// FIFO overrun
pub const FIFO_OVERRUN: u8 = 1;
/// FIFO status unknown
pub const FIFO_STATUS_UNKNOWN: u8 = 2;

/// Get human-readable name for a FIFO status
pub fn fifo_status_name(status: u8) -> &'static str {
    match status {
        FIFO_OK => "OK",
        FIFO_OVERRUN => "OVERRUN",
        _ => "UNKNOWN",
    }
}

// ============================================================================
// Device List
// ============================================================================

/// Index value of an adapter that has not been opened
pub const INDEX_INVALID: u32 = 0xFFFF_FFFF;

/// List all FTDI based devices the driver can talk to
pub const DEVICE_LIST_ALL_FTDI: i32 = 0;
/// List Tiny-CAN devices only
pub const DEVICE_LIST_TINY_CAN: i32 = 1;

/// Size of one device list record in bytes
pub const DEVICE_RECORD_SIZE: usize = 363;

// ============================================================================
// Operating Modes (CanSetMode can_op_mode)
// ============================================================================

/// Keep the current state
pub const OP_CAN_NO_CHANGE: u8 = 0;
/// Start the CAN bus
pub const OP_CAN_START: u8 = 1;
/// Stop the CAN bus
pub const OP_CAN_STOP: u8 = 2;
/// Reset the CAN controller (clears bus off)
pub const OP_CAN_RESET: u8 = 3;
/// Start the CAN bus in listen-only mode
pub const OP_CAN_START_LOM: u8 = 4;
/// Start the CAN bus with automatic retransmission disabled
pub const OP_CAN_START_NO_RETRANS: u8 = 5;

// ============================================================================
// Clear Commands (CanSetMode can_command)
// ============================================================================

/// No command
pub const CAN_CMD_NONE: u16 = 0x0000;
/// Clear receive overrun
pub const CAN_CMD_RXD_OVERRUN_CLEAR: u16 = 0x0001;
/// Clear receive FIFOs
pub const CAN_CMD_RXD_FIFOS_CLEAR: u16 = 0x0002;
/// Clear transmit overrun
pub const CAN_CMD_TXD_OVERRUN_CLEAR: u16 = 0x0004;
/// Clear transmit FIFOs
pub const CAN_CMD_TXD_FIFOS_CLEAR: u16 = 0x0008;
/// Clear hardware filters
pub const CAN_CMD_HW_FILTER_CLEAR: u16 = 0x0010;
/// Clear software filters
pub const CAN_CMD_SW_FILTER_CLEAR: u16 = 0x0020;
/// Clear transmit buffers
pub const CAN_CMD_TXD_PUFFERS_CLEAR: u16 = 0x0040;
/// Clear FIFOs, filters, buffers and error counters
pub const CAN_CMD_ALL_CLEAR: u16 = 0x0FFF;

// ============================================================================
// Event Masks (CanSetEvents)
// ============================================================================

/// Enable plug & play events
pub const EVENT_ENABLE_PNP_CHANGE: u16 = 0x0001;
/// Enable status change events
pub const EVENT_ENABLE_STATUS_CHANGE: u16 = 0x0002;
/// Enable receive events for filter messages
pub const EVENT_ENABLE_RX_FILTER_MESSAGES: u16 = 0x0004;
/// Enable receive events for messages
pub const EVENT_ENABLE_RX_MESSAGES: u16 = 0x0008;
/// Enable all events
pub const EVENT_ENABLE_ALL: u16 = 0x00FF;
/// Disable plug & play events
pub const EVENT_DISABLE_PNP_CHANGE: u16 = 0x0100;
/// Disable status change events
pub const EVENT_DISABLE_STATUS_CHANGE: u16 = 0x0200;
/// Disable receive events for filter messages
pub const EVENT_DISABLE_RX_FILTER_MESSAGES: u16 = 0x0400;
/// Disable receive events for messages
pub const EVENT_DISABLE_RX_MESSAGES: u16 = 0x0800;
/// Disable all events
pub const EVENT_DISABLE_ALL: u16 = 0xFF00;

// ============================================================================
// Frame Flags (TCanMsg.Flags)
// ============================================================================

/// Data length nibble
pub const MSG_FLAG_LENGTH_MASK: u32 = 0x0000_000F;
/// Remote transmission request, as set by the host for transmission
pub const MSG_FLAG_RTR: u32 = 0x0000_0040;
/// Extended frame format, as set by the host for transmission
pub const MSG_FLAG_EFF: u32 = 0x0000_0080;
/// Extended frame format marker, as set by the driver on received frames
pub const MSG_FLAG_RX_EFF: u32 = 0x0001_0000;
/// Remote transmission request marker, as set by the driver on received frames
pub const MSG_FLAG_RX_RTR: u32 = 0x0002_0000;
/// Reserved, must be zero
pub const MSG_FLAG_RESERVED: u32 = 0x0004_0000;
/// Frame was transmitted by this adapter and echoed into the receive queue
pub const MSG_FLAG_TXD: u32 = 0x0008_0000;

// ============================================================================
// Payload and Layout
// ============================================================================

/// Maximum payload length of a classic CAN frame
pub const CAN_MAX_DLEN: usize = 8;

/// Size of a native frame record: id (4) + flags (4) + data (8) + sec (4) + usec (4)
pub const NATIVE_MSG_SIZE: usize = 24;
