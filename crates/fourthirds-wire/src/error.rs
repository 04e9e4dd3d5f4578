//! Error types for fourthirds-wire.

use thiserror::Error;

/// Errors that can occur when building or parsing packets.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Payload is empty; the wire format requires at least one byte.
    #[error("empty payload: packets carry at least one byte")]
    EmptyPayload,

    /// Payload does not fit behind a one-byte count prefix.
    #[error("payload too large: {size} bytes (max {max})")]
    TooLarge {
        /// Actual size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Wire bytes end before the advertised payload and checksum.
    #[error("truncated packet: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Length the count prefix promised.
        expected: usize,
        /// Length actually available.
        actual: usize,
    },

    /// Checksum trailer does not match the payload sum.
    #[error("checksum mismatch: expected 0x{expected:02x}, got 0x{actual:02x}")]
    ChecksumMismatch {
        /// Sum computed over the payload.
        expected: u8,
        /// Trailer byte found on the wire.
        actual: u8,
    },
}
