//! Packet construction, encoding, and offline parsing.

use serde::{Deserialize, Serialize};

use crate::{WireError, MAX_PAYLOAD};

/// Unsigned 8-bit sum of the payload bytes.
///
/// This is the checksum carried in the packet trailer. The count prefix is
/// excluded from the sum.
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
}

/// A length-prefixed, checksum-trailed packet.
///
/// The checksum is computed at construction time and is an invariant of the
/// value: `checksum == sum(payload) mod 256`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    payload: Vec<u8>,
    checksum: u8,
}

impl Packet {
    /// Build a packet from a payload, computing the checksum trailer.
    pub fn new(payload: Vec<u8>) -> Result<Self, WireError> {
        if payload.is_empty() {
            return Err(WireError::EmptyPayload);
        }
        if payload.len() > MAX_PAYLOAD {
            return Err(WireError::TooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD,
            });
        }
        let checksum = checksum(&payload);
        Ok(Packet { payload, checksum })
    }

    /// The payload bytes, count and checksum excluded.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The checksum trailer.
    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// The count prefix transmitted as the first on-wire byte.
    pub fn count(&self) -> u8 {
        self.payload.len() as u8
    }

    /// Encode to wire bytes: count, payload, checksum.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.payload.len() + 2);
        buf.push(self.count());
        buf.extend_from_slice(&self.payload);
        buf.push(self.checksum);
        buf
    }

    /// Parse a complete packet from captured wire bytes.
    ///
    /// Unlike the live handshake, which accepts whatever trailer the wire
    /// carries, this parser verifies the checksum. It is meant for offline
    /// analysis of captured traffic and for tests.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.is_empty() {
            return Err(WireError::EmptyPayload);
        }
        let count = bytes[0] as usize;
        if count == 0 {
            return Err(WireError::EmptyPayload);
        }
        // count byte + payload + checksum trailer
        let expected = count + 2;
        if bytes.len() < expected {
            return Err(WireError::Truncated {
                expected,
                actual: bytes.len(),
            });
        }
        let payload = bytes[1..1 + count].to_vec();
        let trailer = bytes[1 + count];
        let computed = checksum(&payload);
        if trailer != computed {
            return Err(WireError::ChecksumMismatch {
                expected: computed,
                actual: trailer,
            });
        }
        Ok(Packet {
            payload,
            checksum: trailer,
        })
    }
}

impl std::fmt::Display for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}]{} sum=0x{:02x}",
            self.count(),
            hex::encode(&self.payload),
            self.checksum
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
