//! Lens identity configuration.
//!
//! The negotiation script is fixed; what varies between lenses is the
//! payload bytes each write step carries. Those live here, externally
//! supplied, so a different lens can be impersonated without touching
//! protocol logic. The engine transports these bytes; it never interprets
//! them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use fourthirds_wire::{
    Packet, WireError, CAPABILITY_PAYLOAD, IDENTITY_PAYLOAD, KEEP_ALIVE_PAYLOAD,
    SHORT_IDENTITY_LEN,
};

/// Which profile payload a write step sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSlot {
    Capability,
    Identity,
    ShortIdentity,
    KeepAlive,
}

impl std::fmt::Display for PayloadSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadSlot::Capability => write!(f, "capability"),
            PayloadSlot::Identity => write!(f, "identity"),
            PayloadSlot::ShortIdentity => write!(f, "short-identity"),
            PayloadSlot::KeepAlive => write!(f, "keep-alive"),
        }
    }
}

/// Errors in a lens profile.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// A payload does not fit the wire format.
    #[error("{slot} payload invalid: {source}")]
    Payload {
        /// Which payload is at fault.
        slot: PayloadSlot,
        #[source]
        source: WireError,
    },
}

/// The payload bytes a lens reports during negotiation.
///
/// Defaults reproduce the reference lens. Profiles are plain data and
/// deserialize from YAML; see the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LensProfile {
    /// Byte returned for the body's single-byte command.
    pub reply_byte: u8,
    /// Capability packet payload.
    pub capability: Vec<u8>,
    /// Identity packet payload: aperture and focus limits, firmware
    /// version, vendor serial string.
    pub identity: Vec<u8>,
    /// Truncated identity re-sent late in the negotiation. `None` sends
    /// the leading bytes of `identity`.
    pub short_identity: Option<Vec<u8>>,
    /// Run the idle keep-alive exchange after the negotiation. Off on the
    /// reference lens; the engine refuses to run it unless this is set.
    pub keep_alive: bool,
    /// Payload of the keep-alive exchange.
    pub keep_alive_payload: Vec<u8>,
}

impl Default for LensProfile {
    fn default() -> Self {
        LensProfile {
            reply_byte: 0x00,
            capability: CAPABILITY_PAYLOAD.to_vec(),
            identity: IDENTITY_PAYLOAD.to_vec(),
            short_identity: None,
            keep_alive: false,
            keep_alive_payload: KEEP_ALIVE_PAYLOAD.to_vec(),
        }
    }
}

impl LensProfile {
    /// The truncated identity payload.
    pub fn short_identity(&self) -> &[u8] {
        match &self.short_identity {
            Some(bytes) => bytes,
            None => {
                let end = SHORT_IDENTITY_LEN.min(self.identity.len());
                &self.identity[..end]
            }
        }
    }

    /// The bytes a write step sends for `slot`.
    pub fn slot_bytes(&self, slot: PayloadSlot) -> &[u8] {
        match slot {
            PayloadSlot::Capability => &self.capability,
            PayloadSlot::Identity => &self.identity,
            PayloadSlot::ShortIdentity => self.short_identity(),
            PayloadSlot::KeepAlive => &self.keep_alive_payload,
        }
    }

    /// Check every payload against the wire format limits.
    pub fn validate(&self) -> Result<(), ProfileError> {
        for slot in [
            PayloadSlot::Capability,
            PayloadSlot::Identity,
            PayloadSlot::ShortIdentity,
            PayloadSlot::KeepAlive,
        ] {
            Packet::new(self.slot_bytes(slot).to_vec())
                .map_err(|source| ProfileError::Payload { slot, source })?;
        }
        Ok(())
    }
}
