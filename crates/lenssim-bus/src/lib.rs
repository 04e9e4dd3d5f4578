//! Hardware abstraction for the lens side of the body-lens serial bus.
//!
//! The physical interface is five lines: a body-driven clock, a shared
//! half-duplex data line whose direction is switched at runtime, an
//! outbound acknowledgment line, an inbound body-signal line, and a
//! power/enable line. The clock and data lines are owned by the byte
//! shifter; the rest are plain digital lines.
//!
//! Everything the protocol engine touches goes through the [`LensPort`]
//! trait, so the engine can run against real registers or against a
//! simulated body peer. The blocking primitives have no timeout: on
//! hardware an unresponsive body hangs the engine forever. Simulated ports
//! bound their waits with a tick budget and surface exhaustion as
//! [`BusFault::Stalled`], which is how tests observe "blocks indefinitely"
//! deterministically.

mod error;
mod line;
mod port;

pub use error::*;
pub use line::*;
pub use port::*;
