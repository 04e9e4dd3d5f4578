//! Lens-side handshake engine.
//!
//! The engine impersonates the lens well enough for a camera body to
//! complete its power-on negotiation against it. It is layered leaf-first,
//! each module calling only the one below:
//!
//! - [`sync`]: edge and level waits on the body acknowledgment line;
//! - [`transport`]: one byte at a time over the shared half-duplex data
//!   line, with explicit direction switching;
//! - [`framer`]: length-prefixed, checksum-trailed packets with the
//!   per-byte busy/ready ack convention;
//! - [`session`]: the fixed ordered script of exchanges that constitutes
//!   one negotiation, including the blind mid-session clocking reset.
//!
//! Control flows strictly downward, data both ways. Everything runs
//! against the [`LensPort`] trait from `lenssim-bus`, so the same engine
//! drives real registers or the scripted body in `lenssim-body`.
//!
//! [`LensPort`]: lenssim_bus::LensPort

pub mod framer;
mod profile;
mod session;
pub mod sync;
pub mod transport;

pub use profile::*;
pub use session::*;
