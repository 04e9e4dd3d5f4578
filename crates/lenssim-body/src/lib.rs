//! Scripted camera-body peer.
//!
//! [`SimPort`] implements the [`LensPort`] trait against a deterministic
//! model of the body side of the bus: line levels, an edge queue for the
//! lens acknowledgment line, and a byte shifter. The body's behavior is a
//! script of [`BodyAction`]s executed one per simulation tick, and only
//! while the lens is parked inside a blocking call, which reproduces the
//! lockstep nature of the real bus.
//!
//! A tick budget bounds every wait. A body that never responds exhausts
//! the budget and surfaces as [`BusFault::Stalled`], standing in for the
//! indefinite hang the real engine would exhibit.
//!
//! [`LensPort`]: lenssim_bus::LensPort
//! [`BusFault::Stalled`]: lenssim_bus::BusFault

mod port;
mod script;
mod shifter;

pub use port::*;
pub use script::*;
pub use shifter::*;
