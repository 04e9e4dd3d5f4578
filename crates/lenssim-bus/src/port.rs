//! The injectable port trait the protocol engine runs against.

use crate::{BusDirection, BusFault, InputLine, Level, OutputLine};

/// Settling delay inserted before level waits, in microseconds. Absorbs
/// line bounce and propagation skew between the two controllers.
pub const SETTLE_DELAY_US: u64 = 2;

/// Sentinel staged after a write completes to clear the transfer-complete
/// condition, so the next transfer is detected cleanly.
pub const SHIFT_SENTINEL: u8 = 0xff;

/// Everything the lens-side protocol engine needs from the hardware.
///
/// One implementation drives real pins and the serial shifter peripheral;
/// the simulated implementation in `lenssim-body` stands in a scripted body
/// peer. The engine is single threaded and fully cooperative: every
/// blocking call advances in lockstep with the body's clock and signaling,
/// and none of them time out.
pub trait LensPort {
    /// Block until `line` reads `level`.
    ///
    /// This is the distinguished blocking call of the port: on hardware it
    /// spins until the condition holds, with no timeout, and never returns
    /// an error. A simulated port may abort with [`BusFault::Stalled`] once
    /// its tick budget is spent.
    fn block_until(&mut self, line: InputLine, level: Level) -> Result<(), BusFault>;

    /// Fixed settling delay ([`SETTLE_DELAY_US`]) before a level check.
    fn settle(&mut self);

    /// Coarse scripted delay. Used for the wake pulse width and the pause
    /// before the command exchange.
    fn delay_millis(&mut self, millis: u64);

    /// Drive an output line to `level`.
    fn drive(&mut self, line: OutputLine, level: Level);

    /// Switch the shared data line. It rests in [`BusDirection::Input`].
    fn set_direction(&mut self, direction: BusDirection);

    /// Discard a stale transfer-complete condition before a read.
    fn clear_pending(&mut self);

    /// Load the outbound shift register. Clears any pending
    /// transfer-complete condition.
    fn stage(&mut self, value: u8);

    /// Block until the body has clocked 8 bits through the shifter. Same
    /// no-timeout contract as [`LensPort::block_until`].
    fn block_until_shifted(&mut self) -> Result<(), BusFault>;

    /// Fetch the byte latched by the last completed transfer.
    fn take(&mut self) -> u8;

    /// Disable and re-enable the serial clocking hardware, re-applying the
    /// configured shifter mode. The negotiation performs this once, blind,
    /// at a fixed point in the session.
    fn reset_clocking(&mut self);
}
