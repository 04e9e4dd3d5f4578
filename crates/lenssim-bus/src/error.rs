//! Bus fault types.

use thiserror::Error;

use crate::{InputLine, Level};

/// What a blocking primitive was waiting on when it gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitTarget {
    /// A body-driven line reaching a level.
    Line(InputLine, Level),
    /// The shifter completing an 8-bit transfer.
    TransferComplete,
}

impl std::fmt::Display for WaitTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaitTarget::Line(line, level) => write!(f, "{} {}", line, level),
            WaitTarget::TransferComplete => write!(f, "transfer complete"),
        }
    }
}

/// Faults surfaced by a bus port.
///
/// Hardware ports never produce these: their blocking calls spin forever.
/// Simulated ports report `Stalled` when their tick budget runs out, which
/// stands in for an indefinite hang.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BusFault {
    #[error("bus stalled waiting for {waiting_for}")]
    Stalled {
        /// The condition that never came true.
        waiting_for: WaitTarget,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_display() {
        let fault = BusFault::Stalled {
            waiting_for: WaitTarget::Line(InputLine::BodyAck, Level::High),
        };
        assert_eq!(fault.to_string(), "bus stalled waiting for body-ack high");

        let fault = BusFault::Stalled {
            waiting_for: WaitTarget::TransferComplete,
        };
        assert!(fault.to_string().contains("transfer complete"));
    }
}
