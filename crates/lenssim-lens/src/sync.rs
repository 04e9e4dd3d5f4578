//! Edge and level synchronization on the body acknowledgment line.
//!
//! All four waits block with no timeout; an unresponsive body parks the
//! caller forever. The edge waits demand a real transition: a static level
//! reading never satisfies them.

use lenssim_bus::{BusFault, InputLine, LensPort, Level};

/// Block until a rising edge has been observed on the body ack line:
/// first waits for low, then for high.
pub fn wait_rise<P: LensPort>(port: &mut P) -> Result<(), BusFault> {
    port.block_until(InputLine::BodyAck, Level::Low)?;
    port.block_until(InputLine::BodyAck, Level::High)
}

/// Block until a falling edge has been observed on the body ack line.
pub fn wait_fall<P: LensPort>(port: &mut P) -> Result<(), BusFault> {
    port.block_until(InputLine::BodyAck, Level::High)?;
    port.block_until(InputLine::BodyAck, Level::Low)
}

/// Settle, then block until the body ack line holds low.
pub fn wait_low<P: LensPort>(port: &mut P) -> Result<(), BusFault> {
    port.settle();
    port.block_until(InputLine::BodyAck, Level::Low)
}

/// Settle, then block until the body ack line holds high.
pub fn wait_high<P: LensPort>(port: &mut P) -> Result<(), BusFault> {
    port.settle();
    port.block_until(InputLine::BodyAck, Level::High)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lenssim_body::{BodyAction, SimPort};
    use lenssim_bus::WaitTarget;

    fn toggling_body() -> Vec<BodyAction> {
        vec![
            BodyAction::SetLine(InputLine::BodyAck, Level::High),
            BodyAction::SetLine(InputLine::BodyAck, Level::Low),
            BodyAction::SetLine(InputLine::BodyAck, Level::High),
        ]
    }

    #[test]
    fn test_wait_rise_completes_per_transition() {
        let mut port = SimPort::new(toggling_body()).with_budget(16);
        wait_rise(&mut port).unwrap();
        assert_eq!(port.script_remaining(), 2, "stops at the first rise");
        wait_rise(&mut port).unwrap();
        assert_eq!(port.script_remaining(), 0, "consumes the fall and the second rise");
    }

    #[test]
    fn test_wait_rise_rejects_static_high() {
        let mut port = SimPort::new(toggling_body()).with_budget(16);
        wait_rise(&mut port).unwrap();
        wait_rise(&mut port).unwrap();
        // Line is high and the body is done toggling: a third call must
        // block, not return on the static level.
        let fault = wait_rise(&mut port).unwrap_err();
        assert_eq!(
            fault,
            BusFault::Stalled {
                waiting_for: WaitTarget::Line(InputLine::BodyAck, Level::Low),
            }
        );
    }

    #[test]
    fn test_wait_fall_completes_per_transition() {
        let mut port = SimPort::new(vec![
            BodyAction::SetLine(InputLine::BodyAck, Level::High),
            BodyAction::SetLine(InputLine::BodyAck, Level::Low),
        ])
        .with_budget(16);
        wait_fall(&mut port).unwrap();
        assert!(port.script_exhausted());
    }

    #[test]
    fn test_wait_level_settles_first() {
        // The body acts during the settling delay; the level wait then
        // sees the line already steady.
        let mut port = SimPort::new(vec![BodyAction::SetLine(
            InputLine::BodyAck,
            Level::High,
        )])
        .with_budget(16);
        wait_high(&mut port).unwrap();
        assert!(port.script_exhausted());
        assert_eq!(port.ticks(), 1);
    }

    #[test]
    fn test_dead_body_stalls_level_wait() {
        let mut port = SimPort::new(Vec::new()).with_budget(8);
        let fault = wait_high(&mut port).unwrap_err();
        assert_eq!(
            fault,
            BusFault::Stalled {
                waiting_for: WaitTarget::Line(InputLine::BodyAck, Level::High),
            }
        );
    }
}
