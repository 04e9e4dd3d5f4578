//! Single-byte transfers over the shared half-duplex data line.
//!
//! The body clocks every transfer; the lens only arms the shifter and
//! switches the line direction. The line rests in input mode and is
//! switched to output only for the duration of a write. Transfers never
//! overlap.

use lenssim_bus::{BusDirection, BusFault, LensPort, SHIFT_SENTINEL};

/// Read one byte clocked in by the body.
pub fn read_byte<P: LensPort>(port: &mut P) -> Result<u8, BusFault> {
    // In case the previous operation left the line in output mode.
    port.set_direction(BusDirection::Input);
    port.clear_pending();
    port.block_until_shifted()?;
    let value = port.take();
    log::trace!("rx 0x{:02x}", value);
    Ok(value)
}

/// Stage one byte and let the body clock it out.
pub fn write_byte<P: LensPort>(port: &mut P, value: u8) -> Result<(), BusFault> {
    port.stage(value);
    port.set_direction(BusDirection::Output);
    port.block_until_shifted()?;
    // Clear the completion condition so the next transfer is detected
    // cleanly, and give the line back.
    port.stage(SHIFT_SENTINEL);
    port.set_direction(BusDirection::Input);
    log::trace!("tx 0x{:02x}", value);
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lenssim_body::{BodyAction, SimPort};
    use lenssim_bus::WaitTarget;

    #[test]
    fn test_read_byte() {
        let mut port = SimPort::new(vec![BodyAction::ClockOut(0x5a)]);
        assert_eq!(read_byte(&mut port).unwrap(), 0x5a);
        assert_eq!(port.direction(), BusDirection::Input);
    }

    #[test]
    fn test_write_restores_input_direction() {
        let mut port = SimPort::new(vec![
            BodyAction::BeginFrame("w"),
            BodyAction::ClockIn,
        ]);
        write_byte(&mut port, 0xab).unwrap();
        assert_eq!(port.frame("w"), Some(&[0xab][..]));
        assert_eq!(
            port.direction(),
            BusDirection::Input,
            "line must not be left in output mode after a write"
        );
    }

    #[test]
    fn test_write_then_read() {
        let mut port = SimPort::new(vec![
            BodyAction::BeginFrame("w"),
            BodyAction::ClockIn,
            BodyAction::ClockOut(0x17),
        ]);
        write_byte(&mut port, 0x01).unwrap();
        assert_eq!(read_byte(&mut port).unwrap(), 0x17);
    }

    #[test]
    fn test_read_stalls_without_clock() {
        let mut port = SimPort::new(Vec::new()).with_budget(8);
        let fault = read_byte(&mut port).unwrap_err();
        assert_eq!(
            fault,
            BusFault::Stalled {
                waiting_for: WaitTarget::TransferComplete,
            }
        );
    }
}
