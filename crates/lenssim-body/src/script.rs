//! Body-side scripts.
//!
//! A script is the body's half of the bus dialogue, expressed as a flat
//! sequence of actions. The exchange builders below mirror the lens
//! framer's handshake shapes byte for byte; [`negotiation_script`] strings
//! them together into the whole power-on negotiation.

use std::collections::VecDeque;

use lenssim_bus::{Edge, InputLine, Level};

/// One step of body behavior.
///
/// `WaitAckEdge` consumes a recorded transition of the lens acknowledgment
/// line; `ClockOut`/`ClockIn` fire only once the lens has armed the
/// matching transfer. An action that is not yet runnable simply holds the
/// script in place for that tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyAction {
    /// Drive a body-owned line to a level.
    SetLine(InputLine, Level),
    /// Consume a lens-ack transition.
    WaitAckEdge(Edge),
    /// Hold until the lens ack line reads a level.
    WaitAckLevel(Level),
    /// Shift a byte toward the lens.
    ClockOut(u8),
    /// Clock the lens's staged byte in, appending it to the open frame.
    ClockIn,
    /// Open a new capture frame for subsequent `ClockIn` bytes.
    BeginFrame(&'static str),
    /// Drop the bus clock, desynchronizing the shifter.
    DropClock,
    /// Do nothing for the given number of ticks.
    Wait(u32),
}

/// Inputs for the canonical negotiation script: what the body sends, and
/// how many bytes it expects back in each lens packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationPlan {
    /// The five 4-byte command packets, one per handshake read.
    pub commands: [Vec<u8>; 5],
    /// The single-byte command sent between the first and second handshake.
    pub command_byte: u8,
    /// Payload length of the capability packet the lens will send.
    pub capability_len: usize,
    /// Payload length of the identity packet.
    pub identity_len: usize,
    /// Payload length of the truncated identity packet.
    pub short_identity_len: usize,
    /// Drop the bus clock just before the fourth handshake.
    pub drop_clock: bool,
    /// Append one keep-alive exchange: the 4-byte poll to send, and the
    /// lens payload length to expect back. `None` leaves the bus quiet
    /// after the final ack.
    pub keep_alive: Option<(Vec<u8>, usize)>,
}

impl Default for NegotiationPlan {
    fn default() -> Self {
        NegotiationPlan {
            commands: [
                vec![0x10, 0x00, 0x00, 0x00],
                vec![0x20, 0x00, 0x00, 0x00],
                vec![0x30, 0x00, 0x00, 0x00],
                vec![0x40, 0x00, 0x00, 0x00],
                vec![0x50, 0x00, 0x00, 0x00],
            ],
            command_byte: 0x00,
            capability_len: 5,
            identity_len: 21,
            short_identity_len: 2,
            drop_clock: false,
            keep_alive: None,
        }
    }
}

/// Body side of a lens read-packet exchange: clock the command bytes out,
/// answering the lens's per-byte ack pulses, then run the checksum
/// hand-off and collect the echoed checksum into a frame.
pub fn read_exchange(label: &'static str, command: &[u8]) -> Vec<BodyAction> {
    let mut actions = vec![BodyAction::WaitAckLevel(Level::High)];
    for (i, &byte) in command.iter().enumerate() {
        actions.push(BodyAction::ClockOut(byte));
        actions.push(BodyAction::WaitAckEdge(Edge::Falling));
        if i + 1 < command.len() {
            // ready pulse between bytes; the last byte gets none
            actions.push(BodyAction::WaitAckEdge(Edge::Rising));
        }
    }
    actions.extend([
        BodyAction::SetLine(InputLine::BodyAck, Level::Low),
        BodyAction::WaitAckEdge(Edge::Rising),
        BodyAction::SetLine(InputLine::BodyAck, Level::High),
        BodyAction::BeginFrame(label),
        BodyAction::ClockIn,
    ]);
    actions
}

/// Body side of a lens write-packet exchange: hold the ack line low,
/// clock in the count byte, `payload_len` payload bytes, and the checksum
/// trailer, releasing the line as the trailer shifts through.
pub fn write_exchange(label: &'static str, payload_len: usize) -> Vec<BodyAction> {
    let mut actions = vec![BodyAction::SetLine(InputLine::BodyAck, Level::Low)];
    for i in 0..payload_len + 2 {
        actions.push(BodyAction::WaitAckEdge(Edge::Falling));
        actions.push(BodyAction::WaitAckEdge(Edge::Rising));
        if i == 0 {
            actions.push(BodyAction::BeginFrame(label));
        }
        if i == payload_len + 1 {
            actions.push(BodyAction::SetLine(InputLine::BodyAck, Level::High));
        }
        actions.push(BodyAction::ClockIn);
    }
    actions
}

/// Body side of the inter-exchange hand-off where the body leads: drop,
/// wait for the lens to follow, raise, wait for it to follow again.
fn hand_off() -> [BodyAction; 4] {
    [
        BodyAction::SetLine(InputLine::BodyAck, Level::Low),
        BodyAction::WaitAckEdge(Edge::Falling),
        BodyAction::SetLine(InputLine::BodyAck, Level::High),
        BodyAction::WaitAckEdge(Edge::Rising),
    ]
}

/// Hand-off variant where the lens drops its ack first.
fn hand_off_lens_led() -> [BodyAction; 4] {
    [
        BodyAction::WaitAckEdge(Edge::Falling),
        BodyAction::SetLine(InputLine::BodyAck, Level::Low),
        BodyAction::WaitAckEdge(Edge::Rising),
        BodyAction::SetLine(InputLine::BodyAck, Level::High),
    ]
}

/// The body's half of the whole power-on negotiation.
pub fn negotiation_script(plan: &NegotiationPlan) -> VecDeque<BodyAction> {
    let mut script = Vec::new();

    // Power on, then answer the lens wake pulse.
    script.push(BodyAction::SetLine(InputLine::Power, Level::High));
    script.push(BodyAction::SetLine(InputLine::BodyAck, Level::High));
    script.push(BodyAction::WaitAckEdge(Edge::Rising));
    script.push(BodyAction::WaitAckEdge(Edge::Falling));
    script.push(BodyAction::SetLine(InputLine::BodyAck, Level::Low));
    script.push(BodyAction::SetLine(InputLine::BodyAck, Level::High));
    script.push(BodyAction::WaitAckEdge(Edge::Rising));

    script.extend(read_exchange("handshake1", &plan.commands[0]));
    script.extend(hand_off());

    // Long pause, then the single-byte command exchange.
    script.extend(hand_off_lens_led());
    script.push(BodyAction::ClockOut(plan.command_byte));
    script.push(BodyAction::BeginFrame("reply"));
    script.push(BodyAction::ClockIn);
    script.extend(hand_off());

    script.extend(read_exchange("handshake2", &plan.commands[1]));
    script.extend(write_exchange("capability", plan.capability_len));
    script.extend(hand_off());

    script.extend(read_exchange("handshake3", &plan.commands[2]));
    script.extend(write_exchange("identity", plan.identity_len));

    // Hand-off with the optional clock dropout before handshake 4.
    script.push(BodyAction::SetLine(InputLine::BodyAck, Level::Low));
    script.push(BodyAction::WaitAckEdge(Edge::Falling));
    if plan.drop_clock {
        script.push(BodyAction::DropClock);
    }
    script.push(BodyAction::SetLine(InputLine::BodyAck, Level::High));
    script.push(BodyAction::WaitAckEdge(Edge::Rising));

    script.extend(read_exchange("handshake4", &plan.commands[3]));
    script.extend(write_exchange("identity-short", plan.short_identity_len));
    script.extend(hand_off());

    script.extend(read_exchange("handshake5", &plan.commands[4]));

    // Final ack.
    script.push(BodyAction::SetLine(InputLine::BodyAck, Level::Low));
    script.push(BodyAction::WaitAckEdge(Edge::Falling));

    if let Some((poll, len)) = &plan.keep_alive {
        script.push(BodyAction::WaitAckEdge(Edge::Rising));
        script.push(BodyAction::SetLine(InputLine::BodyAck, Level::High));
        script.extend(read_exchange("keep-alive-poll", poll));
        script.extend(write_exchange("keep-alive", *len));
    }

    script.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_exchange_shape() {
        let actions = read_exchange("cmd", &[1, 2, 3, 4]);
        // 1 level gate + 4 clock-outs + 7 edge waits + drop/raise + frame + clock-in
        let clock_outs = actions
            .iter()
            .filter(|a| matches!(a, BodyAction::ClockOut(_)))
            .count();
        assert_eq!(clock_outs, 4);
        assert_eq!(actions.last(), Some(&BodyAction::ClockIn));
        // no ready wait after the final command byte
        let falls = actions
            .iter()
            .filter(|a| matches!(a, BodyAction::WaitAckEdge(Edge::Falling)))
            .count();
        assert_eq!(falls, 4);
    }

    #[test]
    fn test_write_exchange_counts_trailer_and_prefix() {
        let actions = write_exchange("data", 5);
        let clock_ins = actions
            .iter()
            .filter(|a| matches!(a, BodyAction::ClockIn))
            .count();
        // count byte + 5 payload bytes + checksum
        assert_eq!(clock_ins, 7);
    }

    #[test]
    fn test_negotiation_script_drop_clock_precedes_fourth_handshake() {
        let plan = NegotiationPlan {
            drop_clock: true,
            ..Default::default()
        };
        let script: Vec<_> = negotiation_script(&plan).into();
        let drop = script
            .iter()
            .position(|a| matches!(a, BodyAction::DropClock))
            .unwrap();
        let frames: Vec<&str> = script
            .iter()
            .take(drop)
            .filter_map(|a| match a {
                BodyAction::BeginFrame(label) => Some(*label),
                _ => None,
            })
            .collect();
        // everything up to handshake 3 and the identity packet has been
        // exchanged; handshake 4 has not begun
        assert!(frames.contains(&"identity"));
        assert!(!frames.contains(&"handshake4"));
    }

    #[test]
    fn test_negotiation_script_quiet_after_final_ack_by_default() {
        let script = negotiation_script(&NegotiationPlan::default());
        let frames: Vec<&str> = script
            .iter()
            .filter_map(|a| match a {
                BodyAction::BeginFrame(label) => Some(*label),
                _ => None,
            })
            .collect();
        assert_eq!(
            frames,
            [
                "handshake1",
                "reply",
                "handshake2",
                "capability",
                "handshake3",
                "identity",
                "handshake4",
                "identity-short",
                "handshake5",
            ]
        );
    }
}
