//! The power-on negotiation session.
//!
//! One fixed, linear script of typed steps. There is no branching: the
//! body and lens advance in lockstep through the same sequence, and a step
//! that never completes parks the engine there for good. The script
//! structure is data; the payload bytes come from the [`LensProfile`].
//!
//! [`LensProfile`]: crate::LensProfile

use thiserror::Error;

use fourthirds_wire::HANDSHAKE_COMMAND_LEN;
use lenssim_bus::{BusFault, InputLine, LensPort, Level, OutputLine};

use crate::{framer, sync, transport, LensProfile, PayloadSlot};

/// Width of the wake pulse, in milliseconds.
pub const WAKE_PULSE_MS: u64 = 10;

/// Pause between the first handshake and the command exchange.
pub const COMMAND_PAUSE_MS: u64 = 500;

/// Width of the final acknowledgment pulse.
pub const FINAL_ACK_MS: u64 = 10;

/// A wait on the body acknowledgment line: a true edge or a settled level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    Fall,
    Rise,
    Low,
    High,
}

/// An inter-exchange ack dance: wait for the body, answer busy, wait for
/// it again, answer ready. When `ack_leads` is set the lens drops its ack
/// before the entry wait instead of after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandOff {
    pub entry: Wait,
    pub resume: Wait,
    pub ack_leads: bool,
}

/// One step of the session script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Wait for the power line, then for the body's ack to read ready.
    AwaitPowerOn,
    /// Pulse our ack to announce we are awake, wait for the body to
    /// answer, and go ready.
    WakePulse,
    /// Read a command packet and echo its checksum.
    ReadPacket { count: u8 },
    /// Send a profile payload as a framed packet.
    WritePacket { slot: PayloadSlot },
    /// Read the body's single-byte command.
    ReadCommand,
    /// Answer the single-byte command.
    WriteReply,
    /// Scripted pause.
    Delay { millis: u64 },
    /// Inter-exchange ack dance.
    HandOff(HandOff),
    /// Blind reset of the serial clocking hardware. The body sometimes
    /// drops the bus clock mid-session for reasons nobody has diagnosed;
    /// this runs unconditionally at its fixed place in the script rather
    /// than in response to any detected error.
    ResyncClock,
    /// Closing ack pulse; the bus goes quiet after this.
    FinalAck,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::AwaitPowerOn => "await-power-on",
            Step::WakePulse => "wake-pulse",
            Step::ReadPacket { .. } => "read-packet",
            Step::WritePacket { .. } => "write-packet",
            Step::ReadCommand => "read-command",
            Step::WriteReply => "write-reply",
            Step::Delay { .. } => "delay",
            Step::HandOff(_) => "hand-off",
            Step::ResyncClock => "resync-clock",
            Step::FinalAck => "final-ack",
        }
    }
}

/// The canonical negotiation, in order. Replayed bit for bit, this is what
/// the body expects from a freshly attached lens.
pub fn negotiation() -> Vec<Step> {
    const CMD: u8 = HANDSHAKE_COMMAND_LEN;
    vec![
        Step::AwaitPowerOn,
        Step::WakePulse,
        Step::ReadPacket { count: CMD },
        Step::HandOff(HandOff {
            entry: Wait::Fall,
            resume: Wait::Rise,
            ack_leads: false,
        }),
        Step::Delay {
            millis: COMMAND_PAUSE_MS,
        },
        Step::HandOff(HandOff {
            entry: Wait::Low,
            resume: Wait::Rise,
            ack_leads: true,
        }),
        Step::ReadCommand,
        Step::WriteReply,
        Step::HandOff(HandOff {
            entry: Wait::Low,
            resume: Wait::Rise,
            ack_leads: false,
        }),
        Step::ReadPacket { count: CMD },
        Step::WritePacket {
            slot: PayloadSlot::Capability,
        },
        Step::HandOff(HandOff {
            entry: Wait::Low,
            resume: Wait::High,
            ack_leads: false,
        }),
        Step::ReadPacket { count: CMD },
        Step::WritePacket {
            slot: PayloadSlot::Identity,
        },
        Step::HandOff(HandOff {
            entry: Wait::Low,
            resume: Wait::High,
            ack_leads: false,
        }),
        Step::ResyncClock,
        Step::ReadPacket { count: CMD },
        Step::WritePacket {
            slot: PayloadSlot::ShortIdentity,
        },
        Step::HandOff(HandOff {
            entry: Wait::Low,
            resume: Wait::High,
            ack_leads: false,
        }),
        Step::ReadPacket { count: CMD },
        Step::FinalAck,
    ]
}

/// One handshake's worth of traffic: the command packet the body sent and
/// the checksum echoed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRecord {
    pub command: Vec<u8>,
    pub checksum: u8,
}

/// What a completed (or partially completed) session observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// Handshake reads, in script order.
    pub handshakes: Vec<HandshakeRecord>,
    /// The body's single-byte command, once read.
    pub command: Option<u8>,
    /// Steps fully executed.
    pub steps_completed: usize,
}

/// Session failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A step's wait never completed. On hardware this is the permanent
    /// hang; under a budgeted simulated port it is how tests observe it.
    #[error("session stalled at step {index} ({name}): {fault}")]
    Stalled {
        index: usize,
        name: &'static str,
        #[source]
        fault: BusFault,
    },
    /// The keep-alive exchange was requested with a profile that leaves
    /// it disabled.
    #[error("keep-alive exchange is disabled in this profile")]
    KeepAliveDisabled,
}

/// Executes the session script against a port.
pub struct SessionEngine {
    profile: LensProfile,
    script: Vec<Step>,
}

impl SessionEngine {
    /// Engine for the canonical negotiation.
    pub fn new(profile: LensProfile) -> Self {
        SessionEngine {
            profile,
            script: negotiation(),
        }
    }

    /// Engine for a custom script. Used by tests; the real session order
    /// is fixed.
    pub fn with_script(profile: LensProfile, script: Vec<Step>) -> Self {
        SessionEngine { profile, script }
    }

    pub fn profile(&self) -> &LensProfile {
        &self.profile
    }

    pub fn script(&self) -> &[Step] {
        &self.script
    }

    /// Run the session once, start to finish. After the last step the
    /// engine performs no further bus activity.
    pub fn run<P: LensPort>(&self, port: &mut P) -> Result<SessionReport, SessionError> {
        let mut report = SessionReport::default();
        for (index, step) in self.script.iter().enumerate() {
            log::debug!("step {} ({})", index, step.name());
            self.exec(port, step, &mut report)
                .map_err(|fault| SessionError::Stalled {
                    index,
                    name: step.name(),
                    fault,
                })?;
            report.steps_completed = index + 1;
        }
        Ok(report)
    }

    /// One keep-alive exchange: read a poll packet, answer with the
    /// keep-alive payload. Refused unless the profile enables it.
    pub fn keep_alive_cycle<P: LensPort>(
        &self,
        port: &mut P,
    ) -> Result<HandshakeRecord, SessionError> {
        if !self.profile.keep_alive {
            return Err(SessionError::KeepAliveDisabled);
        }
        self.keep_alive_exchange(port)
            .map_err(|fault| SessionError::Stalled {
                index: self.script.len(),
                name: "keep-alive",
                fault,
            })
    }

    fn keep_alive_exchange<P: LensPort>(&self, port: &mut P) -> Result<HandshakeRecord, BusFault> {
        let (command, checksum) = framer::read_packet(port, HANDSHAKE_COMMAND_LEN)?;
        framer::write_packet(port, self.profile.slot_bytes(PayloadSlot::KeepAlive))?;
        Ok(HandshakeRecord { command, checksum })
    }

    fn exec<P: LensPort>(
        &self,
        port: &mut P,
        step: &Step,
        report: &mut SessionReport,
    ) -> Result<(), BusFault> {
        match step {
            Step::AwaitPowerOn => {
                port.block_until(InputLine::Power, Level::High)?;
                sync::wait_high(port)
            }
            Step::WakePulse => {
                port.drive(OutputLine::LensAck, Level::High);
                port.delay_millis(WAKE_PULSE_MS);
                port.drive(OutputLine::LensAck, Level::Low);
                sync::wait_rise(port)?;
                port.drive(OutputLine::LensAck, Level::High);
                Ok(())
            }
            Step::ReadPacket { count } => {
                let (command, checksum) = framer::read_packet(port, *count)?;
                report.handshakes.push(HandshakeRecord { command, checksum });
                Ok(())
            }
            Step::WritePacket { slot } => {
                framer::write_packet(port, self.profile.slot_bytes(*slot))?;
                Ok(())
            }
            Step::ReadCommand => {
                report.command = Some(transport::read_byte(port)?);
                Ok(())
            }
            Step::WriteReply => transport::write_byte(port, self.profile.reply_byte),
            Step::Delay { millis } => {
                port.delay_millis(*millis);
                Ok(())
            }
            Step::HandOff(hand_off) => exec_hand_off(port, hand_off),
            Step::ResyncClock => {
                port.reset_clocking();
                Ok(())
            }
            Step::FinalAck => {
                sync::wait_low(port)?;
                port.drive(OutputLine::LensAck, Level::Low);
                port.delay_millis(FINAL_ACK_MS);
                port.drive(OutputLine::LensAck, Level::High);
                Ok(())
            }
        }
    }
}

fn wait_on<P: LensPort>(port: &mut P, wait: Wait) -> Result<(), BusFault> {
    match wait {
        Wait::Fall => sync::wait_fall(port),
        Wait::Rise => sync::wait_rise(port),
        Wait::Low => sync::wait_low(port),
        Wait::High => sync::wait_high(port),
    }
}

fn exec_hand_off<P: LensPort>(port: &mut P, hand_off: &HandOff) -> Result<(), BusFault> {
    if hand_off.ack_leads {
        port.drive(OutputLine::LensAck, Level::Low);
        wait_on(port, hand_off.entry)?;
        port.drive(OutputLine::LensAck, Level::High);
        wait_on(port, hand_off.resume)
    } else {
        wait_on(port, hand_off.entry)?;
        port.drive(OutputLine::LensAck, Level::Low);
        wait_on(port, hand_off.resume)?;
        port.drive(OutputLine::LensAck, Level::High);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lenssim_body::SimPort;

    #[test]
    fn test_negotiation_script_order() {
        let names: Vec<&str> = negotiation().iter().map(Step::name).collect();
        assert_eq!(
            names,
            [
                "await-power-on",
                "wake-pulse",
                "read-packet",
                "hand-off",
                "delay",
                "hand-off",
                "read-command",
                "write-reply",
                "hand-off",
                "read-packet",
                "write-packet",
                "hand-off",
                "read-packet",
                "write-packet",
                "hand-off",
                "resync-clock",
                "read-packet",
                "write-packet",
                "hand-off",
                "read-packet",
                "final-ack",
            ]
        );
    }

    #[test]
    fn test_resync_immediately_precedes_fourth_read() {
        let script = negotiation();
        let resync = script
            .iter()
            .position(|s| matches!(s, Step::ResyncClock))
            .unwrap();
        assert!(matches!(script[resync + 1], Step::ReadPacket { .. }));
        let reads_before = script[..resync]
            .iter()
            .filter(|s| matches!(s, Step::ReadPacket { .. }))
            .count();
        assert_eq!(reads_before, 3);
    }

    #[test]
    fn test_write_order_is_capability_identity_short() {
        let slots: Vec<PayloadSlot> = negotiation()
            .iter()
            .filter_map(|s| match s {
                Step::WritePacket { slot } => Some(*slot),
                _ => None,
            })
            .collect();
        assert_eq!(
            slots,
            [
                PayloadSlot::Capability,
                PayloadSlot::Identity,
                PayloadSlot::ShortIdentity,
            ]
        );
    }

    #[test]
    fn test_keep_alive_refused_when_disabled() {
        let engine = SessionEngine::new(LensProfile::default());
        let mut port = SimPort::new(Vec::new());
        assert_eq!(
            engine.keep_alive_cycle(&mut port),
            Err(SessionError::KeepAliveDisabled)
        );
    }
}
