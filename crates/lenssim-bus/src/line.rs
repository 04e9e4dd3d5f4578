//! Digital line and bus types.

/// Level of a two-state digital line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// The opposite level.
    pub fn toggled(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }

    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Low => write!(f, "low"),
            Level::High => write!(f, "high"),
        }
    }
}

/// A transition between line levels. Transitions, not static levels, carry
/// the per-byte handshake meaning on the acknowledgment lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

impl Edge {
    /// The edge produced by a transition to `to`.
    pub fn to_level(to: Level) -> Edge {
        match to {
            Level::High => Edge::Rising,
            Level::Low => Edge::Falling,
        }
    }
}

/// Direction of the shared half-duplex data line.
///
/// The line rests in `Input`; it is switched to `Output` only for the
/// duration of a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusDirection {
    #[default]
    Input,
    Output,
}

/// Body-driven lines the lens reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputLine {
    /// The body's per-byte acknowledgment and transfer-boundary signal.
    BodyAck,
    /// Power/enable. Goes high when the camera is switched on.
    Power,
}

impl std::fmt::Display for InputLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputLine::BodyAck => write!(f, "body-ack"),
            InputLine::Power => write!(f, "power"),
        }
    }
}

/// Lens-driven lines the body reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLine {
    /// Busy/ready acknowledgment toward the body.
    LensAck,
}

/// Serial clocking configuration of the byte shifter.
///
/// The reference hardware shifts LSB-first with the clock idling high and
/// data sampled on the trailing edge. [`LensPort::reset_clocking`] tears the
/// shifter down and re-applies this mode.
///
/// [`LensPort::reset_clocking`]: crate::LensPort::reset_clocking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShifterMode {
    pub lsb_first: bool,
    pub idle_high_clock: bool,
    pub sample_trailing_edge: bool,
}

impl Default for ShifterMode {
    fn default() -> Self {
        ShifterMode {
            lsb_first: true,
            idle_high_clock: true,
            sample_trailing_edge: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_toggle() {
        assert_eq!(Level::Low.toggled(), Level::High);
        assert_eq!(Level::High.toggled(), Level::Low);
    }

    #[test]
    fn test_edge_from_transition() {
        assert_eq!(Edge::to_level(Level::High), Edge::Rising);
        assert_eq!(Edge::to_level(Level::Low), Edge::Falling);
    }

    #[test]
    fn test_direction_rests_at_input() {
        assert_eq!(BusDirection::default(), BusDirection::Input);
    }
}
