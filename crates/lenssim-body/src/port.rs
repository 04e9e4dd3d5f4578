//! The simulated port.

use std::collections::VecDeque;

use lenssim_bus::{
    BusDirection, BusFault, Edge, InputLine, LensPort, Level, OutputLine, ShifterMode, WaitTarget,
};

use crate::{BodyAction, SimShifter};

/// Default tick budget. The canonical negotiation takes on the order of a
/// thousand ticks; anything approaching this bound is a wedged bus.
pub const DEFAULT_TICK_BUDGET: u64 = 65_536;

/// Bytes the body clocked in, grouped by exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub label: String,
    pub bytes: Vec<u8>,
}

/// Deterministic [`LensPort`] backed by a body script.
///
/// The body advances only while the lens is parked in a blocking call, one
/// action per tick. Lens-ack transitions are queued, not sampled, so a
/// busy/ready pulse the lens emits between blocking calls is never missed.
/// Ticks are scheduling quanta of the simulated clock, not wall time.
pub struct SimPort {
    power: Level,
    body_ack: Level,
    lens_ack: Level,
    ack_edges: VecDeque<Edge>,
    shifter: SimShifter,
    script: VecDeque<BodyAction>,
    mode: ShifterMode,
    budget: u64,
    ticks: u64,
    frames: Vec<Frame>,
    resyncs: u32,
}

impl SimPort {
    pub fn new(script: impl Into<VecDeque<BodyAction>>) -> Self {
        SimPort {
            power: Level::Low,
            body_ack: Level::Low,
            lens_ack: Level::Low,
            ack_edges: VecDeque::new(),
            shifter: SimShifter::default(),
            script: script.into(),
            mode: ShifterMode::default(),
            budget: DEFAULT_TICK_BUDGET,
            ticks: 0,
            frames: Vec::new(),
            resyncs: 0,
        }
    }

    /// Bound the simulated clock. Waits that outlive the budget stall.
    pub fn with_budget(mut self, budget: u64) -> Self {
        self.budget = budget;
        self
    }

    /// Preset the lens ack level without recording an edge. Exchanges
    /// mid-session start with the line already high; unit tests driving a
    /// single exchange use this to skip the wake sequence.
    pub fn with_lens_ack(mut self, level: Level) -> Self {
        self.lens_ack = level;
        self
    }

    /// Preset the body ack level, as above.
    pub fn with_body_ack(mut self, level: Level) -> Self {
        self.body_ack = level;
        self
    }

    /// Frames the body has clocked in so far.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Bytes of the first frame with the given label.
    pub fn frame(&self, label: &str) -> Option<&[u8]> {
        self.frames
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.bytes.as_slice())
    }

    /// Body actions not yet executed.
    pub fn script_remaining(&self) -> usize {
        self.script.len()
    }

    /// True once the body has played its whole script.
    pub fn script_exhausted(&self) -> bool {
        self.script.is_empty()
    }

    /// How often the lens reset the clocking hardware.
    pub fn resynchronizations(&self) -> u32 {
        self.resyncs
    }

    /// Transfers that ran against a desynchronized shifter.
    pub fn corrupted_transfers(&self) -> u32 {
        self.shifter.corrupted
    }

    /// Simulated ticks consumed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Current direction of the shared data line.
    pub fn direction(&self) -> BusDirection {
        self.shifter.direction
    }

    /// The clocking configuration the shifter runs under.
    pub fn mode(&self) -> ShifterMode {
        self.mode
    }

    fn input_level(&self, line: InputLine) -> Level {
        match line {
            InputLine::BodyAck => self.body_ack,
            InputLine::Power => self.power,
        }
    }

    /// Burn one tick; fail once the budget is spent.
    fn tick(&mut self, target: WaitTarget) -> Result<(), BusFault> {
        if self.ticks >= self.budget {
            return Err(BusFault::Stalled {
                waiting_for: target,
            });
        }
        self.ticks += 1;
        self.run_one();
        Ok(())
    }

    /// Burn up to `n` ticks without failing; delays always complete.
    fn advance(&mut self, n: u64) {
        for _ in 0..n {
            if self.ticks >= self.budget {
                return;
            }
            self.ticks += 1;
            self.run_one();
        }
    }

    /// Execute at most one runnable body action.
    fn run_one(&mut self) {
        let Some(&action) = self.script.front() else {
            return;
        };
        match action {
            BodyAction::SetLine(line, level) => {
                self.script.pop_front();
                match line {
                    InputLine::BodyAck => self.body_ack = level,
                    InputLine::Power => self.power = level,
                }
                log::trace!("body: {} -> {}", line, level);
            }
            BodyAction::WaitAckEdge(edge) => {
                if self.ack_edges.front() == Some(&edge) {
                    self.ack_edges.pop_front();
                    self.script.pop_front();
                }
            }
            BodyAction::WaitAckLevel(level) => {
                if self.lens_ack == level {
                    self.script.pop_front();
                }
            }
            BodyAction::ClockOut(value) => {
                if self.shifter.read_armed() {
                    self.script.pop_front();
                    self.shifter.clock_out(value);
                    log::trace!("body: clocked out 0x{:02x}", value);
                }
            }
            BodyAction::ClockIn => {
                if let Some(value) = self.shifter.clock_in() {
                    self.script.pop_front();
                    log::trace!("body: clocked in 0x{:02x}", value);
                    self.capture(value);
                }
            }
            BodyAction::BeginFrame(label) => {
                self.script.pop_front();
                self.frames.push(Frame {
                    label: label.to_string(),
                    bytes: Vec::new(),
                });
            }
            BodyAction::DropClock => {
                self.script.pop_front();
                self.shifter.desynced = true;
                log::trace!("body: dropped the bus clock");
            }
            BodyAction::Wait(remaining) => {
                if remaining <= 1 {
                    self.script.pop_front();
                } else if let Some(BodyAction::Wait(n)) = self.script.front_mut() {
                    *n -= 1;
                }
            }
        }
    }

    fn capture(&mut self, value: u8) {
        if self.frames.is_empty() {
            self.frames.push(Frame {
                label: "unlabeled".to_string(),
                bytes: Vec::new(),
            });
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.bytes.push(value);
        }
    }
}

impl LensPort for SimPort {
    fn block_until(&mut self, line: InputLine, level: Level) -> Result<(), BusFault> {
        while self.input_level(line) != level {
            self.tick(WaitTarget::Line(line, level))?;
        }
        Ok(())
    }

    fn settle(&mut self) {
        self.advance(1);
    }

    fn delay_millis(&mut self, millis: u64) {
        self.advance(millis);
    }

    fn drive(&mut self, _line: OutputLine, level: Level) {
        if level != self.lens_ack {
            self.lens_ack = level;
            self.ack_edges.push_back(Edge::to_level(level));
        }
    }

    fn set_direction(&mut self, direction: BusDirection) {
        self.shifter.direction = direction;
    }

    fn clear_pending(&mut self) {
        self.shifter.complete = false;
        self.shifter.staged = None;
    }

    fn stage(&mut self, value: u8) {
        self.shifter.staged = Some(value);
        self.shifter.complete = false;
    }

    fn block_until_shifted(&mut self) -> Result<(), BusFault> {
        while !self.shifter.complete {
            self.tick(WaitTarget::TransferComplete)?;
        }
        Ok(())
    }

    fn take(&mut self) -> u8 {
        self.shifter.received
    }

    fn reset_clocking(&mut self) {
        self.shifter.desynced = false;
        self.shifter.staged = None;
        self.shifter.complete = false;
        self.resyncs += 1;
        log::trace!("lens: clocking hardware reset");
    }
}

// ============================================================================
// Tests
// ============================================================================
