//! Runner library: load a lens profile, drive one negotiation against the
//! scripted body, and report what moved on the wire.
//!
//! The binary in `main.rs` is a thin CLI over [`run_negotiation`]; the
//! integration tests under `tests/` use the same entry points.

use std::fmt::Write as _;
use std::path::Path;

use thiserror::Error;

use fourthirds_wire::Packet;
use lenssim_body::{negotiation_script, Frame, NegotiationPlan, SimPort};
use lenssim_lens::{
    HandshakeRecord, LensProfile, ProfileError, SessionEngine, SessionError, SessionReport,
};

pub use lenssim_body::DEFAULT_TICK_BUDGET;

/// The 4-byte poll the body sends in a keep-alive exchange.
const KEEP_ALIVE_POLL: [u8; 4] = [0x60, 0x00, 0x00, 0x00];

/// Runner failures.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("cannot read profile: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse profile: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid profile: {0}")]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Everything one simulated negotiation produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// What the lens engine recorded.
    pub report: SessionReport,
    /// The keep-alive exchange, when the profile enables it.
    pub keep_alive: Option<HandshakeRecord>,
    /// Frames the body clocked in, in wire order.
    pub frames: Vec<Frame>,
    /// Clocking hardware resets performed by the lens.
    pub resynchronizations: u32,
    /// Transfers that ran against a desynchronized shifter.
    pub corrupted_transfers: u32,
    /// Simulated ticks consumed.
    pub ticks: u64,
    /// Whether the body played its script to the end.
    pub body_script_drained: bool,
}

/// Load a lens profile from a YAML file.
pub fn load_profile(path: &Path) -> Result<LensProfile, RunnerError> {
    let text = std::fs::read_to_string(path)?;
    let profile: LensProfile = serde_yaml::from_str(&text)?;
    profile.validate()?;
    Ok(profile)
}

/// Body script inputs matching `profile`.
pub fn plan_for(profile: &LensProfile, drop_clock: bool) -> NegotiationPlan {
    NegotiationPlan {
        capability_len: profile.capability.len(),
        identity_len: profile.identity.len(),
        short_identity_len: profile.short_identity().len(),
        drop_clock,
        keep_alive: profile
            .keep_alive
            .then(|| (KEEP_ALIVE_POLL.to_vec(), profile.keep_alive_payload.len())),
        ..Default::default()
    }
}

/// Run one negotiation (plus the keep-alive exchange, if enabled) against
/// the scripted body.
pub fn run_negotiation(
    profile: &LensProfile,
    plan: &NegotiationPlan,
    budget: u64,
) -> Result<RunOutcome, RunnerError> {
    profile.validate()?;
    let engine = SessionEngine::new(profile.clone());
    let mut port = SimPort::new(negotiation_script(plan)).with_budget(budget);

    tracing::info!("starting negotiation (budget {} ticks)", budget);
    tracing::debug!("shifter mode {:?}", port.mode());
    let report = engine.run(&mut port)?;
    let keep_alive = if profile.keep_alive {
        Some(engine.keep_alive_cycle(&mut port)?)
    } else {
        None
    };
    tracing::info!(
        "negotiation complete: {} steps, {} ticks",
        report.steps_completed,
        port.ticks()
    );

    Ok(RunOutcome {
        report,
        keep_alive,
        frames: port.frames().to_vec(),
        resynchronizations: port.resynchronizations(),
        corrupted_transfers: port.corrupted_transfers(),
        ticks: port.ticks(),
        body_script_drained: port.script_exhausted(),
    })
}

/// Human-readable transcript of a run: one line per frame, decoded as a
/// packet where the bytes parse as one.
pub fn format_transcript(outcome: &RunOutcome) -> String {
    let mut out = String::new();
    for frame in &outcome.frames {
        match Packet::from_wire(&frame.bytes) {
            Ok(packet) => {
                let _ = writeln!(out, "{:<16} {}", frame.label, packet);
            }
            Err(_) => {
                let _ = writeln!(out, "{:<16} {}", frame.label, hex::encode(&frame.bytes));
            }
        }
    }
    if let Some(command) = outcome.report.command {
        let _ = writeln!(out, "{:<16} 0x{:02x}", "body command", command);
    }
    let _ = writeln!(
        out,
        "{:<16} {} resync(s), {} corrupted, {} ticks",
        "summary",
        outcome.resynchronizations,
        outcome.corrupted_transfers,
        outcome.ticks
    );
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_from_yaml() {
        let yaml = r#"
reply_byte: 0
capability: [0, 10, 16, 196, 9]
keep_alive: true
"#;
        let profile: LensProfile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(profile.capability, vec![0x00, 0x0a, 0x10, 0xc4, 0x09]);
        assert!(profile.keep_alive);
        // unspecified fields keep the reference defaults
        assert_eq!(profile.identity.len(), 21);
    }

    #[test]
    fn test_plan_for_matches_profile_lengths() {
        let profile = LensProfile::default();
        let plan = plan_for(&profile, false);
        assert_eq!(plan.capability_len, 5);
        assert_eq!(plan.identity_len, 21);
        assert_eq!(plan.short_identity_len, 2);
        assert!(plan.keep_alive.is_none());
    }

    #[test]
    fn test_transcript_lists_frames() {
        let profile = LensProfile::default();
        let plan = plan_for(&profile, false);
        let outcome = run_negotiation(&profile, &plan, DEFAULT_TICK_BUDGET).unwrap();
        let transcript = format_transcript(&outcome);
        assert!(transcript.contains("capability"));
        assert!(transcript.contains("identity"));
        assert!(transcript.contains("1 resync(s)"));
    }
}
