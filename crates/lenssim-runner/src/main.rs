//! `lenssim` binary: impersonate a lens against the scripted camera body
//! and print the wire transcript.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use lenssim_lens::LensProfile;
use lenssim_runner::{
    format_transcript, load_profile, plan_for, run_negotiation, RunnerError, DEFAULT_TICK_BUDGET,
};

#[derive(Parser, Debug)]
#[command(name = "lenssim", about = "Run one body-lens power-on negotiation")]
struct Args {
    /// Lens profile YAML. Defaults to the reference lens.
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Simulated tick budget before a wait counts as a hang.
    #[arg(long, default_value_t = DEFAULT_TICK_BUDGET)]
    budget: u64,

    /// Have the body drop the bus clock before the fourth handshake.
    #[arg(long)]
    drop_clock: bool,

    /// Run one keep-alive exchange after the negotiation.
    #[arg(long)]
    keep_alive: bool,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), RunnerError> {
    let mut profile = match &args.profile {
        Some(path) => load_profile(path)?,
        None => LensProfile::default(),
    };
    if args.keep_alive {
        profile.keep_alive = true;
    }

    let plan = plan_for(&profile, args.drop_clock);
    let outcome = run_negotiation(&profile, &plan, args.budget)?;
    print!("{}", format_transcript(&outcome));

    if !outcome.body_script_drained {
        tracing::warn!("body script not fully played");
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
