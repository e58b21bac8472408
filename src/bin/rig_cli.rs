//! Rig CLI - JSON bridge for the form layer
//!
//! Commands: profiles, validate, layout, approve
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 on validation failure, 1 on any other error

use clap::{Parser, Subcommand};
use log::{debug, LevelFilter};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

use highline_rig::{
    ApprovalRequest, ProfileRegistry, RigConfiguration, RigPipeline, RuleProfile,
    STANDARD_PROFILE_ID,
};

#[derive(Parser)]
#[command(name = "rig-cli")]
#[command(about = "Highline rig validation and layout engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to rule profiles directory
    #[arg(long, default_value = "profiles")]
    profiles_dir: PathBuf,

    /// Rule profile ID
    #[arg(short, long, default_value = STANDARD_PROFILE_ID)]
    profile: String,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List available rule profiles
    Profiles,

    /// Validate a rig configuration
    Validate {
        /// JSON payload (RigConfiguration)
        #[arg(long)]
        payload: String,
    },

    /// Validate and lay out a rig configuration
    Layout {
        /// JSON payload (RigConfiguration)
        #[arg(long)]
        payload: String,
    },

    /// Approve a rig configuration for saving
    Approve {
        /// Highline the plan belongs to (required)
        #[arg(long)]
        highline_id: String,

        /// JSON payload (RigConfiguration)
        #[arg(long)]
        payload: String,
    },
}

fn profile_summary(p: &RuleProfile) -> serde_json::Value {
    serde_json::json!({
        "id": p.id,
        "name": p.name,
        "version": p.profile_version,
        "failure_mode": p.failure_mode,
        "deprecated": p.deprecated,
        "superseded_by": p.superseded_by,
    })
}

fn print_json(value: &impl Serialize) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{}", s);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("failed to encode output: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_error(error: impl std::fmt::Display, code: u8) -> ExitCode {
    let output = serde_json::json!({ "success": false, "error": error.to_string() });
    println!("{}", output);
    ExitCode::from(code)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    let registry = match ProfileRegistry::load_from_dir(&cli.profiles_dir) {
        Ok(r) => r,
        Err(e) => return print_error(format!("Failed to load profiles: {}", e), 1),
    };

    let pipeline = RigPipeline::new(registry);

    match cli.command {
        Commands::Profiles => {
            let profiles: Vec<_> = pipeline.list_profiles().into_iter().map(profile_summary).collect();
            print_json(&profiles)
        }

        Commands::Validate { payload } => {
            let config: RigConfiguration = match serde_json::from_str(&payload) {
                Ok(c) => c,
                Err(e) => return print_error(format!("Invalid payload: {}", e), 1),
            };

            match pipeline.validate(&cli.profile, &config) {
                Ok(result) => {
                    let code = print_json(&result);
                    if result.is_valid() {
                        code
                    } else {
                        ExitCode::from(2)
                    }
                }
                Err(e) => print_error(e, 1),
            }
        }

        Commands::Layout { payload } => {
            let config: RigConfiguration = match serde_json::from_str(&payload) {
                Ok(c) => c,
                Err(e) => return print_error(format!("Invalid payload: {}", e), 1),
            };

            match pipeline.evaluate(&cli.profile, &config) {
                Ok(report) => print_json(&report),
                Err(e) => print_error(e, 1),
            }
        }

        Commands::Approve { highline_id, payload } => {
            let configuration: RigConfiguration = match serde_json::from_str(&payload) {
                Ok(c) => c,
                Err(e) => return print_error(format!("Invalid payload: {}", e), 1),
            };

            let request = ApprovalRequest {
                highline_id,
                profile_id: cli.profile,
                configuration,
            };
            debug!("approving highline {}", request.highline_id);

            match pipeline.approve(&request) {
                Ok(plan) => print_json(&serde_json::json!({ "success": true, "plan": plan })),
                Err(e @ highline_rig::PipelineError::ValidationFailed(_)) => print_error(e, 2),
                Err(e) => print_error(e, 1),
            }
        }
    }
}
