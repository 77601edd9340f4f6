//! Demo Scenario - runs a canned multi-drone flight against a running
//! deconfliction server and prints the accept/reject/suggestion outcome
//! for each drone.
//!
//! Usage:
//!   cargo run -p deconfliction-cli --bin deconfliction-demo -- --scenario head-on

use chrono::{Duration as ChronoDuration, Utc};
use clap::Parser;
use deconfliction_cli::{scenarios, DeconflictionClient, SubmitOutcome};

const FLIGHT_DURATION_SECS: i64 = 60;

/// Drive a canned flight scenario against a deconfliction server.
#[derive(Parser, Debug)]
#[command(author, version, about = "Deconfliction engine demo scenarios")]
struct Args {
    /// Server URL
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,

    /// Scenario to run: head-on, parallel, or converging
    #[arg(long, default_value = "head-on")]
    scenario: String,

    /// Clear the fleet from the server's airspace before running
    #[arg(long, default_value_t = true)]
    reset: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let scenario = scenarios::by_name(&args.scenario).ok_or_else(|| {
        anyhow::anyhow!(
            "unknown scenario '{}' (expected head-on, parallel, or converging)",
            args.scenario
        )
    })?;

    println!("=== deconfliction demo: {} ===", scenario.name);
    let client = DeconflictionClient::new(&args.url);

    if args.reset {
        println!("[setup] clearing airspace at {}", args.url);
        client.clear_all().await?;
    }

    println!(
        "[setup] reporting starting positions for {} drones",
        scenario.drones.len()
    );
    for drone in &scenario.drones {
        let [x, y, z] = drone.start;
        client.report_position(&drone.drone_id, x, y, z).await?;
    }

    let start = Utc::now();
    let end = start + ChronoDuration::seconds(FLIGHT_DURATION_SECS);

    for drone in &scenario.drones {
        let outcome = client
            .submit_mission(&drone.drone_id, &[drone.end], start, end)
            .await?;
        match outcome {
            SubmitOutcome::Accepted { mission_id, .. } => {
                println!(
                    "[{}] ACCEPTED -> mission {mission_id}",
                    drone.drone_id
                );
            }
            SubmitOutcome::Rejected {
                conflicts,
                suggestions,
                ..
            } => {
                println!(
                    "[{}] REJECTED -> {} conflict(s), {} suggestion(s)",
                    drone.drone_id,
                    conflicts.len(),
                    suggestions.len()
                );
                for suggestion in &suggestions {
                    println!("    suggestion: {suggestion}");
                }
            }
        }
    }

    println!("=== scenario complete ===");
    Ok(())
}
