/*!
 * Court Simulation
 *
 * Players arrive at random, enter the court two at a time, play one game
 * and leave.
 */

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use typed_monitor::actors::{Latency, Player};
use typed_monitor::core::limits::DEFAULT_COURT_PLAYERS;
use typed_monitor::{init_tracing, Court, MonitorError};

#[derive(Debug, Parser)]
#[command(name = "court", about = "Pairwise court access simulation")]
struct Cli {
    /// Number of players (pairs play together, so use an even number)
    #[arg(default_value_t = DEFAULT_COURT_PLAYERS)]
    players: usize,

    /// Upper bound of the random arrival and playing time
    #[arg(long, default_value_t = 1000)]
    max_latency_ms: u64,

    /// Seed for reproducible latencies
    #[arg(long, env = "MONITOR_SEED")]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let court = Arc::new(Court::new());
    let latency = Latency::up_to(Duration::from_millis(cli.max_latency_ms));

    let mut handles = Vec::with_capacity(cli.players);
    for id in 0..cli.players as u32 {
        let player = Player::new(id).with_latency(latency).with_seed(cli.seed);
        let name = player.name();
        let handle = player
            .spawn(court.clone())
            .with_context(|| format!("spawning {}", name))?;
        handles.push((name, handle));
    }

    for (name, handle) in handles {
        handle
            .join()
            .map_err(|_| MonitorError::ActorPanicked(name.clone()))?
            .with_context(|| format!("{} failed", name))?;
    }

    info!(games = court.snapshot().games_completed, "all players left");
    Ok(())
}
