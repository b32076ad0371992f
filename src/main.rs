/*!
 * Producer/Consumer Simulation - Main Entry Point
 *
 * Usage: monitor <producers<=20> <consumers<=20> <slots<=20> <producer-iterations> <consumer-iterations>
 *
 * Every deposit and withdrawal is printed to stdout (`--sink tracing` routes
 * them into the log instead); logs go to stderr.
 */

use clap::Parser;
use std::time::Duration;
use tracing::info;

use typed_monitor::config::SinkKind;
use typed_monitor::{init_tracing, PolicyKind, Simulation, SimulationConfig};

#[derive(Debug, Parser)]
#[command(name = "monitor", about = "Typed bounded-buffer producer/consumer simulation")]
struct Cli {
    /// Number of producers (<= 20)
    producers: usize,
    /// Number of consumers (<= 20)
    consumers: usize,
    /// Number of buffer slots (<= 20)
    slots: usize,
    /// Deposits per producer
    producer_iterations: usize,
    /// Withdrawals per consumer
    consumer_iterations: usize,

    /// Buffer admission policy
    #[arg(long, value_enum, default_value_t = PolicyKind::TypeDemand)]
    policy: PolicyKind,

    /// Upper bound of the random pause before each call
    #[arg(long, default_value_t = 1000)]
    max_latency_ms: u64,

    /// Give up on a single produce/consume after this long
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Seed for reproducible latencies
    #[arg(long, env = "MONITOR_SEED")]
    seed: Option<u64>,

    /// Trace event output
    #[arg(long, value_enum, default_value_t = SinkKind::Stdout)]
    sink: SinkKind,
}

impl Cli {
    fn into_config(self) -> SimulationConfig {
        SimulationConfig {
            producers: self.producers,
            consumers: self.consumers,
            capacity: self.slots,
            producer_iterations: self.producer_iterations,
            consumer_iterations: self.consumer_iterations,
            policy: self.policy,
            max_latency: Duration::from_millis(self.max_latency_ms),
            op_timeout: self.timeout_ms.map(Duration::from_millis),
            seed: self.seed,
        }
    }
}

fn main() -> miette::Result<()> {
    // Wrong argument count prints usage to stderr and exits non-zero
    let cli = Cli::parse();
    init_tracing();

    let sink = cli.sink.sink();
    let simulation = Simulation::new(cli.into_config())?.with_sink(sink);
    let report = simulation.run()?;

    info!(
        produced = report.stats.produced,
        consumed = report.stats.consumed,
        left_in_buffer = report.stats.count,
        type_waits = report.stats.type_waits,
        "simulation complete"
    );

    if let Some((actor, error)) = report.errors().next() {
        return Err(miette::Report::new(error.clone()).wrap_err(format!("{} failed", actor)));
    }
    Ok(())
}
