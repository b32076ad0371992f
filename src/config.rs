/*!
 * Simulation Configuration
 * Actor counts, buffer size, policy and timing for one run
 */

use crate::core::limits::{MAX_CONSUMERS, MAX_PRODUCERS, MAX_SLOTS};
use crate::core::ConfigError;
use crate::actors::Latency;
use crate::monitor::AdmissionPolicy;
use crate::monitoring::{JsonSink, StdoutSink, TraceSink, TracingSink};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Buffer policy selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    #[default]
    TypeDemand,
    Fifo,
    RoundRobin,
}

/// Where produce/consume trace events go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SinkKind {
    /// Human-readable lines on stdout
    #[default]
    Stdout,
    /// JSON lines on stdout
    Json,
    /// `tracing` debug events, filtered by RUST_LOG
    Tracing,
}

impl SinkKind {
    pub fn sink(self) -> Arc<dyn TraceSink> {
        match self {
            SinkKind::Stdout => Arc::new(StdoutSink),
            SinkKind::Json => Arc::new(JsonSink),
            SinkKind::Tracing => Arc::new(TracingSink),
        }
    }
}

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    pub producers: usize,
    pub consumers: usize,
    pub capacity: usize,
    pub producer_iterations: usize,
    pub consumer_iterations: usize,
    pub policy: PolicyKind,
    /// Upper bound of the random pause before each call
    pub max_latency: Duration,
    /// Deadline for each produce/consume; `None` blocks indefinitely
    pub op_timeout: Option<Duration>,
    /// Fixed seed for reproducible latencies
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            producers: 2,
            consumers: 2,
            capacity: 5,
            producer_iterations: 5,
            consumer_iterations: 5,
            policy: PolicyKind::TypeDemand,
            max_latency: crate::core::limits::DEFAULT_MAX_LATENCY,
            op_timeout: None,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Configuration for tests: no latency, bounded waits
    pub fn quick(
        producers: usize,
        consumers: usize,
        capacity: usize,
        producer_iterations: usize,
        consumer_iterations: usize,
    ) -> Self {
        Self {
            producers,
            consumers,
            capacity,
            producer_iterations,
            consumer_iterations,
            max_latency: Duration::ZERO,
            op_timeout: Some(Duration::from_secs(10)),
            seed: Some(1),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("producers", self.producers, MAX_PRODUCERS)?;
        check_range("consumers", self.consumers, MAX_CONSUMERS)?;
        check_range("capacity", self.capacity, MAX_SLOTS)?;
        check_positive("producer iterations", self.producer_iterations)?;
        check_positive("consumer iterations", self.consumer_iterations)?;
        Ok(())
    }

    pub fn admission_policy(&self) -> AdmissionPolicy {
        match self.policy {
            PolicyKind::TypeDemand => AdmissionPolicy::TypeDemand,
            PolicyKind::Fifo => AdmissionPolicy::Fifo,
            PolicyKind::RoundRobin => AdmissionPolicy::RoundRobin {
                producers: self.producers as u32,
            },
        }
    }

    pub fn latency(&self) -> Latency {
        Latency::up_to(self.max_latency)
    }

    /// Total items the producers will deposit
    pub fn total_supply(&self) -> usize {
        self.producers * self.producer_iterations
    }

    /// Total items the consumers will ask for
    pub fn total_demand(&self) -> usize {
        self.consumers * self.consumer_iterations
    }
}

fn check_positive(name: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Zero { name });
    }
    Ok(())
}

fn check_range(name: &'static str, value: usize, max: usize) -> Result<(), ConfigError> {
    check_positive(name, value)?;
    if value > max {
        return Err(ConfigError::OutOfRange { name, value, max });
    }
    Ok(())
}
