/*!
 * Simulation
 * Builds one buffer, runs the configured producers and consumers on their
 * own threads and joins them
 *
 * Roster: producer `i` deposits `i * iterations ..` with type `i % 2`;
 * consumer `j` demands type `j % 2`. With unbalanced supply and demand per
 * type some consumers never finish unless an operation timeout is set.
 */

use super::{join_actor, ActorRun, Consumer, Producer};
use crate::config::SimulationConfig;
use crate::core::limits::SIMULATION_TYPE_COUNT;
use crate::core::types::{ActorId, Demand, MonitorResult, Value};
use crate::core::{ConfigError, MonitorError};
use crate::monitor::{BufferStats, TypedRingBuffer};
use crate::monitoring::{NullSink, RunSpan, TraceSink};
use serde::Serialize;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{info, warn};

type ActorHandle = (String, JoinHandle<ActorRun>);

/// Result of one actor thread
///
/// `values` lists everything the actor moved through the buffer, also when
/// it stopped early with `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActorOutcome {
    pub actor: String,
    pub values: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<MonitorError>,
}

impl ActorOutcome {
    fn join(actor: String, handle: JoinHandle<ActorRun>) -> Self {
        let run = join_actor(&actor, handle)
            .unwrap_or_else(|panicked| ActorRun::stopped(Vec::new(), panicked));
        Self {
            actor,
            values: run.values,
            error: run.error,
        }
    }
}

/// Outcome of a full run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub run_id: String,
    pub producers: Vec<ActorOutcome>,
    pub consumers: Vec<ActorOutcome>,
    pub stats: BufferStats,
}

impl SimulationReport {
    pub fn is_success(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = (&str, &MonitorError)> {
        self.producers
            .iter()
            .chain(self.consumers.iter())
            .filter_map(|o| o.error.as_ref().map(|e| (o.actor.as_str(), e)))
    }

    pub fn produced_values(&self) -> Vec<Value> {
        self.producers
            .iter()
            .flat_map(|o| o.values.iter().copied())
            .collect()
    }

    pub fn consumed_values(&self) -> Vec<Value> {
        self.consumers
            .iter()
            .flat_map(|o| o.values.iter().copied())
            .collect()
    }
}

/// One configured run
pub struct Simulation {
    config: SimulationConfig,
    sink: Arc<dyn TraceSink>,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            sink: Arc::new(NullSink),
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn producers(&self) -> Vec<Producer> {
        let c = &self.config;
        (0..c.producers as ActorId)
            .map(|id| {
                let start = id as Value * c.producer_iterations as Value;
                Producer::new(id, id % SIMULATION_TYPE_COUNT, start, c.producer_iterations)
                    .with_latency(c.latency())
                    .with_timeout(c.op_timeout)
                    .with_seed(c.seed)
            })
            .collect()
    }

    pub fn consumers(&self) -> Vec<Consumer> {
        let c = &self.config;
        (0..c.consumers as ActorId)
            .map(|id| {
                Consumer::new(
                    id,
                    Demand::Type(id % SIMULATION_TYPE_COUNT),
                    c.consumer_iterations,
                )
                .with_latency(c.latency())
                .with_timeout(c.op_timeout)
                .with_seed(c.seed)
            })
            .collect()
    }

    /// Spawn every actor, wait for all of them and collect the outcome
    pub fn run(&self) -> MonitorResult<SimulationReport> {
        let run = RunSpan::new("buffer");
        let _entered = run.enter();

        let buffer = Arc::new(
            TypedRingBuffer::builder(self.config.capacity)
                .with_policy(self.config.admission_policy())
                .with_sink(self.sink.clone())
                .build()?,
        );

        info!(
            producers = self.config.producers,
            consumers = self.config.consumers,
            capacity = self.config.capacity,
            policy = buffer.policy().name(),
            "starting simulation"
        );
        if self.config.total_supply() != self.config.total_demand() {
            warn!(
                supply = self.config.total_supply(),
                demand = self.config.total_demand(),
                "supply and demand differ, some actors may block"
            );
        }

        let mut producer_handles = Vec::with_capacity(self.config.producers);
        let mut consumer_handles = Vec::with_capacity(self.config.consumers);
        if let Err(error) = self.spawn_all(&buffer, &mut producer_handles, &mut consumer_handles) {
            warn!(
                error = %error,
                started = producer_handles.len() + consumer_handles.len(),
                "spawn failed, closing buffer"
            );
            buffer.close();
            for (name, handle) in producer_handles.into_iter().chain(consumer_handles) {
                ActorOutcome::join(name, handle);
            }
            return Err(error);
        }

        let producers: Vec<_> = producer_handles
            .into_iter()
            .map(|(name, handle)| ActorOutcome::join(name, handle))
            .collect();

        let consumers: Vec<_> = consumer_handles
            .into_iter()
            .map(|(name, handle)| ActorOutcome::join(name, handle))
            .collect();

        let report = SimulationReport {
            run_id: run.run_id().to_string(),
            producers,
            consumers,
            stats: buffer.stats(),
        };

        for (actor, error) in report.errors() {
            warn!(actor, error = %error, "actor failed");
        }
        run.record_items(report.stats.consumed as usize);
        run.record_result(report.is_success());

        Ok(report)
    }

    /// Start every actor; handles of those already running stay in the vectors on failure
    fn spawn_all(
        &self,
        buffer: &Arc<TypedRingBuffer>,
        producers: &mut Vec<ActorHandle>,
        consumers: &mut Vec<ActorHandle>,
    ) -> MonitorResult<()> {
        for producer in self.producers() {
            let name = producer.name();
            producers.push((name, producer.spawn(buffer.clone())?));
        }
        for consumer in self.consumers() {
            let name = consumer.name();
            consumers.push((name, consumer.spawn(buffer.clone())?));
        }
        Ok(())
    }
}
