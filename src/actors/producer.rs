/*!
 * Producer Actor
 * Deposits a run of consecutive values with a fixed type tag
 */

use super::latency::{actor_rng, Latency};
use super::ActorRun;
use crate::core::types::{ActorId, MonitorResult, TypeTag, Value};
use crate::monitor::TypedRingBuffer;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::debug;

/// Producer configuration and loop
#[derive(Debug, Clone)]
pub struct Producer {
    pub id: ActorId,
    pub kind: TypeTag,
    pub start_value: Value,
    pub iterations: usize,
    pub latency: Latency,
    /// Per-deposit deadline; `None` blocks indefinitely
    pub timeout: Option<Duration>,
    pub seed: Option<u64>,
}

impl Producer {
    pub fn new(id: ActorId, kind: TypeTag, start_value: Value, iterations: usize) -> Self {
        Self {
            id,
            kind,
            start_value,
            iterations,
            latency: Latency::none(),
            timeout: None,
            seed: None,
        }
    }

    pub fn with_latency(mut self, latency: Latency) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn name(&self) -> String {
        format!("producer-{}", self.id)
    }

    /// Run the producer on the current thread, returning the values deposited
    /// up to the first failed call
    pub fn run(&self, buffer: &TypedRingBuffer) -> ActorRun {
        let mut rng = actor_rng(self.seed, u64::from(self.id));
        let mut produced = Vec::with_capacity(self.iterations);

        for value in (self.start_value..).take(self.iterations) {
            self.latency.pause(&mut rng);
            let deposited = match self.timeout {
                Some(timeout) => buffer.produce_timeout(value, self.kind, self.id, timeout),
                None => buffer.produce(value, self.kind, self.id),
            };
            if let Err(error) = deposited {
                debug!(actor = self.id, count = produced.len(), error = %error, "producer stopped");
                return ActorRun::stopped(produced, error);
            }
            produced.push(value);
        }

        debug!(actor = self.id, count = produced.len(), "producer finished");
        ActorRun::finished(produced)
    }

    /// Run on a named thread
    pub fn spawn(self, buffer: Arc<TypedRingBuffer>) -> MonitorResult<JoinHandle<ActorRun>> {
        super::spawn_actor(self.name(), move || self.run(&buffer))
    }
}
