/*!
 * Consumer Actor
 * Withdraws a fixed number of items matching one demand
 */

use super::latency::{actor_rng, Latency};
use super::ActorRun;
use crate::core::types::{ActorId, Demand, MonitorResult};
use crate::monitor::TypedRingBuffer;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::debug;

/// Consumer configuration and loop
#[derive(Debug, Clone)]
pub struct Consumer {
    pub id: ActorId,
    pub demand: Demand,
    pub iterations: usize,
    pub latency: Latency,
    /// Per-withdrawal deadline; `None` blocks indefinitely
    pub timeout: Option<Duration>,
    pub seed: Option<u64>,
}

impl Consumer {
    pub fn new(id: ActorId, demand: Demand, iterations: usize) -> Self {
        Self {
            id,
            demand,
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
        format!("consumer-{}", self.id)
    }

    /// Run the consumer on the current thread, returning the values withdrawn
    /// in order up to the first failed call
    pub fn run(&self, buffer: &TypedRingBuffer) -> ActorRun {
        // consumers and producers share ids, keep their streams apart
        let mut rng = actor_rng(self.seed, u64::from(self.id) | (1 << 32));
        let mut consumed = Vec::with_capacity(self.iterations);

        for _ in 0..self.iterations {
            self.latency.pause(&mut rng);
            match buffer.consume_matching(self.id, self.demand, self.timeout) {
                Ok(value) => consumed.push(value),
                Err(error) => {
                    debug!(actor = self.id, count = consumed.len(), error = %error, "consumer stopped");
                    return ActorRun::stopped(consumed, error);
                }
            }
        }

        debug!(actor = self.id, demand = %self.demand, count = consumed.len(), "consumer finished");
        ActorRun::finished(consumed)
    }

    /// Run on a named thread
    pub fn spawn(self, buffer: Arc<TypedRingBuffer>) -> MonitorResult<JoinHandle<ActorRun>> {
        super::spawn_actor(self.name(), move || self.run(&buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumer_takes_only_its_type() {
        let buffer = TypedRingBuffer::new(4).unwrap();
        for (value, kind) in [(1, 0), (2, 1), (3, 0), (4, 1)] {
            buffer.produce(value, kind, 0).unwrap();
        }

        let values = Consumer::new(0, Demand::Type(1), 2)
            .run(&buffer)
            .into_result()
            .unwrap();
        assert_eq!(values, vec![2, 4]);
        assert_eq!(buffer.snapshot().values(), vec![1, 3]);
    }

    #[test]
    fn test_consumer_times_out_without_match() {
        let buffer = TypedRingBuffer::new(2).unwrap();
        buffer.produce(1, 0, 0).unwrap();
        let err = Consumer::new(0, Demand::Type(1), 1)
            .with_timeout(Some(Duration::from_millis(20)))
            .run(&buffer)
            .into_result()
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_consumer_keeps_withdrawals_made_before_timeout() {
        let buffer = TypedRingBuffer::new(4).unwrap();
        buffer.produce(1, 1, 0).unwrap();
        buffer.produce(2, 0, 0).unwrap();
        buffer.produce(3, 1, 0).unwrap();

        let run = Consumer::new(0, Demand::Type(1), 3)
            .with_timeout(Some(Duration::from_millis(20)))
            .run(&buffer);

        assert_eq!(run.values, vec![1, 3]);
        assert!(run.error.unwrap().is_timeout());
        assert_eq!(buffer.stats().consumed, 2);
        assert_eq!(buffer.snapshot().values(), vec![2]);
    }
}
