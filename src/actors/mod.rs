/*!
 * Actors
 *
 * Producer, consumer and player loops that drive the monitors from their
 * own threads. Actors hold no shared state of their own; every interaction
 * goes through a monitor call.
 */

mod consumer;
mod latency;
mod player;
mod producer;
mod simulation;

pub use consumer::Consumer;
pub use latency::{actor_rng, Latency};
pub use player::Player;
pub use producer::Producer;
pub use simulation::{ActorOutcome, Simulation, SimulationReport};

use crate::core::types::{MonitorResult, Value};
use crate::core::MonitorError;
use std::thread::{self, JoinHandle};

/// Values an actor moved through the monitor, and the error that stopped it early
///
/// `values` holds every item the actor completed, including those before a
/// failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorRun {
    pub values: Vec<Value>,
    pub error: Option<MonitorError>,
}

impl ActorRun {
    pub fn finished(values: Vec<Value>) -> Self {
        Self {
            values,
            error: None,
        }
    }

    pub fn stopped(values: Vec<Value>, error: MonitorError) -> Self {
        Self {
            values,
            error: Some(error),
        }
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Drop the partial values if the run stopped early
    pub fn into_result(self) -> MonitorResult<Vec<Value>> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.values),
        }
    }
}

/// Spawn a named actor thread inside the caller's tracing span
pub(crate) fn spawn_actor<T, F>(name: String, f: F) -> MonitorResult<JoinHandle<T>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let span = tracing::Span::current();
    thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            let _entered = span.enter();
            f()
        })
        .map_err(|e| MonitorError::SpawnFailed {
            actor: name,
            reason: e.to_string(),
        })
}

/// Join an actor, turning a panic into `ActorPanicked`
pub(crate) fn join_actor<T>(name: &str, handle: JoinHandle<T>) -> MonitorResult<T> {
    handle
        .join()
        .map_err(|_| MonitorError::ActorPanicked(name.to_string()))
}
