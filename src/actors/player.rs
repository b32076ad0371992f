/*!
 * Player Actor
 * One visit to the court: enter, play one game, leave
 */

use super::latency::{actor_rng, Latency};
use crate::core::types::{ActorId, MonitorResult};
use crate::monitor::Court;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::info;

#[derive(Debug, Clone)]
pub struct Player {
    pub id: ActorId,
    pub latency: Latency,
    pub seed: Option<u64>,
}

impl Player {
    pub fn new(id: ActorId) -> Self {
        Self {
            id,
            latency: Latency::none(),
            seed: None,
        }
    }

    pub fn with_latency(mut self, latency: Latency) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn name(&self) -> String {
        format!("player-{}", self.id)
    }

    pub fn run(&self, court: &Court) -> MonitorResult<()> {
        let mut rng = actor_rng(self.seed, u64::from(self.id));

        self.latency.pause(&mut rng);
        info!(player = self.id, "waiting outside");
        court.ask_court(self.id)?;

        info!(player = self.id, "waiting inside");
        court.start_play(self.id)?;

        info!(player = self.id, "playing");
        self.latency.pause(&mut rng);
        court.free_court(self.id)?;

        info!(player = self.id, "left");
        Ok(())
    }

    pub fn spawn(self, court: Arc<Court>) -> MonitorResult<JoinHandle<MonitorResult<()>>> {
        super::spawn_actor(self.name(), move || self.run(&court))
    }
}
