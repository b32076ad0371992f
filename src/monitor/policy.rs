/*!
 * Admission Policy
 * Guard predicates and scan strategy selected per buffer
 */

use crate::core::types::{ActorId, Demand, MonitorResult};
use crate::core::MonitorError;
use serde::{Deserialize, Serialize};

/// Policy variants sharing the same produce/consume contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum AdmissionPolicy {
    /// Consumers demand a type and may skip non-matching items
    #[default]
    TypeDemand,
    /// Plain bounded buffer: consumers always take the oldest item
    Fifo,
    /// Producers deposit in strict rotation by source id; consumers take the oldest item
    RoundRobin { producers: u32 },
}

impl AdmissionPolicy {
    /// Demand actually applied to the scan for a consumer request
    #[inline]
    pub fn effective_demand(&self, requested: Demand) -> Demand {
        match self {
            AdmissionPolicy::TypeDemand => requested,
            AdmissionPolicy::Fifo | AdmissionPolicy::RoundRobin { .. } => Demand::Any,
        }
    }

    /// Reject sources that can never get a turn
    pub fn validate_source(&self, source: ActorId) -> MonitorResult<()> {
        match *self {
            AdmissionPolicy::RoundRobin { producers } if source >= producers => {
                Err(MonitorError::UnknownProducer {
                    source_id: source,
                    producers,
                })
            }
            _ => Ok(()),
        }
    }

    /// Whether `source` may deposit given the current rotation turn
    #[inline]
    pub fn admits(&self, source: ActorId, turn: ActorId) -> bool {
        match self {
            AdmissionPolicy::RoundRobin { .. } => source == turn,
            _ => true,
        }
    }

    /// Turn after a deposit
    #[inline]
    pub fn next_turn(&self, turn: ActorId) -> ActorId {
        match *self {
            AdmissionPolicy::RoundRobin { producers } => (turn + 1) % producers.max(1),
            _ => turn,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AdmissionPolicy::TypeDemand => "type-demand",
            AdmissionPolicy::Fifo => "fifo",
            AdmissionPolicy::RoundRobin { .. } => "round-robin",
        }
    }
}
