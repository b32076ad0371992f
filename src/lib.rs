/*!
 * Typed Monitor Library
 * Monitor-based producer/consumer synchronization over a bounded typed ring
 */

pub mod actors;
pub mod config;
pub mod core;
pub mod monitor;
pub mod monitoring;

// Re-exports
pub use actors::{ActorRun, Consumer, Latency, Player, Producer, Simulation, SimulationReport};
pub use config::{PolicyKind, SimulationConfig, SinkKind};
pub use crate::core::{ActorId, ConfigError, Demand, Item, MonitorError, MonitorResult, TypeTag, Value};
pub use monitor::{AdmissionPolicy, BufferStats, Court, TypedRingBuffer};
pub use monitoring::{init_tracing, RecordingSink, TraceEvent, TraceSink};
