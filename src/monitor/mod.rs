/*!
 * Monitors
 *
 * Lock-and-condition-variable monitors coordinating concurrent actors:
 * - `TypedRingBuffer`: bounded buffer with type-demand, FIFO or
 *   round-robin admission
 * - `Court`: pairwise access gate
 *
 * Liveness is the caller's concern. A consumer demanding a type that no
 * producer emits blocks forever (or until its deadline); the monitors only
 * guarantee mutual exclusion, ordering and the storage invariants.
 */

mod buffer;
mod court;
mod policy;
mod ring;

pub use buffer::{BufferStats, TypedRingBuffer, TypedRingBufferBuilder};
pub use court::{Court, CourtState};
pub use policy::AdmissionPolicy;
pub use ring::{BufferSnapshot, RingBuffer};
