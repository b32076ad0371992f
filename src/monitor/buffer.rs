/*!
 * Typed Ring Buffer Monitor
 *
 * Bounded buffer of typed items shared by producer and consumer actors.
 * All state lives behind one mutex; every wait goes through a condition
 * variable that releases the lock and re-checks its guard on wake (Mesa).
 *
 * # Consumer algorithm
 *
 * `WAIT_NONEMPTY -> SCANNING -> {FOUND -> DONE | EXHAUSTED -> WAIT_TYPE -> SCANNING}`
 *
 * A consumer scans the occupied span from the oldest slot. If nothing
 * matches it parks on `type_available` and rescans the whole span after
 * the next deposit. Producers broadcast on both `not_empty` and
 * `type_available` because any subset of the parked consumers, each
 * waiting on its own type, may have become satisfiable.
 */

use super::policy::AdmissionPolicy;
use super::ring::{BufferSnapshot, RingBuffer};
use crate::core::types::{ActorId, Demand, Item, MonitorResult, TypeTag, Value};
use crate::core::MonitorError;
use crate::monitoring::{NullSink, TraceEvent, TraceSink};
use parking_lot::{Condvar, Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Why an actor is parked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitReason {
    NotFull,
    NotEmpty,
    TypeAvailable,
    Turn,
}

impl WaitReason {
    fn as_str(&self) -> &'static str {
        match self {
            WaitReason::NotFull => "not_full",
            WaitReason::NotEmpty => "not_empty",
            WaitReason::TypeAvailable => "type_available",
            WaitReason::Turn => "turn",
        }
    }
}

/// Deadline for one operation, kept with its origin for error reporting
#[derive(Debug, Clone, Copy)]
struct Deadline {
    start: Instant,
    timeout: Duration,
}

impl Deadline {
    fn after(timeout: Duration) -> Self {
        Self {
            start: Instant::now(),
            timeout,
        }
    }

    #[inline]
    fn at(&self) -> Instant {
        self.start + self.timeout
    }
}

/// Monitor counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counters {
    produced: u64,
    consumed: u64,
    full_waits: u64,
    empty_waits: u64,
    type_waits: u64,
    turn_waits: u64,
    timeouts: u64,
}

/// State guarded by the monitor lock
struct MonitorState {
    ring: RingBuffer,
    /// Producer whose turn it is (round-robin only)
    turn: ActorId,
    counters: Counters,
    closed: bool,
}

/// Buffer statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BufferStats {
    pub policy: AdmissionPolicy,
    pub capacity: usize,
    pub count: usize,
    pub head: usize,
    pub tail: usize,
    pub produced: u64,
    pub consumed: u64,
    pub full_waits: u64,
    pub empty_waits: u64,
    pub type_waits: u64,
    pub turn_waits: u64,
    pub timeouts: u64,
}

/// The type-demand bounded buffer monitor
///
/// Share it between actors with `Arc<TypedRingBuffer>`.
///
/// # Examples
///
/// ```
/// use typed_monitor::monitor::TypedRingBuffer;
///
/// let buffer = TypedRingBuffer::new(3).unwrap();
/// buffer.produce(10, 0, 0).unwrap();
/// buffer.produce(11, 1, 0).unwrap();
///
/// // Skips the type-0 item at the oldest slot
/// assert_eq!(buffer.consume(0, 1).unwrap(), 11);
/// assert_eq!(buffer.len(), 1);
/// ```
pub struct TypedRingBuffer {
    state: Mutex<MonitorState>,
    not_full: Condvar,
    not_empty: Condvar,
    type_available: Condvar,
    turn: Condvar,
    policy: AdmissionPolicy,
    sink: Arc<dyn TraceSink>,
}

impl std::fmt::Debug for TypedRingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TypedRingBuffer")
            .field("policy", &self.policy)
            .field("capacity", &state.ring.capacity())
            .field("count", &state.ring.len())
            .field("head", &state.ring.head())
            .field("tail", &state.ring.tail())
            .field("sink", &self.sink.name())
            .finish()
    }
}

/// Builder for [`TypedRingBuffer`]
pub struct TypedRingBufferBuilder {
    capacity: usize,
    policy: AdmissionPolicy,
    sink: Arc<dyn TraceSink>,
}

impl TypedRingBufferBuilder {
    pub fn with_policy(mut self, policy: AdmissionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn build(self) -> MonitorResult<TypedRingBuffer> {
        Ok(TypedRingBuffer {
            state: Mutex::new(MonitorState {
                ring: RingBuffer::new(self.capacity)?,
                turn: 0,
                counters: Counters::default(),
                closed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            type_available: Condvar::new(),
            turn: Condvar::new(),
            policy: self.policy,
            sink: self.sink,
        })
    }
}

impl TypedRingBuffer {
    /// Type-demand buffer with no trace sink
    pub fn new(capacity: usize) -> MonitorResult<Self> {
        Self::builder(capacity).build()
    }

    pub fn with_policy(capacity: usize, policy: AdmissionPolicy) -> MonitorResult<Self> {
        Self::builder(capacity).with_policy(policy).build()
    }

    pub fn builder(capacity: usize) -> TypedRingBufferBuilder {
        TypedRingBufferBuilder {
            capacity,
            policy: AdmissionPolicy::default(),
            sink: Arc::new(NullSink),
        }
    }

    #[inline]
    pub fn policy(&self) -> AdmissionPolicy {
        self.policy
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().ring.capacity()
    }

    pub fn len(&self) -> usize {
        self.state.lock().ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().ring.is_empty()
    }

    /// Shut the buffer down
    ///
    /// Every parked actor wakes and, like any later call, fails with
    /// `MonitorError::Closed`. Items still in the buffer stay in the snapshot.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;

        self.not_full.notify_all();
        self.not_empty.notify_all();
        self.type_available.notify_all();
        self.turn.notify_all();
        warn!(count = state.ring.len(), "buffer closed");
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Insert a typed item, blocking while the buffer is full
    /// (and, under round-robin, while it is not `source`'s turn)
    pub fn produce(&self, value: Value, kind: TypeTag, source: ActorId) -> MonitorResult<()> {
        self.produce_inner(Item::new(value, kind), source, None)
    }

    /// `produce` that gives up with `MonitorError::Timeout` after `timeout`
    pub fn produce_timeout(
        &self,
        value: Value,
        kind: TypeTag,
        source: ActorId,
        timeout: Duration,
    ) -> MonitorResult<()> {
        self.produce_inner(Item::new(value, kind), source, Some(Deadline::after(timeout)))
    }

    /// Remove the oldest item of type `kind`, blocking until one exists
    pub fn consume(&self, consumer: ActorId, kind: TypeTag) -> MonitorResult<Value> {
        self.consume_inner(consumer, Demand::from(kind), None)
    }

    /// `consume` that gives up with `MonitorError::Timeout` after `timeout`
    pub fn consume_timeout(
        &self,
        consumer: ActorId,
        kind: TypeTag,
        timeout: Duration,
    ) -> MonitorResult<Value> {
        self.consume_inner(consumer, Demand::from(kind), Some(Deadline::after(timeout)))
    }

    /// General form of `consume`: any demand, optional deadline
    pub fn consume_matching(
        &self,
        consumer: ActorId,
        demand: Demand,
        timeout: Option<Duration>,
    ) -> MonitorResult<Value> {
        self.consume_inner(consumer, demand, timeout.map(Deadline::after))
    }

    /// Single scan for type `kind` without blocking
    pub fn try_consume(&self, consumer: ActorId, kind: TypeTag) -> MonitorResult<Option<Value>> {
        self.try_consume_matching(consumer, Demand::from(kind))
    }

    pub fn try_consume_matching(
        &self,
        consumer: ActorId,
        demand: Demand,
    ) -> MonitorResult<Option<Value>> {
        let demand = self.policy.effective_demand(demand);
        let mut state = self.state.lock();
        self.check(&state)?;

        match state.ring.find(demand) {
            Some(offset) => self.take(&mut state, consumer, offset).map(Some),
            None => Ok(None),
        }
    }

    pub fn stats(&self) -> BufferStats {
        let state = self.state.lock();
        let c = state.counters;
        BufferStats {
            policy: self.policy,
            capacity: state.ring.capacity(),
            count: state.ring.len(),
            head: state.ring.head(),
            tail: state.ring.tail(),
            produced: c.produced,
            consumed: c.consumed,
            full_waits: c.full_waits,
            empty_waits: c.empty_waits,
            type_waits: c.type_waits,
            turn_waits: c.turn_waits,
            timeouts: c.timeouts,
        }
    }

    pub fn snapshot(&self) -> BufferSnapshot {
        self.state.lock().ring.snapshot()
    }

    fn produce_inner(
        &self,
        item: Item,
        source: ActorId,
        deadline: Option<Deadline>,
    ) -> MonitorResult<()> {
        self.policy.validate_source(source)?;
        let mut state = self.state.lock();

        loop {
            self.check(&state)?;
            if state.ring.is_full() {
                self.park(&mut state, WaitReason::NotFull, source, deadline)?;
            } else if !self.policy.admits(source, state.turn) {
                self.park(&mut state, WaitReason::Turn, source, deadline)?;
            } else {
                break;
            }
        }

        let position = state.ring.push(item)?;
        state.counters.produced += 1;
        self.sink.record(&TraceEvent::produced(source, item, position));

        self.not_empty.notify_all();
        let woken = self.type_available.notify_all();
        debug!(
            actor = source,
            value = item.value,
            kind = item.kind,
            position,
            count = state.ring.len(),
            woken,
            "deposit"
        );

        if let AdmissionPolicy::RoundRobin { .. } = self.policy {
            state.turn = self.policy.next_turn(state.turn);
            self.turn.notify_all();
        }

        Ok(())
    }

    fn consume_inner(
        &self,
        consumer: ActorId,
        demand: Demand,
        deadline: Option<Deadline>,
    ) -> MonitorResult<Value> {
        let demand = self.policy.effective_demand(demand);
        let mut state = self.state.lock();

        loop {
            self.check(&state)?;

            // WAIT_NONEMPTY
            if state.ring.is_empty() {
                self.park(&mut state, WaitReason::NotEmpty, consumer, deadline)?;
                continue;
            }

            // SCANNING always restarts from the oldest slot
            match state.ring.find(demand) {
                Some(offset) => return self.take(&mut state, consumer, offset),
                None => {
                    debug!(actor = consumer, %demand, count = state.ring.len(), "scan exhausted");
                    self.park(&mut state, WaitReason::TypeAvailable, consumer, deadline)?;
                }
            }
        }
    }

    /// Remove a located item and wake producers
    fn take(
        &self,
        state: &mut MutexGuard<'_, MonitorState>,
        consumer: ActorId,
        offset: usize,
    ) -> MonitorResult<Value> {
        let (item, position) = state.ring.remove(offset)?;
        state.counters.consumed += 1;
        self.sink.record(&TraceEvent::consumed(consumer, item, position));

        self.not_full.notify_all();
        debug!(
            actor = consumer,
            value = item.value,
            kind = item.kind,
            position,
            skipped = offset,
            count = state.ring.len(),
            "withdrawal"
        );

        Ok(item.value)
    }

    /// Release the lock until woken on the condition for `reason`
    ///
    /// Fails with `Timeout` once the deadline has passed; callers re-check
    /// their guard after every return.
    fn park(
        &self,
        state: &mut MutexGuard<'_, MonitorState>,
        reason: WaitReason,
        actor: ActorId,
        deadline: Option<Deadline>,
    ) -> MonitorResult<()> {
        if let Some(deadline) = deadline {
            let elapsed = deadline.start.elapsed();
            if elapsed >= deadline.timeout {
                state.counters.timeouts += 1;
                warn!(
                    actor,
                    reason = reason.as_str(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "monitor wait timed out"
                );
                return Err(MonitorError::timeout(elapsed, deadline.timeout));
            }
        }

        let condvar = match reason {
            WaitReason::NotFull => {
                state.counters.full_waits += 1;
                &self.not_full
            }
            WaitReason::NotEmpty => {
                state.counters.empty_waits += 1;
                &self.not_empty
            }
            WaitReason::TypeAvailable => {
                state.counters.type_waits += 1;
                &self.type_available
            }
            WaitReason::Turn => {
                state.counters.turn_waits += 1;
                &self.turn
            }
        };

        debug!(actor, reason = reason.as_str(), "parking");
        match deadline {
            Some(deadline) => {
                condvar.wait_until(state, deadline.at());
            }
            None => condvar.wait(state),
        }
        Ok(())
    }

    /// Bound check on every pass, full structural walk in debug builds
    fn check(&self, state: &MonitorState) -> MonitorResult<()> {
        if state.closed {
            return Err(MonitorError::Closed);
        }

        let result = if cfg!(debug_assertions) {
            state.ring.verify()
        } else {
            state.ring.check_bounds()
        };

        if let Err(ref e) = result {
            error!(error = %e, "ring invariant violated");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::RecordingSink;
    use std::thread;

    #[test]
    fn test_produce_then_consume() {
        let buffer = TypedRingBuffer::new(2).unwrap();
        buffer.produce(5, 0, 0).unwrap();
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.consume(0, 0).unwrap(), 5);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_zero_capacity() {
        assert!(matches!(
            TypedRingBuffer::new(0),
            Err(MonitorError::InvalidCapacity(0))
        ));
    }

    #[test]
    fn test_try_consume_does_not_block() {
        let buffer = TypedRingBuffer::new(2).unwrap();
        assert_eq!(buffer.try_consume(0, 1).unwrap(), None);
        buffer.produce(3, 0, 0).unwrap();
        assert_eq!(buffer.try_consume(0, 1).unwrap(), None);
        assert_eq!(buffer.try_consume_matching(0, Demand::Any).unwrap(), Some(3));
    }

    #[test]
    fn test_consume_timeout_on_empty() {
        let buffer = TypedRingBuffer::new(1).unwrap();
        let start = Instant::now();
        let err = buffer
            .consume_timeout(0, 0, Duration::from_millis(50))
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(buffer.stats().timeouts, 1);
    }

    #[test]
    fn test_produce_timeout_on_full() {
        let buffer = TypedRingBuffer::new(1).unwrap();
        buffer.produce(1, 0, 0).unwrap();
        let err = buffer
            .produce_timeout(2, 0, 0, Duration::from_millis(30))
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(buffer.stats().full_waits, 1);
        assert_eq!(buffer.snapshot().values(), vec![1]);
    }

    #[test]
    fn test_sink_sees_positions() {
        let sink = Arc::new(RecordingSink::new());
        let buffer = TypedRingBuffer::builder(3)
            .with_sink(sink.clone())
            .build()
            .unwrap();

        buffer.produce(10, 0, 0).unwrap();
        buffer.produce(11, 1, 0).unwrap();
        buffer.consume(7, 1).unwrap();

        assert_eq!(
            sink.events(),
            vec![
                TraceEvent::produced(0, Item::new(10, 0), 0),
                TraceEvent::produced(0, Item::new(11, 1), 1),
                TraceEvent::consumed(7, Item::new(11, 1), 1),
            ]
        );
    }

    #[test]
    fn test_blocked_consumer_woken_by_matching_deposit() {
        let buffer = Arc::new(TypedRingBuffer::new(2).unwrap());
        buffer.produce(1, 0, 0).unwrap();

        let consumer = {
            let buffer = buffer.clone();
            thread::spawn(move || buffer.consume_timeout(0, 1, Duration::from_secs(5)))
        };

        thread::sleep(Duration::from_millis(50));
        buffer.produce(2, 1, 0).unwrap();

        assert_eq!(consumer.join().unwrap().unwrap(), 2);
        assert!(buffer.stats().type_waits >= 1);
    }

    #[test]
    fn test_close_wakes_parked_actors() {
        let buffer = Arc::new(TypedRingBuffer::new(1).unwrap());
        buffer.produce(1, 0, 0).unwrap();

        let consumer = {
            let buffer = buffer.clone();
            thread::spawn(move || buffer.consume(0, 1))
        };
        let producer = {
            let buffer = buffer.clone();
            thread::spawn(move || buffer.produce(2, 1, 1))
        };

        thread::sleep(Duration::from_millis(50));
        buffer.close();

        assert_eq!(consumer.join().unwrap(), Err(MonitorError::Closed));
        assert_eq!(producer.join().unwrap(), Err(MonitorError::Closed));
        assert!(buffer.is_closed());
        assert_eq!(buffer.try_consume(0, 0), Err(MonitorError::Closed));
        assert_eq!(buffer.snapshot().values(), vec![1]);
    }

    #[test]
    fn test_debug_format() {
        let buffer = TypedRingBuffer::new(4).unwrap();
        let text = format!("{:?}", buffer);
        assert!(text.contains("capacity: 4"));
        assert!(text.contains("null"));
    }
}
