/*!
 * Ring Storage
 * Fixed-capacity circular slot array with head/tail/count bookkeeping
 *
 * Holds no lock of its own: `TypedRingBuffer` owns it behind the monitor
 * mutex. The occupied slots always form one contiguous (wrapping) span of
 * `count` slots starting at `tail`, oldest first.
 */

use crate::core::types::{Demand, Item, MonitorResult, Slot};
use crate::core::MonitorError;
use serde::{Deserialize, Serialize};

/// Circular slot storage
#[derive(Debug, Clone)]
pub struct RingBuffer {
    slots: Box<[Slot]>,
    /// Next write position
    head: usize,
    /// Oldest occupied position (scan start)
    tail: usize,
    count: usize,
}

/// Point-in-time copy of the ring for diagnostics and tests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferSnapshot {
    pub slots: Vec<Slot>,
    pub head: usize,
    pub tail: usize,
    pub count: usize,
}

impl BufferSnapshot {
    /// Occupied items, oldest first
    pub fn items(&self) -> Vec<Item> {
        let capacity = self.slots.len();
        (0..self.count)
            .filter_map(|offset| self.slots[(self.tail + offset) % capacity])
            .collect()
    }

    /// Values of the occupied items, oldest first
    pub fn values(&self) -> Vec<crate::core::types::Value> {
        self.items().into_iter().map(|item| item.value).collect()
    }
}

impl RingBuffer {
    /// Create an empty ring with `capacity` slots
    pub fn new(capacity: usize) -> MonitorResult<Self> {
        if capacity == 0 {
            return Err(MonitorError::InvalidCapacity(capacity));
        }

        Ok(Self {
            slots: vec![None; capacity].into_boxed_slice(),
            head: 0,
            tail: 0,
            count: 0,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == self.slots.len()
    }

    #[inline]
    pub fn head(&self) -> usize {
        self.head
    }

    #[inline]
    pub fn tail(&self) -> usize {
        self.tail
    }

    /// Physical position of the `offset`-th oldest item
    #[inline(always)]
    fn position(&self, offset: usize) -> usize {
        (self.tail + offset) % self.slots.len()
    }

    /// Write an item at `head`, returning the position used
    ///
    /// The monitor only calls this after waiting for a free slot, so a full
    /// ring here means the guard was bypassed.
    pub fn push(&mut self, item: Item) -> MonitorResult<usize> {
        if self.is_full() {
            return Err(MonitorError::InvariantViolation(format!(
                "write attempted on full ring ({} slots)",
                self.count
            )));
        }

        let position = self.head;
        if self.slots[position].is_some() {
            return Err(MonitorError::InvariantViolation(format!(
                "head slot {} is occupied",
                position
            )));
        }

        self.slots[position] = Some(item);
        self.head = (position + 1) % self.slots.len();
        self.count += 1;
        Ok(position)
    }

    /// Bounded scan over the occupied span, oldest first
    ///
    /// Returns the offset (from `tail`) of the first item the demand accepts.
    /// Inspects at most `count` slots.
    pub fn find(&self, demand: Demand) -> Option<usize> {
        (0..self.count).find(|&offset| {
            self.slots[self.position(offset)]
                .as_ref()
                .is_some_and(|item| demand.accepts(item))
        })
    }

    /// Remove the item `offset` slots after `tail`
    ///
    /// Older items between `tail` and the removed slot move up by one so the
    /// occupied span stays contiguous, then `tail` advances. Returns the item
    /// and the position it was read from.
    pub fn remove(&mut self, offset: usize) -> MonitorResult<(Item, usize)> {
        if offset >= self.count {
            return Err(MonitorError::InvariantViolation(format!(
                "remove offset {} outside occupied span of {}",
                offset, self.count
            )));
        }

        let position = self.position(offset);
        let item = self.slots[position].take().ok_or_else(|| {
            MonitorError::InvariantViolation(format!(
                "slot {} inside occupied span is empty",
                position
            ))
        })?;

        for older in (0..offset).rev() {
            let from = self.position(older);
            let to = self.position(older + 1);
            self.slots[to] = self.slots[from].take();
        }

        self.tail = (self.tail + 1) % self.slots.len();
        self.count -= 1;
        Ok((item, position))
    }

    /// Cheap O(1) bound check, run on every monitor operation
    #[inline]
    pub fn check_bounds(&self) -> MonitorResult<()> {
        let capacity = self.slots.len();
        if self.count > capacity || self.head >= capacity || self.tail >= capacity {
            return Err(MonitorError::InvariantViolation(format!(
                "count={} head={} tail={} with capacity {}",
                self.count, self.head, self.tail, capacity
            )));
        }
        Ok(())
    }

    /// Full structural check: exactly `count` contiguous occupied slots
    /// starting at `tail`, ending right before `head`.
    pub fn verify(&self) -> MonitorResult<()> {
        self.check_bounds()?;
        let capacity = self.slots.len();

        if (self.tail + self.count) % capacity != self.head {
            return Err(MonitorError::InvariantViolation(format!(
                "head {} does not follow tail {} + count {}",
                self.head, self.tail, self.count
            )));
        }

        for offset in 0..capacity {
            let occupied = self.slots[self.position(offset)].is_some();
            if occupied != (offset < self.count) {
                return Err(MonitorError::InvariantViolation(format!(
                    "slot {} occupied={} breaks the contiguous span (tail {}, count {})",
                    self.position(offset),
                    occupied,
                    self.tail,
                    self.count
                )));
            }
        }

        Ok(())
    }

    pub fn snapshot(&self) -> BufferSnapshot {
        BufferSnapshot {
            slots: self.slots.to_vec(),
            head: self.head,
            tail: self.tail,
            count: self.count,
        }
    }
}
