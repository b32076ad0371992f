/*!
 * Trace Sinks
 * Optional observers of produce/consume events
 *
 * The monitor calls into a sink while holding its lock, right after the
 * state change, so events reach the sink in the exact order the monitor
 * serialized them. Sinks must not call back into the monitor.
 */

use crate::core::types::{ActorId, Item, TypeTag, Value};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// A produce or consume event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    Produced {
        actor: ActorId,
        value: Value,
        kind: TypeTag,
        position: usize,
    },
    Consumed {
        actor: ActorId,
        value: Value,
        kind: TypeTag,
        position: usize,
    },
}

impl TraceEvent {
    pub fn produced(actor: ActorId, item: Item, position: usize) -> Self {
        TraceEvent::Produced {
            actor,
            value: item.value,
            kind: item.kind,
            position,
        }
    }

    pub fn consumed(actor: ActorId, item: Item, position: usize) -> Self {
        TraceEvent::Consumed {
            actor,
            value: item.value,
            kind: item.kind,
            position,
        }
    }

    #[inline]
    pub fn value(&self) -> Value {
        match self {
            TraceEvent::Produced { value, .. } | TraceEvent::Consumed { value, .. } => *value,
        }
    }

    #[inline]
    pub fn kind(&self) -> TypeTag {
        match self {
            TraceEvent::Produced { kind, .. } | TraceEvent::Consumed { kind, .. } => *kind,
        }
    }
}

impl std::fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraceEvent::Produced {
                actor,
                value,
                kind,
                position,
            } => write!(
                f,
                "Producer {} produced {} (type {}) in position {}",
                actor, value, kind, position
            ),
            TraceEvent::Consumed {
                actor,
                value,
                kind,
                position,
            } => write!(
                f,
                "Consumer {} consumed {} (type {}) from position {}",
                actor, value, kind, position
            ),
        }
    }
}

/// Receiver of monitor events
pub trait TraceSink: Send + Sync {
    fn record(&self, event: &TraceEvent);

    /// Get sink name for debugging
    fn name(&self) -> &'static str;
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TraceSink for NullSink {
    #[inline(always)]
    fn record(&self, _event: &TraceEvent) {}

    fn name(&self) -> &'static str {
        "null"
    }
}

/// Human-readable lines on standard output
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl TraceSink for StdoutSink {
    fn record(&self, event: &TraceEvent) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", event);
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}

/// One JSON object per line on standard output
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSink;

impl TraceSink for JsonSink {
    fn record(&self, event: &TraceEvent) {
        match serde_json::to_string(event) {
            Ok(line) => {
                let mut out = std::io::stdout().lock();
                let _ = writeln!(out, "{}", line);
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize trace event"),
        }
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

/// Forwards events to `tracing` at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn record(&self, event: &TraceEvent) {
        match *event {
            TraceEvent::Produced {
                actor,
                value,
                kind,
                position,
            } => tracing::debug!(actor, value, kind, position, "produced"),
            TraceEvent::Consumed {
                actor,
                value,
                kind,
                position,
            } => tracing::debug!(actor, value, kind, position, "consumed"),
        }
    }

    fn name(&self) -> &'static str {
        "tracing"
    }
}

/// Keeps every event in memory, in monitor order
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TraceEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    pub fn produced(&self) -> Vec<TraceEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, TraceEvent::Produced { .. }))
            .copied()
            .collect()
    }

    pub fn consumed(&self) -> Vec<TraceEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, TraceEvent::Consumed { .. }))
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl TraceSink for RecordingSink {
    fn record(&self, event: &TraceEvent) {
        self.events.lock().push(*event);
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_display() {
        let event = TraceEvent::produced(0, Item::new(10, 0), 0);
        assert_eq!(
            event.to_string(),
            "Producer 0 produced 10 (type 0) in position 0"
        );

        let event = TraceEvent::consumed(3, Item::new(11, 1), 2);
        assert_eq!(
            event.to_string(),
            "Consumer 3 consumed 11 (type 1) from position 2"
        );
    }

    #[test]
    fn test_event_json() {
        let event = TraceEvent::produced(1, Item::new(7, 1), 4);
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"event":"produced","actor":1,"value":7,"kind":1,"position":4}"#
        );
    }

    #[derive(Clone, Default)]
    struct SharedBuf(std::sync::Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_tracing_sink_emits_debug_events() {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            TracingSink.record(&TraceEvent::produced(2, Item::new(9, 1), 3));
            TracingSink.record(&TraceEvent::consumed(4, Item::new(9, 1), 3));
        });

        let output = String::from_utf8(buf.0.lock().clone()).unwrap();
        assert!(output.contains("produced"));
        assert!(output.contains("consumed"));
        assert!(output.contains("value=9"));
        assert!(output.contains("actor=4"));
    }

    #[test]
    fn test_recording_sink_split() {
        let sink = RecordingSink::new();
        sink.record(&TraceEvent::produced(0, Item::new(1, 0), 0));
        sink.record(&TraceEvent::consumed(0, Item::new(1, 0), 0));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.produced().len(), 1);
        assert_eq!(sink.consumed()[0].value(), 1);
    }
}
