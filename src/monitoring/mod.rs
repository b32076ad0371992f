/*!
 * Monitoring
 * Structured logging setup and trace sinks for monitor events
 */

mod sink;
mod tracer;

pub use sink::{
    JsonSink, NullSink, RecordingSink, StdoutSink, TraceEvent, TraceSink, TracingSink,
};
pub use tracer::{generate_run_id, init_tracing, RunSpan};
