/*!
 * Simulation Tests
 * Full runs through the actor roster with recorded traces
 */

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use typed_monitor::{
    MonitorError, PolicyKind, RecordingSink, Simulation, SimulationConfig, TraceEvent,
};

#[test]
fn test_every_value_consumed_once() {
    let sink = Arc::new(RecordingSink::new());
    let config = SimulationConfig {
        max_latency: Duration::from_millis(2),
        ..SimulationConfig::quick(4, 4, 3, 6, 6)
    };
    let report = Simulation::new(config)
        .unwrap()
        .with_sink(sink.clone())
        .run()
        .unwrap();

    assert!(report.is_success());

    let mut produced = report.produced_values();
    let mut consumed = report.consumed_values();
    produced.sort_unstable();
    consumed.sort_unstable();
    assert_eq!(produced, (0..24).collect::<Vec<_>>());
    assert_eq!(consumed, produced);

    assert_eq!(sink.len(), 48);
    for event in sink.consumed() {
        if let TraceEvent::Consumed { actor, kind, .. } = event {
            assert_eq!(kind, actor % 2);
        }
    }
}

#[test]
fn test_unbalanced_demand_times_out() {
    // one type-0 producer, but consumer 1 wants type 1
    let config = SimulationConfig {
        op_timeout: Some(Duration::from_millis(100)),
        ..SimulationConfig::quick(1, 2, 2, 2, 1)
    };
    let report = Simulation::new(config).unwrap().run().unwrap();

    assert!(!report.is_success());
    let errors: Vec<_> = report.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, "consumer-1");
    assert!(matches!(errors[0].1, MonitorError::Timeout { .. }));
    assert_eq!(report.stats.count, 1);
}

#[test]
fn test_partial_consumer_keeps_withdrawn_values() {
    // two type-0 items for a consumer that wants three
    let config = SimulationConfig {
        op_timeout: Some(Duration::from_millis(100)),
        ..SimulationConfig::quick(1, 1, 2, 2, 3)
    };
    let report = Simulation::new(config).unwrap().run().unwrap();

    assert!(!report.is_success());
    assert_eq!(report.consumers[0].values, vec![0, 1]);
    assert!(matches!(
        report.consumers[0].error,
        Some(MonitorError::Timeout { .. })
    ));
    assert_eq!(report.consumed_values().len() as u64, report.stats.consumed);
    assert_eq!(report.produced_values().len() as u64, report.stats.produced);
}

#[test]
fn test_fifo_policy_run() {
    let config = SimulationConfig {
        policy: PolicyKind::Fifo,
        ..SimulationConfig::quick(3, 1, 2, 3, 9)
    };
    let report = Simulation::new(config).unwrap().run().unwrap();
    assert!(report.is_success());
    assert_eq!(report.stats.consumed, 9);
    assert_eq!(report.stats.type_waits, 0);
}

#[test]
fn test_report_serializes() {
    let report = Simulation::new(SimulationConfig::quick(1, 1, 1, 2, 2))
        .unwrap()
        .run()
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["stats"]["produced"], 2);
    assert_eq!(json["producers"][0]["actor"], "producer-0");
}
