//! Global subscriber installation. Runs in its own test binary so no other
//! subscriber can be installed first.

use siumai_relay::observability::{TracingConfig, init_tracing};

#[test]
fn first_install_wins_and_later_calls_are_no_ops() {
    let config = TracingConfig::new()
        .with_filter("siumai_relay=debug")
        .with_json(true);
    assert!(init_tracing(&config));
    assert!(!init_tracing(&TracingConfig::default()));
    tracing::debug!(target: "siumai_relay", "subscriber installed");
}
