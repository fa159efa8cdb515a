//! Prometheus metrics for bus message filtering

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec};

lazy_static! {
    /// Messages observed by echo filters, by outcome
    /// (echoed / silent / muted / filtered / unparseable)
    pub static ref ECHO_OBSERVED_TOTAL: CounterVec = register_counter_vec!(
        "bus_echo_observed_total",
        "Total messages observed by echo filters",
        &["process", "outcome"]
    )
    .unwrap();

    /// Control messages applied by echo filters
    pub static ref ECHO_CONTROL_TOTAL: CounterVec = register_counter_vec!(
        "bus_echo_control_total",
        "Total control messages applied by echo filters",
        &["process", "command"]
    )
    .unwrap();

    /// Registration payloads scrubbed before echoing
    pub static ref ECHO_REDACTED_TOTAL: CounterVec = register_counter_vec!(
        "bus_echo_redacted_total",
        "Total registration payloads scrubbed of credentials",
        &["process"]
    )
    .unwrap();
}
