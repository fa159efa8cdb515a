//! Echo filters for observing bus traffic
//!
//! Every bus-connected process registers one echo handler per connection.
//! The handler logs traffic when bus logging is enabled, reacts to runtime
//! log-control messages, and scrubs credentials from registration payloads
//! before they can reach the log.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::logging::{LogControl, LogLevel};
use crate::message::BusMessage;
use crate::metrics;
use crate::settings::Settings;

/// Message type carrying runtime logging adjustments
pub const DEBUG_LOG_TYPE: &str = "mycroft.debug.log";

/// Message type whose payload carries a credential token
pub const REGISTRATION_TYPE: &str = "registration";

/// Observes bus traffic on behalf of one named process
///
/// Construction captures the whitelist and a snapshot of the configured
/// blacklist. All shared state lives in the [`LogControl`] handed in, so
/// independent filters over the same control cell cooperate while filters
/// over different cells stay isolated.
pub struct EchoFilter {
    name: String,
    whitelist: Option<HashSet<String>>,
    blacklist: HashSet<String>,
    control: Arc<LogControl>,
}

impl EchoFilter {
    /// Build a filter attributed to `name`
    ///
    /// A whitelist of `None` admits every message type; `Some` restricts
    /// observation to exactly the listed types. The blacklist is read from
    /// `settings` once, here.
    pub fn new(
        name: impl Into<String>,
        whitelist: Option<HashSet<String>>,
        settings: &Settings,
        control: Arc<LogControl>,
    ) -> Self {
        Self {
            name: name.into(),
            whitelist,
            blacklist: settings.log_blacklist.clone(),
            control,
        }
    }

    /// Observe one raw message from the bus
    ///
    /// Never fails and never panics: unparseable input and every failure
    /// inside control handling collapse to doing nothing, so a handler
    /// registered on a live connection cannot disturb message delivery.
    pub fn observe(&self, raw: &str) {
        if let Some(line) = self.process(raw) {
            debug!(process = %self.name, "{}", line);
            metrics::ECHO_OBSERVED_TOTAL
                .with_label_values(&[&self.name, "echoed"])
                .inc();
        }
    }

    /// Run the filter pipeline and return the text to echo, if any
    ///
    /// Filtering is applied before control interpretation: a muted or
    /// blacklisted control message changes nothing. The bus-logging toggle
    /// is read after control handling, so the message that enables it is
    /// itself the first one echoed.
    fn process(&self, raw: &str) -> Option<String> {
        let mut msg = match BusMessage::parse(raw) {
            Ok(msg) => msg,
            Err(_) => {
                metrics::ECHO_OBSERVED_TOTAL
                    .with_label_values(&[&self.name, "unparseable"])
                    .inc();
                return None;
            }
        };

        if let Some(whitelist) = &self.whitelist {
            if !whitelist.contains(&msg.msg_type) {
                metrics::ECHO_OBSERVED_TOTAL
                    .with_label_values(&[&self.name, "muted"])
                    .inc();
                return None;
            }
        }

        if self.blacklist.contains(&msg.msg_type) {
            metrics::ECHO_OBSERVED_TOTAL
                .with_label_values(&[&self.name, "filtered"])
                .inc();
            return None;
        }

        let mut redacted = None;
        if msg.msg_type == DEBUG_LOG_TYPE {
            self.handle_debug_log(&msg);
        } else if msg.msg_type == REGISTRATION_TYPE {
            if let Some(data) = msg.data.as_mut() {
                data.insert("token".to_string(), Value::Null);
                // a scrubbed payload that cannot be re-serialized is
                // dropped rather than echoed with its token intact
                redacted = Some(msg.to_json().ok()?);
                metrics::ECHO_REDACTED_TOTAL
                    .with_label_values(&[&self.name])
                    .inc();
            }
        }

        if self.control.log_all_bus_messages() {
            Some(redacted.unwrap_or_else(|| raw.to_string()))
        } else {
            metrics::ECHO_OBSERVED_TOTAL
                .with_label_values(&[&self.name, "silent"])
                .inc();
            None
        }
    }

    /// Apply a `mycroft.debug.log` control message
    ///
    /// The level and bus sub-commands are independent; a missing or invalid
    /// level does not stop the bus toggle from applying. A payload without
    /// `data` adjusts nothing.
    fn handle_debug_log(&self, msg: &BusMessage) {
        let data = match &msg.data {
            Some(data) => data,
            None => return,
        };

        if let Some(lvl) = data
            .get("level")
            .and_then(Value::as_str)
            .and_then(LogLevel::parse)
        {
            let _ = self.control.set_level(lvl);
            info!(process = %self.name, "Changing log level to: {}", lvl);
            let _ = self.control.set_net_level(lvl);
            metrics::ECHO_CONTROL_TOTAL
                .with_label_values(&[&self.name, "log_level"])
                .inc();
        }

        // JSON null means the key is absent; a literal false is present
        // and disables bus logging
        match data.get("bus") {
            None | Some(Value::Null) => {}
            Some(flag) => {
                info!(process = %self.name, "Bus logging: {}", flag);
                self.control.set_log_all_bus_messages(json_truthy(flag));
                metrics::ECHO_CONTROL_TOTAL
                    .with_label_values(&[&self.name, "bus_toggle"])
                    .inc();
            }
        }
    }
}

/// Build the echo handler a bus subscriber registers for `name`
///
/// The returned closure forwards each raw message to a captured
/// [`EchoFilter`]; see [`EchoFilter::observe`] for the behavior.
pub fn make_echo(
    name: impl Into<String>,
    whitelist: Option<HashSet<String>>,
    settings: &Settings,
    control: Arc<LogControl>,
) -> impl Fn(&str) + Send + Sync {
    let filter = EchoFilter::new(name, whitelist, settings, control);
    move |raw: &str| filter.observe(raw)
}

/// Truthiness of an arbitrary JSON value: empty strings, empty containers,
/// zero, null and false are falsy, everything else truthy
fn json_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
