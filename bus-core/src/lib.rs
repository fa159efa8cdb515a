//! Bus utilities for HiveBus processes
//!
//! Provides the pieces every bus-connected process shares:
//! - JSON message envelope (`type` + optional `data`)
//! - Process-wide settings (certificate directory, echo blacklist)
//! - Runtime-adjustable logging via a reloadable filter
//! - The echo filter that observes bus traffic for diagnostics
//! - Prometheus counters for the echo path

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod echo;
pub mod error;
pub mod logging;
pub mod message;
pub mod metrics;
pub mod settings;

pub use echo::{make_echo, EchoFilter};
pub use error::{Error, Result};
pub use logging::{init_logging, LogControl, LogLevel};
pub use message::BusMessage;
pub use settings::Settings;
