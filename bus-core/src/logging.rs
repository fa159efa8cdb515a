//! Logging control for bus processes
//!
//! Installs the process's tracing subscriber behind a reloadable filter so
//! that the active level can be adjusted at runtime by control messages
//! observed on the bus.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

use crate::{Error, Result};

/// Log target of the websocket library used by the bus transport; its
/// verbosity is adjusted alongside the process level.
pub const NET_LOG_TARGET: &str = "tungstenite";

/// Log level names used on the wire by `mycroft.debug.log` control messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Most severe; folded into `error` for the tracing filter
    Critical,
    /// Errors only
    Error,
    /// Warnings and errors
    Warning,
    /// Routine operational messages
    Info,
    /// Everything, including echoed bus traffic
    Debug,
}

impl LogLevel {
    /// Parse a wire-level name, case-insensitively
    ///
    /// Returns `None` for anything outside the five known names.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CRITICAL" => Some(LogLevel::Critical),
            "ERROR" => Some(LogLevel::Error),
            "WARNING" => Some(LogLevel::Warning),
            "INFO" => Some(LogLevel::Info),
            "DEBUG" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// Wire-level spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Critical => "CRITICAL",
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARNING",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Directive fragment understood by `EnvFilter`
    fn directive(&self) -> &'static str {
        match self {
            LogLevel::Critical | LogLevel::Error => "error",
            LogLevel::Warning => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

struct LevelState {
    level: LogLevel,
    net_level: Option<LogLevel>,
    handle: Option<FilterHandle>,
}

/// Shared logging state for one bus process
///
/// One instance is `Arc`-shared by every echo filter in the process: the
/// `log_all_bus_messages` toggle and the active level live here rather than
/// in a module global, so independent instances (and tests) cannot
/// contaminate each other. Until [`init_logging`] attaches a filter handle,
/// level changes update this state only.
pub struct LogControl {
    log_all_bus_messages: AtomicBool,
    state: Mutex<LevelState>,
}

impl LogControl {
    /// Create a control cell with bus echoing off and the level at INFO
    pub fn new() -> Self {
        Self {
            log_all_bus_messages: AtomicBool::new(false),
            state: Mutex::new(LevelState {
                level: LogLevel::Info,
                net_level: None,
                handle: None,
            }),
        }
    }

    /// Whether ordinary bus traffic is echoed to the log
    pub fn log_all_bus_messages(&self) -> bool {
        self.log_all_bus_messages.load(Ordering::Relaxed)
    }

    /// Turn echoing of ordinary bus traffic on or off
    pub fn set_log_all_bus_messages(&self, on: bool) {
        self.log_all_bus_messages.store(on, Ordering::Relaxed);
    }

    /// Currently active level
    pub fn level(&self) -> LogLevel {
        self.state.lock().level
    }

    /// Set the process-wide level and reload the installed filter
    pub fn set_level(&self, level: LogLevel) -> Result<()> {
        let mut state = self.state.lock();
        state.level = level;
        Self::reload(&state)
    }

    /// Set the level of the bus transport's networking library
    pub fn set_net_level(&self, level: LogLevel) -> Result<()> {
        let mut state = self.state.lock();
        state.net_level = Some(level);
        Self::reload(&state)
    }

    fn filter_string(state: &LevelState) -> String {
        match state.net_level {
            Some(net) => format!(
                "{},{}={}",
                state.level.directive(),
                NET_LOG_TARGET,
                net.directive()
            ),
            None => state.level.directive().to_string(),
        }
    }

    fn reload(state: &LevelState) -> Result<()> {
        let handle = match &state.handle {
            Some(handle) => handle,
            None => return Ok(()),
        };
        let filter = EnvFilter::try_new(Self::filter_string(state))
            .map_err(|e| Error::LogFilter(e.to_string()))?;
        handle
            .reload(filter)
            .map_err(|e| Error::LogFilter(e.to_string()))
    }

    fn attach(&self, handle: FilterHandle) {
        self.state.lock().handle = Some(handle);
    }
}

impl Default for LogControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Install the process's tracing subscriber and attach its reload handle
///
/// The initial filter honors `RUST_LOG` when set; control messages replace
/// the filter wholesale afterwards. Fails if a global subscriber is already
/// installed.
pub fn init_logging(control: &LogControl) -> Result<()> {
    let initial = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(LogControl::filter_string(&control.state.lock())));

    let (filter, handle) = reload::Layer::new(initial);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| Error::LogFilter(e.to_string()))?;

    control.attach(handle);
    Ok(())
}
