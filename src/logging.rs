use std::fs;
use std::ops::BitOr;
use std::panic::Location;
use std::path::Path;
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the logging system with both console and file output. The crate's
/// verbosity follows `activation`, so every level the [`Logger`] lets through is kept.
pub fn init_logging(log_dir: &Path, activation: LogLevel) {
    // Ensure logs directory exists
    let _ = fs::create_dir_all(log_dir);

    // Create a non-blocking file appender for daily log rotation
    let file_appender = tracing_appender::rolling::daily(log_dir, "projector.log");
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(file_appender);

    // Create a JSON layer for file logging
    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);

    // Create a formatted layer for console logging
    let console_layer = fmt::layer().with_writer(std::io::stderr);

    let filter = match tracing_directive(activation).parse() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };

    // Set the global default subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    // We need to keep the guard in scope to ensure logs are flushed on exit
    std::mem::forget(_guard);
}

/// Crate-level `EnvFilter` directive letting through what [`Logger::log`] emits for
/// `activation`. Warnings stay visible even when the logger is silenced.
pub fn tracing_directive(activation: LogLevel) -> &'static str {
    if activation.intersects(LogLevel::DEBUG) {
        "hub_projector=trace"
    } else if activation.intersects(LogLevel::DETAILED) {
        "hub_projector=debug"
    } else if activation.intersects(LogLevel::INFO) {
        "hub_projector=info"
    } else {
        "hub_projector=warn"
    }
}

/// Bit-vector log level. A logger emits a message when its activation mask shares
/// at least one bit with the message's level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLevel(u8);

impl LogLevel {
    pub const DEBUG: LogLevel = LogLevel(0b100);
    pub const DETAILED: LogLevel = LogLevel(0b010);
    pub const INFO: LogLevel = LogLevel(0b001);
    pub const NONE: LogLevel = LogLevel(0);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn intersects(self, other: LogLevel) -> bool {
        self.0 & other.0 > 0
    }

    /// Parses a configured activation level. Each named level enables itself and every
    /// coarser one, so "debug" shows INFO, DETAILED and DEBUG messages.
    pub fn parse_activation(name: &str) -> Option<LogLevel> {
        match name.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Some(LogLevel::NONE),
            "info" => Some(LogLevel::INFO),
            "detailed" => Some(LogLevel::INFO | LogLevel::DETAILED),
            "debug" | "all" => Some(LogLevel::INFO | LogLevel::DETAILED | LogLevel::DEBUG),
            _ => None,
        }
    }
}

impl BitOr for LogLevel {
    type Output = LogLevel;

    fn bitor(self, rhs: LogLevel) -> LogLevel {
        LogLevel(self.0 | rhs.0)
    }
}

/// Message sink handed to every component that reports progress.
///
/// Messages carry the elapsed time since the logger was created and, optionally, the
/// source location of the caller. Long root paths can be shortened through
/// [`Logger::with_substitution`].
#[derive(Debug, Clone)]
pub struct Logger {
    activation: LogLevel,
    started: Instant,
    substitutions: Vec<(String, String)>,
}

impl Logger {
    pub fn new(activation: LogLevel) -> Self {
        Self {
            activation,
            started: Instant::now(),
            substitutions: Vec::new(),
        }
    }

    /// Replace every occurrence of `long` in logged messages with `short`.
    pub fn with_substitution(mut self, long: impl Into<String>, short: impl Into<String>) -> Self {
        let long = long.into();
        if !long.is_empty() {
            self.substitutions.push((long, short.into()));
        }
        self
    }

    pub fn activation(&self) -> LogLevel {
        self.activation
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.activation.intersects(level)
    }

    pub fn unclutter(&self, message: &str) -> String {
        self.substitutions
            .iter()
            .fold(message.to_string(), |acc, (long, short)| acc.replace(long.as_str(), short))
    }

    /// Formats the line that [`Logger::log`] emits, or `None` when the level is not active.
    #[track_caller]
    pub fn render(&self, message: &str, level: LogLevel, show_caller: bool) -> Option<String> {
        if !self.is_enabled(level) {
            return None;
        }
        let elapsed = format!("{:.2} sec", self.started.elapsed().as_secs_f64());
        let source = if show_caller {
            let caller = Location::caller();
            let file = Path::new(caller.file())
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("<source location undetermined>");
            format!("{}:{}", file, caller.line())
        } else {
            String::new()
        };
        Some(format!("[{}]\t{}\t{}", elapsed, source, self.unclutter(message)))
    }

    /// `stack_level_increase` is kept on the event so that wrappers around the logger can
    /// say how many layers sit between the business logic and this call.
    #[track_caller]
    pub fn log(&self, message: &str, level: LogLevel, stack_level_increase: usize, show_caller: bool) {
        let Some(line) = self.render(message, level, show_caller) else {
            return;
        };
        if level.intersects(LogLevel::INFO) {
            tracing::info!(stack_level_increase, "{}", line);
        } else if level.intersects(LogLevel::DETAILED) {
            tracing::debug!(stack_level_increase, "{}", line);
        } else {
            tracing::trace!(stack_level_increase, "{}", line);
        }
    }

    #[track_caller]
    pub fn info(&self, message: &str) {
        self.log(message, LogLevel::INFO, 0, false);
    }

    #[track_caller]
    pub fn debug(&self, message: &str) {
        self.log(message, LogLevel::DEBUG, 0, true);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Logger::new(LogLevel::INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_mask_filters_levels() {
        let logger = Logger::new(LogLevel::INFO);
        assert!(logger.render("hello", LogLevel::INFO, false).is_some());
        assert!(logger.render("hello", LogLevel::DEBUG, false).is_none());

        let verbose = Logger::new(LogLevel::parse_activation("debug").unwrap());
        assert!(verbose.render("hello", LogLevel::DEBUG, false).is_some());
        assert!(verbose.render("hello", LogLevel::DETAILED, false).is_some());
    }

    #[test]
    fn unclutter_replaces_long_roots() {
        let logger = Logger::new(LogLevel::INFO).with_substitution("/very/long/root", "$DB_ROOT");
        let line = logger.render("loading /very/long/root/a.json", LogLevel::INFO, false).unwrap();
        assert!(line.ends_with("loading $DB_ROOT/a.json"));
    }

    #[test]
    fn show_caller_includes_this_file() {
        let logger = Logger::new(LogLevel::INFO);
        let line = logger.render("x", LogLevel::INFO, true).unwrap();
        assert!(line.contains("logging:"));
    }

    #[test]
    fn directive_follows_activation() {
        let debug = LogLevel::parse_activation("debug").unwrap();
        assert_eq!(tracing_directive(debug), "hub_projector=trace");
        assert_eq!(tracing_directive(LogLevel::parse_activation("detailed").unwrap()), "hub_projector=debug");
        assert_eq!(tracing_directive(LogLevel::INFO), "hub_projector=info");
        assert_eq!(tracing_directive(LogLevel::NONE), "hub_projector=warn");
    }

    #[test]
    fn debug_activation_reaches_trace_events() {
        let filter = EnvFilter::new(tracing_directive(LogLevel::parse_activation("debug").unwrap()));
        let subscriber = tracing_subscriber::registry().with(filter);
        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(target: "hub_projector::logging", tracing::Level::TRACE));
        });

        let quiet = tracing_subscriber::registry().with(EnvFilter::new(tracing_directive(LogLevel::INFO)));
        tracing::subscriber::with_default(quiet, || {
            assert!(!tracing::enabled!(target: "hub_projector::logging", tracing::Level::DEBUG));
        });
    }

    #[test]
    fn unknown_activation_name_is_rejected() {
        assert_eq!(LogLevel::parse_activation("loud"), None);
        assert_eq!(LogLevel::parse_activation("off"), Some(LogLevel::NONE));
    }
}
