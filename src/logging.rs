//! Logging infrastructure - structured tracing for marshalling activity
//!
//! Design: Uses `tracing` for structured, contextual logging with:
//! - Configurable level through the environment or `MarshalConfig`
//! - Zero-cost when disabled
//! - Console or file output, plain or JSON
//! - A drop guard for timing operations

use crate::config::LoggingSettings;
use once_cell::sync::OnceCell;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, trace, warn, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Global logging state
static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Keeps the background file writer alive for the life of the process
static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default log level
    pub level: Level,
    /// Log file path, console output when `None`
    pub log_path: Option<PathBuf>,
    /// Enable JSON format (vs human-readable)
    pub json_format: bool,
    /// Show span events (enter/exit)
    pub show_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            log_path: None,
            json_format: false,
            show_spans: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // NATIVE_MARSHAL_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level) = std::env::var("NATIVE_MARSHAL_LOG_LEVEL") {
            config.level = parse_level(&level);
        }

        // NATIVE_MARSHAL_LOG_FILE: path to log file
        if let Ok(path) = std::env::var("NATIVE_MARSHAL_LOG_FILE") {
            config.log_path = Some(PathBuf::from(path));
        }

        config.json_format = std::env::var("NATIVE_MARSHAL_LOG_JSON").is_ok();
        config.show_spans = std::env::var("NATIVE_MARSHAL_LOG_SPANS").is_ok();

        config
    }

    /// Create config from the `[logging]` section of a config file
    pub fn from_settings(settings: &LoggingSettings) -> Self {
        Self {
            level: parse_level(&settings.level),
            log_path: settings.file.clone(),
            json_format: settings.json,
            show_spans: false,
        }
    }

    /// Verbose config for debugging marshalling problems
    pub fn debug() -> Self {
        Self {
            level: Level::TRACE,
            log_path: None,
            json_format: false,
            show_spans: true,
        }
    }
}

fn parse_level(level: &str) -> Level {
    Level::from_str(level).unwrap_or(Level::INFO)
}

/// Initialize logging with configuration from the environment
pub fn init() {
    init_with_config(LogConfig::from_env());
}

/// Initialize logging with custom configuration
///
/// Only the first call installs a subscriber. A subscriber installed by the
/// host application takes precedence and is left alone.
pub fn init_with_config(config: LogConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "native_marshal={}",
                config.level.as_str().to_lowercase()
            ))
        });

        let layer = output_layer::<Registry>(&config).or_else(|err| {
            eprintln!("native_marshal: cannot open log file, using stdout: {err}");
            output_layer::<Registry>(&LogConfig {
                log_path: None,
                ..config.clone()
            })
        });
        let Ok(layer) = layer else { return };

        let _ = tracing_subscriber::registry()
            .with(layer)
            .with(env_filter)
            .try_init();
    });
}

fn output_layer<S>(config: &LogConfig) -> io::Result<Box<dyn Layer<S> + Send + Sync>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let writer = match &config.log_path {
        Some(path) => {
            let (dir, name) = split_log_path(path)?;
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            BoxMakeWriter::new(writer)
        }
        None => BoxMakeWriter::new(io::stdout),
    };

    let span_events = if config.show_spans {
        FmtSpan::ENTER | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer = fmt::layer()
        .with_writer(writer)
        .with_span_events(span_events)
        .with_target(true)
        .with_thread_ids(cfg!(debug_assertions))
        .with_line_number(cfg!(debug_assertions));

    Ok(if config.json_format {
        layer.json().boxed()
    } else {
        layer.with_ansi(config.log_path.is_none()).boxed()
    })
}

fn split_log_path(path: &Path) -> io::Result<(PathBuf, PathBuf)> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "log path has no file name")
    })?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, PathBuf::from(name)))
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

// ============================================================================
// Marshalling events
// ============================================================================

/// Log native memory allocation
#[inline]
pub fn log_allocation(size: usize, ptr: *const u8) {
    trace!(
        event = "allocation",
        size_bytes = size,
        address = ?ptr,
        "Native memory allocated"
    );
}

/// Log native memory deallocation
#[inline]
pub fn log_deallocation(ptr: *const u8) {
    trace!(
        event = "deallocation",
        address = ?ptr,
        "Native memory released"
    );
}

/// Log struct layout finalization
pub fn log_layout_finalized(fields: usize, size: usize, align: usize) {
    debug!(
        event = "layout_finalized",
        fields,
        size_bytes = size,
        align,
        "Struct layout finalized"
    );
}

/// Log enum mapping construction
pub fn log_enum_entry(type_name: &str, constants: usize) {
    debug!(
        event = "enum_entry",
        enum_type = type_name,
        constants,
        "Enum mapping built"
    );
}

/// Log function descriptor binding
pub fn log_function_bound(fn_name: &str, params: usize) {
    debug!(
        event = "function_bound",
        function = fn_name,
        params,
        "Function descriptor bound"
    );
}

/// Log native function call
pub fn log_native_call(fn_name: &str, arg_count: usize) {
    debug!(
        event = "native_call",
        function = fn_name,
        args = arg_count,
        "Native function called"
    );
}

/// Log native function return
pub fn log_native_return(fn_name: &str, deferred: usize) {
    trace!(
        event = "native_return",
        function = fn_name,
        deferred,
        "Native function returned"
    );
}

/// Log a failed post-call copy-back
pub fn log_copy_back_error(error: &str) {
    warn!(
        event = "copy_back_error",
        error = error,
        "Post-call copy-back failed"
    );
}

/// Performance tracking utilities
pub mod perf {
    use std::time::Instant;
    use tracing::debug;

    /// Track operation duration (returns guard that logs on drop)
    #[must_use]
    pub fn track(operation: &str) -> PerformanceGuard<'_> {
        PerformanceGuard {
            operation,
            start: Instant::now(),
        }
    }

    pub struct PerformanceGuard<'a> {
        operation: &'a str,
        start: Instant,
    }

    impl<'a> PerformanceGuard<'a> {
        #[inline]
        pub fn operation(&self) -> &'a str {
            self.operation
        }
    }

    impl Drop for PerformanceGuard<'_> {
        fn drop(&mut self) {
            let elapsed = self.start.elapsed();
            debug!(
                operation = %self.operation,
                duration_us = elapsed.as_micros(),
                "operation completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = LogConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(config.log_path.is_none());

        let debug_config = LogConfig::debug();
        assert_eq!(debug_config.level, Level::TRACE);
        assert!(debug_config.show_spans);
    }

    #[test]
    fn test_config_from_settings() {
        let settings = LoggingSettings {
            level: "Debug".to_string(),
            json: true,
            file: Some(PathBuf::from("logs/marshal.log")),
        };
        let config = LogConfig::from_settings(&settings);
        assert_eq!(config.level, Level::DEBUG);
        assert!(config.json_format);

        let fallback = LogConfig::from_settings(&LoggingSettings {
            level: "loud".to_string(),
            ..LoggingSettings::default()
        });
        assert_eq!(fallback.level, Level::INFO);
    }

    #[test]
    fn test_split_log_path() {
        let (dir, name) = split_log_path(Path::new("marshal.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, PathBuf::from("marshal.log"));

        let (dir, _) = split_log_path(Path::new("/var/log/marshal.log")).unwrap();
        assert_eq!(dir, PathBuf::from("/var/log"));
    }

    #[test]
    fn test_init_idempotent() {
        init();
        init(); // Should not panic
        assert!(is_initialized());
        let _guard = perf::track("idempotent_init");
    }

    #[test]
    fn test_perf_guard_borrows_operation_name() {
        let name = String::from("strlen");
        let guard = perf::track(&name);
        assert_eq!(guard.operation(), "strlen");
        assert!(std::ptr::eq(guard.operation(), name.as_str()));
    }
}
