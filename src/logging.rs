/// Structured logging for the rain alarm service
///
/// Provides context-rich logging with component and location identifiers,
/// timestamps, and severity levels. Supports both console output
/// and file-based logging for daemon operations.

use chrono::Local;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::{Mutex, PoisonError};

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Parses the level names accepted in the `[logging]` config section.
    /// `CRITICAL` is folded into `Error`.
    pub fn from_name(name: &str) -> Option<LogLevel> {
        match name.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARN" | "WARNING" => Some(LogLevel::Warning),
            "ERROR" | "CRITICAL" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Fetch,
    Parser,
    Alarm,
    Store,
    Mqtt,
    Http,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Fetch => write!(f, "FETCH"),
            Component::Parser => write!(f, "PARSE"),
            Component::Alarm => write!(f, "ALARM"),
            Component::Store => write!(f, "STORE"),
            Component::Mqtt => write!(f, "MQTT"),
            Component::Http => write!(f, "HTTP"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - page moved or location removed upstream
    Expected,
    /// Unexpected failure - indicates service degradation or network trouble
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        *LOGGER.lock().unwrap_or_else(PoisonError::into_inner) = Some(logger);
    }

    fn format_entry(level: LogLevel, component: &Component, location: Option<&str>, message: &str) -> String {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let location_part = location.map(|s| format!(" [{}]", s)).unwrap_or_default();
        format!(
            "[{}] {} {}{}: {}",
            timestamp, level, component, location_part, message
        )
    }

    fn log(&self, level: LogLevel, component: &Component, location: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = Self::format_entry(level, component, location, message);
        let location_part = location.map(|s| format!(" [{}]", s)).unwrap_or_default();

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, location_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, location_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, component: Component, location: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
        logger.log(level, &component, location, message);
    }
}

/// Log a general informational message
pub fn info(component: Component, location: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, component, location, message);
}

/// Log a warning message
pub fn warn(component: Component, location: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, component, location, message);
}

/// Log an error message
pub fn error(component: Component, location: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, component, location, message);
}

/// Log a debug message
pub fn debug(component: Component, location: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, component, location, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a nowcast page fetch failure based on the error text.
pub fn classify_fetch_failure(error_message: &str) -> FailureType {
    // A missing page usually means the location URI is stale
    if error_message.contains("HTTP status 404") || error_message.contains("HTTP status 410") {
        FailureType::Expected
    } else if error_message.contains("timeout") || error_message.contains("HTTP status 5") {
        FailureType::Unexpected
    } else if error_message.contains("HTTP request failed") {
        FailureType::Unexpected
    } else {
        FailureType::Unknown
    }
}

/// Log a fetch failure with automatic classification
pub fn log_fetch_failure(location: &str, operation: &str, error_message: &str) {
    let failure_type = classify_fetch_failure(error_message);

    let message = format!(
        "{} failed [{}]: {}",
        operation,
        failure_type,
        error_message
    );

    match failure_type {
        FailureType::Expected => debug(Component::Fetch, Some(location), &message),
        FailureType::Unexpected => error(Component::Fetch, Some(location), &message),
        FailureType::Unknown => warn(Component::Fetch, Some(location), &message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_from_config_names() {
        assert_eq!(LogLevel::from_name("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_name("info"), Some(LogLevel::Info));
        assert_eq!(LogLevel::from_name("WARNING"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::from_name("CRITICAL"), Some(LogLevel::Error));
        assert_eq!(LogLevel::from_name("verbose"), None);
    }

    #[test]
    fn test_failure_classification() {
        assert_eq!(classify_fetch_failure("HTTP status 404"), FailureType::Expected);
        assert_eq!(classify_fetch_failure("HTTP status 503"), FailureType::Unexpected);
        assert_eq!(classify_fetch_failure("HTTP request timeout"), FailureType::Unexpected);
        assert_eq!(classify_fetch_failure("HTTP status 302"), FailureType::Unknown);
    }

    #[test]
    fn test_entry_format_includes_component_and_location() {
        let entry = Logger::format_entry(
            LogLevel::Warning,
            &Component::Fetch,
            Some("/deutschland/x.html"),
            "boom",
        );
        assert!(entry.contains("WARN"));
        assert!(entry.contains("FETCH [/deutschland/x.html]: boom"), "got {}", entry);
    }
}
