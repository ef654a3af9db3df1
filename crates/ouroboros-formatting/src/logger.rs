//! Sink for model-level errors reported by formatters while reading

use parking_lot::Mutex;
use std::error::Error;

/// Receives errors a formatter chooses to report instead of failing the read
pub trait FormatterLogger: Send + Sync {
    /// Record an error message for the member at `path`
    fn log_error(&self, path: &str, message: &str);

    /// Record an error value for the member at `path`
    fn log_exception(&self, path: &str, error: &(dyn Error + 'static)) {
        self.log_error(path, &error.to_string());
    }
}

/// Forwards formatter errors to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFormatterLogger;

impl FormatterLogger for TracingFormatterLogger {
    fn log_error(&self, path: &str, message: &str) {
        tracing::warn!(path = %path, "Formatter error: {}", message);
    }

    fn log_exception(&self, path: &str, error: &(dyn Error + 'static)) {
        tracing::warn!(path = %path, error = %error, "Formatter exception");
    }
}

/// Keeps every reported error in memory
#[derive(Debug, Default)]
pub struct CollectingFormatterLogger {
    entries: Mutex<Vec<(String, String)>>,
}

impl CollectingFormatterLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of `(path, message)` pairs in report order
    pub fn entries(&self) -> Vec<(String, String)> {
        self.entries.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl FormatterLogger for CollectingFormatterLogger {
    fn log_error(&self, path: &str, message: &str) {
        self.entries
            .lock()
            .push((path.to_string(), message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_logger_records_in_order() {
        let logger = CollectingFormatterLogger::new();
        assert!(logger.is_empty());

        logger.log_error("items[0].name", "required");
        let io = std::io::Error::other("truncated");
        logger.log_exception("items[1]", &io);

        assert_eq!(
            logger.entries(),
            vec![
                ("items[0].name".to_string(), "required".to_string()),
                ("items[1]".to_string(), "truncated".to_string()),
            ]
        );
    }

    #[test]
    fn test_tracing_logger_is_object_safe() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let logger: &dyn FormatterLogger = &TracingFormatterLogger;
        logger.log_error("root", "bad value");
    }
}
