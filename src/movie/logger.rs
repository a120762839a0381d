//! Diagnostics collaborator for recorder and player sessions.

use log::Level;

/// Receives session diagnostics from [`MovieRecorder`](super::MovieRecorder)
/// and [`MoviePlayer`](super::MoviePlayer).
///
/// Failures that the boundary methods swallow are reported here and nowhere
/// else, so a caller that cares about them should supply its own logger.
pub trait MovieLogger: Send {
    /// Session lifecycle and other routine events.
    fn info(&mut self, message: &str);

    /// Recoverable anomalies (rejected frame, failed open that will be retried).
    fn warn(&mut self, message: &str);

    /// Failures that end a session or lose data.
    fn error(&mut self, message: &str);

    /// Per-frame chatter such as loop rewinds. Default: no-op.
    fn debug(&mut self, _message: &str) {}
}

/// Forwards events to the `log` facade under the `opc_movie` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMovieLogger;

impl LogMovieLogger {
    fn emit(level: Level, message: &str) {
        log::log!(target: "opc_movie", level, "{}", message);
    }
}

impl MovieLogger for LogMovieLogger {
    fn info(&mut self, message: &str) {
        Self::emit(Level::Info, message);
    }

    fn warn(&mut self, message: &str) {
        Self::emit(Level::Warn, message);
    }

    fn error(&mut self, message: &str) {
        Self::emit(Level::Error, message);
    }

    fn debug(&mut self, message: &str) {
        Self::emit(Level::Debug, message);
    }
}

/// Silent logger that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMovieLogger;

impl MovieLogger for NullMovieLogger {
    fn info(&mut self, _message: &str) {}
    fn warn(&mut self, _message: &str) {}
    fn error(&mut self, _message: &str) {}
}
