//! Error type for movie recording and playback.

use std::io;
use std::path::PathBuf;

use super::format::HeaderError;

/// Errors raised by [`MovieRecorder`](super::MovieRecorder) and
/// [`MoviePlayer`](super::MoviePlayer).
///
/// The boundary methods `write_frame` / `read_frame` never return these;
/// they log them and degrade to a dropped frame or an empty read.
#[derive(Debug, thiserror::Error)]
pub enum MovieError {
    #[error("Failed to create movie file {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to open movie file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read from movie file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write to movie file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to close movie file {}: {source}", .path.display())]
    Close {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Bad movie header: {0}")]
    Header(#[from] HeaderError),

    /// `expected` is the latched session length, or `None` when no session
    /// exists yet and any positive length would do.
    #[error("Invalid frame length {actual}{}", describe_expected(.expected))]
    InvalidFrameLength {
        expected: Option<usize>,
        actual: i64,
    },

    #[error("Movie holds no complete frame after rewinding")]
    EmptyOrCorruptStream,

    #[error("Playback session is closed")]
    Closed,
}

fn describe_expected(expected: &Option<usize>) -> String {
    match expected {
        Some(n) => format!(" (expected {})", n),
        None => " (must be at least 1 byte)".to_string(),
    }
}
