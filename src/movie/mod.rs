//! Movie recording and looping playback for OPC pixel streams.
//!
//! A movie is a header followed by raw frames of one fixed length. The
//! recorder learns that length from the first frame it sees; the player
//! reads it back from the header and serves the frames in an endless loop.
//!
//! # File Format
//!
//! ```text
//! Header (26 bytes):
//!   Magic: "flx.opc.movie.v001" (18 bytes, no terminator)
//!   Frame rate: i32 LE (milliseconds between frames)
//!   Frame length: i32 LE (bytes per frame, > 0)
//!
//! Frame data (frame length bytes each, back to back):
//!   Opaque pixel payload, typically RGB triplets
//!   No per-frame prefix, no index, no compression
//! ```

mod error;
mod format;
mod logger;
mod player;
mod recorder;

pub use error::MovieError;
pub use format::{HeaderError, MOVIE_MAGIC, MovieHeader};
pub use logger::{LogMovieLogger, MovieLogger, NullMovieLogger};
pub use player::{FrameLoop, MoviePlayer, PlayerState};
pub use recorder::{MovieRecorder, RecorderState};
