//! OPC Movie - record and loop-play Open Pixel Control frame streams.
//!
//! This crate persists a live stream of fixed-length pixel frames to a
//! compact binary file and replays that file as an endless loop of the same
//! frames. It only stores and returns bytes; talking to an OPC server is left
//! to the caller.
//!
//! # Architecture
//!
//! - `movie`: File format, recorder and player
//! - `schema`: Configuration and pixel payload helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use opc_movie::{
//!     movie::{MoviePlayer, MovieRecorder},
//!     schema::{Pattern, Rgb},
//! };
//!
//! let pattern = Pattern::Chase {
//!     color: Rgb::new(255, 0, 0),
//! };
//!
//! // Record 30 frames of a 64 pixel strip at 40 ms per frame
//! let mut recorder = MovieRecorder::new("chase.opcm", 40);
//! for i in 0..30 {
//!     recorder.write_frame(&pattern.frame(64, i));
//! }
//! recorder.stop_recording();
//!
//! // Play it back; the 31st read wraps to the first frame
//! let mut player = MoviePlayer::new("chase.opcm");
//! for _ in 0..31 {
//!     let frame = player.read_frame();
//!     assert_eq!(frame.len(), 64 * 3);
//! }
//! player.stop_playback();
//! ```

pub mod movie;
pub mod schema;

// Re-export commonly used types
pub use movie::{MovieError, MovieHeader, MoviePlayer, MovieRecorder};
pub use schema::{MovieConfig, Pattern, Rgb};
