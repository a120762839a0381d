//! Movie player for looping back recorded frame streams.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::mem;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::error::MovieError;
use super::format::MovieHeader;
use super::logger::{LogMovieLogger, MovieLogger};
use crate::schema::MovieConfig;

/// Observable state of a [`MoviePlayer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// No header parsed yet. Every read retries opening the file.
    Unopened,
    /// Header parsed, frames are served in a loop.
    Streaming,
    /// Closed by [`MoviePlayer::stop_playback`]. Terminal.
    Closed,
}

/// Readable, seekable movie input.
pub(crate) trait MovieSource: Read + Seek + Send {}

impl<T: Read + Seek + Send> MovieSource for T {}

/// Opens the input for a path and reports its total length in bytes.
pub(crate) type SourceFactory = fn(&Path) -> io::Result<(Box<dyn MovieSource>, u64)>;

fn open_file_source(path: &Path) -> io::Result<(Box<dyn MovieSource>, u64)> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    Ok((Box::new(BufReader::new(file)), len))
}

/// Open input file positioned somewhere in the frame area.
struct PlaybackSession {
    reader: Box<dyn MovieSource>,
    header: MovieHeader,
    frame_size: usize,
    /// Byte offset of the first frame; playback loops back here.
    first_frame: u64,
    /// Complete frames present when the file was opened.
    frame_count: u64,
}

impl PlaybackSession {
    fn rewind(&mut self) -> io::Result<()> {
        self.reader.seek(SeekFrom::Start(self.first_frame)).map(|_| ())
    }
}

enum Session {
    Unopened,
    Streaming(PlaybackSession),
    Closed,
}

/// Plays an OPC movie file as an endless loop of frames.
///
/// The file is opened on the first read. When the last complete frame has
/// been served the player seeks back to the first frame, so reads never run
/// dry on a valid file. A partial frame at the end of the file is skipped.
///
/// Unlike [`MovieRecorder`](super::MovieRecorder), the player has no sticky
/// failure: while no header could be parsed, each read tries again.
///
/// Usage:
/// ```ignore
/// let mut player = MoviePlayer::new("show.opcm");
/// loop {
///     let frame = player.read_frame();
///     if !frame.is_empty() {
///         sink.send(&frame);
///     }
///     std::thread::sleep(player.frame_interval().unwrap_or_default());
/// }
/// ```
pub struct MoviePlayer {
    path: PathBuf,
    session: Session,
    frames_read: u64,
    loops_completed: u64,
    open_source: SourceFactory,
    logger: Box<dyn MovieLogger>,
}

impl MoviePlayer {
    /// Create a player that logs through the `log` facade.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_logger(path, Box::new(LogMovieLogger))
    }

    pub fn with_logger<P: AsRef<Path>>(path: P, logger: Box<dyn MovieLogger>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            session: Session::Unopened,
            frames_read: 0,
            loops_completed: 0,
            open_source: open_file_source,
            logger,
        }
    }

    /// Replace how the input is opened.
    #[cfg(test)]
    pub(crate) fn with_source_factory(mut self, open_source: SourceFactory) -> Self {
        self.open_source = open_source;
        self
    }

    pub fn from_config(config: &MovieConfig) -> Self {
        Self::new(&config.path)
    }

    /// Read the next frame, or an empty vector if none is available.
    ///
    /// Errors are logged, never returned; an empty result is a transient miss
    /// and the next call tries again.
    pub fn read_frame(&mut self) -> Vec<u8> {
        match self.try_read_frame() {
            Ok(frame) => frame,
            Err(MovieError::Closed) => Vec::new(),
            Err(
                e @ (MovieError::Open { .. }
                | MovieError::Header(_)
                | MovieError::EmptyOrCorruptStream),
            ) => {
                self.logger.warn(&format!("No frame available: {}", e));
                Vec::new()
            }
            Err(e) => {
                self.logger.error(&format!("Playback error: {}", e));
                Vec::new()
            }
        }
    }

    /// Read the next frame, looping back to the first frame at end of file.
    pub fn try_read_frame(&mut self) -> Result<Vec<u8>, MovieError> {
        match self.session {
            Session::Closed => return Err(MovieError::Closed),
            Session::Unopened => {
                let session = self.open_session()?;
                self.session = Session::Streaming(session);
            }
            Session::Streaming(_) => {}
        }

        let Session::Streaming(session) = &mut self.session else {
            return Err(MovieError::Closed);
        };

        if session.frame_count == 0 {
            return Err(MovieError::EmptyOrCorruptStream);
        }

        let mut frame = vec![0u8; session.frame_size];
        let mut rewound = false;

        loop {
            match session.reader.read_exact(&mut frame) {
                Ok(()) => {
                    self.frames_read += 1;
                    return Ok(frame);
                }
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    if rewound {
                        return Err(MovieError::EmptyOrCorruptStream);
                    }
                    session.rewind().map_err(|source| MovieError::Read {
                        path: self.path.clone(),
                        source,
                    })?;
                    rewound = true;
                    self.loops_completed += 1;
                    self.logger.debug("End of movie reached, looping to first frame");
                }
                Err(source) => {
                    if let Err(e) = session.rewind() {
                        self.logger.debug(&format!("Rewind after read error failed: {}", e));
                    }
                    return Err(MovieError::Read {
                        path: self.path.clone(),
                        source,
                    });
                }
            }
        }
    }

    /// Open the input file and parse its header.
    fn open_session(&mut self) -> Result<PlaybackSession, MovieError> {
        self.logger.info(&format!(
            "Preparing movie input file {}",
            self.path.display()
        ));

        let (mut reader, file_len) =
            (self.open_source)(&self.path).map_err(|source| MovieError::Open {
                path: self.path.clone(),
                source,
            })?;

        let header = MovieHeader::read_from(&mut reader)?;
        let frame_size = header
            .frame_size()
            .ok_or(MovieError::InvalidFrameLength {
                expected: None,
                actual: header.frame_length as i64,
            })?;
        let frame_count = header.frame_count_for(file_len);

        self.logger.info(&format!(
            "Header read: {} ms/frame, {} bytes/frame, {} frames",
            header.frame_rate_ms, header.frame_length, frame_count
        ));

        Ok(PlaybackSession {
            reader,
            header,
            frame_size,
            first_frame: MovieHeader::SIZE as u64,
            frame_count,
        })
    }

    /// Close the input file. Safe to call repeatedly.
    pub fn stop_playback(&mut self) {
        if let Session::Streaming(_) = mem::replace(&mut self.session, Session::Closed) {
            self.logger.info(&format!(
                "Closed movie input file {} after {} frames",
                self.path.display(),
                self.frames_read
            ));
        }
    }

    /// Create an endless iterator over frames. Ends only once playback is stopped.
    pub fn frames(&mut self) -> FrameLoop<'_> {
        FrameLoop { player: self }
    }

    pub fn state(&self) -> PlayerState {
        match self.session {
            Session::Unopened => PlayerState::Unopened,
            Session::Streaming(_) => PlayerState::Streaming,
            Session::Closed => PlayerState::Closed,
        }
    }

    /// True once a header has been parsed and until playback is stopped.
    pub fn is_ready(&self) -> bool {
        matches!(self.session, Session::Streaming(_))
    }

    fn playing(&self) -> Option<&PlaybackSession> {
        match &self.session {
            Session::Streaming(session) => Some(session),
            _ => None,
        }
    }

    /// Parsed header of the open file.
    pub fn header(&self) -> Option<MovieHeader> {
        self.playing().map(|s| s.header)
    }

    pub fn frame_rate_ms(&self) -> Option<i32> {
        self.playing().map(|s| s.header.frame_rate_ms)
    }

    pub fn frame_length(&self) -> Option<usize> {
        self.playing().map(|s| s.frame_size)
    }

    /// Number of complete frames found when the file was opened.
    pub fn frame_count(&self) -> Option<u64> {
        self.playing().map(|s| s.frame_count)
    }

    /// Delay between frames as stored in the header.
    pub fn frame_interval(&self) -> Option<Duration> {
        self.playing().map(|s| s.header.frame_interval())
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// How many times playback has wrapped back to the first frame.
    pub fn loops_completed(&self) -> u64 {
        self.loops_completed
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Iterator that keeps looping over a movie's frames.
pub struct FrameLoop<'a> {
    player: &'a mut MoviePlayer,
}

impl<'a> Iterator for FrameLoop<'a> {
    type Item = Result<Vec<u8>, MovieError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.player.try_read_frame() {
            Err(MovieError::Closed) => None,
            result => Some(result),
        }
    }
}
