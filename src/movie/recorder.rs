//! Movie recorder for capturing OPC pixel frames.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::mem;
use std::path::{Path, PathBuf};

use super::error::MovieError;
use super::format::MovieHeader;
use super::logger::{LogMovieLogger, MovieLogger};
use crate::schema::MovieConfig;

/// Observable state of a [`MovieRecorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// No frame received yet; the file does not exist.
    Pending,
    /// Header written, frames are being appended.
    Recording,
    /// Creating the file or writing to it failed. Terminal.
    Failed,
    /// Closed by [`MovieRecorder::stop_recording`]. Terminal.
    Stopped,
}

/// Output handle of a recording session.
pub(crate) type MovieSink = Box<dyn Write + Send>;

/// Creates the output handle for a recording path.
pub(crate) type SinkFactory = fn(&Path) -> io::Result<MovieSink>;

fn create_file_sink(path: &Path) -> io::Result<MovieSink> {
    Ok(Box::new(BufWriter::new(File::create(path)?)))
}

/// Open output file together with the header it was created with.
struct RecordingSession {
    writer: MovieSink,
    header: MovieHeader,
    frame_length: usize,
}

enum Session {
    Pending,
    Recording(RecordingSession),
    Failed,
    Stopped,
}

/// Records a stream of fixed-length frames to an OPC movie file.
///
/// The file is created lazily: the first frame fixes the frame length that
/// goes into the header, together with the frame rate configured at that
/// moment. Any failure while creating the file or appending to it puts the
/// recorder into [`RecorderState::Failed`], after which every frame is
/// dropped for the life of the recorder.
///
/// Usage:
/// ```ignore
/// let mut recorder = MovieRecorder::new("show.opcm", 40);
/// for frame in frames {
///     recorder.write_frame(&frame);
/// }
/// recorder.stop_recording();
/// ```
pub struct MovieRecorder {
    path: PathBuf,
    frame_rate_ms: i32,
    frame_length: Option<usize>,
    frames_written: u64,
    frames_dropped: u64,
    session: Session,
    create_sink: SinkFactory,
    logger: Box<dyn MovieLogger>,
}

impl MovieRecorder {
    /// Create a recorder that logs through the `log` facade.
    pub fn new<P: AsRef<Path>>(path: P, frame_rate_ms: i32) -> Self {
        Self::with_logger(path, frame_rate_ms, Box::new(LogMovieLogger))
    }

    pub fn with_logger<P: AsRef<Path>>(
        path: P,
        frame_rate_ms: i32,
        logger: Box<dyn MovieLogger>,
    ) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            frame_rate_ms,
            frame_length: None,
            frames_written: 0,
            frames_dropped: 0,
            session: Session::Pending,
            create_sink: create_file_sink,
            logger,
        }
    }

    /// Replace how the output handle is created.
    #[cfg(test)]
    pub(crate) fn with_sink_factory(mut self, create_sink: SinkFactory) -> Self {
        self.create_sink = create_sink;
        self
    }

    pub fn from_config(config: &MovieConfig) -> Self {
        Self::new(&config.path, config.frame_rate_ms)
    }

    /// Set the frame rate stored in the header.
    ///
    /// Only takes effect if the header has not been written yet.
    pub fn set_frame_rate(&mut self, frame_rate_ms: i32) {
        if let Session::Recording(session) = &self.session {
            self.logger.debug(&format!(
                "Frame rate {} ms not stored: header already written with {} ms",
                frame_rate_ms, session.header.frame_rate_ms
            ));
        }
        self.frame_rate_ms = frame_rate_ms;
    }

    /// Append a frame, logging and swallowing any failure.
    pub fn write_frame(&mut self, frame: &[u8]) {
        match self.try_write_frame(frame) {
            Ok(_) => {}
            Err(e @ MovieError::InvalidFrameLength { expected: Some(_), .. }) => {
                self.logger.warn(&format!("Frame dropped: {}", e));
            }
            Err(e) => {
                self.logger.error(&format!("Recording failed: {}", e));
            }
        }
    }

    /// Append a frame.
    ///
    /// Returns `Ok(true)` if the frame was written and `Ok(false)` if it was
    /// dropped because the recorder is failed or stopped. A frame whose length
    /// differs from the recording's frame length is rejected with
    /// [`MovieError::InvalidFrameLength`] and the recording continues.
    pub fn try_write_frame(&mut self, frame: &[u8]) -> Result<bool, MovieError> {
        if let Session::Pending = self.session {
            match self.open_session(frame.len()) {
                Ok(session) => self.session = Session::Recording(session),
                Err(e) => {
                    self.session = Session::Failed;
                    self.frames_dropped += 1;
                    return Err(e);
                }
            }
        }

        let Session::Recording(session) = &mut self.session else {
            self.frames_dropped += 1;
            return Ok(false);
        };

        if frame.len() != session.frame_length {
            self.frames_dropped += 1;
            return Err(MovieError::InvalidFrameLength {
                expected: Some(session.frame_length),
                actual: frame.len() as i64,
            });
        }

        if let Err(source) = session.writer.write_all(frame) {
            // A partially written frame would shift every later frame
            self.session = Session::Failed;
            self.frames_dropped += 1;
            return Err(MovieError::Write {
                path: self.path.clone(),
                source,
            });
        }

        self.frames_written += 1;
        Ok(true)
    }

    /// Create the output file and write its header.
    fn open_session(&mut self, frame_length: usize) -> Result<RecordingSession, MovieError> {
        self.frame_length = Some(frame_length);

        let header_length = i32::try_from(frame_length)
            .ok()
            .filter(|&n| n > 0)
            .ok_or(MovieError::InvalidFrameLength {
                expected: None,
                actual: frame_length as i64,
            })?;
        let header = MovieHeader::new(self.frame_rate_ms, header_length);

        self.logger.info(&format!(
            "Preparing movie output file {}",
            self.path.display()
        ));

        let mut writer = (self.create_sink)(&self.path).map_err(|source| MovieError::Create {
            path: self.path.clone(),
            source,
        })?;

        header
            .write_to(&mut writer)
            .and_then(|_| writer.flush())
            .map_err(|source| MovieError::Write {
                path: self.path.clone(),
                source,
            })?;

        self.logger.info(&format!(
            "Header written: {} ms/frame, {} bytes/frame",
            header.frame_rate_ms, header.frame_length
        ));

        Ok(RecordingSession {
            writer,
            header,
            frame_length,
        })
    }

    /// Flush and close the output file.
    ///
    /// Safe to call repeatedly. Close errors are logged, not returned.
    pub fn stop_recording(&mut self) {
        let session = match mem::replace(&mut self.session, Session::Stopped) {
            Session::Recording(session) => session,
            Session::Failed => {
                self.session = Session::Failed;
                return;
            }
            Session::Pending | Session::Stopped => return,
        };

        let mut writer = session.writer;
        if let Err(e) = writer.flush() {
            let err = MovieError::Close {
                path: self.path.clone(),
                source: e,
            };
            self.logger.error(&err.to_string());
            return;
        }

        self.logger.info(&format!(
            "Closed movie output file {} after {} frames",
            self.path.display(),
            self.frames_written
        ));
    }

    pub fn state(&self) -> RecorderState {
        match self.session {
            Session::Pending => RecorderState::Pending,
            Session::Recording(_) => RecorderState::Recording,
            Session::Failed => RecorderState::Failed,
            Session::Stopped => RecorderState::Stopped,
        }
    }

    /// Currently configured frame rate.
    pub fn frame_rate_ms(&self) -> i32 {
        self.frame_rate_ms
    }

    /// Frame length latched from the first frame, if any frame was seen.
    pub fn frame_length(&self) -> Option<usize> {
        self.frame_length
    }

    /// Header of the open recording.
    pub fn recorded_header(&self) -> Option<MovieHeader> {
        match &self.session {
            Session::Recording(session) => Some(session.header),
            _ => None,
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for MovieRecorder {
    fn drop(&mut self) {
        if let Session::Recording(_) = self.session {
            self.stop_recording();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movie::logger::NullMovieLogger;
    use crate::movie::logger::testing::CaptureLogger;
    use std::fs;
    use tempfile::tempdir;

    fn quiet(path: &Path, rate: i32) -> MovieRecorder {
        MovieRecorder::with_logger(path, rate, Box::new(NullMovieLogger))
    }

    #[test]
    fn test_recorder_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("basic.opcm");

        let mut recorder = quiet(&path, 100);
        assert_eq!(recorder.state(), RecorderState::Pending);
        assert!(!path.exists());

        for frame in [[1u8; 6], [2u8; 6], [3u8; 6]] {
            assert!(recorder.try_write_frame(&frame).unwrap());
        }
        assert_eq!(recorder.state(), RecorderState::Recording);
        assert_eq!(recorder.recorded_header(), Some(MovieHeader::new(100, 6)));
        recorder.stop_recording();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 44);
        assert_eq!(&bytes[..26], &MovieHeader::new(100, 6).encode());
        assert_eq!(&bytes[26..32], &[1u8; 6]);
        assert_eq!(&bytes[38..44], &[3u8; 6]);
        assert_eq!(recorder.frames_written(), 3);
    }

    #[test]
    fn test_zero_length_first_frame_is_sticky() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.opcm");

        let mut recorder = quiet(&path, 100);
        assert!(matches!(
            recorder.try_write_frame(&[]),
            Err(MovieError::InvalidFrameLength {
                expected: None,
                actual: 0
            })
        ));
        assert_eq!(recorder.state(), RecorderState::Failed);
        assert_eq!(recorder.frame_length(), Some(0));

        for _ in 0..3 {
            assert!(!recorder.try_write_frame(&[9u8; 12]).unwrap());
        }
        recorder.write_frame(&[9u8; 12]);

        assert!(!path.exists());
        assert_eq!(recorder.frames_written(), 0);
        assert_eq!(recorder.frames_dropped(), 5);
    }

    #[test]
    fn test_create_failure_is_sticky() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("movie.opcm");

        let logger = CaptureLogger::default();
        let mut recorder = MovieRecorder::with_logger(&path, 5, Box::new(logger.clone()));

        recorder.write_frame(&[1, 2, 3]);
        assert_eq!(recorder.state(), RecorderState::Failed);
        assert_eq!(logger.count(log::Level::Error), 1);

        fs::create_dir(dir.path().join("missing")).unwrap();
        recorder.write_frame(&[1, 2, 3]);
        assert!(!path.exists());
        // Dropped frames after failure are silent
        assert_eq!(logger.count(log::Level::Error), 1);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mismatch.opcm");

        let mut recorder = quiet(&path, 20);
        recorder.try_write_frame(&[7u8; 64]).unwrap();

        match recorder.try_write_frame(&[8u8; 32]) {
            Err(MovieError::InvalidFrameLength { expected, actual }) => {
                assert_eq!(expected, Some(64));
                assert_eq!(actual, 32);
            }
            other => panic!("expected length mismatch, got {:?}", other),
        }
        assert_eq!(recorder.state(), RecorderState::Recording);

        assert!(recorder.try_write_frame(&[9u8; 64]).unwrap());
        recorder.stop_recording();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 26 + 64 * 2);
        assert!(bytes[26..90].iter().all(|&b| b == 7));
        assert!(bytes[90..].iter().all(|&b| b == 9));
    }

    #[test]
    fn test_mismatch_logged_as_warning() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("warn.opcm");

        let logger = CaptureLogger::default();
        let mut recorder = MovieRecorder::with_logger(&path, 20, Box::new(logger.clone()));
        recorder.write_frame(&[0u8; 3]);
        recorder.write_frame(&[0u8; 4]);

        assert_eq!(logger.count(log::Level::Warn), 1);
        assert_eq!(logger.count(log::Level::Error), 0);
        assert!(logger.contains("expected 3"));
    }

    #[test]
    fn test_frame_rate_latched_at_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rate.opcm");

        let mut recorder = quiet(&path, 5);
        recorder.set_frame_rate(33);
        recorder.write_frame(&[1, 2, 3]);
        recorder.set_frame_rate(99);
        recorder.write_frame(&[4, 5, 6]);
        recorder.stop_recording();

        assert_eq!(recorder.frame_rate_ms(), 99);
        let bytes = fs::read(&path).unwrap();
        let header = MovieHeader::decode(&bytes).unwrap();
        assert_eq!(header, MovieHeader::new(33, 3));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stop.opcm");

        let logger = CaptureLogger::default();
        let mut recorder = MovieRecorder::with_logger(&path, 10, Box::new(logger.clone()));
        recorder.write_frame(&[1, 1]);
        recorder.stop_recording();
        recorder.stop_recording();

        assert_eq!(recorder.state(), RecorderState::Stopped);
        assert!(!recorder.try_write_frame(&[2, 2]).unwrap());
        assert_eq!(fs::metadata(&path).unwrap().len(), 28);

        let closes = logger
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, m)| m.starts_with("Closed"))
            .count();
        assert_eq!(closes, 1);
    }

    #[test]
    fn test_stop_before_first_frame() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("never.opcm");

        let mut recorder = quiet(&path, 10);
        recorder.stop_recording();
        recorder.write_frame(&[1, 2, 3]);

        assert_eq!(recorder.state(), RecorderState::Stopped);
        assert!(!path.exists());
    }

    /// Accepts a fixed number of bytes, then fails every write.
    struct FullDisk {
        remaining: usize,
    }

    impl Write for FullDisk {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.remaining == 0 {
                return Err(io::Error::new(io::ErrorKind::StorageFull, "disk full"));
            }
            let n = buf.len().min(self.remaining);
            self.remaining -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn room_for_header_and_one_frame(_path: &Path) -> io::Result<MovieSink> {
        Ok(Box::new(FullDisk {
            remaining: MovieHeader::SIZE + 6,
        }))
    }

    fn room_for_nothing(_path: &Path) -> io::Result<MovieSink> {
        Ok(Box::new(FullDisk { remaining: 0 }))
    }

    #[test]
    fn test_append_failure_is_sticky() {
        let dir = tempdir().unwrap();
        let logger = CaptureLogger::default();
        let mut recorder =
            MovieRecorder::with_logger(dir.path().join("full.opcm"), 10, Box::new(logger.clone()))
                .with_sink_factory(room_for_header_and_one_frame);

        assert!(recorder.try_write_frame(&[1u8; 6]).unwrap());
        assert!(matches!(
            recorder.try_write_frame(&[2u8; 6]),
            Err(MovieError::Write { .. })
        ));
        assert_eq!(recorder.state(), RecorderState::Failed);

        assert!(!recorder.try_write_frame(&[3u8; 6]).unwrap());
        recorder.write_frame(&[4u8; 6]);
        assert_eq!(recorder.frames_written(), 1);
        assert_eq!(recorder.frames_dropped(), 3);
        assert_eq!(logger.count(log::Level::Error), 0);

        recorder.stop_recording();
        assert_eq!(recorder.state(), RecorderState::Failed);
    }

    #[test]
    fn test_header_write_failure_is_sticky() {
        let dir = tempdir().unwrap();
        let mut recorder = quiet(&dir.path().join("nospace.opcm"), 10)
            .with_sink_factory(room_for_nothing);

        assert!(matches!(
            recorder.try_write_frame(&[1u8; 6]),
            Err(MovieError::Write { .. })
        ));
        assert_eq!(recorder.state(), RecorderState::Failed);
        assert_eq!(recorder.recorded_header(), None);
        assert!(!recorder.try_write_frame(&[1u8; 6]).unwrap());
    }

    #[test]
    fn test_drop_flushes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("drop.opcm");

        {
            let mut recorder = quiet(&path, 10);
            recorder.write_frame(&[5u8; 10]);
            recorder.write_frame(&[6u8; 10]);
        }

        assert_eq!(fs::metadata(&path).unwrap().len(), 46);
    }
}
