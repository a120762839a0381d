//! Binary format definitions for OPC movie files.

use std::io::{self, Read, Write};
use std::time::Duration;

/// Magic bytes identifying an OPC movie file (format tag and version).
pub const MOVIE_MAGIC: &[u8; 18] = b"flx.opc.movie.v001";

/// Errors produced while decoding a movie header.
#[derive(Debug, thiserror::Error)]
pub enum HeaderError {
    #[error("Invalid OPC movie magic bytes")]
    BadMagic,
    #[error("Header truncated: got {len} of {} bytes", MovieHeader::SIZE)]
    Truncated { len: usize },
    #[error("Failed to read header: {0}")]
    Io(#[from] io::Error),
}

/// File header for the OPC movie format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovieHeader {
    /// Delay between frames in milliseconds.
    pub frame_rate_ms: i32,
    /// Byte length of every frame in the file.
    pub frame_length: i32,
}

impl MovieHeader {
    /// Size of header in bytes.
    /// Magic(18) + FrameRate(4) + FrameLength(4) = 26
    pub const SIZE: usize = 26;

    pub fn new(frame_rate_ms: i32, frame_length: i32) -> Self {
        Self {
            frame_rate_ms,
            frame_length,
        }
    }

    /// Frame size in bytes, or `None` if the stored length is not positive.
    pub fn frame_size(&self) -> Option<usize> {
        usize::try_from(self.frame_length).ok().filter(|&n| n > 0)
    }

    /// Inter-frame delay. Negative rates are treated as zero.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_rate_ms.max(0) as u64)
    }

    /// Number of complete frames stored in a file of `file_len` bytes.
    pub fn frame_count_for(&self, file_len: u64) -> u64 {
        match self.frame_size() {
            Some(size) => file_len.saturating_sub(Self::SIZE as u64) / size as u64,
            None => 0,
        }
    }

    /// Serialize the header: magic, then both fields little-endian.
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[..18].copy_from_slice(MOVIE_MAGIC);
        buf[18..22].copy_from_slice(&self.frame_rate_ms.to_le_bytes());
        buf[22..26].copy_from_slice(&self.frame_length.to_le_bytes());
        buf
    }

    /// Parse a header from the start of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, HeaderError> {
        if bytes.len() < Self::SIZE {
            return Err(HeaderError::Truncated { len: bytes.len() });
        }
        if &bytes[..18] != MOVIE_MAGIC {
            return Err(HeaderError::BadMagic);
        }

        let frame_rate_ms = i32::from_le_bytes([bytes[18], bytes[19], bytes[20], bytes[21]]);
        let frame_length = i32::from_le_bytes([bytes[22], bytes[23], bytes[24], bytes[25]]);

        Ok(Self {
            frame_rate_ms,
            frame_length,
        })
    }

    /// Write header to output.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.encode())
    }

    /// Read header from input.
    ///
    /// Keeps reading until 26 bytes arrive or the stream ends, so a short
    /// file is reported as [`HeaderError::Truncated`] rather than decoded.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self, HeaderError> {
        let mut buf = [0u8; Self::SIZE];
        let mut filled = 0;
        while filled < Self::SIZE {
            match r.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HeaderError::Io(e)),
            }
        }
        Self::decode(&buf[..filled])
    }
}
