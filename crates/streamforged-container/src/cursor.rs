//! Position-tracking cursor over a seekable byte stream.

use crate::{Error, Result};
use std::io::{self, Read, Seek, SeekFrom};

/// A seek+read capability with explicit position and length accounting.
///
/// The cursor owns the underlying stream. Its `position` is authoritative:
/// readers never rely on the stream's own offset between calls.
#[derive(Debug)]
pub struct MediaCursor<R> {
    reader: R,
    position: u64,
    length: u64,
}

impl<R: Read + Seek> MediaCursor<R> {
    /// Wrap a stream, measuring its length and rewinding to the start.
    pub fn new(mut reader: R) -> Result<Self> {
        let length = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        Ok(Self {
            reader,
            position: 0,
            length,
        })
    }

    /// Current offset from the start of the stream.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Move to an absolute offset. Offsets past the end are allowed and leave
    /// nothing remaining.
    pub fn set_position(&mut self, position: u64) -> Result<()> {
        self.reader.seek(SeekFrom::Start(position))?;
        self.position = position;
        Ok(())
    }

    /// Total stream length in bytes.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Bytes between the current position and the end of the stream.
    pub fn remaining(&self) -> u64 {
        self.length.saturating_sub(self.position)
    }

    /// Read up to `buf.len()` bytes, stopping early only at end of stream.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.resync();
                    return Err(e.into());
                }
            }
        }
        self.position += filled as u64;
        Ok(filled)
    }

    /// Read exactly `N` bytes or fail with `UnexpectedEndOfStream`.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.require(N as u64)?;
        let mut buf = [0u8; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    /// Read exactly `count` bytes into a new buffer.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        self.require(count as u64)?;
        let mut buf = vec![0u8; count];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    /// Advance the position by `count` bytes without reading them.
    pub fn skip(&mut self, count: u64) -> Result<()> {
        self.set_position(self.position.saturating_add(count))
    }

    /// Run `scan` and restore the current position afterwards, whether the
    /// scan succeeded or not. A scan error takes precedence over a restore error.
    pub fn preserving<T, F>(&mut self, scan: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let saved = self.position;
        let result = scan(self);
        let restored = self.set_position(saved);
        match (result, restored) {
            (Err(e), _) => Err(e),
            (Ok(_), Err(e)) => Err(e),
            (Ok(value), Ok(())) => Ok(value),
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Release the underlying stream.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn require(&self, need: u64) -> Result<()> {
        let have = self.remaining();
        if have < need {
            return Err(Error::UnexpectedEndOfStream { need, have });
        }
        Ok(())
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        if let Err(e) = self.reader.read_exact(buf) {
            self.resync();
            return Err(e.into());
        }
        self.position += buf.len() as u64;
        Ok(())
    }

    // After a failed read the stream offset is unspecified.
    fn resync(&mut self) {
        if let Ok(position) = self.reader.stream_position() {
            self.position = position;
        }
    }
}
