//! The seekable container stream contract shared by the RIFF and Ogg readers.

use crate::cursor::MediaCursor;
use crate::record::Record;
use crate::types::Track;
use crate::{Error, Result};
use std::io::{Read, Seek};

/// Default cap on a single payload read (16 MiB).
pub const DEFAULT_MAX_PAYLOAD_SIZE: u64 = 16 * 1024 * 1024;

/// Tunables shared by both readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Largest payload `read_payload` will load into memory.
    pub max_payload_size: u64,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
        }
    }
}

/// A container reader walking framed records over a seekable stream.
///
/// Implementors provide the framing primitive (`read_next`) and the descent
/// rule; everything else is built on those. Query methods (`root`,
/// `table_of_contents`, `find`, `describe`, `read_payload`) leave the position
/// exactly where they found it, so they can be interleaved with manual
/// iteration. A reader is not meant to be shared between threads.
pub trait ContainerStream {
    /// Underlying byte stream.
    type Reader: Read + Seek;

    /// The reader's cursor.
    fn cursor(&self) -> &MediaCursor<Self::Reader>;

    /// The reader's cursor, mutably.
    fn cursor_mut(&mut self) -> &mut MediaCursor<Self::Reader>;

    /// Reader tunables.
    fn options(&self) -> &ReaderOptions;

    /// Fewest bytes a record header can occupy.
    fn min_header_length(&self) -> u64;

    /// Read one record header at the current position.
    ///
    /// On success the position is just past the header, at the first payload byte.
    fn read_next(&mut self) -> Result<Record>;

    /// Whether iteration continues inside `record`'s payload instead of skipping it.
    fn descends_into(&self, record: &Record) -> bool;

    /// The record acting as the container's index, if any.
    fn table_of_contents(&mut self) -> Result<Option<Record>>;

    /// Tracks in the container. Computed once, then served from cache.
    fn tracks(&mut self) -> Result<&[Track]>;

    /// Human-readable tag for a record.
    fn describe(&mut self, record: &Record) -> Result<String>;

    /// Sample retrieval hook for streaming sources. Readers only extract
    /// framing and metadata, so this is unsupported by default.
    fn sample(&mut self, track: &Track) -> Result<Vec<u8>> {
        Err(Error::unsupported(format!(
            "sample retrieval for track {}",
            track.id
        )))
    }

    /// Current offset.
    fn position(&self) -> u64 {
        self.cursor().position()
    }

    /// Move to an absolute offset.
    fn set_position(&mut self, position: u64) -> Result<()> {
        self.cursor_mut().set_position(position)
    }

    /// Total stream length.
    fn length(&self) -> u64 {
        self.cursor().length()
    }

    /// `length - position`, saturating at zero.
    fn remaining(&self) -> u64 {
        self.cursor().remaining()
    }

    /// Read up to `buf.len()` raw bytes.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.cursor_mut().read(buf)
    }

    /// Skip `count` raw bytes.
    fn skip(&mut self, count: u64) -> Result<()> {
        self.cursor_mut().skip(count)
    }

    /// Lazily iterate records from the current position.
    fn records(&mut self) -> Records<'_, Self>
    where
        Self: Sized,
    {
        Records::new(self)
    }

    /// Run `scan` and restore the position afterwards, on success or failure.
    fn peek<T, F>(&mut self, scan: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let saved = self.position();
        let result = scan(self);
        let restored = self.set_position(saved);
        match (result, restored) {
            (Err(e), _) => Err(e),
            (Ok(_), Err(e)) => Err(e),
            (Ok(value), Ok(())) => Ok(value),
        }
    }

    /// The first record of the stream.
    fn root(&mut self) -> Result<Option<Record>>
    where
        Self: Sized,
    {
        self.peek(|stream| {
            stream.set_position(0)?;
            if stream.remaining() < stream.min_header_length() {
                return Ok(None);
            }
            stream.read_next().map(Some)
        })
    }

    /// The first record, in iteration order from the root, whose identifier
    /// starts with `identifier`.
    fn find(&mut self, identifier: &[u8]) -> Result<Option<Record>>
    where
        Self: Sized,
    {
        self.peek(|stream| {
            stream.set_position(0)?;
            for record in stream.records() {
                let record = record?;
                if record.is(identifier) {
                    return Ok(Some(record));
                }
            }
            Ok(None)
        })
    }

    /// Every record, in iteration order from the root, whose identifier
    /// starts with `identifier`.
    fn find_all(&mut self, identifier: &[u8]) -> Result<Vec<Record>>
    where
        Self: Sized,
    {
        self.peek(|stream| {
            stream.set_position(0)?;
            let mut found = Vec::new();
            for record in stream.records() {
                let record = record?;
                if record.is(identifier) {
                    found.push(record);
                }
            }
            Ok(found)
        })
    }

    /// Load a record's payload. Truncated records yield the bytes present.
    fn read_payload(&mut self, record: &Record) -> Result<Vec<u8>> {
        let max = self.options().max_payload_size;
        if record.payload_length > max {
            return Err(Error::PayloadTooLarge {
                size: record.payload_length,
                max,
            });
        }
        self.read_payload_prefix(record, record.payload_length as usize)
    }

    /// Load at most `limit` leading payload bytes of a record.
    fn read_payload_prefix(&mut self, record: &Record, limit: usize) -> Result<Vec<u8>> {
        let wanted = record.payload_length.min(limit as u64) as usize;
        self.cursor_mut().preserving(|cursor| {
            cursor.set_position(record.data_offset())?;
            let mut data = vec![0u8; wanted];
            let read = cursor.read(&mut data)?;
            data.truncate(read);
            Ok(data)
        })
    }
}

/// Lazy, forward-only iterator over records.
///
/// Each step first moves past the previously yielded record (or into it, when
/// the reader descends into that kind of record), then frames the next one.
/// Iteration ends when fewer bytes remain than a header needs, and stops
/// after the first error.
pub struct Records<'a, S: ContainerStream> {
    stream: &'a mut S,
    previous: Option<Record>,
    finished: bool,
}

impl<'a, S: ContainerStream> Records<'a, S> {
    fn new(stream: &'a mut S) -> Self {
        Self {
            stream,
            previous: None,
            finished: false,
        }
    }

    fn advance(&mut self) -> Result<Option<Record>> {
        if let Some(previous) = self.previous.take() {
            let next = if self.stream.descends_into(&previous) {
                previous.data_offset()
            } else {
                previous.end_offset()
            };
            self.stream.set_position(next)?;
        }

        let remaining = self.stream.remaining();
        if remaining < self.stream.min_header_length() {
            if remaining > 0 {
                tracing::trace!(
                    "Ignoring {} trailing bytes at offset {}",
                    remaining,
                    self.stream.position()
                );
            }
            return Ok(None);
        }

        let record = self.stream.read_next()?;
        self.previous = Some(record.clone());
        Ok(Some(record))
    }
}

impl<S: ContainerStream> Iterator for Records<'_, S> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.advance() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<S: ContainerStream> std::iter::FusedIterator for Records<'_, S> {}
