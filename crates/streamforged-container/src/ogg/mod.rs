//! Ogg container reading.
//!
//! An Ogg file is a flat sequence of pages, each carrying a slice of one
//! logical bitstream identified by its serial number. Streams are
//! reconstructed by remembering the first and last page of every serial;
//! the codec is identified from the first page's payload.

pub mod page;
pub mod sniff;

pub use page::{PageFlags, PageHeader, CAPTURE_PATTERN, PAGE_HEADER_LEN};
pub use sniff::{AudioParams, Sniffed, Sniffer, SnifferRegistry, VideoParams};

use crate::cursor::MediaCursor;
use crate::record::Record;
use crate::stream::{ContainerStream, ReaderOptions};
use crate::types::{seconds, FileTimes, Track};
use crate::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::time::Duration;

/// Ogg Skeleton header packets. Pages opening with these describe the other
/// streams and are not streams of their own.
const SKELETON_PATTERNS: [(&[u8], &str); 3] = [
    (b"fishead\0", "fishead"),
    (b"fisbone\0", "fisbone"),
    (b"index\0", "index"),
];

/// Leading payload bytes needed to tell codecs apart and read their
/// identification headers.
const SNIFF_PREFIX_LEN: usize = 128;

/// Granule position of a page on which no packet ends.
const NO_GRANULE: u64 = u64::MAX;

fn skeleton_name(payload: &[u8]) -> Option<&'static str> {
    SKELETON_PATTERNS
        .iter()
        .find(|(pattern, _)| payload.starts_with(pattern))
        .map(|(_, name)| *name)
}

/// Pages of one logical bitstream.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalStream {
    pub serial: u32,
    /// First page flagged as starting the stream (or carrying no flags).
    pub start: Option<Record>,
    /// First page flagged as ending the stream.
    pub end: Option<Record>,
    pub first_seen: Record,
    pub last_seen: Record,
    pub page_count: u64,
}

impl LogicalStream {
    fn new(serial: u32, page: Record) -> Self {
        Self {
            serial,
            start: None,
            end: None,
            first_seen: page.clone(),
            last_seen: page,
            page_count: 0,
        }
    }

    /// The opening page, or the first page seen when none was flagged.
    pub fn start_page(&self) -> &Record {
        self.start.as_ref().unwrap_or(&self.first_seen)
    }

    /// The closing page, or the last page seen for truncated streams.
    pub fn end_page(&self) -> &Record {
        self.end.as_ref().unwrap_or(&self.last_seen)
    }

    fn observe(&mut self, header: &PageHeader, page: &Record) {
        self.page_count += 1;
        self.last_seen = page.clone();
        if self.start.is_none() && header.starts_stream() {
            self.start = Some(page.clone());
        }
        if self.end.is_none() && header.ends_stream() {
            self.end = Some(page.clone());
        }
    }
}

/// Decode the page header carried in a page record's identifier.
pub fn page_header(record: &Record) -> Result<PageHeader> {
    PageHeader::parse(&record.identifier).ok_or_else(|| {
        Error::malformed(format!("record at offset {} is not an Ogg page", record.offset))
    })
}

/// Lazy reader over an Ogg stream.
pub struct OggReader<R> {
    cursor: MediaCursor<R>,
    options: ReaderOptions,
    file_times: FileTimes,
    registry: SnifferRegistry,
    streams: Option<Vec<LogicalStream>>,
    tracks: Option<Vec<Track>>,
}

impl OggReader<BufReader<File>> {
    /// Open a file, capturing its file-system timestamps.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let times = FileTimes::from_metadata(&file.metadata()?);
        Ok(Self::new(BufReader::new(file))?.with_file_times(times))
    }
}

impl<R: Read + Seek> OggReader<R> {
    /// Create a reader with default options and the standard sniffers.
    pub fn new(reader: R) -> Result<Self> {
        Self::with_options(reader, ReaderOptions::default())
    }

    pub fn with_options(reader: R, options: ReaderOptions) -> Result<Self> {
        Ok(Self {
            cursor: MediaCursor::new(reader)?,
            options,
            file_times: FileTimes::default(),
            registry: SnifferRegistry::standard(),
            streams: None,
            tracks: None,
        })
    }

    /// Use these timestamps for every track.
    pub fn with_file_times(mut self, file_times: FileTimes) -> Self {
        self.file_times = file_times;
        self
    }

    /// Replace the codec sniffers.
    pub fn with_registry(mut self, registry: SnifferRegistry) -> Self {
        self.registry = registry;
        self.tracks = None;
        self
    }

    pub fn registry(&self) -> &SnifferRegistry {
        &self.registry
    }

    /// Release the underlying stream.
    pub fn into_inner(self) -> R {
        self.cursor.into_inner()
    }

    /// Reconstruct logical streams in order of first appearance. Skeleton
    /// pages are ignored. The table is built once, then cached.
    pub fn parse_pages(&mut self) -> Result<&[LogicalStream]> {
        if self.streams.is_none() {
            let streams = self.peek(|reader| {
                reader.set_position(0)?;
                let mut streams: Vec<LogicalStream> = Vec::new();
                while let Some(page) = reader.next_page()? {
                    let header = page_header(&page)?;
                    let prefix = reader.read_payload_prefix(&page, 8)?;
                    if let Some(name) = skeleton_name(&prefix) {
                        tracing::trace!("Skipping skeleton {} page at offset {}", name, page.offset);
                        continue;
                    }
                    let index = match streams.iter().position(|s| s.serial == header.serial) {
                        Some(index) => index,
                        None => {
                            tracing::debug!(
                                "Ogg stream {:#010x} starts at offset {}",
                                header.serial,
                                page.offset
                            );
                            streams.push(LogicalStream::new(header.serial, page.clone()));
                            streams.len() - 1
                        }
                    };
                    streams[index].observe(&header, &page);
                }
                Ok(streams)
            })?;
            for stream in streams.iter().filter(|s| s.end.is_none()) {
                tracing::warn!(
                    "Ogg stream {:#010x} has no last page, using page at offset {}",
                    stream.serial,
                    stream.last_seen.offset
                );
            }
            self.streams = Some(streams);
        }
        Ok(self.streams.as_deref().unwrap_or_default())
    }

    /// Frame the page at the current position and move past it. `None` once
    /// too few bytes remain for a page header.
    fn next_page(&mut self) -> Result<Option<Record>> {
        if self.remaining() < PAGE_HEADER_LEN {
            return Ok(None);
        }
        let page = self.read_next()?;
        self.set_position(page.end_offset())?;
        Ok(Some(page))
    }

    /// Longest track duration.
    pub fn duration(&mut self) -> Result<Duration> {
        Ok(self
            .tracks()?
            .iter()
            .map(|t| t.duration)
            .max()
            .unwrap_or_default())
    }

    fn build_track(&mut self, stream: &LogicalStream) -> Result<Track> {
        let payload = self.read_payload_prefix(stream.start_page(), SNIFF_PREFIX_LEN)?;
        let (name, sniffed) = self.registry.sniff(&payload);
        let start_granule = granule(stream.start_page())?;
        let end_granule = granule(stream.end_page())?;

        let mut track = Track {
            id: stream.serial as u64,
            media_kind: sniffed.media_kind(),
            codec: name.map(|n| n.as_bytes().to_vec()).unwrap_or_default(),
            created: self.file_times.created,
            modified: self.file_times.modified,
            ..Default::default()
        };

        match sniffed {
            Sniffed::Audio(audio) => {
                track.rate = audio.rate;
                track.channels = audio.channels;
                track.bit_depth = audio.bit_depth;
                track.sample_count = end_granule;
                if audio.rate > 0.0 {
                    track.start_time = seconds(start_granule as f64 / audio.rate);
                    track.duration = seconds(end_granule as f64 / audio.rate);
                }
                if let Some(fourcc) = audio.fourcc {
                    track.codec = fourcc.to_vec();
                }
            }
            Sniffed::Video(video) => {
                let frames = |g: u64| frame_count(g, video.granule_shift);
                track.rate = video.rate;
                track.width = video.width;
                track.height = video.height;
                track.bit_depth = video.bit_depth;
                track.sample_count = frames(end_granule);
                if video.rate > 0.0 {
                    let start_secs = frames(start_granule) as f64 / video.rate;
                    let end_secs = frames(end_granule) as f64 / video.rate;
                    track.start_time = seconds(start_secs);
                    track.duration = seconds(start_secs.max(end_secs - start_secs));
                }
                if let Some(fourcc) = video.fourcc {
                    track.codec = fourcc.to_vec();
                }
            }
            Sniffed::Text => {}
            Sniffed::Unknown(tag) => track.codec = tag.to_vec(),
        }

        tracing::debug!(
            "Ogg stream {:#010x}: {} {} over {} pages",
            stream.serial,
            track.media_kind,
            track.codec_name(),
            stream.page_count
        );
        Ok(track)
    }
}

fn granule(page: &Record) -> Result<u64> {
    let position = page_header(page)?.granule_position;
    Ok(if position == NO_GRANULE { 0 } else { position })
}

/// Frames encoded by a granule position. Theora packs the last keyframe
/// number above `shift` bits and the frames since that keyframe below.
pub fn frame_count(granule: u64, shift: Option<u8>) -> u64 {
    match shift {
        Some(shift) if shift > 0 && shift < 64 => {
            let keyframe = granule >> shift;
            let delta = granule & ((1u64 << shift) - 1);
            keyframe + delta
        }
        _ => granule,
    }
}

impl<R: Read + Seek> ContainerStream for OggReader<R> {
    type Reader = R;

    fn cursor(&self) -> &MediaCursor<R> {
        &self.cursor
    }

    fn cursor_mut(&mut self) -> &mut MediaCursor<R> {
        &mut self.cursor
    }

    fn options(&self) -> &ReaderOptions {
        &self.options
    }

    fn min_header_length(&self) -> u64 {
        PAGE_HEADER_LEN
    }

    fn read_next(&mut self) -> Result<Record> {
        let offset = self.cursor.position();
        let have = self.cursor.remaining();
        if have < PAGE_HEADER_LEN {
            return Err(Error::UnexpectedEndOfStream {
                need: PAGE_HEADER_LEN,
                have,
            });
        }

        let identifier = self.cursor.read_bytes(PAGE_HEADER_LEN as usize)?;
        let header = PageHeader::parse(&identifier).ok_or_else(|| {
            Error::malformed(format!("missing OggS capture pattern at offset {}", offset))
        })?;
        if header.version != 0 {
            return Err(Error::malformed(format!(
                "unsupported Ogg version {} at offset {}",
                header.version, offset
            )));
        }
        let segments = header.segment_count as u64;
        if segments == 0 || segments > self.cursor.remaining() {
            return Err(Error::malformed(format!(
                "invalid segment count {} at offset {}",
                segments, offset
            )));
        }

        let lacing = self.cursor.read_bytes(segments as usize)?;
        let payload_length: u64 = lacing.iter().map(|&v| v as u64).sum();
        let header_length = PAGE_HEADER_LEN + segments;
        let total_length = header_length + payload_length;
        let complete = total_length <= have;
        if !complete {
            tracing::warn!(
                "Ogg page at offset {} declares {} bytes, only {} remain",
                offset,
                total_length,
                have
            );
        }
        tracing::trace!(
            "Ogg page {} of stream {:#010x} at offset {}, flags {}, payload {}",
            header.sequence,
            header.serial,
            offset,
            header.flags,
            payload_length
        );

        Ok(Record {
            identifier,
            header_length,
            offset,
            payload_length,
            total_length,
            complete,
        })
    }

    fn descends_into(&self, _record: &Record) -> bool {
        false
    }

    /// The skeleton `index` page.
    fn table_of_contents(&mut self) -> Result<Option<Record>> {
        self.peek(|reader| {
            reader.set_position(0)?;
            while let Some(page) = reader.next_page()? {
                let prefix = reader.read_payload_prefix(&page, 8)?;
                if skeleton_name(&prefix) == Some("index") {
                    return Ok(Some(page));
                }
            }
            Ok(None)
        })
    }

    fn tracks(&mut self) -> Result<&[Track]> {
        if self.tracks.is_none() {
            let streams = self.parse_pages()?.to_vec();
            let tracks = streams
                .iter()
                .map(|stream| self.build_track(stream))
                .collect::<Result<Vec<_>>>()?;
            tracing::debug!("Found {} Ogg tracks", tracks.len());
            self.tracks = Some(tracks);
        }
        Ok(self.tracks.as_deref().unwrap_or_default())
    }

    fn describe(&mut self, record: &Record) -> Result<String> {
        let header = page_header(record)?;
        let prefix = self.read_payload_prefix(record, SNIFF_PREFIX_LEN)?;
        if let Some(name) = skeleton_name(&prefix) {
            return Ok(name.to_string());
        }
        if header.flags.contains(PageFlags::FIRST_PAGE) {
            if let Some(sniffer) = self.registry.find(&prefix) {
                return Ok(sniffer.name.to_string());
            }
        }
        Ok(String::from_utf8_lossy(CAPTURE_PATTERN).into_owned())
    }
}
