//! RIFF-family container reading (AVI, WAVE, RF64).
//!
//! A RIFF file is a tree of chunks: a FourCC, a 32-bit length and a payload
//! padded to an even size. `RIFF`, `RIFX`, `RF64` and `LIST` chunks carry a
//! FourCC sub-type followed by nested chunks. RF64 files escape oversized
//! lengths as `0xFFFFFFFF` and record the real values in a `ds64` chunk that
//! must be the first child of the root.

pub mod chunks;
pub mod ds64;
pub mod idit;

pub use chunks::{AviMainHeader, BitmapInfo, FourCc, StreamHeader, WaveFormat};
pub use ds64::SizeOverrides;

use crate::bytes::{c_string, Endian};
use crate::cursor::MediaCursor;
use crate::record::Record;
use crate::stream::{ContainerStream, ReaderOptions};
use crate::types::{seconds, FileTimes, MediaKind, Track};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use chunks::*;
use ds64::{DS64_MIN_SIZE, SIZE_ESCAPE};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::time::Duration;

/// Identifier plus length.
const CHUNK_HEADER_LEN: u64 = 8;
/// Identifier, length and form type of the root chunk.
const ROOT_HEADER_LEN: u64 = 12;

/// Lazy reader over a RIFF-family stream.
pub struct RiffReader<R> {
    cursor: MediaCursor<R>,
    options: ReaderOptions,
    file_times: FileTimes,
    endian: Endian,
    root_seen: bool,
    needs_64bit: bool,
    overrides: Option<SizeOverrides>,
    ds64_scanned: bool,
    main_header: Option<AviMainHeader>,
    tracks: Option<Vec<Track>>,
}

impl RiffReader<BufReader<File>> {
    /// Open a file, capturing its file-system timestamps.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let times = FileTimes::from_metadata(&file.metadata()?);
        Ok(Self::new(BufReader::new(file))?.with_file_times(times))
    }
}

impl<R: Read + Seek> RiffReader<R> {
    /// Create a reader with default options.
    pub fn new(reader: R) -> Result<Self> {
        Self::with_options(reader, ReaderOptions::default())
    }

    /// Create a reader with the given options.
    pub fn with_options(reader: R, options: ReaderOptions) -> Result<Self> {
        Ok(Self {
            cursor: MediaCursor::new(reader)?,
            options,
            file_times: FileTimes::default(),
            endian: Endian::Little,
            root_seen: false,
            needs_64bit: false,
            overrides: None,
            ds64_scanned: false,
            main_header: None,
            tracks: None,
        })
    }

    /// Use these timestamps where the container carries none.
    pub fn with_file_times(mut self, file_times: FileTimes) -> Self {
        self.file_times = file_times;
        self
    }

    /// Release the underlying stream.
    pub fn into_inner(self) -> R {
        self.cursor.into_inner()
    }

    /// Whether the root was identified as RF64.
    pub fn is_rf64(&self) -> bool {
        self.needs_64bit
    }

    /// Byte order of length fields (big-endian for `RIFX`).
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Form type of the root chunk, such as `AVI ` or `WAVE`.
    pub fn form_type(&mut self) -> Result<Option<FourCc>> {
        Ok(self.root()?.and_then(|root| root.sub_type()))
    }

    /// Sizes captured from the `ds64` chunk of an RF64 file.
    pub fn size_overrides(&mut self) -> Result<Option<&SizeOverrides>> {
        self.root()?;
        if self.needs_64bit {
            self.ensure_overrides()?;
        }
        Ok(self.overrides.as_ref())
    }

    /// The AVI main header. Parsed once, then cached.
    ///
    /// Fails with `MalformedContainer` when the file has no usable `avih`.
    pub fn main_header(&mut self) -> Result<AviMainHeader> {
        if let Some(header) = self.main_header {
            return Ok(header);
        }
        let record = self
            .find(AVIH)?
            .ok_or_else(|| Error::malformed("missing avih chunk"))?;
        let payload = self.read_payload(&record)?;
        let header = AviMainHeader::parse(&payload, self.endian).ok_or_else(|| {
            Error::malformed(format!(
                "avih chunk is {} bytes, need at least {}",
                payload.len(),
                AviMainHeader::MIN_SIZE
            ))
        })?;
        tracing::debug!(
            "avih: {} frames at {}us, {} streams, {}x{}",
            header.total_frames,
            header.microseconds_per_frame,
            header.streams,
            header.width,
            header.height
        );
        self.main_header = Some(header);
        Ok(header)
    }

    /// Creation time from `IDIT`, falling back to the file-system time.
    pub fn creation_time(&mut self) -> Result<Option<DateTime<Utc>>> {
        let Some(record) = self.find(IDIT)? else {
            return Ok(self.file_times.created);
        };
        let payload = self.read_payload(&record)?;
        let text = String::from_utf8_lossy(&payload);
        Ok(Some(idit::parse_idit(
            &text,
            self.file_times.created_or_epoch(),
        )))
    }

    /// Whether the file carries AVI stream headers: an `AVI ` form, or any
    /// other form holding an `avih` chunk.
    pub fn is_avi(&mut self) -> Result<bool> {
        if self.form_type()?.as_ref() == Some(AVI_FORM) {
            return Ok(true);
        }
        Ok(self.find(AVIH)?.is_some())
    }

    /// Playback duration: the AVI main header, or the audio track of a WAVE file.
    /// Other forms have no duration.
    pub fn duration(&mut self) -> Result<Duration> {
        if self.form_type()?.as_ref() == Some(WAVE_FORM) {
            let duration = self.tracks()?.first().map(|t| t.duration);
            return Ok(duration.unwrap_or_default());
        }
        if self.is_avi()? {
            return Ok(self.main_header()?.duration());
        }
        Ok(Duration::ZERO)
    }

    /// Learn byte order and RF64-ness from the root tag, reading it on the
    /// first framing call that does not start at offset zero.
    fn ensure_root_tag(&mut self) -> Result<()> {
        if !self.root_seen {
            let tag: FourCc = self.cursor.preserving(|cursor| {
                cursor.set_position(0)?;
                cursor.read_array()
            })?;
            self.note_root(&tag);
        }
        Ok(())
    }

    fn note_root(&mut self, identifier: &[u8]) {
        self.root_seen = true;
        self.endian = if identifier == RIFX {
            Endian::Big
        } else {
            Endian::Little
        };
        if identifier == RF64 && !self.needs_64bit {
            tracing::debug!("RF64 root, 64-bit sizes come from ds64");
            self.needs_64bit = true;
        }
    }

    fn resolve_escaped_length(&mut self, identifier: &[u8], offset: u64) -> Result<u64> {
        self.ensure_overrides()?;
        match &self.overrides {
            Some(overrides) => Ok(overrides.size_for(&identifier[..4], offset == 0)),
            None => Err(Error::MissingSizeOverride { offset }),
        }
    }

    fn ensure_overrides(&mut self) -> Result<()> {
        if self.overrides.is_none() && !self.ds64_scanned {
            self.ds64_scanned = true;
            self.overrides = self.scan_ds64()?;
        }
        Ok(())
    }

    /// Walk the root's direct children looking for `ds64`. Framing here is
    /// raw so that escaped lengths never recurse into override resolution.
    fn scan_ds64(&mut self) -> Result<Option<SizeOverrides>> {
        let endian = self.endian;
        self.cursor.preserving(|cursor| {
            cursor.set_position(ROOT_HEADER_LEN)?;
            while cursor.remaining() >= CHUNK_HEADER_LEN {
                let offset = cursor.position();
                let header: [u8; 8] = cursor.read_array()?;
                let length = endian.u32(&header, 4).unwrap_or(0);

                if &header[..4] == DS64 {
                    let available = (length as u64).min(cursor.remaining());
                    let payload = cursor.read_bytes(available as usize)?;
                    return Ok(parse_ds64(offset, &payload));
                }
                if length == SIZE_ESCAPE {
                    tracing::warn!(
                        "Escaped length at offset {} precedes any ds64 chunk",
                        offset
                    );
                    return Ok(None);
                }
                cursor.skip(length as u64 + (length as u64 & 1))?;
            }
            Ok(None)
        })
    }

    /// Keep the overrides of a `ds64` chunk that iteration reached directly
    /// after the root header.
    fn capture_ds64(&mut self, record: &Record) -> Result<()> {
        let limit = self.options.max_payload_size as usize;
        let payload = self.read_payload_prefix(record, limit)?;
        self.ds64_scanned = true;
        self.overrides = parse_ds64(record.offset, &payload);
        Ok(())
    }

    fn collect(&mut self, tags: &[&FourCc]) -> Result<Vec<Record>> {
        self.peek(|reader| {
            reader.set_position(0)?;
            let mut found = Vec::new();
            for record in reader.records() {
                let record = record?;
                if tags.iter().any(|tag| record.is(tag.as_slice())) {
                    found.push(record);
                }
            }
            Ok(found)
        })
    }

    fn avi_tracks(&mut self) -> Result<Vec<Track>> {
        let main = self.main_header()?;
        let created = self.creation_time()?;
        let endian = self.endian;

        let mut streams: Vec<StreamParts> = Vec::new();
        for record in self.collect(&[STRH, STRF, STRN])? {
            let payload = self.read_payload(&record)?;
            if record.is(STRH) {
                match StreamHeader::parse(&payload, endian) {
                    Some(header) => streams.push(StreamParts::new(header)),
                    None => tracing::warn!(
                        "Skipping {}-byte strh at offset {}",
                        payload.len(),
                        record.offset
                    ),
                }
            } else if let Some(stream) = streams.last_mut() {
                if record.is(STRF) && stream.format.is_none() {
                    stream.format = Some(payload);
                } else if record.is(STRN) && stream.name.is_none() {
                    stream.name = Some(c_string(&payload));
                }
            }
        }

        if streams.len() as u32 != main.streams {
            tracing::warn!(
                "avih declares {} streams, found {} strh chunks",
                main.streams,
                streams.len()
            );
        }

        Ok(streams
            .into_iter()
            .enumerate()
            .map(|(index, parts)| {
                let mut track = parts.into_track(index as u64, &main, endian);
                track.created = created;
                track.modified = self.file_times.modified;
                track
            })
            .collect())
    }

    fn wave_tracks(&mut self) -> Result<Vec<Track>> {
        let fmt = self
            .find(FMT)?
            .ok_or_else(|| Error::malformed("WAVE file has no fmt chunk"))?;
        let payload = self.read_payload(&fmt)?;
        let format = WaveFormat::parse(&payload, self.endian)
            .ok_or_else(|| Error::malformed("fmt chunk too short"))?;

        let data_length = self.find(DATA)?.map(|d| d.payload_length).unwrap_or(0);
        let sample_count = if format.block_align > 0 {
            data_length / format.block_align as u64
        } else {
            0
        };
        let rate = format.samples_per_second as f64;
        let duration = if rate > 0.0 {
            seconds(sample_count as f64 / rate)
        } else {
            Duration::ZERO
        };

        Ok(vec![Track {
            id: 0,
            media_kind: MediaKind::Audio,
            codec: format.codec_tag().to_le_bytes().to_vec(),
            created: self.file_times.created,
            modified: self.file_times.modified,
            start_time: Duration::ZERO,
            duration,
            sample_count,
            rate,
            channels: format.channels,
            bit_depth: format.bits_per_sample,
            ..Default::default()
        }])
    }
}

fn parse_ds64(offset: u64, payload: &[u8]) -> Option<SizeOverrides> {
    let overrides = SizeOverrides::parse(payload);
    match &overrides {
        Some(o) => tracing::debug!(
            "ds64 at offset {}: riff size {}, data size {}, {} table entries",
            offset,
            o.riff_size,
            o.data_size,
            o.table.len()
        ),
        None => tracing::warn!(
            "ds64 at offset {} is {} bytes, need at least {}",
            offset,
            payload.len(),
            DS64_MIN_SIZE
        ),
    }
    overrides
}

/// The `strh`, `strf` and `strn` chunks of one AVI stream.
struct StreamParts {
    header: StreamHeader,
    format: Option<Vec<u8>>,
    name: Option<String>,
}

impl StreamParts {
    fn new(header: StreamHeader) -> Self {
        Self {
            header,
            format: None,
            name: None,
        }
    }

    fn into_track(self, id: u64, main: &AviMainHeader, endian: Endian) -> Track {
        let header = self.header;
        let (rate, scale) = header.rate_and_scale();
        let rate = rate as f64 / scale as f64;
        let media_kind = MediaKind::from_stream_type(&header.stream_type);

        let mut track = Track {
            id,
            media_kind,
            codec: header.handler.to_vec(),
            start_time: seconds(header.start as f64 / rate),
            duration: seconds(header.length as f64 / rate),
            sample_count: header.length as u64,
            rate,
            name: self.name.filter(|n| !n.is_empty()),
            ..Default::default()
        };

        let format = self.format.as_deref().unwrap_or_default();
        match media_kind {
            MediaKind::Video => match BitmapInfo::parse(format, endian) {
                Some(bitmap) => {
                    track.width = bitmap.width.unsigned_abs();
                    track.height = bitmap.height.unsigned_abs();
                    track.bit_depth = bitmap.bit_count;
                    if bitmap.compression != [0; 4] {
                        track.codec = bitmap.compression.to_vec();
                    }
                }
                None => {
                    track.width = main.width;
                    track.height = main.height;
                }
            },
            MediaKind::Audio => {
                if let Some(wave) = WaveFormat::parse(format, endian) {
                    track.channels = wave.channels;
                    track.bit_depth = wave.bits_per_sample;
                    track.codec = wave.codec_tag().to_le_bytes().to_vec();
                }
            }
            _ => {}
        }
        track
    }
}

impl<R: Read + Seek> ContainerStream for RiffReader<R> {
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
        CHUNK_HEADER_LEN
    }

    fn read_next(&mut self) -> Result<Record> {
        let offset = self.cursor.position();
        let have = self.cursor.remaining();
        if have < CHUNK_HEADER_LEN {
            return Err(Error::UnexpectedEndOfStream {
                need: CHUNK_HEADER_LEN,
                have,
            });
        }

        let header: [u8; 8] = self.cursor.read_array()?;
        let mut identifier = header[..4].to_vec();
        if offset == 0 {
            self.note_root(&identifier);
        } else {
            self.ensure_root_tag()?;
        }
        let declared = self.endian.u32(&header, 4).unwrap_or(0);

        let container = is_container_tag(&identifier);
        let mut header_length = CHUNK_HEADER_LEN;
        if container {
            let sub_type: FourCc = self.cursor.read_array()?;
            identifier.extend_from_slice(&sub_type);
            header_length += 4;
        }

        let length = if declared == SIZE_ESCAPE && self.needs_64bit {
            self.resolve_escaped_length(&identifier, offset)?
        } else {
            declared as u64
        };

        let payload_length = if container {
            length.saturating_sub(4)
        } else {
            length
        };
        let total_length = header_length
            .checked_add(payload_length)
            .and_then(|n| n.checked_add(length & 1))
            .filter(|&n| offset.checked_add(n).is_some())
            .ok_or_else(|| {
                Error::malformed(format!(
                    "chunk {} at offset {} declares {} bytes, past the addressable range",
                    String::from_utf8_lossy(&identifier),
                    offset,
                    length
                ))
            })?;
        let complete = total_length <= have;
        if !complete {
            tracing::warn!(
                "Chunk {} at offset {} declares {} bytes, only {} remain",
                String::from_utf8_lossy(&identifier),
                offset,
                total_length,
                have
            );
        }
        tracing::trace!(
            "Chunk {} at offset {}, payload {}",
            String::from_utf8_lossy(&identifier),
            offset,
            payload_length
        );

        let record = Record {
            identifier,
            header_length,
            offset,
            payload_length,
            total_length,
            complete,
        };
        if self.needs_64bit
            && self.overrides.is_none()
            && offset == ROOT_HEADER_LEN
            && record.is(DS64)
        {
            self.capture_ds64(&record)?;
        }
        Ok(record)
    }

    fn descends_into(&self, record: &Record) -> bool {
        is_container_tag(&record.identifier)
    }

    fn table_of_contents(&mut self) -> Result<Option<Record>> {
        match self.find(IDX1)? {
            Some(index) => Ok(Some(index)),
            None => self.find(INDX),
        }
    }

    fn tracks(&mut self) -> Result<&[Track]> {
        if self.tracks.is_none() {
            let tracks = if self.form_type()?.as_ref() == Some(WAVE_FORM) {
                self.wave_tracks()?
            } else if self.is_avi()? {
                self.avi_tracks()?
            } else {
                tracing::debug!("RIFF form carries no stream headers");
                Vec::new()
            };
            tracing::debug!("Found {} RIFF tracks", tracks.len());
            self.tracks = Some(tracks);
        }
        Ok(self.tracks.as_deref().unwrap_or_default())
    }

    fn describe(&mut self, record: &Record) -> Result<String> {
        Ok(record
            .identifier
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                }
            })
            .collect())
    }
}
