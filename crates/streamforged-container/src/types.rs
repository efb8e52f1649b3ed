//! Track and summary types shared by both readers.

use chrono::{DateTime, Utc};
use std::fmt;
use std::fs::Metadata;
use std::time::Duration;

#[cfg(feature = "serialize")]
use serde::Serialize;

/// Kind of media carried by a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "lowercase"))]
pub enum MediaKind {
    Audio,
    Video,
    Text,
    /// Opaque data stream (AVI `data`).
    Data,
    #[default]
    Unknown,
}

impl MediaKind {
    /// Map an AVI stream type FourCC.
    pub fn from_stream_type(fcc: &[u8; 4]) -> Self {
        match fcc {
            b"vids" => Self::Video,
            b"auds" | b"mids" => Self::Audio,
            b"txts" => Self::Text,
            b"data" => Self::Data,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Text => "text",
            Self::Data => "data",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Creation and modification times of the backing file, when known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileTimes {
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl FileTimes {
    /// Collect times from file-system metadata. Platforms without a creation
    /// time fall back to the modification time.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let modified = metadata.modified().ok().map(DateTime::<Utc>::from);
        let created = metadata
            .created()
            .ok()
            .map(DateTime::<Utc>::from)
            .or(modified);
        Self { created, modified }
    }

    /// Creation time, or the Unix epoch for streams without a file behind them.
    pub fn created_or_epoch(&self) -> DateTime<Utc> {
        self.created.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// Derived, read-only description of one logical stream in a container.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
pub struct Track {
    /// RIFF stream ordinal or Ogg serial number.
    pub id: u64,
    pub media_kind: MediaKind,
    /// Raw codec tag (FourCC, format tag or sniffed signature bytes).
    pub codec: Vec<u8>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub start_time: Duration,
    pub duration: Duration,
    pub sample_count: u64,
    /// Frames or samples per second.
    pub rate: f64,
    pub width: u32,
    pub height: u32,
    pub channels: u16,
    pub bit_depth: u16,
    pub name: Option<String>,
}

impl Track {
    /// Codec tag as printable text, with non-printable bytes dropped.
    pub fn codec_name(&self) -> String {
        self.codec
            .iter()
            .filter(|b| b.is_ascii_graphic() || **b == b' ')
            .map(|&b| b as char)
            .collect::<String>()
            .trim()
            .to_string()
    }
}

/// Convert a floating-point number of seconds into a `Duration`, treating
/// negative and non-finite values as zero.
pub(crate) fn seconds(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        Duration::ZERO
    }
}

/// Container-level summary of a probed file.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
pub struct MediaInfo {
    /// Path of the probed file, or `<memory>`.
    pub file_path: String,
    pub file_size: u64,
    /// Container format (e.g. "RIFF", "Ogg").
    pub container: String,
    /// RIFF form type such as `AVI ` or `WAVE`.
    pub form_type: Option<String>,
    pub duration: Option<Duration>,
    /// Number of streams declared by the container header, when it has one.
    pub declared_streams: Option<u32>,
    pub tracks: Vec<Track>,
}

impl MediaInfo {
    /// Tracks of the given kind.
    pub fn tracks_of(&self, kind: MediaKind) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(move |t| t.media_kind == kind)
    }
}
