//! RIFF chunk identifiers and fixed-layout chunk payloads.

use crate::bytes::{array, Endian};
use std::time::Duration;

/// Four-character chunk code.
pub type FourCc = [u8; 4];

pub const RIFF: &FourCc = b"RIFF";
pub const RIFX: &FourCc = b"RIFX";
pub const RF64: &FourCc = b"RF64";
pub const ON2: &FourCc = b"ON2 ";
pub const ODML: &FourCc = b"odml";
pub const LIST: &FourCc = b"LIST";

pub const DS64: &FourCc = b"ds64";
pub const AVIH: &FourCc = b"avih";
pub const STRH: &FourCc = b"strh";
pub const STRF: &FourCc = b"strf";
pub const STRN: &FourCc = b"strn";
pub const IDIT: &FourCc = b"IDIT";
pub const IDX1: &FourCc = b"idx1";
pub const INDX: &FourCc = b"indx";
pub const FMT: &FourCc = b"fmt ";
pub const DATA: &FourCc = b"data";

pub const AVI_FORM: &FourCc = b"AVI ";
pub const WAVE_FORM: &FourCc = b"WAVE";

/// Chunk tags followed by a sub-type and holding nested chunks.
pub const CONTAINER_TAGS: [&FourCc; 6] = [RIFF, RIFX, RF64, ON2, ODML, LIST];

/// Whether `identifier` starts with one of the container tags.
pub fn is_container_tag(identifier: &[u8]) -> bool {
    identifier
        .get(..4)
        .is_some_and(|tag| CONTAINER_TAGS.iter().any(|c| c.as_slice() == tag))
}

/// `avih` flag: the file carries an `idx1` index.
pub const AVIF_HASINDEX: u32 = 0x10;
/// `avih` flag: audio and video are interleaved.
pub const AVIF_ISINTERLEAVED: u32 = 0x100;

/// AVI main header (`avih`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AviMainHeader {
    pub microseconds_per_frame: u32,
    pub max_bytes_per_second: u32,
    pub padding_granularity: u32,
    pub flags: u32,
    pub total_frames: u32,
    pub initial_frames: u32,
    pub streams: u32,
    pub suggested_buffer_size: u32,
    pub width: u32,
    pub height: u32,
}

impl AviMainHeader {
    /// Ten leading dwords; the trailing reserved words are optional.
    pub const MIN_SIZE: usize = 40;

    pub fn parse(data: &[u8], endian: Endian) -> Option<Self> {
        if data.len() < Self::MIN_SIZE {
            return None;
        }
        let dword = |i: usize| endian.u32(data, i * 4).unwrap_or(0);
        Some(Self {
            microseconds_per_frame: dword(0),
            max_bytes_per_second: dword(1),
            padding_granularity: dword(2),
            flags: dword(3),
            total_frames: dword(4),
            initial_frames: dword(5),
            streams: dword(6),
            suggested_buffer_size: dword(7),
            width: dword(8),
            height: dword(9),
        })
    }

    /// Frame duration multiplied by the frame count.
    pub fn duration(&self) -> Duration {
        Duration::from_micros(self.microseconds_per_frame as u64 * self.total_frames as u64)
    }

    /// Frames per second, if the frame duration is set.
    pub fn frame_rate(&self) -> Option<f64> {
        (self.microseconds_per_frame > 0).then(|| 1_000_000.0 / self.microseconds_per_frame as f64)
    }

    pub fn has_index(&self) -> bool {
        self.flags & AVIF_HASINDEX != 0
    }

    pub fn is_interleaved(&self) -> bool {
        self.flags & AVIF_ISINTERLEAVED != 0
    }
}

/// AVI stream header (`strh`).
///
/// Real files truncate this structure freely; fields past the end of the
/// payload read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamHeader {
    pub stream_type: FourCc,
    pub handler: FourCc,
    pub flags: u32,
    pub priority: u16,
    pub language: u16,
    pub initial_frames: u32,
    pub scale: u32,
    pub rate: u32,
    pub start: u32,
    pub length: u32,
    pub suggested_buffer_size: u32,
    pub quality: u32,
    pub sample_size: u32,
}

impl StreamHeader {
    pub fn parse(data: &[u8], endian: Endian) -> Option<Self> {
        let stream_type = array::<4>(data, 0)?;
        let dword = |offset: usize| endian.u32(data, offset).unwrap_or(0);
        let word = |offset: usize| endian.u16(data, offset).unwrap_or(0);
        Some(Self {
            stream_type,
            handler: array::<4>(data, 4).unwrap_or_default(),
            flags: dword(8),
            priority: word(12),
            language: word(14),
            initial_frames: dword(16),
            scale: dword(20),
            rate: dword(24),
            start: dword(28),
            length: dword(32),
            suggested_buffer_size: dword(36),
            quality: dword(40),
            sample_size: dword(44),
        })
    }

    /// Rate and scale, with 25/1 substituted when either is zero.
    pub fn rate_and_scale(&self) -> (u32, u32) {
        if self.rate == 0 || self.scale == 0 {
            (25, 1)
        } else {
            (self.rate, self.scale)
        }
    }
}

/// Video stream format (`BITMAPINFOHEADER`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapInfo {
    pub width: i32,
    /// Negative for top-down bitmaps.
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: FourCc,
    pub image_size: u32,
}

impl BitmapInfo {
    pub fn parse(data: &[u8], endian: Endian) -> Option<Self> {
        Some(Self {
            width: endian.i32(data, 4)?,
            height: endian.i32(data, 8)?,
            planes: endian.u16(data, 12)?,
            bit_count: endian.u16(data, 14)?,
            compression: array::<4>(data, 16)?,
            image_size: endian.u32(data, 20).unwrap_or(0),
        })
    }
}

/// `WAVE_FORMAT_EXTENSIBLE` format tag.
pub const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Audio stream format (`WAVEFORMATEX`), also used by the WAVE `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveFormat {
    pub format_tag: u16,
    pub channels: u16,
    pub samples_per_second: u32,
    pub average_bytes_per_second: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// Leading two bytes of the sub-format GUID of extensible formats.
    pub sub_format: Option<u16>,
}

impl WaveFormat {
    pub fn parse(data: &[u8], endian: Endian) -> Option<Self> {
        let format_tag = endian.u16(data, 0)?;
        let sub_format = if format_tag == WAVE_FORMAT_EXTENSIBLE {
            endian.u16(data, 24)
        } else {
            None
        };
        Some(Self {
            format_tag,
            channels: endian.u16(data, 2)?,
            samples_per_second: endian.u32(data, 4)?,
            average_bytes_per_second: endian.u32(data, 8)?,
            block_align: endian.u16(data, 12)?,
            bits_per_sample: endian.u16(data, 14).unwrap_or(0),
            sub_format,
        })
    }

    /// The effective format tag, looking through `WAVE_FORMAT_EXTENSIBLE`.
    pub fn codec_tag(&self) -> u16 {
        self.sub_format.unwrap_or(self.format_tag)
    }
}
