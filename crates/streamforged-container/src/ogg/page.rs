//! Ogg page header layout.
//!
//! ```text
//! 0   capture pattern "OggS"
//! 4   stream structure version (0)
//! 5   header type flags
//! 6   granule position (u64 LE)
//! 14  bitstream serial number (u32 LE)
//! 18  page sequence number (u32 LE)
//! 22  CRC checksum (u32 LE)
//! 26  number of page segments
//! 27  segment (lacing) table
//! ```

use crate::bytes::{array, Endian};
use std::fmt;
use std::ops::BitOr;

/// Capture pattern opening every page.
pub const CAPTURE_PATTERN: &[u8; 4] = b"OggS";

/// Bytes before the lacing table.
pub const PAGE_HEADER_LEN: u64 = 27;

/// Header type flags of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PageFlags(u8);

impl PageFlags {
    /// First packet on the page continues one from the previous page.
    pub const CONTINUATION: Self = Self(0x01);
    /// First page of a logical bitstream.
    pub const FIRST_PAGE: Self = Self(0x02);
    /// Last page of a logical bitstream.
    pub const LAST_PAGE: Self = Self(0x04);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether every flag in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for PageFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for PageFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (Self::CONTINUATION, "continuation"),
            (Self::FIRST_PAGE, "first"),
            (Self::LAST_PAGE, "last"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect();
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// Decoded fixed fields of a page header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    pub version: u8,
    pub flags: PageFlags,
    pub granule_position: u64,
    pub serial: u32,
    pub sequence: u32,
    pub checksum: u32,
    pub segment_count: u8,
}

impl PageHeader {
    /// Decode the 27 fixed header bytes (a page record's identifier).
    /// Returns `None` if fewer bytes are given or the capture pattern is wrong.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.get(..4)? != CAPTURE_PATTERN || data.len() < PAGE_HEADER_LEN as usize {
            return None;
        }
        let le = Endian::Little;
        Some(Self {
            version: data[4],
            flags: PageFlags::from_bits(data[5]),
            granule_position: u64::from_le_bytes(array::<8>(data, 6)?),
            serial: le.u32(data, 14)?,
            sequence: le.u32(data, 18)?,
            checksum: le.u32(data, 22)?,
            segment_count: data[26],
        })
    }

    /// A page opening a stream: first-page flag set, or no flags at all.
    pub fn starts_stream(&self) -> bool {
        self.flags.contains(PageFlags::FIRST_PAGE) || self.flags.is_empty()
    }

    pub fn ends_stream(&self) -> bool {
        self.flags.contains(PageFlags::LAST_PAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(flags: u8, granule: u64, serial: u32) -> Vec<u8> {
        let mut out = CAPTURE_PATTERN.to_vec();
        out.push(0);
        out.push(flags);
        out.extend(granule.to_le_bytes());
        out.extend(serial.to_le_bytes());
        out.extend(7u32.to_le_bytes());
        out.extend(0xDEADBEEFu32.to_le_bytes());
        out.push(1);
        out
    }

    #[test]
    fn test_parse_header() {
        let parsed = PageHeader::parse(&header(0x06, 44_100, 0x1234)).unwrap();
        assert_eq!(parsed.granule_position, 44_100);
        assert_eq!(parsed.serial, 0x1234);
        assert_eq!(parsed.sequence, 7);
        assert_eq!(parsed.checksum, 0xDEADBEEF);
        assert_eq!(parsed.segment_count, 1);
        assert!(parsed.starts_stream());
        assert!(parsed.ends_stream());
        assert!(!parsed.flags.contains(PageFlags::CONTINUATION));
    }

    #[test]
    fn test_no_flags_starts_stream() {
        let parsed = PageHeader::parse(&header(0, 0, 1)).unwrap();
        assert!(parsed.starts_stream());
        let parsed = PageHeader::parse(&header(0x01, 0, 1)).unwrap();
        assert!(!parsed.starts_stream());
    }

    #[test]
    fn test_rejects_short_or_foreign() {
        assert!(PageHeader::parse(&header(0, 0, 1)[..26]).is_none());
        assert!(PageHeader::parse(b"RIFF").is_none());
    }

    #[test]
    fn test_flags_display() {
        assert_eq!(
            (PageFlags::FIRST_PAGE | PageFlags::LAST_PAGE).to_string(),
            "first|last"
        );
        assert_eq!(PageFlags::default().to_string(), "none");
    }
}
