//! RF64 `ds64` size overrides.

use super::chunks::FourCc;
use crate::bytes::{array, Endian};

/// Chunk length value that defers to the `ds64` chunk.
pub const SIZE_ESCAPE: u32 = u32::MAX;

/// Smallest valid `ds64` payload: three 64-bit sizes and the table length.
pub const DS64_MIN_SIZE: usize = 28;

/// 64-bit sizes captured from a `ds64` chunk.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SizeOverrides {
    /// Size of the RF64 root chunk (including its form type).
    pub riff_size: u64,
    /// Size of the `data` chunk; applies to any other escaped chunk too.
    pub data_size: u64,
    pub sample_count: u64,
    /// Per-chunk sizes for escaped chunks other than `data`.
    pub table: Vec<(FourCc, u64)>,
}

impl SizeOverrides {
    /// Parse a `ds64` payload. Returns `None` when it is shorter than 28 bytes.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < DS64_MIN_SIZE {
            return None;
        }
        let le = Endian::Little;
        let riff_size = le.u64(data, 0)?;
        let data_size = le.u64(data, 8)?;
        let sample_count = le.u64(data, 16)?;
        let table_length = le.u32(data, 24)? as usize;

        let table = (0..table_length)
            .map_while(|i| {
                let offset = DS64_MIN_SIZE + i * 12;
                Some((array::<4>(data, offset)?, le.u64(data, offset + 4)?))
            })
            .collect();

        Some(Self {
            riff_size,
            data_size,
            sample_count,
            table,
        })
    }

    /// Size to use for an escaped chunk.
    pub fn size_for(&self, tag: &[u8], is_root: bool) -> u64 {
        if is_root {
            return self.riff_size;
        }
        self.table
            .iter()
            .find(|(id, _)| id.as_slice() == tag)
            .map(|(_, size)| *size)
            .unwrap_or(self.data_size)
    }
}
