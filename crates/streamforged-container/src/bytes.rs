//! Bounds-checked integer reads from byte slices.

/// Byte order of multi-byte fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Endian {
    pub fn u16(self, data: &[u8], offset: usize) -> Option<u16> {
        let bytes = array::<2>(data, offset)?;
        Some(match self {
            Self::Little => u16::from_le_bytes(bytes),
            Self::Big => u16::from_be_bytes(bytes),
        })
    }

    pub fn u32(self, data: &[u8], offset: usize) -> Option<u32> {
        let bytes = array::<4>(data, offset)?;
        Some(match self {
            Self::Little => u32::from_le_bytes(bytes),
            Self::Big => u32::from_be_bytes(bytes),
        })
    }

    pub fn i32(self, data: &[u8], offset: usize) -> Option<i32> {
        self.u32(data, offset).map(|v| v as i32)
    }

    pub fn u64(self, data: &[u8], offset: usize) -> Option<u64> {
        let bytes = array::<8>(data, offset)?;
        Some(match self {
            Self::Little => u64::from_le_bytes(bytes),
            Self::Big => u64::from_be_bytes(bytes),
        })
    }
}

/// Copy `N` bytes starting at `offset`, if that many are present.
pub fn array<const N: usize>(data: &[u8], offset: usize) -> Option<[u8; N]> {
    let end = offset.checked_add(N)?;
    data.get(offset..end)?.try_into().ok()
}

/// Big-endian 24-bit unsigned integer.
pub fn be_u24(data: &[u8], offset: usize) -> Option<u32> {
    let [a, b, c] = array::<3>(data, offset)?;
    Some(u32::from_be_bytes([0, a, b, c]))
}

/// Text up to the first NUL, decoded lossily and trimmed.
pub fn c_string(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).trim().to_string()
}
