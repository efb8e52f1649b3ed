//! Framed record descriptors.

/// One framed unit of a container: a RIFF chunk or an Ogg page.
///
/// A record only describes where the unit lives in the stream. It holds no
/// handle to the stream, so cloning or dropping one never moves the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Frame tag bytes.
    ///
    /// RIFF: the FourCC, followed by the sub-type for list chunks.
    /// Ogg: the 27 fixed page header bytes.
    pub identifier: Vec<u8>,
    /// Bytes taken by identifier and length fields (RIFF 8 or 12, Ogg 27 + segments).
    pub header_length: u64,
    /// Stream offset of the first header byte.
    pub offset: u64,
    /// Logical payload length, without padding.
    pub payload_length: u64,
    /// Header plus payload plus any alignment padding.
    pub total_length: u64,
    /// Whether the stream holds every byte the record advertises.
    pub complete: bool,
}

impl Record {
    /// Offset of the first payload byte.
    pub fn data_offset(&self) -> u64 {
        self.offset + self.header_length
    }

    /// Offset where the following record starts.
    pub fn end_offset(&self) -> u64 {
        self.offset.saturating_add(self.total_length)
    }

    /// Bytes of padding after the payload.
    pub fn padding(&self) -> u64 {
        self.total_length
            .saturating_sub(self.header_length + self.payload_length)
    }

    /// Whether the identifier starts with the given tag.
    pub fn is(&self, tag: &[u8]) -> bool {
        self.identifier.starts_with(tag)
    }

    /// The leading four identifier bytes, zero-filled when shorter.
    pub fn fourcc(&self) -> [u8; 4] {
        let mut tag = [0u8; 4];
        let n = self.identifier.len().min(4);
        tag[..n].copy_from_slice(&self.identifier[..n]);
        tag
    }

    /// The sub-type of a list record (bytes 4..8 of the identifier).
    pub fn sub_type(&self) -> Option<[u8; 4]> {
        let bytes = self.identifier.get(4..8)?;
        let mut tag = [0u8; 4];
        tag.copy_from_slice(bytes);
        Some(tag)
    }
}
