//! Codec identification from the first packet of an Ogg logical stream.
//!
//! Each codec announces itself with magic bytes at the start of its
//! beginning-of-stream page. Sniffers are tried in registration order; the
//! first whose matcher accepts the payload extracts the stream parameters.
//! A payload nothing matches becomes [`Sniffed::Unknown`], never an error.

use crate::bytes::{array, be_u24, Endian};
use crate::riff::FourCc;
use crate::types::MediaKind;

/// Audio stream parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AudioParams {
    pub rate: f64,
    pub channels: u16,
    pub bit_depth: u16,
    /// Sub-codec FourCC of wrapped streams (OGM).
    pub fourcc: Option<FourCc>,
}

/// Video stream parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VideoParams {
    /// Frames per second.
    pub rate: f64,
    pub width: u32,
    pub height: u32,
    pub bit_depth: u16,
    /// Theora keyframe granule shift.
    pub granule_shift: Option<u8>,
    pub fourcc: Option<FourCc>,
}

/// What a sniffer learned about a stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sniffed {
    Audio(AudioParams),
    Video(VideoParams),
    Text,
    /// Unrecognised payload, keeping its first eight bytes.
    Unknown([u8; 8]),
}

impl Sniffed {
    pub fn media_kind(&self) -> MediaKind {
        match self {
            Self::Audio(_) => MediaKind::Audio,
            Self::Video(_) => MediaKind::Video,
            Self::Text => MediaKind::Text,
            Self::Unknown(_) => MediaKind::Unknown,
        }
    }

    fn unknown(data: &[u8]) -> Self {
        let mut tag = [0u8; 8];
        let len = data.len().min(8);
        tag[..len].copy_from_slice(&data[..len]);
        Self::Unknown(tag)
    }
}

/// A named matcher/extractor pair.
#[derive(Debug, Clone, Copy)]
pub struct Sniffer {
    pub name: &'static str,
    pub matches: fn(&[u8]) -> bool,
    pub extract: fn(&[u8]) -> Sniffed,
}

impl Sniffer {
    pub const fn new(
        name: &'static str,
        matches: fn(&[u8]) -> bool,
        extract: fn(&[u8]) -> Sniffed,
    ) -> Self {
        Self {
            name,
            matches,
            extract,
        }
    }
}

/// Ordered sniffer table.
#[derive(Debug, Clone)]
pub struct SnifferRegistry {
    sniffers: Vec<Sniffer>,
}

impl Default for SnifferRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl SnifferRegistry {
    /// A registry with no sniffers; everything sniffs as unknown.
    pub fn empty() -> Self {
        Self {
            sniffers: Vec::new(),
        }
    }

    /// The built-in codec table.
    pub fn standard() -> Self {
        Self {
            sniffers: vec![
                Sniffer::new("ogm", is_ogm, extract_ogm),
                Sniffer::new("vorbis", |d| d.first() == Some(&0x01), extract_vorbis),
                Sniffer::new("vorbis", is_legacy_vorbis_comment, |_| {
                    Sniffed::Audio(AudioParams {
                        rate: 44_100.0,
                        channels: 2,
                        ..Default::default()
                    })
                }),
                Sniffer::new("theora", |d| d.starts_with(b"\x80theora"), extract_theora),
                Sniffer::new("kate", |d| d.starts_with(b"\x80kate"), |_| Sniffed::Text),
                Sniffer::new("flac", is_flac, extract_flac),
                Sniffer::new("dirac", |d| d.first() == Some(&b'B'), |_| {
                    Sniffed::Video(VideoParams::default())
                }),
                Sniffer::new("cmml", |d| d.starts_with(b"CMML"), |_| Sniffed::Text),
                Sniffer::new("celt", |d| d.starts_with(b"CELT"), extract_celt),
                Sniffer::new("opus", |d| d.starts_with(b"OpusHead"), extract_opus),
                Sniffer::new("midi", |d| d.first() == Some(&b'O'), |_| {
                    Sniffed::Audio(AudioParams::default())
                }),
                Sniffer::new("pcm", |d| d.starts_with(b"PCM "), extract_pcm),
                Sniffer::new("speex", |d| d.starts_with(b"Spe"), extract_speex),
                Sniffer::new("spots", |d| d.starts_with(b"SP"), |_| {
                    Sniffed::Video(VideoParams::default())
                }),
                Sniffer::new("text", |d| d.first() == Some(&b'T'), |_| Sniffed::Text),
                Sniffer::new("uvs", |d| d.starts_with(b"UVS "), extract_uvs),
                Sniffer::new("yuv4mpeg", |d| d.starts_with(b"YUV4MPEG"), extract_yuv4mpeg),
                Sniffer::new("png", |d| d.first() == Some(&211), extract_image),
                Sniffer::new("mng", |d| d.first() == Some(&212), extract_image),
                Sniffer::new("jng", |d| d.first() == Some(&213), extract_image),
            ],
        }
    }

    /// Append a sniffer, tried after those already registered.
    pub fn register(&mut self, sniffer: Sniffer) -> &mut Self {
        self.sniffers.push(sniffer);
        self
    }

    pub fn len(&self) -> usize {
        self.sniffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sniffers.is_empty()
    }

    /// The first sniffer accepting `data`.
    pub fn find(&self, data: &[u8]) -> Option<&Sniffer> {
        self.sniffers.iter().find(|s| (s.matches)(data))
    }

    /// Identify a stream from its first packet: the sniffer name and what it
    /// extracted, or `None` and [`Sniffed::Unknown`].
    pub fn sniff(&self, data: &[u8]) -> (Option<&'static str>, Sniffed) {
        match self.find(data) {
            Some(sniffer) => (Some(sniffer.name), (sniffer.extract)(data)),
            None => {
                tracing::debug!("No sniffer matches payload {:02x?}", &data[..data.len().min(8)]);
                (None, Sniffed::unknown(data))
            }
        }
    }
}

fn le_u32(data: &[u8], offset: usize) -> u32 {
    Endian::Little.u32(data, offset).unwrap_or(0)
}

fn be_u32(data: &[u8], offset: usize) -> u32 {
    Endian::Big.u32(data, offset).unwrap_or(0)
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Media kind of an OGM stream header, keyed on the byte at offset 4:
/// `e` video, `i`/`n` audio, `t` text. Anything else is not OGM.
pub fn ogm_stream_kind(data: &[u8]) -> Option<MediaKind> {
    if data.first() != Some(&0x01) {
        return None;
    }
    match data.get(4)? {
        b'e' => Some(MediaKind::Video),
        b'i' | b'n' => Some(MediaKind::Audio),
        b't' => Some(MediaKind::Text),
        _ => None,
    }
}

fn is_ogm(data: &[u8]) -> bool {
    ogm_stream_kind(data).is_some()
}

fn extract_ogm(data: &[u8]) -> Sniffed {
    let le = Endian::Little;
    let fourcc = array::<4>(data, 9);
    // Time unit is in 100ns ticks.
    let time_unit = le.u64(data, 17).unwrap_or(0) as f64;
    let samples_per_unit = le.u64(data, 25).unwrap_or(0) as f64;
    let bit_depth = le.u16(data, 41).unwrap_or(0);

    match ogm_stream_kind(data) {
        Some(MediaKind::Video) => Sniffed::Video(VideoParams {
            rate: ratio(10_000_000.0 * samples_per_unit.max(1.0), time_unit),
            width: le.u32(data, 45).unwrap_or(0),
            height: le.u32(data, 49).unwrap_or(0),
            bit_depth,
            granule_shift: None,
            fourcc,
        }),
        Some(MediaKind::Audio) => Sniffed::Audio(AudioParams {
            rate: samples_per_unit,
            channels: le.u16(data, 45).unwrap_or(0),
            bit_depth,
            fourcc,
        }),
        _ => Sniffed::Text,
    }
}

fn extract_vorbis(data: &[u8]) -> Sniffed {
    Sniffed::Audio(AudioParams {
        rate: le_u32(data, 12) as f64,
        channels: data.get(11).copied().unwrap_or(0) as u16,
        ..Default::default()
    })
}

/// Beta libVorbis encoders that emitted the comment header first.
const LEGACY_VORBIS_VENDORS: [&[u8]; 2] = [
    b"Xiphophorus libVorbis I 20000508",
    b"Xiphophorus libVorbis I 20001031",
];

fn is_legacy_vorbis_comment(data: &[u8]) -> bool {
    if data.first() != Some(&0x03) {
        return false;
    }
    let length = le_u32(data, 7) as usize;
    data.get(11..11 + length)
        .is_some_and(|vendor| LEGACY_VORBIS_VENDORS.contains(&vendor))
}

fn extract_theora(data: &[u8]) -> Sniffed {
    let frame_numerator = be_u32(data, 22) as f64;
    let frame_denominator = be_u32(data, 26) as f64;
    let granule_shift = match (data.get(40), data.get(41)) {
        (Some(&a), Some(&b)) => Some(((a & 0x03) << 3) | (b >> 5)),
        _ => None,
    };
    Sniffed::Video(VideoParams {
        rate: ratio(frame_numerator, frame_denominator),
        width: be_u24(data, 14).unwrap_or(0),
        height: be_u24(data, 17).unwrap_or(0),
        bit_depth: 12,
        granule_shift,
        fourcc: None,
    })
}

fn is_flac(data: &[u8]) -> bool {
    data.first() == Some(&177) || data.starts_with(b"\x7fFLAC")
}

fn extract_flac(data: &[u8]) -> Sniffed {
    // STREAMINFO follows the mapping header and block header at offset 17.
    let Some([b27, b28, b29, b30]) = array::<4>(data, 27) else {
        return Sniffed::Audio(AudioParams::default());
    };
    let rate = ((b27 as u32) << 12) | ((b28 as u32) << 4) | (b29 as u32 >> 4);
    Sniffed::Audio(AudioParams {
        rate: rate as f64,
        channels: ((b29 >> 1) & 0x07) as u16 + 1,
        bit_depth: ((((b29 & 0x01) << 4) | (b30 >> 4)) + 1) as u16,
        fourcc: None,
    })
}

fn extract_celt(data: &[u8]) -> Sniffed {
    Sniffed::Audio(AudioParams {
        rate: le_u32(data, 36) as f64,
        channels: le_u32(data, 40) as u16,
        ..Default::default()
    })
}

fn extract_opus(data: &[u8]) -> Sniffed {
    // Granule positions always count 48 kHz samples.
    Sniffed::Audio(AudioParams {
        rate: 48_000.0,
        channels: data.get(9).copied().unwrap_or(0) as u16,
        ..Default::default()
    })
}

fn extract_pcm(data: &[u8]) -> Sniffed {
    Sniffed::Audio(AudioParams {
        rate: be_u32(data, 16) as f64,
        bit_depth: data.get(20).copied().unwrap_or(0) as u16,
        channels: data.get(21).copied().unwrap_or(0) as u16,
        fourcc: None,
    })
}

fn extract_speex(data: &[u8]) -> Sniffed {
    Sniffed::Audio(AudioParams {
        rate: le_u32(data, 36) as f64,
        channels: le_u32(data, 48) as u16,
        bit_depth: 16,
        fourcc: None,
    })
}

/// Bits per pixel of an uncompressed pixel format.
pub fn pixel_format_bits(fourcc: &FourCc) -> u16 {
    match fourcc {
        b"I420" | b"YV12" | b"NV12" => 12,
        b"YUY2" | b"UYVY" => 16,
        b"RGB3" | b"BGR3" | b"RV24" => 24,
        b"RGBA" | b"BGRA" | b"RV32" => 32,
        b"Y800" | b"GREY" => 8,
        _ => 0,
    }
}

fn extract_uvs(data: &[u8]) -> Sniffed {
    let fourcc = array::<4>(data, 36);
    Sniffed::Video(VideoParams {
        rate: ratio(be_u32(data, 8) as f64, be_u32(data, 12) as f64),
        width: be_u32(data, 16),
        height: be_u32(data, 20),
        bit_depth: fourcc.as_ref().map(pixel_format_bits).unwrap_or(0),
        granule_shift: None,
        fourcc,
    })
}

fn extract_yuv4mpeg(data: &[u8]) -> Sniffed {
    let line_end = data.iter().position(|&b| b == b'\n').unwrap_or(data.len());
    let header = String::from_utf8_lossy(&data[..line_end]);
    let mut params = VideoParams {
        bit_depth: 12,
        ..Default::default()
    };
    for token in header.split_whitespace().skip(1) {
        let mut chars = token.chars();
        let key = chars.next();
        let value = chars.as_str();
        match key {
            Some('W') => params.width = value.parse().unwrap_or(0),
            Some('H') => params.height = value.parse().unwrap_or(0),
            Some('F') => {
                if let Some((n, d)) = value.split_once(':') {
                    params.rate = ratio(n.parse().unwrap_or(0.0), d.parse().unwrap_or(0.0));
                }
            }
            _ => {}
        }
    }
    Sniffed::Video(params)
}

fn extract_image(data: &[u8]) -> Sniffed {
    let header = [b"IHDR", b"MHDR"].iter().find_map(|tag| {
        data.windows(4)
            .position(|w| w == tag.as_slice())
            .map(|at| at + 4)
    });
    let mut params = VideoParams::default();
    if let Some(at) = header {
        params.width = be_u32(data, at);
        params.height = be_u32(data, at + 4);
        params.bit_depth = data.get(at + 8).copied().unwrap_or(0) as u16;
    }
    Sniffed::Video(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vorbis_header(channels: u8, rate: u32) -> Vec<u8> {
        let mut data = b"\x01vorbis".to_vec();
        data.extend(0u32.to_le_bytes());
        data.push(channels);
        data.extend(rate.to_le_bytes());
        data.extend([0u8; 14]);
        data
    }

    #[test]
    fn test_vorbis() {
        let registry = SnifferRegistry::standard();
        let (name, sniffed) = registry.sniff(&vorbis_header(2, 48_000));
        assert_eq!(name, Some("vorbis"));
        let Sniffed::Audio(audio) = sniffed else {
            panic!("expected audio, got {sniffed:?}");
        };
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.rate, 48_000.0);
    }

    #[test]
    fn test_ogm_kinds() {
        assert_eq!(ogm_stream_kind(b"\x01video\0\0\0"), Some(MediaKind::Video));
        assert_eq!(ogm_stream_kind(b"\x01audio\0\0\0"), Some(MediaKind::Audio));
        assert_eq!(ogm_stream_kind(b"\x01text\0\0\0\0"), Some(MediaKind::Text));
        assert_eq!(ogm_stream_kind(b"\x01vorbis"), None);
    }

    #[test]
    fn test_ogm_video() {
        let mut data = b"\x01video\0\0\0".to_vec();
        data.extend_from_slice(b"DX50");
        data.extend(0u32.to_le_bytes());
        data.extend(400_000u64.to_le_bytes());
        data.extend(1u64.to_le_bytes());
        data.extend([0u8; 8]);
        data.extend(24u16.to_le_bytes());
        data.extend([0u8; 2]);
        data.extend(640u32.to_le_bytes());
        data.extend(480u32.to_le_bytes());
        let (name, sniffed) = SnifferRegistry::standard().sniff(&data);
        assert_eq!(name, Some("ogm"));
        let Sniffed::Video(video) = sniffed else {
            panic!("expected video, got {sniffed:?}");
        };
        assert_eq!((video.width, video.height), (640, 480));
        assert_eq!(video.rate, 25.0);
        assert_eq!(video.fourcc, Some(*b"DX50"));
    }

    #[test]
    fn test_legacy_vorbis_comment() {
        let vendor = LEGACY_VORBIS_VENDORS[1];
        let mut data = b"\x03vorbis".to_vec();
        data.extend((vendor.len() as u32).to_le_bytes());
        data.extend_from_slice(vendor);
        let (_, sniffed) = SnifferRegistry::standard().sniff(&data);
        assert_eq!(sniffed.media_kind(), MediaKind::Audio);

        let mut other = b"\x03vorbis".to_vec();
        other.extend(4u32.to_le_bytes());
        other.extend_from_slice(b"libX");
        let (name, sniffed) = SnifferRegistry::standard().sniff(&other);
        assert_eq!(name, None);
        assert_eq!(sniffed.media_kind(), MediaKind::Unknown);
    }

    #[test]
    fn test_theora() {
        let mut data = vec![0u8; 42];
        data[..7].copy_from_slice(b"\x80theora");
        data[14..17].copy_from_slice(&[0, 1, 0x40]);
        data[17..20].copy_from_slice(&[0, 0, 0xF0]);
        data[22..26].copy_from_slice(&30u32.to_be_bytes());
        data[26..30].copy_from_slice(&1u32.to_be_bytes());
        data[40] = 0x01;
        data[41] = 0x40;
        let Sniffed::Video(video) = SnifferRegistry::standard().sniff(&data).1 else {
            panic!("expected video");
        };
        assert_eq!((video.width, video.height), (320, 240));
        assert_eq!(video.rate, 30.0);
        assert_eq!(video.granule_shift, Some(10));
    }

    #[test]
    fn test_flac_streaminfo() {
        let mut data = vec![0u8; 51];
        data[..5].copy_from_slice(b"\x7fFLAC");
        // 44100 Hz, 2 channels, 16 bits.
        data[27] = 0x0A;
        data[28] = 0xC4;
        data[29] = 0x42;
        data[30] = 0xF0;
        let Sniffed::Audio(audio) = SnifferRegistry::standard().sniff(&data).1 else {
            panic!("expected audio");
        };
        assert_eq!(audio.rate, 44_100.0);
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.bit_depth, 16);
    }

    #[test]
    fn test_speex_and_spots() {
        let mut speex = b"Speex   ".to_vec();
        speex.resize(52, 0);
        speex[36..40].copy_from_slice(&16_000u32.to_le_bytes());
        speex[48..52].copy_from_slice(&1u32.to_le_bytes());
        let (name, sniffed) = SnifferRegistry::standard().sniff(&speex);
        assert_eq!(name, Some("speex"));
        assert_eq!(
            sniffed,
            Sniffed::Audio(AudioParams {
                rate: 16_000.0,
                channels: 1,
                bit_depth: 16,
                fourcc: None
            })
        );
        let (name, sniffed) = SnifferRegistry::standard().sniff(b"SPOTS\0\0\0");
        assert_eq!(name, Some("spots"));
        assert_eq!(sniffed.media_kind(), MediaKind::Video);
    }

    #[test]
    fn test_yuv4mpeg() {
        let (_, sniffed) =
            SnifferRegistry::standard().sniff(b"YUV4MPEG2 W352 H288 F30000:1001 Ip A1:1\n");
        let Sniffed::Video(video) = sniffed else {
            panic!("expected video");
        };
        assert_eq!((video.width, video.height), (352, 288));
        assert!((video.rate - 29.97).abs() < 0.01);
    }

    #[test]
    fn test_uvs_pixel_format() {
        let mut data = b"UVS ".to_vec();
        data.resize(40, 0);
        data[8..12].copy_from_slice(&25u32.to_be_bytes());
        data[12..16].copy_from_slice(&1u32.to_be_bytes());
        data[16..20].copy_from_slice(&176u32.to_be_bytes());
        data[20..24].copy_from_slice(&144u32.to_be_bytes());
        data[36..40].copy_from_slice(b"YUY2");
        let Sniffed::Video(video) = SnifferRegistry::standard().sniff(&data).1 else {
            panic!("expected video");
        };
        assert_eq!(video.bit_depth, 16);
        assert_eq!((video.width, video.height), (176, 144));
        assert_eq!(video.rate, 25.0);
    }

    #[test]
    fn test_opus_is_not_midi() {
        let (name, sniffed) = SnifferRegistry::standard().sniff(b"OpusHead\x01\x02\x38\x01");
        assert_eq!(name, Some("opus"));
        let Sniffed::Audio(audio) = sniffed else {
            panic!("expected audio");
        };
        assert_eq!(audio.channels, 2);
        assert_eq!(SnifferRegistry::standard().sniff(b"OggMIDI\0").0, Some("midi"));
    }

    #[test]
    fn test_unknown_keeps_raw_tag() {
        let (name, sniffed) = SnifferRegistry::standard().sniff(&[0xFF, 1, 2]);
        assert_eq!(name, None);
        assert_eq!(sniffed, Sniffed::Unknown([0xFF, 1, 2, 0, 0, 0, 0, 0]));
    }

    #[test]
    fn test_register_custom_sniffer() {
        let mut registry = SnifferRegistry::empty();
        assert!(registry.is_empty());
        registry.register(Sniffer::new("daala", |d| d.starts_with(b"\x80daala"), |_| {
            Sniffed::Video(VideoParams::default())
        }));
        let (name, sniffed) = registry.sniff(b"\x80daala\0");
        assert_eq!(name, Some("daala"));
        assert_eq!(sniffed.media_kind(), MediaKind::Video);
        assert_eq!(registry.sniff(b"\x80theora").0, None);
    }
}
