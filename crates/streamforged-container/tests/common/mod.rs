//! Synthetic container fixtures shared by the integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::rc::Rc;

/// A plain RIFF chunk, padded to an even length.
pub fn chunk(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = id.to_vec();
    out.extend((payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
    out
}

/// A `LIST`/`RIFF`-style chunk with a sub-type.
pub fn list(id: &[u8; 4], sub_type: &[u8; 4], children: &[u8]) -> Vec<u8> {
    let mut out = id.to_vec();
    out.extend(((children.len() + 4) as u32).to_le_bytes());
    out.extend_from_slice(sub_type);
    out.extend_from_slice(children);
    out
}

pub fn dwords(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// `avih` payload: 33333us per frame, 10 frames, 320x240.
pub fn avih(streams: u32) -> Vec<u8> {
    dwords(&[33333, 0, 0, 0x10, 10, 0, streams, 0, 320, 240, 0, 0, 0, 0])
}

/// `strh` payload for a stream at `rate / scale` with `length` samples.
pub fn strh(stream_type: &[u8; 4], handler: &[u8; 4], scale: u32, rate: u32, length: u32) -> Vec<u8> {
    let mut out = stream_type.to_vec();
    out.extend_from_slice(handler);
    out.extend(dwords(&[0, 0, 0, scale, rate, 0, length, 0, 0, 0]));
    out
}

/// `BITMAPINFOHEADER` payload.
pub fn bitmap_info(width: i32, height: i32, compression: &[u8; 4]) -> Vec<u8> {
    let mut out = 40u32.to_le_bytes().to_vec();
    out.extend(width.to_le_bytes());
    out.extend(height.to_le_bytes());
    out.extend(1u16.to_le_bytes());
    out.extend(24u16.to_le_bytes());
    out.extend_from_slice(compression);
    out.extend([0u8; 20]);
    out
}

/// `WAVEFORMATEX` payload.
pub fn wave_format(tag: u16, channels: u16, rate: u32, bits: u16) -> Vec<u8> {
    let block_align = channels * bits / 8;
    let mut out = tag.to_le_bytes().to_vec();
    out.extend(channels.to_le_bytes());
    out.extend(rate.to_le_bytes());
    out.extend((rate * block_align as u32).to_le_bytes());
    out.extend(block_align.to_le_bytes());
    out.extend(bits.to_le_bytes());
    out
}

/// Minimal AVI: one video stream header, no `strf`, and an `idx1` index.
pub fn minimal_avi() -> Vec<u8> {
    let strl = list(b"LIST", b"strl", &chunk(b"strh", &strh(b"vids", b"DIB ", 1, 30, 10)));
    let mut hdrl = chunk(b"avih", &avih(1));
    hdrl.extend(strl);
    let mut body = list(b"LIST", b"hdrl", &hdrl);
    body.extend(list(b"LIST", b"movi", &chunk(b"00dc", b"frame")));
    body.extend(chunk(b"idx1", &[0u8; 16]));
    list(b"RIFF", b"AVI ", &body)
}

/// AVI with an audio and a video stream, stream names and an `IDIT` date.
pub fn two_stream_avi() -> Vec<u8> {
    let mut video = chunk(b"strh", &strh(b"vids", b"XVID", 1001, 30000, 300));
    video.extend(chunk(b"strf", &bitmap_info(640, -480, b"XVID")));
    video.extend(chunk(b"strn", b"Main video\0"));

    let mut audio = chunk(b"strh", &strh(b"auds", b"\0\0\0\0", 1, 44100, 441000));
    audio.extend(chunk(b"strf", &wave_format(0x55, 2, 44100, 16)));

    let mut hdrl = chunk(b"avih", &avih(2));
    hdrl.extend(list(b"LIST", b"strl", &video));
    hdrl.extend(list(b"LIST", b"strl", &audio));

    let mut body = list(b"LIST", b"hdrl", &hdrl);
    body.extend(chunk(b"IDIT", b"MON OCT 12 10:30:00 2009\n\0"));
    body.extend(list(b"LIST", b"movi", &[]));
    list(b"RIFF", b"AVI ", &body)
}

/// PCM WAVE file holding `frames` stereo 16-bit frames.
pub fn wave(rate: u32, frames: u32) -> Vec<u8> {
    let mut body = chunk(b"fmt ", &wave_format(1, 2, rate, 16));
    body.extend(chunk(b"data", &vec![0u8; frames as usize * 4]));
    list(b"RIFF", b"WAVE", &body)
}

/// RF64 WAVE whose `data` length is escaped to the ds64 value
/// `data_size`. Only `present` data bytes are actually stored.
pub fn rf64(data_size: u64, present: usize, with_ds64: bool) -> Vec<u8> {
    let fmt = chunk(b"fmt ", &wave_format(1, 2, 48000, 16));

    let mut ds64 = Vec::new();
    let riff_size = 4 + 8 + 28 + fmt.len() as u64 + 8 + data_size;
    ds64.extend(riff_size.to_le_bytes());
    ds64.extend(data_size.to_le_bytes());
    ds64.extend((data_size / 4).to_le_bytes());
    ds64.extend(0u32.to_le_bytes());

    let mut out = b"RF64".to_vec();
    out.extend(u32::MAX.to_le_bytes());
    out.extend_from_slice(b"WAVE");
    if with_ds64 {
        out.extend(chunk(b"ds64", &ds64));
    } else {
        out.extend(chunk(b"JUNK", &[0u8; 28]));
    }
    out.extend(fmt);
    out.extend_from_slice(b"data");
    out.extend(u32::MAX.to_le_bytes());
    out.extend(vec![0u8; present]);
    out
}

/// One Ogg page with an explicit lacing table.
pub fn ogg_page(flags: u8, granule: u64, serial: u32, sequence: u32, lacing: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut out = b"OggS".to_vec();
    out.push(0);
    out.push(flags);
    out.extend(granule.to_le_bytes());
    out.extend(serial.to_le_bytes());
    out.extend(sequence.to_le_bytes());
    out.extend(0u32.to_le_bytes());
    out.push(lacing.len() as u8);
    out.extend_from_slice(lacing);
    out.extend_from_slice(payload);
    out
}

/// One Ogg page carrying a single packet under 255 bytes.
pub fn ogg_packet_page(flags: u8, granule: u64, serial: u32, sequence: u32, payload: &[u8]) -> Vec<u8> {
    ogg_page(flags, granule, serial, sequence, &[payload.len() as u8], payload)
}

/// Vorbis identification header.
pub fn vorbis_id(channels: u8, rate: u32) -> Vec<u8> {
    let mut out = b"\x01vorbis".to_vec();
    out.extend(0u32.to_le_bytes());
    out.push(channels);
    out.extend(rate.to_le_bytes());
    out.extend([0u8; 12]);
    out.push(0xB8);
    out.push(1);
    out
}

/// Theora identification header for `width`x`height` at `fps`/1 with the
/// given keyframe granule shift.
pub fn theora_id(width: u32, height: u32, fps: u32, shift: u8) -> Vec<u8> {
    let mut out = vec![0u8; 42];
    out[..7].copy_from_slice(b"\x80theora");
    out[7] = 3;
    out[8] = 2;
    out[14..17].copy_from_slice(&width.to_be_bytes()[1..]);
    out[17..20].copy_from_slice(&height.to_be_bytes()[1..]);
    out[22..26].copy_from_slice(&fps.to_be_bytes());
    out[26..30].copy_from_slice(&1u32.to_be_bytes());
    out[40] = (shift >> 3) & 0x03;
    out[41] = (shift & 0x07) << 5;
    out
}

/// A two-page Vorbis stream ending at `end_granule`.
pub fn vorbis_stream(serial: u32, rate: u32, end_granule: u64) -> Vec<u8> {
    let mut out = ogg_packet_page(0x02, 0, serial, 0, &vorbis_id(2, rate));
    out.extend(ogg_packet_page(0x04, end_granule, serial, 1, b"audio"));
    out
}

/// Seekable reader counting `read` calls.
pub struct CountingReader {
    inner: Cursor<Vec<u8>>,
    reads: Rc<Cell<usize>>,
}

impl CountingReader {
    pub fn new(data: Vec<u8>) -> (Self, Rc<Cell<usize>>) {
        let reads = Rc::new(Cell::new(0));
        (
            Self {
                inner: Cursor::new(data),
                reads: Rc::clone(&reads),
            },
            reads,
        )
    }
}

impl Read for CountingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads.set(self.reads.get() + 1);
        self.inner.read(buf)
    }
}

impl Seek for CountingReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}
