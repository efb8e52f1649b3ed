//! # streamforged-container
//!
//! Lazy, seekable readers for RIFF-family (AVI, WAVE, RF64) and Ogg containers.
//!
//! Both readers walk a file as a sequence of framed [`Record`]s without
//! buffering it, and recover per-stream [`Track`] metadata from the headers
//! they find along the way.
//!
//! ## Features
//!
//! - RIFF chunk framing with list recursion, odd-length padding, big-endian
//!   `RIFX` and RF64 `ds64` 64-bit size overrides
//! - AVI stream headers (`avih`, `strh`, `strf`, `strn`), `IDIT` dates and
//!   WAVE `fmt ` parsing
//! - Ogg page framing, logical stream reconstruction and codec sniffing
//!   (Vorbis, Theora, FLAC, Speex, Opus, OGM and more)
//! - Position-preserving queries: lookups never move the reader
//!
//! ## Example
//!
//! ```no_run
//! use streamforged_container::{ContainerStream, RiffReader};
//!
//! let mut reader = RiffReader::open("clip.avi").unwrap();
//! for record in reader.records() {
//!     let record = record.unwrap();
//!     println!("{} at {}", String::from_utf8_lossy(&record.identifier), record.offset);
//! }
//!
//! for track in reader.tracks().unwrap() {
//!     println!("{} {} {}x{}", track.id, track.media_kind, track.width, track.height);
//! }
//! ```

pub mod bytes;
pub mod container;
pub mod cursor;
pub mod error;
pub mod ogg;
pub mod record;
pub mod riff;
pub mod stream;
pub mod types;

pub use container::{
    container_from_extension, detect_container, detect_container_from_reader, probe_file,
    probe_file_with_options, probe_reader, Container, ContainerReader,
};
pub use cursor::MediaCursor;
pub use error::{Error, Result};
pub use ogg::{OggReader, PageFlags, Sniffed, SnifferRegistry};
pub use record::Record;
pub use riff::{RiffReader, SizeOverrides};
pub use stream::{ContainerStream, ReaderOptions, Records, DEFAULT_MAX_PAYLOAD_SIZE};
pub use types::*;
