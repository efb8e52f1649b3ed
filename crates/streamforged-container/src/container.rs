//! Container format detection and summaries.

use crate::cursor::MediaCursor;
use crate::ogg::{OggReader, CAPTURE_PATTERN};
use crate::record::Record;
use crate::riff::RiffReader;
use crate::stream::{ContainerStream, ReaderOptions};
use crate::types::{FileTimes, MediaInfo, Track};
use crate::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// Supported container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// RIFF, RIFX and RF64 (.avi, .wav)
    Riff,
    /// Ogg (.ogg, .ogv, .oga, .opus)
    Ogg,
}

impl std::fmt::Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Container::Riff => write!(f, "RIFF"),
            Container::Ogg => write!(f, "Ogg"),
        }
    }
}

/// Detect container format from file magic bytes
pub fn detect_container(path: &Path) -> Result<Container> {
    let mut reader = BufReader::new(File::open(path)?);
    detect_container_from_reader(&mut reader)
}

/// Detect container format from a reader. The reader is rewound afterwards.
pub fn detect_container_from_reader<R: Read + Seek>(reader: &mut R) -> Result<Container> {
    let mut magic = [0u8; 4];
    let mut filled = 0;
    while filled < magic.len() {
        match reader.read(&mut magic[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    reader.rewind()?;

    match &magic[..filled] {
        b"RIFF" | b"RIFX" | b"RF64" => Ok(Container::Riff),
        m if m == CAPTURE_PATTERN => Ok(Container::Ogg),
        _ => Err(Error::UnsupportedContainer(
            "Unable to detect container format from magic bytes".to_string(),
        )),
    }
}

/// Get container type from file extension (fallback)
pub fn container_from_extension(path: &Path) -> Option<Container> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "avi" | "wav" | "wave" | "rf64" | "rmi" => Some(Container::Riff),
        "ogg" | "ogv" | "oga" | "ogx" | "ogm" | "spx" | "opus" => Some(Container::Ogg),
        _ => None,
    }
}

/// Either reader, chosen at run time.
pub enum ContainerReader<R> {
    Riff(RiffReader<R>),
    Ogg(OggReader<R>),
}

impl ContainerReader<BufReader<File>> {
    /// Open a file, detecting its format from magic bytes or, failing that,
    /// its extension.
    pub fn open<P: AsRef<Path>>(path: P, options: ReaderOptions) -> Result<Self> {
        let path = path.as_ref();
        let container = detect_container(path).or_else(|e| {
            container_from_extension(path).ok_or(e)
        })?;
        let file = File::open(path)?;
        let times = FileTimes::from_metadata(&file.metadata()?);
        tracing::debug!("Opening {} as {}", path.display(), container);
        Ok(Self::new(container, BufReader::new(file), options)?.with_file_times(times))
    }
}

impl<R: Read + Seek> ContainerReader<R> {
    pub fn new(container: Container, reader: R, options: ReaderOptions) -> Result<Self> {
        Ok(match container {
            Container::Riff => Self::Riff(RiffReader::with_options(reader, options)?),
            Container::Ogg => Self::Ogg(OggReader::with_options(reader, options)?),
        })
    }

    /// Detect the format of `reader` from its magic bytes and wrap it.
    pub fn detect(mut reader: R, options: ReaderOptions) -> Result<Self> {
        let container = detect_container_from_reader(&mut reader)?;
        Self::new(container, reader, options)
    }

    pub fn with_file_times(self, file_times: FileTimes) -> Self {
        match self {
            Self::Riff(r) => Self::Riff(r.with_file_times(file_times)),
            Self::Ogg(r) => Self::Ogg(r.with_file_times(file_times)),
        }
    }

    pub fn container(&self) -> Container {
        match self {
            Self::Riff(_) => Container::Riff,
            Self::Ogg(_) => Container::Ogg,
        }
    }

    /// Summarize the container and its tracks.
    pub fn summarize(&mut self, file_path: impl Into<String>) -> Result<MediaInfo> {
        let file_size = self.length();
        let container = self.container().to_string();
        let (form_type, duration, declared_streams) = match self {
            Self::Riff(riff) => {
                let form_type = riff.form_type()?.map(|f| {
                    String::from_utf8_lossy(&f).trim_end().to_string()
                });
                let declared = if riff.is_avi()? {
                    Some(riff.main_header()?.streams)
                } else {
                    None
                };
                (form_type, Some(riff.duration()?), declared)
            }
            Self::Ogg(ogg) => (None, Some(ogg.duration()?), None),
        };
        let tracks = self.tracks()?.to_vec();

        Ok(MediaInfo {
            file_path: file_path.into(),
            file_size,
            container,
            form_type,
            duration,
            declared_streams,
            tracks,
        })
    }
}

impl<R: Read + Seek> ContainerStream for ContainerReader<R> {
    type Reader = R;

    fn cursor(&self) -> &MediaCursor<R> {
        match self {
            Self::Riff(r) => r.cursor(),
            Self::Ogg(r) => r.cursor(),
        }
    }

    fn cursor_mut(&mut self) -> &mut MediaCursor<R> {
        match self {
            Self::Riff(r) => r.cursor_mut(),
            Self::Ogg(r) => r.cursor_mut(),
        }
    }

    fn options(&self) -> &ReaderOptions {
        match self {
            Self::Riff(r) => r.options(),
            Self::Ogg(r) => r.options(),
        }
    }

    fn min_header_length(&self) -> u64 {
        match self {
            Self::Riff(r) => r.min_header_length(),
            Self::Ogg(r) => r.min_header_length(),
        }
    }

    fn read_next(&mut self) -> Result<Record> {
        match self {
            Self::Riff(r) => r.read_next(),
            Self::Ogg(r) => r.read_next(),
        }
    }

    fn descends_into(&self, record: &Record) -> bool {
        match self {
            Self::Riff(r) => r.descends_into(record),
            Self::Ogg(r) => r.descends_into(record),
        }
    }

    fn table_of_contents(&mut self) -> Result<Option<Record>> {
        match self {
            Self::Riff(r) => r.table_of_contents(),
            Self::Ogg(r) => r.table_of_contents(),
        }
    }

    fn tracks(&mut self) -> Result<&[Track]> {
        match self {
            Self::Riff(r) => r.tracks(),
            Self::Ogg(r) => r.tracks(),
        }
    }

    fn describe(&mut self, record: &Record) -> Result<String> {
        match self {
            Self::Riff(r) => r.describe(record),
            Self::Ogg(r) => r.describe(record),
        }
    }
}

/// Probe a container file and summarize its tracks.
pub fn probe_file<P: AsRef<Path>>(path: P) -> Result<MediaInfo> {
    probe_file_with_options(path, ReaderOptions::default())
}

/// Probe a container file with custom reader options.
pub fn probe_file_with_options<P: AsRef<Path>>(
    path: P,
    options: ReaderOptions,
) -> Result<MediaInfo> {
    let path = path.as_ref();
    let mut reader = ContainerReader::open(path, options)?;
    reader.summarize(path.display().to_string())
}

/// Probe an in-memory or otherwise seekable stream.
pub fn probe_reader<R: Read + Seek>(reader: R) -> Result<MediaInfo> {
    let mut reader = ContainerReader::detect(reader, ReaderOptions::default())?;
    reader.summarize("<memory>")
}
