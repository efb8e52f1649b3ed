//! Text rendering for CLI output.

use std::fmt::Write;
use std::time::Duration;
use streamforged_container::{MediaInfo, MediaKind, Record, Track};

/// Format a duration as `HH:MM:SS.mmm`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        duration.subsec_millis()
    )
}

/// Nesting depth of each record in a flat iteration order.
///
/// `descends` tells which records hold nested records; a record is nested in
/// every such record whose extent it starts within.
pub fn record_depths<F>(records: &[Record], descends: F) -> Vec<usize>
where
    F: Fn(&Record) -> bool,
{
    let mut open: Vec<u64> = Vec::new();
    records
        .iter()
        .map(|record| {
            while open.last().is_some_and(|&end| record.offset >= end) {
                open.pop();
            }
            let depth = open.len();
            if descends(record) {
                open.push(record.end_offset());
            }
            depth
        })
        .collect()
}

/// One line of a record listing.
pub fn render_record(record: &Record, name: &str, depth: usize) -> String {
    format!(
        "{:>10}  {:>3}  {:>10}  {}{}{}",
        record.offset,
        record.header_length,
        record.payload_length,
        "  ".repeat(depth),
        name,
        if record.complete { "" } else { " [truncated]" }
    )
}

/// Short description of a track.
pub fn render_track(track: &Track) -> String {
    let mut line = format!("#{} {} {}", track.id, track.media_kind, track.codec_name());
    match track.media_kind {
        MediaKind::Video => {
            let _ = write!(line, " {}x{}", track.width, track.height);
            if track.rate > 0.0 {
                let _ = write!(line, " {:.3} fps", track.rate);
            }
        }
        MediaKind::Audio => {
            let _ = write!(line, " {}ch {} Hz", track.channels, track.rate);
        }
        _ => {}
    }
    if track.bit_depth > 0 {
        let _ = write!(line, ", {} bit", track.bit_depth);
    }
    if !track.duration.is_zero() {
        let _ = write!(line, ", {}", format_duration(track.duration));
    }
    if let Some(ref name) = track.name {
        let _ = write!(line, " ({})", name);
    }
    line
}

/// Multi-line container summary.
pub fn render_summary(info: &MediaInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "File: {}", info.file_path);
    let _ = write!(out, "Container: {}", info.container);
    if let Some(ref form) = info.form_type {
        let _ = write!(out, " ({})", form);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Size: {} bytes", info.file_size);
    if let Some(duration) = info.duration {
        let _ = writeln!(out, "Duration: {}", format_duration(duration));
    }
    if let Some(streams) = info.declared_streams {
        let _ = writeln!(out, "Declared streams: {}", streams);
    }
    let _ = writeln!(out, "\nTracks: {}", info.tracks.len());
    for track in &info.tracks {
        let _ = writeln!(out, "  {}", render_track(track));
    }
    out
}
