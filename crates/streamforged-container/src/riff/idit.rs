//! Lenient parsing of the AVI `IDIT` digitization date.
//!
//! Writers disagree on the format. The common shapes are the C `ctime` form
//! (`MON OCT 12 10:30:00 2009`) and the EXIF form (`2009:10:12 10:30:00`).
//! Each whitespace-separated token is interpreted on its own; any component
//! no token supplies keeps the value from the fallback timestamp.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc};

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];
const WEEKDAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

#[derive(Debug, Clone, Copy)]
struct Parts {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
}

impl Parts {
    fn from_datetime(value: &DateTime<Utc>) -> Self {
        Self {
            year: value.year(),
            month: value.month(),
            day: value.day(),
            hour: value.hour(),
            minute: value.minute(),
            second: value.second(),
        }
    }

    fn to_datetime(self) -> Option<DateTime<Utc>> {
        let naive = NaiveDate::from_ymd_opt(self.year, self.month, self.day)?
            .and_hms_opt(self.hour, self.minute, self.second)?;
        Some(Utc.from_utc_datetime(&naive))
    }
}

/// Parse `IDIT` text, taking unparseable components from `fallback`.
pub fn parse_idit(text: &str, fallback: DateTime<Utc>) -> DateTime<Utc> {
    let mut parts = Parts::from_datetime(&fallback);

    for token in text.trim_matches(|c: char| c == '\0' || c.is_whitespace()).split_whitespace() {
        if !apply_token(token, &mut parts) {
            tracing::debug!("Ignoring unparseable IDIT token {:?}", token);
        }
    }

    parts.to_datetime().unwrap_or_else(|| {
        tracing::warn!("IDIT {:?} does not form a valid date, using fallback", text);
        fallback
    })
}

fn apply_token(token: &str, parts: &mut Parts) -> bool {
    let token = token.trim_matches(|c: char| c == ',' || c == '\0');

    if token.contains(':') {
        let fields: Vec<u32> = token.split(':').filter_map(|f| f.parse().ok()).collect();
        let [a, b, c] = fields[..] else {
            return false;
        };
        if token.split(':').next().is_some_and(|f| f.len() == 4) {
            parts.year = a as i32;
            parts.month = b;
            parts.day = c;
        } else {
            parts.hour = a;
            parts.minute = b;
            parts.second = c;
        }
        return true;
    }

    let lower = token.to_ascii_lowercase();
    if lower.len() >= 3 {
        if let Some(index) = MONTHS.iter().position(|m| lower.starts_with(m)) {
            parts.month = index as u32 + 1;
            return true;
        }
        if WEEKDAYS.iter().any(|d| lower.starts_with(d)) {
            return true;
        }
    }

    match token.parse::<u32>() {
        Ok(year) if year >= 1000 => {
            parts.year = year as i32;
            true
        }
        Ok(day) if (1..=31).contains(&day) => {
            parts.day = day;
            true
        }
        _ => false,
    }
}
