//! Source-independent raw records consumed by the ingestion pipeline.
//!
//! Both the manual-file and the remote-snapshot normalizers project into
//! these shapes. Values that only matter when a new track row is created
//! (the duration) stay unparsed until then.

use std::time::Duration;

use chrono::Datelike;

use crate::ingest::artist_parser::{ParsedArtists, parse_artist_field};
use crate::model::CollectionSource;

/// How a raw track credits its artists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtistCredit {
    /// Free text such as `"A & B feat. C"`
    Field(String),
    /// Names already split by the source, all credited as main artists
    Names(Vec<String>),
}

impl ArtistCredit {
    pub fn parse(&self) -> ParsedArtists {
        match self {
            Self::Field(field) => parse_artist_field(field),
            Self::Names(names) => ParsedArtists::from_names(names),
        }
    }
}

/// A track duration as the source wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationField {
    /// `"H:MM:SS"`, `"MM:SS"` or plain seconds, optionally fractional
    Text(String),
    /// Milliseconds
    Millis(u64),
}

impl DurationField {
    pub fn parse(&self) -> Result<Duration, String> {
        match self {
            Self::Millis(ms) => Ok(Duration::from_millis(*ms)),
            Self::Text(text) => parse_duration(text),
        }
    }
}

/// A track record normalized from any source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTrack {
    pub name: String,
    pub artist: ArtistCredit,
    pub duration: DurationField,
    pub released_year: i64,
}

/// A collection record normalized from any source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCollection {
    pub name: String,
    pub nick_name: Option<String>,
    pub description: String,
    pub created_year: i64,
    pub ordinal: Option<i64>,
    pub source: CollectionSource,
    pub remote_id: Option<String>,
    /// Tracks in playlist order
    pub tracks: Vec<RawTrack>,
}

/// Parse `"H:MM:SS"`, `"MM:SS"` or `"SS"` (seconds may carry a fraction).
pub fn parse_duration(text: &str) -> Result<Duration, String> {
    let text = text.trim();
    let invalid = || format!("unparseable duration '{text}'");

    let parts: Vec<&str> = text.split(':').collect();
    let (seconds_part, leading) = parts.split_last().ok_or_else(invalid)?;
    let (whole_seconds, fraction_millis) = parse_seconds(seconds_part).ok_or_else(invalid)?;
    if !leading.is_empty() && whole_seconds >= 60 {
        return Err(invalid());
    }

    let mut whole: Vec<u64> = Vec::with_capacity(leading.len());
    for part in leading {
        whole.push(parse_digits(part).ok_or_else(invalid)?);
    }

    let total_seconds = match whole.as_slice() {
        [] => Some(whole_seconds),
        [minutes] => minutes
            .checked_mul(60)
            .and_then(|m| m.checked_add(whole_seconds)),
        [hours, minutes] => {
            if *minutes >= 60 {
                return Err(invalid());
            }
            hours
                .checked_mul(3600)
                .and_then(|h| h.checked_add(minutes * 60))
                .and_then(|hm| hm.checked_add(whole_seconds))
        }
        _ => None,
    };

    let millis = total_seconds
        .and_then(|s| s.checked_mul(1000))
        .and_then(|ms| ms.checked_add(fraction_millis))
        .ok_or_else(invalid)?;
    Ok(Duration::from_millis(millis))
}

/// Non-empty ASCII digits only; no sign, exponent or separators.
fn parse_digits(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// `"SS"` or `"SS.fff"`: whole seconds and the fraction rounded to millis.
fn parse_seconds(text: &str) -> Option<(u64, u64)> {
    let Some((whole, fraction)) = text.split_once('.') else {
        return Some((parse_digits(text)?, 0));
    };
    let whole = parse_digits(whole)?;
    if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let digits: Vec<u64> = fraction
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(4)
        .map(|b| u64::from(b - b'0'))
        .collect();
    // 0.9995 and up rounds to 1000, carrying into the next second
    let millis = digits[0] * 100 + digits[1] * 10 + digits[2] + u64::from(digits[3] >= 5);
    Some((whole, millis))
}

/// Parse a release year from `"1999"` or a `"1999-04[-01]"` date.
///
/// Years after the current calendar year are rejected.
pub fn parse_year(text: &str) -> Result<i64, String> {
    let text = text.trim();
    let year_part = text.split('-').next().unwrap_or_default();
    let year: i64 = year_part
        .parse()
        .map_err(|_| format!("unparseable year '{text}'"))?;
    validate_year(year)
}

/// Reject non-positive years and years in the future.
pub fn validate_year(year: i64) -> Result<i64, String> {
    let current = i64::from(chrono::Utc::now().year());
    if year <= 0 {
        Err(format!("invalid year {year}"))
    } else if year > current {
        Err(format!("year {year} cannot exceed current year {current}"))
    } else {
        Ok(year)
    }
}
