//! Hand-authored collection files.
//!
//! Each collection lives in `collection_<key>[_suffix].json` inside the
//! manual directory:
//!
//! ```json
//! {
//!   "name": "Summer 2004", "nick_name": "s04", "description": "",
//!   "created_year": 2004, "ordinal": 12,
//!   "tracks": [
//!     {"name": "Teardrop", "artist": "Massive Attack",
//!      "duration": "5:30", "released_year": 1998}
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, RecordLocation, Result, ResultExt};
use crate::ingest::raw::{ArtistCredit, DurationField, RawCollection, RawTrack, parse_year};
use crate::model::CollectionSource;

const FILE_PREFIX: &str = "collection_";

/// Extract the identifying key from a manual collection file name.
///
/// `collection_10.json` and `collection_10_summer.json` both yield `"10"`.
pub fn collection_key(file_name: &str) -> Option<&str> {
    let rest = file_name.strip_prefix(FILE_PREFIX)?;
    if !file_name.ends_with(".json") {
        return None;
    }
    let key = rest.split(['_', '.']).next()?;
    (!key.is_empty()).then_some(key)
}

/// One manual collection file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualEntry {
    pub key: String,
    pub path: PathBuf,
}

impl ManualEntry {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Read and parse the file without validating its fields.
    pub fn read(&self) -> Result<ManualDocument> {
        let contents = std::fs::read_to_string(&self.path)
            .with_context(format!("reading {}", self.path.display()))?;
        let file: ManualCollectionFile =
            serde_json::from_str(&contents).map_err(|e| Error::json(&self.path, e))?;
        Ok(ManualDocument {
            file_name: self.file_name(),
            file,
        })
    }
}

/// Manual collection files ordered by file name.
#[derive(Debug, Clone, Default)]
pub struct ManualIndex {
    entries: Vec<ManualEntry>,
}

impl ManualIndex {
    /// Index the `collection_*.json` files in `dir`. A missing directory is empty.
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            tracing::warn!(target: "sources::manual", dir = %dir.display(), "Manual directory not found");
            return Ok(Self::default());
        }

        let mut entries = Vec::new();
        for dir_entry in std::fs::read_dir(dir).with_context(format!("listing {}", dir.display()))? {
            let path = dir_entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(key) = collection_key(file_name) {
                entries.push(ManualEntry {
                    key: key.to_string(),
                    path: path.clone(),
                });
            }
        }
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(mut entries: Vec<ManualEntry>) -> Self {
        entries.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
        Self { entries }
    }

    pub fn entries(&self) -> &[ManualEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ManualCollectionFile {
    name: Option<String>,
    nick_name: Option<String>,
    description: Option<String>,
    created_year: Option<Value>,
    ordinal: Option<i64>,
    tracks: Option<Vec<ManualTrackRecord>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ManualTrackRecord {
    name: Option<String>,
    artist: Option<String>,
    duration: Option<Value>,
    released_year: Option<Value>,
}

/// A parsed manual file whose fields have not been validated yet.
#[derive(Debug, Clone)]
pub struct ManualDocument {
    file_name: String,
    file: ManualCollectionFile,
}

impl ManualDocument {
    /// Collection name, if the file has a non-blank one.
    pub fn name(&self) -> Option<&str> {
        self.file
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    /// Name for messages: the collection name, or the file name without one.
    pub fn label(&self) -> &str {
        self.name().unwrap_or(&self.file_name)
    }

    /// Project the document into a raw collection.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedRecord`] naming the first missing or invalid field.
    pub fn normalize(&self) -> Result<RawCollection> {
        let collection = RecordLocation::collection(self.label());
        let name = self
            .name()
            .ok_or_else(|| Error::malformed(collection.clone(), "missing name"))?;
        let created_year = self
            .file
            .created_year
            .as_ref()
            .ok_or_else(|| Error::malformed(collection.clone(), "missing created_year"))
            .and_then(|v| year_value(v).map_err(|r| Error::malformed(collection.clone(), r)))?;
        let records = self
            .file
            .tracks
            .as_ref()
            .ok_or_else(|| Error::malformed(collection.clone(), "missing tracks"))?;

        let mut tracks = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let location = RecordLocation::track(name, index + 1);
            tracks.push(normalize_track(record).map_err(|r| Error::malformed(location, r))?);
        }

        Ok(RawCollection {
            name: name.to_string(),
            nick_name: self.file.nick_name.clone().filter(|n| !n.trim().is_empty()),
            description: self.file.description.clone().unwrap_or_default(),
            created_year,
            ordinal: self.file.ordinal,
            source: CollectionSource::Manual,
            remote_id: None,
            tracks,
        })
    }
}

fn normalize_track(record: &ManualTrackRecord) -> std::result::Result<RawTrack, String> {
    let name = record.name.clone().ok_or("missing track name")?;
    let artist = record.artist.clone().ok_or("missing artist")?;
    let duration = match record.duration.as_ref().ok_or("missing duration")? {
        Value::String(text) => DurationField::Text(text.clone()),
        other => return Err(format!("unparseable duration '{other}'")),
    };
    let released_year = year_value(record.released_year.as_ref().ok_or("missing released_year")?)?;

    Ok(RawTrack {
        name,
        artist: ArtistCredit::Field(artist),
        duration,
        released_year,
    })
}

fn year_value(value: &Value) -> std::result::Result<i64, String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| format!("unparseable year '{n}'")),
        Value::String(text) => parse_year(text),
        other => Err(format!("unparseable year '{other}'")),
    }
}
