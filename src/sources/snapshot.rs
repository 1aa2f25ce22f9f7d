//! Local snapshots of remote collections.
//!
//! One pretty-printed JSON document per collection, named after the
//! sanitized collection name. Writes go through a temp file and a rename
//! so an interrupted sync never leaves a truncated snapshot.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result, ResultExt};
use crate::spotify::RemoteCollection;

/// File name used for a collection called `name`.
pub fn snapshot_file_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let sanitized = sanitized.trim_start_matches('.');
    if sanitized.is_empty() {
        "untitled.json".to_string()
    } else {
        format!("{sanitized}.json")
    }
}

/// Directory of remote collection snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(snapshot_file_name(name))
    }

    /// Write (or overwrite) the snapshot of `collection`.
    pub fn write(&self, collection: &RemoteCollection) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(format!("creating {}", self.dir.display()))?;

        let path = self.path_for(&collection.name);
        let contents =
            serde_json::to_string_pretty(collection).map_err(|e| Error::json(&path, e))?;

        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, contents)
            .with_context(format!("writing {}", temp_path.display()))?;
        std::fs::rename(&temp_path, &path)
            .with_context(format!("renaming {}", temp_path.display()))?;

        tracing::debug!(target: "sources::snapshot", path = %path.display(), "Wrote snapshot");
        Ok(path)
    }

    fn snapshot_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.dir)
            .with_context(format!("listing {}", self.dir.display()))?
        {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    fn read(path: &Path) -> Result<RemoteCollection> {
        let contents = std::fs::read_to_string(path)
            .with_context(format!("reading {}", path.display()))?;
        serde_json::from_str(&contents).map_err(|e| Error::json(path, e))
    }

    /// Every snapshot, sorted by collection name.
    pub fn load_all(&self) -> Result<Vec<RemoteCollection>> {
        let mut collections = self
            .snapshot_paths()?
            .iter()
            .map(|p| Self::read(p))
            .collect::<Result<Vec<_>>>()?;
        collections.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(collections)
    }

    /// Remote ids that already have a snapshot.
    pub fn local_remote_ids(&self) -> Result<HashSet<String>> {
        Ok(self
            .load_all()?
            .into_iter()
            .map(|c| c.spotify_id)
            .collect())
    }

    /// Delete every snapshot; returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let paths = self.snapshot_paths()?;
        for path in &paths {
            std::fs::remove_file(path).with_context(format!("removing {}", path.display()))?;
        }
        tracing::info!(target: "sources::snapshot", removed = paths.len(), "Cleared snapshots");
        Ok(paths.len())
    }
}
