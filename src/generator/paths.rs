//! # Path / Manifest Tracker
//!
//! Every artifact a layer emits is identified by a logical id (`dto/user`).
//! [`OutputLayout`] turns that id into an absolute path and an import
//! specifier; [`PathTracker`] records the mapping and refuses a second,
//! different path for an id it has already seen, as well as a second id for a
//! path another id already owns.
//!
//! ```text
//! dto/user  ──OutputLayout──▶  <root>/dto/user.rs   crate::dto::user
//! dto/mod   ──OutputLayout──▶  <root>/dto/mod.rs    crate::dto
//! ```
//!
//! The import specifier always follows the file's location, so an artifact
//! placed at `dto/user_v2.rs` is imported as `crate::dto::user_v2`.
//!
//! After generation the tracker is consumed into a [`Manifest`], the
//! reproducibility record for the run. Two runs over the same schema and config
//! produce manifests that compare equal under [`Manifest::deterministic_eq`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Where one artifact lands and how generated code imports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathEntry {
    pub logical_id: String,
    pub absolute_path: PathBuf,
    pub import_specifier: String,
}

/// A registration that would break the one-id-one-path mapping.
///
/// Either `logical_id` is already registered at `existing` and now claims
/// `rejected`, or `rejected` is already owned by the id `owner`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("path conflict for '{logical_id}': {} is held by '{owner}', rejected {}", .existing.display(), .rejected.display())]
pub struct PathConflictError {
    pub logical_id: String,
    /// Logical id registered at `existing`.
    pub owner: String,
    pub existing: PathBuf,
    pub rejected: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("invalid logical id '{0}': expected a relative path like 'dto/user'")]
    InvalidLogicalId(String),
    #[error("invalid output path '{}' for '{logical_id}'", .path.display())]
    InvalidPath { logical_id: String, path: PathBuf },
}

/// Maps logical ids to files under one output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub root: PathBuf,
    /// File extension without the dot.
    pub extension: String,
    /// Leading segment of every import specifier (`crate`).
    pub import_root: String,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: "rs".to_string(),
            import_root: "crate".to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_import_root(mut self, import_root: impl Into<String>) -> Self {
        self.import_root = import_root.into();
        self
    }

    /// Resolve a logical id, optionally placed at an explicit path relative to the root.
    ///
    /// The import specifier is derived from the relative file path without its
    /// extension; a trailing `mod` names the enclosing directory's module.
    pub fn resolve(
        &self,
        logical_id: &str,
        placement: Option<&Path>,
    ) -> Result<PathEntry, LayoutError> {
        let segments = logical_segments(logical_id)?;
        let (relative, mut modules) = match placement {
            Some(path) => {
                let modules = placement_segments(path).ok_or_else(|| LayoutError::InvalidPath {
                    logical_id: logical_id.to_string(),
                    path: path.to_path_buf(),
                })?;
                (path.to_path_buf(), modules)
            }
            None => (
                PathBuf::from(format!("{logical_id}.{}", self.extension)),
                segments.iter().map(|s| (*s).to_string()).collect(),
            ),
        };
        if modules.last().is_some_and(|m| m == "mod") {
            modules.pop();
        }

        let import_specifier = std::iter::once(self.import_root.clone())
            .chain(modules)
            .collect::<Vec<_>>()
            .join("::");

        Ok(PathEntry {
            logical_id: logical_id.to_string(),
            absolute_path: self.root.join(relative),
            import_specifier,
        })
    }
}

fn logical_segments(logical_id: &str) -> Result<Vec<&str>, LayoutError> {
    let segments: Vec<&str> = logical_id.split('/').collect();
    let valid = !logical_id.is_empty()
        && segments.iter().all(|s| {
            !s.is_empty()
                && *s != "."
                && *s != ".."
                && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        });
    if valid {
        Ok(segments)
    } else {
        Err(LayoutError::InvalidLogicalId(logical_id.to_string()))
    }
}

/// Module segments of a plain relative path: every directory plus the file stem.
fn placement_segments(path: &Path) -> Option<Vec<String>> {
    let mut segments = Vec::new();
    for component in path.components() {
        let Component::Normal(part) = component else {
            return None;
        };
        segments.push(part.to_str()?.to_string());
    }
    let last = segments.last_mut()?;
    let stem = Path::new(last.as_str()).file_stem()?.to_str()?.to_string();
    *last = stem;
    Some(segments)
}

#[derive(Debug, Default)]
struct TrackerState {
    entries: BTreeMap<String, PathEntry>,
    /// Absolute path → the logical id registered there.
    owners: BTreeMap<PathBuf, String>,
    conflicts: Vec<PathConflictError>,
}

impl TrackerState {
    fn reject(&mut self, conflict: PathConflictError) -> PathConflictError {
        tracing::warn!(%conflict, "path conflict");
        self.conflicts.push(conflict.clone());
        conflict
    }
}

/// Registry of every emitted artifact for one run.
///
/// All registrations go through one mutex, so the tracker may be shared with
/// parallel workers.
#[derive(Debug, Default)]
pub struct PathTracker {
    state: Mutex<TrackerState>,
}

impl PathTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `logical_id` at `absolute_path`.
    ///
    /// Returns `Ok(true)` for a new registration and `Ok(false)` when the same
    /// id was already registered at the same path. A known id at a different
    /// path, or a new id at a path another id owns, is a conflict: it is
    /// recorded and returned, and the first registration wins.
    pub fn track_path(
        &self,
        logical_id: &str,
        absolute_path: &Path,
        import_specifier: &str,
    ) -> Result<bool, PathConflictError> {
        let mut state = self.lock();
        if let Some(existing) = state.entries.get(logical_id) {
            if existing.absolute_path == absolute_path {
                return Ok(false);
            }
            let conflict = PathConflictError {
                logical_id: logical_id.to_string(),
                owner: logical_id.to_string(),
                existing: existing.absolute_path.clone(),
                rejected: absolute_path.to_path_buf(),
            };
            return Err(state.reject(conflict));
        }
        if let Some(owner) = state.owners.get(absolute_path) {
            let conflict = PathConflictError {
                logical_id: logical_id.to_string(),
                owner: owner.clone(),
                existing: absolute_path.to_path_buf(),
                rejected: absolute_path.to_path_buf(),
            };
            return Err(state.reject(conflict));
        }
        state
            .owners
            .insert(absolute_path.to_path_buf(), logical_id.to_string());
        state.entries.insert(
            logical_id.to_string(),
            PathEntry {
                logical_id: logical_id.to_string(),
                absolute_path: absolute_path.to_path_buf(),
                import_specifier: import_specifier.to_string(),
            },
        );
        Ok(true)
    }

    pub fn track_entry(&self, entry: &PathEntry) -> Result<bool, PathConflictError> {
        self.track_path(&entry.logical_id, &entry.absolute_path, &entry.import_specifier)
    }

    pub fn get(&self, logical_id: &str) -> Option<PathEntry> {
        self.lock().entries.get(logical_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn conflict_count(&self) -> usize {
        self.lock().conflicts.len()
    }

    /// Consume the tracker into the run manifest.
    pub fn finalize(self, schema_hash: &str, tool_version: &str) -> Manifest {
        let state = self
            .state
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Manifest {
            schema_hash: schema_hash.to_string(),
            tool_version: tool_version.to_string(),
            generated_at: Utc::now(),
            path_map: state.entries,
            conflicts: state.conflicts,
        }
    }

    // A panic while holding the lock cannot leave the maps half-written.
    fn lock(&self) -> std::sync::MutexGuard<'_, TrackerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// The reproducibility record of one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub schema_hash: String,
    pub tool_version: String,
    #[serde(with = "rfc3339")]
    pub generated_at: DateTime<Utc>,
    pub path_map: BTreeMap<String, PathEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<PathConflictError>,
}

impl Manifest {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Equality ignoring `generated_at`.
    pub fn deterministic_eq(&self, other: &Manifest) -> bool {
        self.schema_hash == other.schema_hash
            && self.tool_version == other.tool_version
            && self.path_map == other.path_map
            && self.conflicts == other.conflicts
    }
}

mod rfc3339 {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
