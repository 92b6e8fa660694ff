//! Value table persistence
//!
//! Tables live at `<root>/discount-<γ:.2>/<h>.txt`, one file per horizon
//! step, as `[v]` entries with five decimals in state-index order. A
//! `manifest.json` next to them records the latest horizon and a hash of the
//! model that produced it, so training only resumes from compatible tables.

use crate::mdp::state::STATE_COUNT;
use crate::mdp::transition::MdpConfig;
use crate::mdp::value::ValueTable;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("value table {path} not found")]
    Missing { path: PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed value table {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("value table {path} has {found} entries, expected {expected}")]
    WrongLength {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Latest persisted horizon for one discount, and the model that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub config_hash: String,
    pub discount: f64,
    pub latest_horizon: usize,
}

/// SHA-256 over the JSON of the model config and discount
///
/// Struct fields serialize in declaration order, so equal models always hash
/// to the same digest.
pub fn compute_config_hash(config: &MdpConfig, discount: f64) -> Result<String, PersistenceError> {
    let bytes = serde_json::to_vec(&(config, discount)).map_err(|e| {
        PersistenceError::Serialization(format!("config serialization failed: {}", e))
    })?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Render a table as bracketed five-decimal entries
pub fn format_table(table: &ValueTable) -> String {
    let mut out = String::with_capacity(table.len() * 12);
    for value in table.as_slice() {
        out.push_str(&format!("[{:.5}]", value));
    }
    out
}

/// Parse bracketed entries; `path` only labels errors
pub fn parse_table(text: &str, path: &Path) -> Result<ValueTable, PersistenceError> {
    let malformed = |reason: String| PersistenceError::Malformed {
        path: path.to_path_buf(),
        reason,
    };

    let mut values = Vec::with_capacity(STATE_COUNT);
    for (i, chunk) in text.trim().split(']').enumerate() {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }
        let body = chunk
            .strip_prefix('[')
            .ok_or_else(|| malformed(format!("entry {} does not start with '['", i)))?;
        let value: f64 = body
            .trim()
            .parse()
            .map_err(|e| malformed(format!("entry {}: {}", i, e)))?;
        values.push(value);
    }

    let found = values.len();
    ValueTable::from_values(values).map_err(|_| PersistenceError::WrongLength {
        path: path.to_path_buf(),
        expected: STATE_COUNT,
        found,
    })
}

/// Directory of value tables, one subdirectory per discount
#[derive(Debug, Clone)]
pub struct ValueTableStore {
    root: PathBuf,
}

impl ValueTableStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn discount_dir(&self, discount: f64) -> PathBuf {
        self.root.join(format!("discount-{:.2}", discount))
    }

    pub fn table_path(&self, discount: f64, horizon: usize) -> PathBuf {
        self.discount_dir(discount).join(format!("{}.txt", horizon))
    }

    pub fn manifest_path(&self, discount: f64) -> PathBuf {
        self.discount_dir(discount).join("manifest.json")
    }

    /// Write the table for `horizon`, returning its path
    pub fn save(
        &self,
        discount: f64,
        horizon: usize,
        table: &ValueTable,
    ) -> Result<PathBuf, PersistenceError> {
        let dir = self.discount_dir(discount);
        fs::create_dir_all(&dir).map_err(|source| PersistenceError::Io {
            path: dir.clone(),
            source,
        })?;

        let path = self.table_path(discount, horizon);
        fs::write(&path, format_table(table)).map_err(|source| PersistenceError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "value table saved");
        Ok(path)
    }

    pub fn load(&self, discount: f64, horizon: usize) -> Result<ValueTable, PersistenceError> {
        let path = self.table_path(discount, horizon);
        let text = read_existing(&path)?;
        parse_table(&text, &path)
    }

    pub fn write_manifest(&self, manifest: &Manifest) -> Result<(), PersistenceError> {
        let dir = self.discount_dir(manifest.discount);
        fs::create_dir_all(&dir).map_err(|source| PersistenceError::Io {
            path: dir.clone(),
            source,
        })?;

        let path = self.manifest_path(manifest.discount);
        let json = serde_json::to_string_pretty(manifest).map_err(|e| {
            PersistenceError::Serialization(format!("manifest serialization failed: {}", e))
        })?;
        fs::write(&path, json).map_err(|source| PersistenceError::Io { path, source })
    }

    /// `None` if no manifest was written for this discount
    pub fn read_manifest(&self, discount: f64) -> Result<Option<Manifest>, PersistenceError> {
        let path = self.manifest_path(discount);
        let text = match read_existing(&path) {
            Ok(text) => text,
            Err(PersistenceError::Missing { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        serde_json::from_str(&text).map(Some).map_err(|e| PersistenceError::Malformed {
            path,
            reason: e.to_string(),
        })
    }
}

fn read_existing(path: &Path) -> Result<String, PersistenceError> {
    fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => PersistenceError::Missing {
            path: path.to_path_buf(),
        },
        _ => PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_hash_deterministic() {
        let a = compute_config_hash(&MdpConfig::default(), 0.9).unwrap();
        let b = compute_config_hash(&MdpConfig::default(), 0.9).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_config_hash_depends_on_model() {
        let base = compute_config_hash(&MdpConfig::default(), 0.9).unwrap();
        assert_ne!(base, compute_config_hash(&MdpConfig::default(), 0.8).unwrap());

        let mut config = MdpConfig::default();
        config.arrival_cap = 4;
        assert_ne!(base, compute_config_hash(&config, 0.9).unwrap());

        let mut config = MdpConfig::default();
        config.penalties[5] = -76.0;
        assert_ne!(base, compute_config_hash(&config, 0.9).unwrap());
    }

    #[test]
    fn test_paths() {
        let store = ValueTableStore::new("values");
        assert_eq!(store.table_path(0.9, 15), PathBuf::from("values/discount-0.90/15.txt"));
    }

    #[test]
    fn test_format_entries() {
        let mut values = vec![0.0; STATE_COUNT];
        values[0] = 1.234567;
        values[1] = -2.0;
        let text = format_table(&ValueTable::from_values(values).unwrap());
        assert!(text.starts_with("[1.23457][-2.00000][0.00000]"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let path = Path::new("x.txt");
        assert!(matches!(parse_table("[1.0][abc]", path), Err(PersistenceError::Malformed { .. })));
        assert!(matches!(
            parse_table("[1.0][2.0]", path),
            Err(PersistenceError::WrongLength { found: 2, .. })
        ));
    }
}
