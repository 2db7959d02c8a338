use crate::types::LabelHistory;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Troubleshooting history on disk, one JSON file per label.
pub struct HistoryStore {
    dir: Utf8PathBuf,
}

impl HistoryStore {
    /// Create a store under the given project directory.
    ///
    /// Files live in `.remedy/history/<label>.json` within the project directory.
    pub fn new(project_dir: &Utf8Path) -> Self {
        let dir = project_dir.join(".remedy").join("history");
        Self { dir }
    }

    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// File holding the history of `label`.
    pub fn path_for(&self, label: &str) -> Utf8PathBuf {
        let file_name: String = label
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | ' ' => '_',
                c => c,
            })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }

    /// Load the history of a label.
    ///
    /// Returns an empty history if nothing was saved yet.
    pub fn load(&self, label: &str) -> Result<LabelHistory, StoreError> {
        let path = self.path_for(label);
        if !path.exists() {
            return Ok(LabelHistory::new(label));
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save a label's history, creating the directory if needed.
    ///
    /// Writes to a temporary file first so a crash never leaves a truncated file.
    pub fn save(&self, history: &LabelHistory) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&history.label);
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(history)?;
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;
        tracing::debug!("Saved troubleshooting history of {} to {}", history.label, path);
        Ok(())
    }

    /// Labels with a saved history, sorted.
    pub fn labels(&self) -> Result<Vec<String>, StoreError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut labels = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                labels.push(stem.to_string());
            }
        }
        labels.sort();
        Ok(labels)
    }
}
