//! Read-only registry of execution targets.
//!
//! Loaded once at start-up and shared behind an `Arc` afterwards; there is
//! no way to mutate a registry after construction.

use crate::error::ConfigError;
use crate::target::{Target, TargetConfig};
use camino::Utf8Path;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// On-disk registry format: `{"targets": {"name": {...}}}`.
#[derive(Debug, Deserialize)]
struct RegistryFile {
    targets: BTreeMap<String, TargetConfig>,
}

#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    targets: BTreeMap<String, Arc<Target>>,
}

impl TargetRegistry {
    /// Build a registry from already-validated targets.
    pub fn new(targets: impl IntoIterator<Item = Target>) -> Self {
        let targets = targets
            .into_iter()
            .map(|t| (t.name.clone(), Arc::new(t)))
            .collect();
        Self { targets }
    }

    /// Parse and validate a registry from JSON text.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let file: RegistryFile = serde_json::from_str(content)?;
        let mut targets = BTreeMap::new();
        for (name, config) in file.targets {
            let target = Target::from_config(&name, config)?;
            targets.insert(name, Arc::new(target));
        }
        tracing::debug!("loaded {} targets", targets.len());
        Ok(Self { targets })
    }

    /// Load a registry file.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Look up a target by name.
    pub fn get(&self, name: &str) -> Result<Arc<Target>, ConfigError> {
        self.targets
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownTarget {
                name: name.to_string(),
                known: self.names().join(", "),
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.targets.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Target>> {
        self.targets.values()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
