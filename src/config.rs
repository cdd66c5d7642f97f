use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{
    model::{Category, Priority},
    storage::DEFAULT_STORE,
};

/// Settings read from an optional TOML file. Command-line flags are
/// layered on top by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Task list location.
    pub store: PathBuf,
    /// Where `export` drops its file.
    pub export_dir: PathBuf,
    pub default_category: Category,
    pub default_priority: Priority,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store: PathBuf::from(DEFAULT_STORE),
            export_dir: PathBuf::from("."),
            default_category: Category::Work,
            default_priority: Priority::Medium,
        }
    }
}

impl Settings {
    /// Defaults when `path` is `None`, otherwise the parsed file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
    }
}
