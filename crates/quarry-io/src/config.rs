use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IoError, IoResult};

/// Settings for the file adapters, usually loaded from a `[io]` TOML table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Treat symbolic links as links: reading one yields its target path.
    /// Consulted by [`SymlinkPolicy::Configured`](crate::SymlinkPolicy).
    pub allow_symlinks: bool,
    /// Cap on bytes taken from standard input.
    pub max_read_bytes: Option<u64>,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            allow_symlinks: cfg!(unix),
            max_read_bytes: None,
        }
    }
}

impl IoConfig {
    pub fn from_toml_str(text: &str) -> IoResult<Self> {
        toml::from_str(text).map_err(|e| IoError::Config(e.to_string()))
    }

    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> IoResult<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}
