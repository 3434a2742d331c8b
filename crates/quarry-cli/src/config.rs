use std::fs;
use std::path::Path;

use anyhow::Context;
use quarry_io::IoConfig;
use quarry_store::StoreConfig;
use serde::{Deserialize, Serialize};

/// Everything `--config` may set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub io: IoConfig,
    pub store: StoreConfig,
}

impl CliConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("invalid config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_types::HashAlgorithm;

    #[test]
    fn no_file_is_default() {
        assert_eq!(CliConfig::load(None).unwrap(), CliConfig::default());
    }

    #[test]
    fn tables_are_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quarry.toml");
        fs::write(&path, "[store]\nalgorithm = \"sha1\"\n").unwrap();
        let c = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(c.store.algorithm, HashAlgorithm::Sha1);
        assert_eq!(c.io, IoConfig::default());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CliConfig::load(Some(&dir.path().join("none.toml"))).is_err());
    }
}
