use serde::{Deserialize, Serialize};

use quarry_types::HashAlgorithm;

use crate::error::{StoreError, StoreResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Algorithm used to name newly stored artifacts.
    pub algorithm: HashAlgorithm,
    /// Re-hash content on every read and reject mismatches.
    pub verify_reads: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Sha3_256,
            verify_reads: true,
        }
    }
}

impl StoreConfig {
    pub fn from_toml_str(text: &str) -> StoreResult<Self> {
        toml::from_str(text).map_err(|e| StoreError::Config(e.to_string()))
    }
}
