use std::fs;
use std::io;
use std::path::Path;

use grove_store::DEFAULT_MIN_DEGREE;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// File name of the repository configuration inside `.grove`.
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Minimum degree of the object index B-tree.
    pub btree_min_degree: usize,
    /// Author recorded on commits and pull requests.
    pub author: String,
    /// Author recorded on commits produced by approving a pull request.
    pub merge_author: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            btree_min_degree: DEFAULT_MIN_DEGREE,
            author: "user@grove.local".into(),
            merge_author: "system@merge".into(),
        }
    }
}

impl RepoConfig {
    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| SdkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> SdkResult<String> {
        toml::to_string_pretty(self).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// Load `<repo_dir>/config.toml`, falling back to defaults when the file
    /// does not exist.
    pub fn load(repo_dir: &Path) -> SdkResult<Self> {
        let path = repo_dir.join(CONFIG_FILE_NAME);
        match fs::read_to_string(&path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(SdkError::Config(format!("{}: {e}", path.display()))),
        }
    }

    pub fn validate(&self) -> SdkResult<()> {
        if self.btree_min_degree < 2 {
            return Err(SdkError::Config(format!(
                "btree_min_degree must be at least 2, got {}",
                self.btree_min_degree
            )));
        }
        if self.author.trim().is_empty() {
            return Err(SdkError::Config("author must not be empty".into()));
        }
        if self.merge_author.trim().is_empty() {
            return Err(SdkError::Config("merge_author must not be empty".into()));
        }
        Ok(())
    }
}
