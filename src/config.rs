//! Binding options, optionally loaded from a JSON file.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::path_de::{PathError, from_slice_with_path, from_str_with_path};
use crate::tree::DEFAULT_DELIMITER;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(#[from] PathError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindOptions {
    /// Separator between segments of a field's path.
    pub path_delimiter: char,
    /// Descend into the top element when handed a document root.
    pub unwrap_document_root: bool,
    /// Cell separator for delimited table input.
    pub column_delimiter: char,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            path_delimiter: DEFAULT_DELIMITER,
            unwrap_document_root: true,
            column_delimiter: ',',
        }
    }
}

impl BindOptions {
    pub fn from_json_str(src: &str) -> Result<Self, ConfigError> {
        Ok(from_str_with_path(src)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let options = from_slice_with_path(&bytes)?;
        tracing::debug!(path = %path.display(), ?options, "loaded bind options");
        Ok(options)
    }
}
