//! TOML configuration for the `kmod-builtin` tool.
//!
//! ```toml
//! # Either an explicit directory...
//! dirname = "/lib/modules/6.8.0-45-generic"
//! # ...or a release resolved under /lib/modules.
//! release = "6.8.0-45-generic"
//! json = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::error::Result as BuiltinResult;
use crate::file::Context;

/// Errors produced while loading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Module directory holding modules.builtin.modinfo.
    pub dirname: Option<PathBuf>,
    /// Kernel release, used when `dirname` is unset.
    pub release: Option<String>,
    /// Print JSON instead of plain text by default.
    pub json: bool,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Resolve the module directory: explicit `dirname`, then `release`,
    /// then the running kernel.
    pub fn context(&self) -> BuiltinResult<Context> {
        if let Some(dir) = &self.dirname {
            return Ok(Context::new(dir.clone()));
        }
        if let Some(release) = &self.release {
            return Ok(Context::from_release(release));
        }
        Context::from_running_kernel()
    }
}
