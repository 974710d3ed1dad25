//! The `~/.shlink` directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Environment variable overriding the home directory.
pub(crate) const HOME_ENV: &str = "SHLINK_HOME";

/// Resolved `~/.shlink` layout.
#[derive(Debug, Clone)]
pub(crate) struct ShlinkHome {
    root: PathBuf,
}

impl ShlinkHome {
    /// `$SHLINK_HOME`, else `~/.shlink`.
    pub(crate) fn resolve() -> Result<Self> {
        if let Some(root) = std::env::var_os(HOME_ENV) {
            return Ok(Self::at(root));
        }
        let base = directories::BaseDirs::new().context("could not determine home directory")?;
        Ok(Self::at(base.home_dir().join(".shlink")))
    }

    /// Layout rooted at `root`.
    pub(crate) fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    /// The client signing key.
    pub(crate) fn key_path(&self) -> PathBuf {
        self.root.join("keys").join("client.key")
    }

    /// The user config file.
    pub(crate) fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }
}
