#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Server settings assembled from several layers.
//!
//! Later layers replace individual fields of earlier ones:
//!
//! | layer | source |
//! |-------|--------|
//! | defaults | `defaults.toml`, compiled in |
//! | environment | `SHLINK_*`, `PUBLIC_URL`, `PORT`; only fields still at their default |
//! | system | `/etc/shlink/config.toml` |
//! | user | `~/.shlink/config.toml` |
//! | explicit | the `--config` file |
//!
//! ```rust,no_run
//! let resolved = shlink_config::Config::load(None).unwrap();
//! println!("serving {}", resolved.config.public_url());
//! ```
//!
//! Nothing here knows about tokens or links as domain types; the gateway
//! maps sections onto its own settings.

pub mod env;
pub mod error;
pub mod loader;
pub mod merge;
pub mod show;
pub mod types;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::LoadOptions;
pub use merge::ConfigLayer;
pub use show::{ResolvedConfig, ShowFormat};
pub use types::*;

use std::path::Path;

impl Config {
    /// Resolve every layer, reading `explicit_file` last.
    ///
    /// # Errors
    ///
    /// Any unreadable or malformed file, or a merged value that fails
    /// [`validate`](crate::validate).
    pub fn load(explicit_file: Option<&Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(&LoadOptions {
            explicit_file: explicit_file.map(Path::to_path_buf),
            ..LoadOptions::default()
        })
    }

    /// [`Config::load`] with the user layer read from `home_dir` instead of
    /// `~/.shlink`.
    ///
    /// # Errors
    ///
    /// As [`Config::load`].
    pub fn load_with_home(
        explicit_file: Option<&Path>,
        home_dir: &Path,
    ) -> ConfigResult<ResolvedConfig> {
        loader::load(&LoadOptions {
            explicit_file: explicit_file.map(Path::to_path_buf),
            home_override: Some(home_dir.to_path_buf()),
            ..LoadOptions::default()
        })
    }

    /// Read one file over the defaults, without environment or home layers.
    ///
    /// # Errors
    ///
    /// As [`Config::load`].
    pub fn load_file(path: &Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }
}
