//! Config command: show the resolved configuration.

use std::path::Path;

use anyhow::Result;
use shlink_config::{Config, ShowFormat};

use crate::home::ShlinkHome;
use crate::theme::Theme;

/// Print the resolved configuration with source annotations.
pub(crate) fn show_config(
    home: &ShlinkHome,
    explicit: Option<&Path>,
    format: &str,
    section: Option<&str>,
) -> Result<()> {
    let format: ShowFormat = format.parse().map_err(anyhow::Error::msg)?;
    let resolved = Config::load_with_home(explicit, home.root())?;
    println!("{}", resolved.show(format, section)?);
    Ok(())
}

/// Print the files the loader checks, marking those that exist.
pub(crate) fn show_paths(home: &ShlinkHome, explicit: Option<&Path>) {
    println!("{}", Theme::header("Config files (lowest to highest precedence)"));
    let system = Path::new("/etc/shlink/config.toml");
    let user = home.config_path();
    let mut paths = vec![system, user.as_path()];
    if let Some(explicit) = explicit {
        paths.push(explicit);
    }
    for path in paths {
        let marker = if path.exists() { "found" } else { "absent" };
        println!("  {} {}", path.display(), Theme::dimmed(marker));
    }
}
