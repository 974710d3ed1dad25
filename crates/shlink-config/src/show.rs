//! `config show`: the merged configuration, each value tagged with the
//! layer that supplied it.

use std::fmt::Write as _;
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::FieldSources;
use crate::types::Config;

/// Outcome of [`loader::load`](crate::loader::load).
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Merged and validated values.
    pub config: Config,
    /// Which layer set each dotted field path.
    pub field_sources: FieldSources,
    /// Files read, lowest precedence first.
    pub loaded_files: Vec<String>,
}

/// Rendering for [`ResolvedConfig::show`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowFormat {
    /// TOML, one `# [layer]` comment per value.
    Toml,
    /// Plain JSON without annotations.
    Json,
}

impl FromStr for ShowFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown format {other:?} (expected toml or json)")),
        }
    }
}

impl ResolvedConfig {
    /// Render the whole configuration or one `section` of it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownSection`] for a section name the schema
    /// lacks, or [`ConfigError::Render`] if serialization fails.
    pub fn show(&self, format: ShowFormat, section: Option<&str>) -> ConfigResult<String> {
        let tree = toml::Value::try_from(&self.config)
            .map_err(|e| ConfigError::Render(e.to_string()))?;
        let toml::Value::Table(root) = tree else {
            return Err(ConfigError::Render("configuration is not a table".to_owned()));
        };

        let sections: Vec<(&String, &toml::Value)> = match section {
            Some(name) => {
                let (key, value) = root
                    .get_key_value(name)
                    .ok_or_else(|| ConfigError::UnknownSection(name.to_owned()))?;
                vec![(key, value)]
            },
            None => root.iter().collect(),
        };

        match format {
            ShowFormat::Json => {
                let json = match section {
                    Some(_) => serde_json::to_value(sections.first().map(|(_, value)| *value)),
                    None => serde_json::to_value(&root),
                }
                .map_err(|e| ConfigError::Render(e.to_string()))?;
                serde_json::to_string_pretty(&json).map_err(|e| ConfigError::Render(e.to_string()))
            },
            ShowFormat::Toml => Ok(self.annotated_toml(&sections)),
        }
    }

    fn annotated_toml(&self, sections: &[(&String, &toml::Value)]) -> String {
        let mut out = String::from("# Resolved shlink configuration\n");
        let _ = writeln!(out, "# public_url = {:?}", self.config.public_url());
        for (n, path) in (1..).zip(&self.loaded_files) {
            let _ = writeln!(out, "# file {n}: {path}");
        }

        for (name, value) in sections {
            let Some(fields) = value.as_table() else {
                continue;
            };
            let _ = writeln!(out, "\n[{name}]");
            for (key, field) in fields {
                let path = format!("{name}.{key}");
                match self.field_sources.get(&path) {
                    Some(layer) => {
                        let _ = writeln!(out, "{key} = {field}  # [{layer}]");
                    },
                    None => {
                        let _ = writeln!(out, "{key} = {field}");
                    },
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::ConfigLayer;

    fn resolved() -> ResolvedConfig {
        let mut field_sources = FieldSources::new();
        field_sources.insert("server.port".to_owned(), ConfigLayer::Environment);
        field_sources.insert("tokens.ttl_secs".to_owned(), ConfigLayer::Defaults);
        ResolvedConfig {
            config: Config::default(),
            field_sources,
            loaded_files: vec!["/etc/shlink/config.toml".to_owned()],
        }
    }

    #[test]
    fn test_toml_tags_each_value_with_its_layer() {
        let out = resolved().show(ShowFormat::Toml, None).unwrap();
        assert!(out.contains("# public_url = \"http://localhost:3000\""));
        assert!(out.contains("# file 1: /etc/shlink/config.toml"));
        assert!(out.contains("[server]"));
        assert!(out.contains("port = 3000  # [environment variable]"));
        assert!(out.contains("ttl_secs = 300  # [defaults]"));
    }

    #[test]
    fn test_json_is_plain_config() {
        let out = resolved().show(ShowFormat::Json, None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["tokens"]["ttl_secs"], 300);
        assert_eq!(value["links"]["pin_lockout_threshold"], 5);
        assert!(value["links"].get("max_claim_limit").is_none());
    }

    #[test]
    fn test_single_section() {
        let out = resolved().show(ShowFormat::Toml, Some("links")).unwrap();
        assert!(out.contains("pin_lockout_threshold = 5"));
        assert!(!out.contains("ttl_secs"));

        let json = resolved().show(ShowFormat::Json, Some("tokens")).unwrap();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&json).unwrap()["ttl_secs"],
            300
        );
    }

    #[test]
    fn test_unknown_section() {
        assert!(matches!(
            resolved().show(ShowFormat::Json, Some("nope")),
            Err(ConfigError::UnknownSection(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_format_names() {
        assert_eq!("json".parse::<ShowFormat>(), Ok(ShowFormat::Json));
        assert!("yaml".parse::<ShowFormat>().is_err());
    }
}
