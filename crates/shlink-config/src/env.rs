//! Environment variable fallbacks.
//!
//! Environment variables are **fallback**, not override: they only apply to
//! fields that no config file set.

use std::collections::HashMap;

use tracing::debug;

use crate::merge::{ConfigLayer, FieldSources};

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

/// Supported variables, earlier entries winning for the same field.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "SHLINK_PUBLIC_URL",
        field_path: "server.public_url",
    },
    EnvMapping {
        var_name: "PUBLIC_URL",
        field_path: "server.public_url",
    },
    EnvMapping {
        var_name: "SHLINK_PORT",
        field_path: "server.port",
    },
    EnvMapping {
        var_name: "PORT",
        field_path: "server.port",
    },
    EnvMapping {
        var_name: "SHLINK_TOKEN_TTL_SECS",
        field_path: "tokens.ttl_secs",
    },
    EnvMapping {
        var_name: "SHLINK_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "SHLINK_LOG_FORMAT",
        field_path: "logging.format",
    },
];

/// Apply environment variable fallbacks to fields that were not set by any
/// config file layer.
///
/// Returns the number of env vars applied.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        // Defaults may be overridden; files and earlier variables may not.
        if sources
            .get(mapping.field_path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults)
        {
            continue;
        }

        if let Some(val) = env_vars.get(mapping.var_name) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var fallback"
            );

            set_field_from_string(merged, mapping.field_path, val);
            sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
            count = count.saturating_add(1);
        }
    }

    count
}

/// Set a `section.field` in the TOML tree from a string value.
fn set_field_from_string(root: &mut toml::Value, path: &str, val: &str) {
    let Some((section, field)) = path.split_once('.') else {
        return;
    };
    let Some(root_table) = root.as_table_mut() else {
        return;
    };

    let section_val = root_table
        .entry(section.to_owned())
        .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    if let Some(table) = section_val.as_table_mut() {
        table.insert(field.to_owned(), coerce_to_toml_value(path, val));
    }
}

/// Coerce a string env var value to the TOML type of the field.
fn coerce_to_toml_value(path: &str, val: &str) -> toml::Value {
    if matches!(path, "server.port" | "tokens.ttl_secs")
        && let Ok(i) = val.trim().parse::<i64>()
    {
        return toml::Value::Integer(i);
    }

    toml::Value::String(val.to_owned())
}

/// Collect all current environment variables into a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn base() -> toml::Value {
        toml::from_str("[server]\nport = 3000\n").unwrap()
    }

    #[test]
    fn test_env_overrides_defaults() {
        let mut merged = base();
        let mut sources = FieldSources::new();
        sources.insert("server.port".to_owned(), ConfigLayer::Defaults);

        let env = make_env(&[("PORT", "8080"), ("PUBLIC_URL", "https://links.example")]);
        let count = apply_env_fallbacks(&mut merged, &mut sources, &env);

        assert_eq!(count, 2);
        assert_eq!(merged["server"]["port"].as_integer(), Some(8080));
        assert_eq!(
            merged["server"]["public_url"].as_str(),
            Some("https://links.example")
        );
        assert_eq!(sources.get("server.port"), Some(&ConfigLayer::Environment));
    }

    #[test]
    fn test_env_does_not_override_files() {
        let mut merged = base();
        let mut sources = FieldSources::new();
        sources.insert("server.port".to_owned(), ConfigLayer::User);

        let env = make_env(&[("PORT", "8080")]);
        assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env), 0);
        assert_eq!(merged["server"]["port"].as_integer(), Some(3000));
    }

    #[test]
    fn test_prefixed_variable_wins() {
        let mut merged = base();
        let mut sources = FieldSources::new();

        let env = make_env(&[
            ("SHLINK_PUBLIC_URL", "https://preferred"),
            ("PUBLIC_URL", "https://generic"),
        ]);
        apply_env_fallbacks(&mut merged, &mut sources, &env);
        assert_eq!(merged["server"]["public_url"].as_str(), Some("https://preferred"));
    }

    #[test]
    fn test_unparseable_number_left_as_string() {
        let mut merged = base();
        let mut sources = FieldSources::new();
        apply_env_fallbacks(&mut merged, &mut sources, &make_env(&[("PORT", "eighty")]));
        assert_eq!(merged["server"]["port"].as_str(), Some("eighty"));
    }
}
