//! Merging config layers.
//!
//! Layers are combined as raw [`toml::Value`] trees before deserializing, so
//! a key a file leaves out keeps whatever the layer below it said.

use std::collections::HashMap;

/// Where a value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Compiled-in defaults (`defaults.toml`).
    Defaults,
    /// System-wide configuration (`/etc/shlink/config.toml`).
    System,
    /// User-level configuration (`~/.shlink/config.toml`).
    User,
    /// A file named explicitly on the command line.
    Explicit(String),
    /// Environment variable fallback.
    Environment,
}

impl std::fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::System => write!(f, "system (/etc/shlink/config.toml)"),
            Self::User => write!(f, "user (~/.shlink/config.toml)"),
            Self::Explicit(path) => write!(f, "file ({path})"),
            Self::Environment => write!(f, "environment variable"),
        }
    }
}

/// Dotted field path (`tokens.ttl_secs`) to the layer that last set it.
pub type FieldSources = HashMap<String, ConfigLayer>;

/// Lay `top` over `base` and credit every leaf it sets to `layer`.
///
/// Tables combine key by key. Anything else in `top`, arrays included,
/// replaces what was below it outright.
pub fn apply_layer(
    base: &mut toml::Value,
    top: &toml::Value,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    apply_at(base, top, &mut String::new(), layer, sources);
}

/// Credit every leaf of `value` to `layer`. Used for the defaults, which
/// have nothing underneath them.
pub fn attribute(value: &toml::Value, layer: &ConfigLayer, sources: &mut FieldSources) {
    attribute_at(value, &mut String::new(), layer, sources);
}

fn apply_at(
    base: &mut toml::Value,
    top: &toml::Value,
    path: &mut String,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    let (toml::Value::Table(below), toml::Value::Table(above)) = (&mut *base, top) else {
        *base = top.clone();
        attribute_at(top, path, layer, sources);
        return;
    };
    for (key, value) in above {
        let mark = push_segment(path, key);
        match below.get_mut(key) {
            Some(existing) => apply_at(existing, value, path, layer, sources),
            None => {
                below.insert(key.clone(), value.clone());
                attribute_at(value, path, layer, sources);
            },
        }
        path.truncate(mark);
    }
}

fn attribute_at(
    value: &toml::Value,
    path: &mut String,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    match value {
        toml::Value::Table(table) => {
            for (key, child) in table {
                let mark = push_segment(path, key);
                attribute_at(child, path, layer, sources);
                path.truncate(mark);
            }
        },
        _ => {
            sources.insert(path.clone(), layer.clone());
        },
    }
}

/// Append `.key` (or `key` at the root) and return the length to truncate
/// back to.
fn push_segment(path: &mut String, key: &str) -> usize {
    let mark = path.len();
    if !path.is_empty() {
        path.push('.');
    }
    path.push_str(key);
    mark
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_unset_fields_survive() {
        let mut base = parse("[tokens]\nttl_secs = 300\n[server]\nport = 3000\n");
        let mut sources = FieldSources::new();
        apply_layer(
            &mut base,
            &parse("[server]\nport = 8080\n"),
            &ConfigLayer::System,
            &mut sources,
        );

        assert_eq!(base["server"]["port"].as_integer(), Some(8080));
        assert_eq!(base["tokens"]["ttl_secs"].as_integer(), Some(300));
        assert_eq!(sources.len(), 1);
    }

    #[test]
    fn test_arrays_replaced_whole() {
        let mut base = parse("[logging]\ndirectives = [\"a=debug\", \"c=info\"]\n");
        apply_layer(
            &mut base,
            &parse("[logging]\ndirectives = [\"b=warn\"]\n"),
            &ConfigLayer::User,
            &mut FieldSources::new(),
        );
        let directives = base["logging"]["directives"].as_array().unwrap();
        assert_eq!(directives, &vec![toml::Value::String("b=warn".to_owned())]);
    }

    #[test]
    fn test_sources_follow_last_writer() {
        let mut base = parse("[server]\nport = 3000\n");
        let mut sources = FieldSources::new();
        attribute(&base, &ConfigLayer::Defaults, &mut sources);

        apply_layer(
            &mut base,
            &parse("[server]\npublic_url = \"https://x\"\n[links]\nmax_claim_limit = 3\n"),
            &ConfigLayer::User,
            &mut sources,
        );

        assert_eq!(sources.get("server.port"), Some(&ConfigLayer::Defaults));
        assert_eq!(sources.get("server.public_url"), Some(&ConfigLayer::User));
        assert_eq!(sources.get("links.max_claim_limit"), Some(&ConfigLayer::User));
    }
}
