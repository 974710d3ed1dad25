//! Package namespaces: the URL space rooted at a client's key thumbprint.
//!
//! ```text
//! {public_url}/shclinks/{key_thumbprint}/{package_id}/data/{file}
//! {public_url}/shclinks/{key_thumbprint}/{package_id}/policy
//! ```

use shlink_crypto::KeyThumbprint;

/// Path segment under which every namespace lives.
pub const NAMESPACE_SEGMENT: &str = "shclinks";

/// The root of all namespaces owned by `key`: `{public_url}/shclinks/{key}/`.
#[must_use]
pub fn owner_prefix(public_url: &str, key: &KeyThumbprint) -> String {
    format!("{public_url}/{NAMESPACE_SEGMENT}/{key}/")
}

/// One package inside a client's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageNamespace {
    base: String,
    package_id: String,
}

impl PackageNamespace {
    /// Namespace of `package_id` owned by `key` under `public_url`.
    #[must_use]
    pub fn new(public_url: &str, key: &KeyThumbprint, package_id: impl Into<String>) -> Self {
        let package_id = package_id.into();
        Self {
            base: format!("{}{package_id}", owner_prefix(public_url, key)),
            package_id,
        }
    }

    /// The package id.
    #[must_use]
    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    /// `…/{package_id}/data`, the location a `modify` grant names.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("{}/data", self.base)
    }

    /// `…/{package_id}/data/`, which every shared file location must start with.
    #[must_use]
    pub fn data_prefix(&self) -> String {
        format!("{}/data/", self.base)
    }

    /// `…/{package_id}/data/{file}`.
    #[must_use]
    pub fn file_url(&self, file: &str) -> String {
        format!("{}/data/{file}", self.base)
    }

    /// `…/{package_id}/policy`, the location a `share` grant names.
    #[must_use]
    pub fn policy_url(&self) -> String {
        format!("{}/policy", self.base)
    }

    /// Whether `location` names a file inside this package's data space.
    #[must_use]
    pub fn contains_file(&self, location: &str) -> bool {
        location
            .strip_prefix(&self.data_prefix())
            .is_some_and(|file| !file.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns() -> PackageNamespace {
        PackageNamespace::new(
            "http://localhost:3000",
            &KeyThumbprint::from("abc".to_owned()),
            "pkg",
        )
    }

    #[test]
    fn test_urls() {
        let ns = ns();
        assert_eq!(ns.data_url(), "http://localhost:3000/shclinks/abc/pkg/data");
        assert_eq!(ns.policy_url(), "http://localhost:3000/shclinks/abc/pkg/policy");
        assert_eq!(
            ns.file_url("x.json"),
            "http://localhost:3000/shclinks/abc/pkg/data/x.json"
        );
        assert_eq!(
            owner_prefix("http://localhost:3000", &KeyThumbprint::from("abc".to_owned())),
            "http://localhost:3000/shclinks/abc/"
        );
    }

    #[test]
    fn test_contains_file() {
        let ns = ns();
        assert!(ns.contains_file("http://localhost:3000/shclinks/abc/pkg/data/x.json"));
        assert!(!ns.contains_file("http://localhost:3000/shclinks/abc/pkg/data/"));
        assert!(!ns.contains_file("http://localhost:3000/shclinks/abc/pkg/data"));
        assert!(!ns.contains_file("http://localhost:3000/shclinks/abc/pkg2/data/x.json"));
        assert!(!ns.contains_file("http://localhost:3000/shclinks/abc/pkg/policy"));
    }
}
