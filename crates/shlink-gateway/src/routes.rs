//! Mapping of request URLs onto the three operations.

use shlink_core::NAMESPACE_SEGMENT;

use crate::protocol::GRANT_PATH;

/// One of the operations the gateway serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `POST {public_url}/gnap`
    Grant,
    /// `PUT {public_url}/shclinks/{owner}/{package_id}/policy`
    Policy {
        /// Owner key thumbprint from the path.
        owner: String,
        /// Package (link) id.
        package_id: String,
    },
    /// `GET {public_url}/shclinks/{owner}/{package_id}/data/{file}`
    Data {
        /// Owner key thumbprint from the path.
        owner: String,
        /// Package id.
        package_id: String,
        /// File name.
        file: String,
    },
}

impl Route {
    /// Resolve `method` and a full `url` served below `public_url`.
    #[must_use]
    pub fn resolve(public_url: &str, method: &str, url: &str) -> Option<Self> {
        let path = url.strip_prefix(public_url)?;
        if path.contains(['?', '#']) {
            return None;
        }
        if path == GRANT_PATH {
            return (method == "POST").then_some(Self::Grant);
        }

        let segments: Vec<&str> = path.strip_prefix('/')?.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        match (method, segments.as_slice()) {
            ("PUT", [ns, owner, package_id, "policy"]) if *ns == NAMESPACE_SEGMENT => {
                Some(Self::Policy {
                    owner: (*owner).to_owned(),
                    package_id: (*package_id).to_owned(),
                })
            },
            ("GET", [ns, owner, package_id, "data", file]) if *ns == NAMESPACE_SEGMENT => {
                Some(Self::Data {
                    owner: (*owner).to_owned(),
                    package_id: (*package_id).to_owned(),
                    file: (*file).to_owned(),
                })
            },
            _ => None,
        }
    }

    /// Operation name used in logs.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Grant => "grant",
            Self::Policy { .. } => "share",
            Self::Data { .. } => "fetch",
        }
    }
}
