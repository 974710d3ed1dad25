//! Access request items (RAR items) and the references that name them.
//!
//! A client asks for access either by naming a structured item
//! (`{type, actions?, locations, datatypes?}`) or by a bare string
//! reference: the id of a shared link, or the well-known
//! [`INITIALIZE_REFERENCE`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference that asks the server to mint a fresh package namespace.
pub const INITIALIZE_REFERENCE: &str = "shclink-initialize";

/// Kind of right an access item grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessType {
    /// Read files inside a package's data namespace.
    #[serde(rename = "shclink-read", alias = "read")]
    Read,
    /// Write files inside a package's data namespace.
    #[serde(rename = "shclink-modify", alias = "modify")]
    Modify,
    /// Publish the link policy of a package.
    #[serde(rename = "shclink-share", alias = "share")]
    Share,
    /// Create a new package.
    #[serde(rename = "shclink-initialize", alias = "initialize")]
    Initialize,
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "shclink-read"),
            Self::Modify => write!(f, "shclink-modify"),
            Self::Share => write!(f, "shclink-share"),
            Self::Initialize => write!(f, "shclink-initialize"),
        }
    }
}

/// HTTP action an item may be exercised with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    /// `GET`
    Get,
    /// `PUT`
    Put,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
}

impl Action {
    /// Every action, in the order grants list them.
    pub const ALL: [Self; 4] = [Self::Post, Self::Get, Self::Put, Self::Delete];
}

/// Media type an item covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Datatype {
    /// A SMART Health Card.
    #[serde(rename = "application/smart-health-card")]
    SmartHealthCard,
    /// A FHIR JSON resource or bundle.
    #[serde(rename = "application/fhir+json")]
    FhirJson,
}

/// A structured access item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RarItem {
    /// Kind of right.
    #[serde(rename = "type")]
    pub access_type: AccessType,
    /// Permitted actions, if restricted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<Action>>,
    /// Exact absolute URIs the item covers. Never patterns.
    pub locations: Vec<String>,
    /// Media types, if restricted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatypes: Option<Vec<Datatype>>,
}

impl RarItem {
    /// Item of `access_type` over `locations`, no action or datatype restriction.
    #[must_use]
    pub fn new<I, S>(access_type: AccessType, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            access_type,
            actions: None,
            locations: locations.into_iter().map(Into::into).collect(),
            datatypes: None,
        }
    }

    /// A `read` item over `locations`.
    #[must_use]
    pub fn read<I, S>(locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(AccessType::Read, locations)
    }

    /// Restrict the item to `actions`.
    #[must_use]
    pub fn with_actions(mut self, actions: impl Into<Vec<Action>>) -> Self {
        self.actions = Some(actions.into());
        self
    }

    /// Whether this item is of `access_type` and lists `location` verbatim.
    #[must_use]
    pub fn covers(&self, access_type: AccessType, location: &str) -> bool {
        self.access_type == access_type && self.locations.iter().any(|l| l == location)
    }
}

/// One entry of a requested or granted access list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccessRequestItem {
    /// A bare reference: a link id or [`INITIALIZE_REFERENCE`].
    Reference(String),
    /// A structured item.
    Item(RarItem),
}

impl AccessRequestItem {
    /// The reference string, if this is a reference.
    #[must_use]
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Self::Reference(r) => Some(r),
            Self::Item(_) => None,
        }
    }

    /// The structured item, if this is one.
    #[must_use]
    pub fn as_item(&self) -> Option<&RarItem> {
        match self {
            Self::Item(item) => Some(item),
            Self::Reference(_) => None,
        }
    }

    /// Whether this is the package-initialization reference.
    #[must_use]
    pub fn is_initialize(&self) -> bool {
        self.as_reference() == Some(INITIALIZE_REFERENCE)
    }
}

impl From<RarItem> for AccessRequestItem {
    fn from(item: RarItem) -> Self {
        Self::Item(item)
    }
}
