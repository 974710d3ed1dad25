//! The grant policy engine.
//!
//! Each requested access item is run through a fixed, ordered list of
//! evaluators. The first one to grant something wins for that item. Items
//! nothing grants are dropped: the issued token simply carries fewer rights.
//!
//! | Evaluator    | Matches                                 | Grants                                   |
//! |--------------|-----------------------------------------|------------------------------------------|
//! | `initialize` | the `shclink-initialize` reference      | `modify` on a fresh package's data, `share` on its policy |
//! | `manage`     | a `modify` or `share` item              | the item, if every location is in the caller's namespace |
//! | `claim`      | any other reference (a link id)         | the link's read items                    |

use shlink_core::{
    AccessRequestItem, AccessType, Action, ClientIdentity, PackageNamespace, PolicyRecord,
    RarItem, owner_prefix,
};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ClaimError, PolicyError, PolicyResult};
use crate::links::LinkRegistry;

/// Everything an evaluator may consult.
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    /// The client whose signature was verified.
    pub client: &'a ClientIdentity,
    /// PIN supplied with the grant request.
    pub pin: Option<&'a str>,
    /// Public base URL of the server, without a trailing slash.
    pub public_url: &'a str,
    /// The link registry.
    pub registry: &'a LinkRegistry,
}

/// Rights granted for one item, with the policies that justified them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grant {
    /// Granted access items.
    pub items: Vec<RarItem>,
    /// One record per justification.
    pub policies: Vec<PolicyRecord>,
}

impl Grant {
    /// Whether nothing was granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// What one evaluator made of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// The evaluator does not apply, or its precondition failed.
    Denied,
    /// Rights were granted.
    Granted(Grant),
    /// A claim on an existing link was explicitly refused.
    Rejected(ClaimError),
}

/// An evaluator: a pure decision over one item.
pub type Evaluator = fn(&AccessRequestItem, &PolicyContext<'_>) -> PolicyResult<Evaluation>;

/// The evaluators, in the order they are tried.
pub const EVALUATORS: [(&str, Evaluator); 3] = [
    ("initialize", evaluate_initialize),
    ("manage", evaluate_manage),
    ("claim", evaluate_claim),
];

/// Accumulated result of evaluating a whole access list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOutcome {
    /// Every granted item.
    pub granted_access: Vec<RarItem>,
    /// Every enabling policy record.
    pub enabling_policies: Vec<PolicyRecord>,
    /// Claims that were explicitly refused.
    pub rejections: Vec<ClaimError>,
}

impl EngineOutcome {
    /// Whether nothing at all was granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.granted_access.is_empty()
    }

    fn absorb(&mut self, grant: Grant) {
        self.granted_access.extend(grant.items);
        self.enabling_policies.extend(grant.policies);
    }
}

/// Runs access items through [`EVALUATORS`].
#[derive(Clone, Copy)]
pub struct PolicyEngine {
    evaluators: &'static [(&'static str, Evaluator)],
}

impl PolicyEngine {
    /// Engine with the standard evaluator chain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            evaluators: &EVALUATORS,
        }
    }

    /// Evaluate one item. The first grant wins; a refusal is remembered in
    /// case nothing later grants.
    ///
    /// # Errors
    ///
    /// Returns an error only on a storage fault.
    pub fn evaluate_item(
        &self,
        item: &AccessRequestItem,
        ctx: &PolicyContext<'_>,
    ) -> PolicyResult<Evaluation> {
        let mut refusal = None;
        for (name, evaluator) in self.evaluators {
            match evaluator(item, ctx)? {
                Evaluation::Granted(grant) if !grant.is_empty() => {
                    debug!(evaluator = name, items = grant.items.len(), "Item granted");
                    return Ok(Evaluation::Granted(grant));
                },
                Evaluation::Rejected(e) => refusal = Some(e),
                Evaluation::Granted(_) | Evaluation::Denied => {},
            }
        }
        Ok(refusal.map_or(Evaluation::Denied, Evaluation::Rejected))
    }

    /// Evaluate an access list. Identical items are evaluated once.
    ///
    /// # Errors
    ///
    /// Returns an error only on a storage fault.
    pub fn evaluate(
        &self,
        items: &[AccessRequestItem],
        ctx: &PolicyContext<'_>,
    ) -> PolicyResult<EngineOutcome> {
        let mut outcome = EngineOutcome::default();
        for (index, item) in items.iter().enumerate() {
            if items[..index].contains(item) {
                continue;
            }
            match self.evaluate_item(item, ctx)? {
                Evaluation::Granted(grant) => outcome.absorb(grant),
                Evaluation::Rejected(e) => outcome.rejections.push(e),
                Evaluation::Denied => debug!(?item, "Item not granted"),
            }
        }
        Ok(outcome)
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.evaluators.iter().map(|(name, _)| *name).collect();
        f.debug_struct("PolicyEngine")
            .field("evaluators", &names)
            .finish()
    }
}

/// Link ids an access list would claim, deduplicated.
#[must_use]
pub fn claimed_link_ids(items: &[AccessRequestItem]) -> Vec<&str> {
    let mut ids: Vec<&str> = items
        .iter()
        .filter(|item| !item.is_initialize())
        .filter_map(AccessRequestItem::as_reference)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Anyone may create a package; its rights are confined to the caller's
/// own namespace.
fn evaluate_initialize(
    item: &AccessRequestItem,
    ctx: &PolicyContext<'_>,
) -> PolicyResult<Evaluation> {
    if !item.is_initialize() {
        return Ok(Evaluation::Denied);
    }

    let package = PackageNamespace::new(
        ctx.public_url,
        ctx.client.key_id(),
        Uuid::new_v4().to_string(),
    );
    if !ctx.registry.bind_owner(package.package_id(), ctx.client.key_id())? {
        return Ok(Evaluation::Denied);
    }
    debug!(client = %ctx.client.key_id(), package = package.package_id(), "Package initialized");

    Ok(Evaluation::Granted(Grant {
        items: vec![
            RarItem::new(AccessType::Modify, [package.data_url()]).with_actions(Action::ALL),
            RarItem::new(AccessType::Share, [package.policy_url()]).with_actions([Action::Put]),
        ],
        policies: vec![PolicyRecord::initialize()],
    }))
}

/// The namespace owner may modify and re-share anything under it.
fn evaluate_manage(item: &AccessRequestItem, ctx: &PolicyContext<'_>) -> PolicyResult<Evaluation> {
    let Some(rar) = item.as_item() else {
        return Ok(Evaluation::Denied);
    };
    if !matches!(rar.access_type, AccessType::Modify | AccessType::Share) {
        return Ok(Evaluation::Denied);
    }

    let prefix = owner_prefix(ctx.public_url, ctx.client.key_id());
    let owned = !rar.locations.is_empty()
        && rar
            .locations
            .iter()
            .all(|location| location.starts_with(&prefix));
    if !owned {
        debug!(client = %ctx.client.key_id(), "Manage request outside caller's namespace");
        return Ok(Evaluation::Denied);
    }

    Ok(Evaluation::Granted(Grant {
        items: vec![rar.clone()],
        policies: vec![PolicyRecord::manage(ctx.client.key_id().clone())],
    }))
}

/// Anyone holding a link id (and its PIN) may claim it while slots remain.
fn evaluate_claim(item: &AccessRequestItem, ctx: &PolicyContext<'_>) -> PolicyResult<Evaluation> {
    let Some(link_id) = item.as_reference() else {
        return Ok(Evaluation::Denied);
    };
    if item.is_initialize() || link_id.is_empty() {
        return Ok(Evaluation::Denied);
    }

    match ctx.registry.claim(link_id, ctx.pin, ctx.client) {
        Ok(items) => {
            let policies = items
                .iter()
                .map(|_| PolicyRecord::claim(link_id))
                .collect();
            Ok(Evaluation::Granted(Grant { items, policies }))
        },
        Err(ClaimError::UnknownLink { .. }) => Ok(Evaluation::Denied),
        Err(ClaimError::Storage(e)) => Err(PolicyError::Storage(e)),
        Err(e) => Ok(Evaluation::Rejected(e)),
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
