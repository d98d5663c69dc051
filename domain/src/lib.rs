//! Domain library for the party planner.
//!
//! Holds the entity records, the store port (trait), table naming, fixtures and
//! error definitions. The data access layer lives in [`service`]. Keep concrete
//! store clients and IO concerns out of this crate; they belong in adapters.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Primary key attribute shared by every collection.
pub const KEY_ATTR: &str = "id";

/// A host of parties. Never updated in place, never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parent {
    pub id: String,
    pub name: Option<String>,
    pub mobile_number: Option<String>,
}

/// A party hosted by a parent.
///
/// `host_parent_id` is a plain back-reference; the store does not enforce that
/// the parent exists. `children` holds child ids in invitation order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub id: String,
    pub description: Option<String>,
    pub date_time: Option<String>,
    pub venue_description: Option<String>,
    pub venue_name: Option<String>,
    pub host_parent_id: Option<String>,
    /// Name of the birthday child.
    pub child_name: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    /// Write token, replaced on every write. Guarded appends condition on it;
    /// `None` only for items that predate it.
    #[serde(default)]
    pub version: Option<String>,
}

impl Party {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// A child that is either a guest of a party or the birthday child.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    pub id: String,
    pub name: Option<String>,
    pub birth_date: Option<String>,
}

/// A static, non-persisted record used by the generic node examples.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Widget {
    pub id: String,
    pub name: String,
}

/// Attribute value in the store's document model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrValue {
    S(String),
    /// Numbers travel as their decimal string, like the store does.
    N(String),
    Bool(bool),
    L(Vec<AttrValue>),
    Null,
}

impl AttrValue {
    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttrValue::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_n(&self) -> Option<&str> {
        match self {
            AttrValue::N(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_l(&self) -> Option<&[AttrValue]> {
        match self {
            AttrValue::L(l) => Some(l),
            _ => None,
        }
    }
}

/// One stored record: attribute name to value.
pub type Item = BTreeMap<String, AttrValue>;

/// Equality filter on a single non-key attribute, applied during scans.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanFilter {
    pub attribute: String,
    pub equals: AttrValue,
}

impl ScanFilter {
    pub fn eq<S: Into<String>>(attribute: S, equals: AttrValue) -> Self {
        Self {
            attribute: attribute.into(),
            equals,
        }
    }
}

/// Precondition for a conditional put.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    AttributeEquals { name: String, value: AttrValue },
    AttributeNotExists(String),
}

impl Condition {
    /// Evaluate the condition against the currently stored item, if any.
    pub fn holds(&self, current: Option<&Item>) -> bool {
        match self {
            Condition::AttributeEquals { name, value } => {
                current.and_then(|item| item.get(name)) == Some(value)
            }
            Condition::AttributeNotExists(name) => {
                current.and_then(|item| item.get(name)).is_none()
            }
        }
    }
}

/// Store client port: per-item get, put and filtered scan over named tables.
///
/// Implementations relay store failures verbatim as [`CoreError::Store`] and
/// never retry.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch an item by its `id`, optionally restricted to `projection`.
    async fn get(
        &self,
        table: &str,
        key: &str,
        projection: Option<&[&str]>,
    ) -> Result<Option<Item>, CoreError>;

    /// Write a whole item. Without a condition this is an unconditional upsert.
    async fn put(
        &self,
        table: &str,
        item: Item,
        condition: Option<&Condition>,
    ) -> Result<(), CoreError>;

    /// Read every item of a table, optionally filtered and projected.
    async fn scan(
        &self,
        table: &str,
        filter: Option<&ScanFilter>,
        projection: Option<&[&str]>,
    ) -> Result<Vec<Item>, CoreError>;
}

/// Physical table names of the three collections.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tables {
    pub parents: String,
    pub parties: String,
    pub children: String,
}

impl Tables {
    pub const DEFAULT_PROJECT: &'static str = "relay-kalas";
    pub const DEFAULT_STAGE: &'static str = "dev";

    /// Names in the `{project}-{collection}-{stage}` convention.
    pub fn for_stage(project: &str, stage: &str) -> Self {
        Self {
            parents: format!("{project}-parents-{stage}"),
            parties: format!("{project}-parties-{stage}"),
            children: format!("{project}-children-{stage}"),
        }
    }

    /// Resolve names from a variable lookup (usually the process environment).
    ///
    /// Reads `PROJECT_NAME` and `STAGE`, then applies the explicit overrides
    /// `TABLE_PARENTS`, `TABLE_PARTIES` and `TABLE_CHILDREN`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let project = non_empty("PROJECT_NAME").unwrap_or_else(|| Self::DEFAULT_PROJECT.into());
        let stage = non_empty("STAGE").unwrap_or_else(|| Self::DEFAULT_STAGE.into());
        let defaults = Self::for_stage(&project, &stage);
        Self {
            parents: non_empty("TABLE_PARENTS").unwrap_or(defaults.parents),
            parties: non_empty("TABLE_PARTIES").unwrap_or(defaults.parties),
            children: non_empty("TABLE_CHILDREN").unwrap_or(defaults.children),
        }
    }
}

impl Default for Tables {
    fn default() -> Self {
        Self::for_stage(Self::DEFAULT_PROJECT, Self::DEFAULT_STAGE)
    }
}

/// Core domain errors (no external error crates to keep deps small).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Failure reported by the backing store, relayed unchanged.
    Store(String),
    /// A conditional put found a different stored state.
    ConditionFailed,
    /// A party required by the operation does not exist.
    PartyNotFound(String),
    /// A guarded update kept losing to concurrent writers.
    Conflict(String),
    /// A stored item could not be mapped to a record.
    InvalidItem(String),
    /// Fixtures or other startup input could not be parsed.
    InvalidFixtures(String),
}

impl CoreError {
    /// Stable machine-readable code for API error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Store(_) => "STORE_ERROR",
            CoreError::ConditionFailed => "CONDITION_FAILED",
            CoreError::PartyNotFound(_) => "PARTY_NOT_FOUND",
            CoreError::Conflict(_) => "CONFLICT",
            CoreError::InvalidItem(_) => "INVALID_ITEM",
            CoreError::InvalidFixtures(_) => "INVALID_FIXTURES",
        }
    }
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::Store(msg) => write!(f, "store error: {}", msg),
            CoreError::ConditionFailed => write!(f, "conditional write failed"),
            CoreError::PartyNotFound(id) => write!(f, "party not found: {}", id),
            CoreError::Conflict(msg) => write!(f, "conflicting update: {}", msg),
            CoreError::InvalidItem(msg) => write!(f, "invalid item: {}", msg),
            CoreError::InvalidFixtures(msg) => write!(f, "invalid fixtures: {}", msg),
        }
    }
}

impl Error for CoreError {}

pub mod adapters;
pub mod fixtures;
pub mod item;
pub mod service;

pub use fixtures::Fixtures;
pub use service::PartyService;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn tables_follow_project_stage_convention() {
        let t = Tables::default();
        assert_eq!(t.parents, "relay-kalas-parents-dev");
        assert_eq!(t.parties, "relay-kalas-parties-dev");
        assert_eq!(t.children, "relay-kalas-children-dev");
    }

    #[test]
    fn tables_from_lookup_applies_stage_and_overrides() {
        let env: HashMap<&str, &str> = [
            ("PROJECT_NAME", "kalas"),
            ("STAGE", "prod"),
            ("TABLE_CHILDREN", "kids"),
            ("TABLE_PARENTS", "  "),
        ]
        .into_iter()
        .collect();
        let t = Tables::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(t.parents, "kalas-parents-prod");
        assert_eq!(t.parties, "kalas-parties-prod");
        assert_eq!(t.children, "kids");
    }

    #[test]
    fn condition_evaluation() {
        let mut item = Item::new();
        item.insert("version".into(), AttrValue::N("2".into()));

        let eq = Condition::AttributeEquals {
            name: "version".into(),
            value: AttrValue::N("2".into()),
        };
        assert!(eq.holds(Some(&item)));
        assert!(!eq.holds(None));

        let absent = Condition::AttributeNotExists("version".into());
        assert!(!absent.holds(Some(&item)));
        assert!(absent.holds(None));
        assert!(absent.holds(Some(&Item::new())));
    }

    #[test]
    fn error_display_and_code() {
        let err = CoreError::PartyNotFound("z1".into());
        assert_eq!(err.to_string(), "party not found: z1");
        assert_eq!(err.code(), "PARTY_NOT_FOUND");
    }
}
