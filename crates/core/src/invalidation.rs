// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Invalidation graph from mutated entities to stale cache keys.
//!
//! Rules are data: each one maps an entity type to the collection-level keys
//! its mutation stales, plus the root of its instance-scoped key. The table is
//! many-to-many, so one entity may stale several aggregate views and one view
//! may depend on several entities.
//!
//! ```text
//! invalidate(resident, Some("42"))
//!   -> residents, residents/42, occupancy-metrics, activity-feed, dashboard-metrics
//! ```
//!
//! The graph only computes key sets. Discarding or refetching cached values
//! belongs to the read cache.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::entity::{EntityRef, EntityType};

/// Identifier of one cached read result, as a list of key segments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(Vec<String>);

impl CacheKey {
    /// Creates a key from its segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CacheKey(segments.into_iter().map(Into::into).collect())
    }

    /// A collection-level key such as `residents`.
    pub fn collection(name: &str) -> Self {
        CacheKey(vec![name.to_string()])
    }

    /// An instance-scoped key such as `residents/42`.
    pub fn instance(root: &str, id: &str) -> Self {
        CacheKey(vec![root.to_string(), id.to_string()])
    }

    /// Returns the key segments.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns true if `other` starts with every segment of this key.
    pub fn is_prefix_of(&self, other: &CacheKey) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// One row of the invalidation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationRule {
    /// Entity whose mutation triggers this rule.
    pub entity: EntityType,
    /// Collection-level keys marked stale on every mutation of `entity`.
    pub collections: Vec<String>,
    /// Root of the instance-scoped key; `None` when instances are not cached individually.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_root: Option<String>,
}

impl InvalidationRule {
    pub fn new(entity: EntityType, collections: &[&str], instance_root: Option<&str>) -> Self {
        InvalidationRule {
            entity,
            collections: collections.iter().map(|c| c.to_string()).collect(),
            instance_root: instance_root.map(str::to_string),
        }
    }
}

type RuleRow = (EntityType, &'static [&'static str], &'static str);

const STANDARD_RULES: &[RuleRow] = &[
    (
        EntityType::Property,
        &["properties", "rooms", "occupancy-metrics", "dashboard-metrics"],
        "properties",
    ),
    (
        EntityType::Room,
        &["rooms", "properties", "occupancy-metrics"],
        "rooms",
    ),
    (
        EntityType::Resident,
        &["residents", "occupancy-metrics", "activity-feed", "dashboard-metrics"],
        "residents",
    ),
    (
        EntityType::Incident,
        &["incidents", "residents", "activity-feed", "dashboard-metrics"],
        "incidents",
    ),
    (
        EntityType::SupportPlan,
        &["support-plans", "residents", "progress-tracking", "dashboard-metrics"],
        "support-plans",
    ),
    (
        EntityType::ProgressEntry,
        &["progress-tracking", "support-plans", "activity-feed"],
        "progress-tracking",
    ),
    (
        EntityType::RiskAssessment,
        &["risk-assessments", "residents", "dashboard-metrics"],
        "risk-assessments",
    ),
    (
        EntityType::Invoice,
        &["invoices", "billing-summary", "dashboard-metrics"],
        "invoices",
    ),
    (
        EntityType::Payment,
        &["payments", "invoices", "billing-summary"],
        "payments",
    ),
];

/// Static registry of invalidation rules.
#[derive(Debug, Clone, Default)]
pub struct InvalidationGraph {
    rules: Vec<InvalidationRule>,
}

impl InvalidationGraph {
    /// Creates a graph from an explicit rule list.
    pub fn new(rules: Vec<InvalidationRule>) -> Self {
        InvalidationGraph { rules }
    }

    /// The rule table for the housing case-management backend.
    pub fn standard() -> Self {
        let rules = STANDARD_RULES
            .iter()
            .map(|(entity, collections, root)| {
                InvalidationRule::new(*entity, collections, Some(*root))
            })
            .collect();
        InvalidationGraph { rules }
    }

    /// Adds a rule to the table.
    pub fn with_rule(mut self, rule: InvalidationRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Returns every rule in the table.
    pub fn rules(&self) -> &[InvalidationRule] {
        &self.rules
    }

    /// Computes the keys to mark stale after `entity` (optionally instance `id`) is mutated.
    ///
    /// Without an id only collection-level keys are returned.
    pub fn invalidate(&self, entity: EntityType, id: Option<&str>) -> BTreeSet<CacheKey> {
        let mut keys = BTreeSet::new();
        for rule in self.rules.iter().filter(|r| r.entity == entity) {
            keys.extend(rule.collections.iter().map(|c| CacheKey::collection(c)));
            if let (Some(root), Some(id)) = (&rule.instance_root, id) {
                keys.insert(CacheKey::instance(root, id));
            }
        }
        keys
    }

    /// Same as [`invalidate`](Self::invalidate), for an [`EntityRef`].
    pub fn invalidate_ref(&self, target: &EntityRef) -> BTreeSet<CacheKey> {
        self.invalidate(target.entity, target.id.as_deref())
    }

    /// Entity types whose mutation stales `key` (directly or via its instance root).
    pub fn dependents(&self, key: &CacheKey) -> BTreeSet<EntityType> {
        let Some(head) = key.segments().first() else {
            return BTreeSet::new();
        };
        self.rules
            .iter()
            .filter(|rule| {
                if key.segments().len() == 1 {
                    rule.collections.iter().any(|c| c == head)
                } else {
                    rule.instance_root.as_deref() == Some(head.as_str())
                }
            })
            .map(|rule| rule.entity)
            .collect()
    }

    /// Every collection-level key named in the table.
    pub fn collection_keys(&self) -> BTreeSet<CacheKey> {
        self.rules
            .iter()
            .flat_map(|r| r.collections.iter().map(|c| CacheKey::collection(c)))
            .collect()
    }
}

#[cfg(test)]
#[path = "invalidation_tests.rs"]
mod tests;
