// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Business entity types whose mutation invalidates cached reads.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Kind of business record a write can mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityType {
    /// A housing property (building or scheme).
    Property,
    /// A room or unit within a property.
    Room,
    /// A young person housed by the provider.
    Resident,
    /// A recorded incident involving one or more residents.
    Incident,
    /// A resident's support plan.
    SupportPlan,
    /// A progress-tracking entry against a support plan.
    ProgressEntry,
    /// A risk assessment for a resident.
    RiskAssessment,
    /// A billing invoice.
    Invoice,
    /// A payment against an invoice.
    Payment,
}

impl EntityType {
    /// Every entity type, in declaration order.
    pub const ALL: [EntityType; 9] = [
        EntityType::Property,
        EntityType::Room,
        EntityType::Resident,
        EntityType::Incident,
        EntityType::SupportPlan,
        EntityType::ProgressEntry,
        EntityType::RiskAssessment,
        EntityType::Invoice,
        EntityType::Payment,
    ];

    /// Returns the string representation used in configuration and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Property => "property",
            EntityType::Room => "room",
            EntityType::Resident => "resident",
            EntityType::Incident => "incident",
            EntityType::SupportPlan => "support-plan",
            EntityType::ProgressEntry => "progress-entry",
            EntityType::RiskAssessment => "risk-assessment",
            EntityType::Invoice => "invoice",
            EntityType::Payment => "payment",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        EntityType::ALL
            .into_iter()
            .find(|e| e.as_str() == normalized)
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "invalid entity type: '{s}'\n  hint: valid types are: {}",
                    EntityType::ALL.map(|e| e.as_str()).join(", ")
                ))
            })
    }
}

/// The entity a mutating Operation touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity: EntityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl EntityRef {
    /// A mutation of the whole collection (no instance id known).
    pub fn collection(entity: EntityType) -> Self {
        EntityRef { entity, id: None }
    }

    /// A mutation of one instance.
    pub fn instance(entity: EntityType, id: impl Into<String>) -> Self {
        EntityRef {
            entity,
            id: Some(id.into()),
        }
    }
}
