//! Error types for the org-directory SDK.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a search produced no organizations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoMatchReason {
    /// No operation type title contains the search pattern.
    NoCategoryMatched,
    /// Categories matched, but no organization is linked to them or their descendants.
    NoLinkedOrganizations,
    /// No building lies inside the search circle.
    NoBuildingsInRange,
    /// Buildings lie inside the circle, but none of them houses an organization.
    NoOrganizationsInRange,
}

impl fmt::Display for NoMatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoCategoryMatched => "no operation type matches the pattern",
            Self::NoLinkedOrganizations => "no organizations are linked to the matched operation types",
            Self::NoBuildingsInRange => "no buildings within the search radius",
            Self::NoOrganizationsInRange => "no organizations within the search radius",
        };
        f.write_str(text)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("No match: {reason}")]
    NoMatch { reason: NoMatchReason },

    #[error("Validation error on field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl DirectoryError {
    #[must_use]
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    #[must_use]
    pub fn no_match(reason: NoMatchReason) -> Self {
        Self::NoMatch { reason }
    }

    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the error means "the query ran fine and found nothing".
    #[must_use]
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NoMatch { .. })
    }
}
