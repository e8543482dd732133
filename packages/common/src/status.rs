#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Workflow status of an achievement reference.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum AchievementStatus {
    /// Editable by its owner; not yet visible to the advisor workflow.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "draft"))]
    Draft,
    /// Waiting for the student's advisor to verify or reject.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "submitted"))]
    Submitted,
    /// Confirmed by an advisor. Terminal.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "verified"))]
    Verified,
    /// Turned down by an advisor with a note. Terminal.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "rejected"))]
    Rejected,
}

impl AchievementStatus {
    /// Returns true if no further transition can leave this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified | Self::Rejected)
    }

    /// Whether the workflow state machine permits `self -> target`.
    ///
    /// Edges: `draft -> submitted`, `submitted -> verified`,
    /// `submitted -> rejected`. Everything else is illegal, including
    /// re-entering `submitted` and any edge out of a terminal status.
    pub fn can_transition_to(&self, target: AchievementStatus) -> bool {
        matches!(
            (self, target),
            (Self::Draft, Self::Submitted)
                | (Self::Submitted, Self::Verified)
                | (Self::Submitted, Self::Rejected)
        )
    }

    /// All possible status values.
    pub const ALL: &'static [AchievementStatus] =
        &[Self::Draft, Self::Submitted, Self::Verified, Self::Rejected];

    /// Returns the string representation (lowercase).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for AchievementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for AchievementStatus {
    fn default() -> Self {
        Self::Draft
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    invalid: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid status '{}'. Valid values: {}",
            self.invalid,
            AchievementStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for AchievementStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "submitted" => Ok(Self::Submitted),
            "verified" => Ok(Self::Verified),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseStatusError {
                invalid: s.to_string(),
            }),
        }
    }
}
