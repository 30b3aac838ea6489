#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of an event registration.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    /// Awaiting a manual decision by an administrator.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "pending"))]
    Pending,
    /// Holds one of the event's `max_participants` slots.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "confirmed"))]
    Confirmed,
    /// Arrived after the event was full.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "waitlisted"))]
    Waitlisted,
}

impl RegistrationStatus {
    /// Returns true if this registration counts against event capacity.
    pub fn occupies_slot(&self) -> bool {
        matches!(self, Self::Confirmed)
    }

    /// All possible status values.
    pub const ALL: &'static [RegistrationStatus] =
        &[Self::Pending, Self::Confirmed, Self::Waitlisted];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Waitlisted => "waitlisted",
        }
    }

    /// Statuses that count against event capacity.
    pub fn slot_holding() -> Vec<RegistrationStatus> {
        Self::ALL
            .iter()
            .copied()
            .filter(|status| status.occupies_slot())
            .collect()
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid status '{invalid}'. Valid values: pending, confirmed, waitlisted")]
pub struct ParseStatusError {
    invalid: String,
}

impl FromStr for RegistrationStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "waitlisted" => Ok(Self::Waitlisted),
            _ => Err(ParseStatusError {
                invalid: s.to_string(),
            }),
        }
    }
}
