use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Lifecycle status of a feature, as persisted in its status row.
///
/// The four "-ing" statuses double as *stuck* markers: a feature parked in one
/// of them after a failed operation requires manual data repair before any
/// further lifecycle operation is safe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FeatureStatus {
    /// Registered, but no status row has been inserted yet.
    Uncreated,
    /// Status row exists; no schema work done.
    Created,
    Initializing,
    /// Schema prepared (tables/columns in place), no data moved.
    Initialized,
    Migrating,
    /// Data transformation complete.
    Migrated,
    /// Live: feature-conditional code treats the feature as on.
    Enabled,
    Disabled,
    RollingBack,
    /// Data transformation undone.
    RolledBack,
    Uninitializing,
    /// Schema preparation undone.
    Uninitialized,
}

impl FeatureStatus {
    /// Whether this is one of the four transitional ("-ing") statuses.
    ///
    /// A feature found in a transitional status outside of an in-flight
    /// operation is stuck and needs operator attention.
    #[must_use]
    pub const fn is_transitional(self) -> bool {
        matches!(
            self,
            Self::Initializing | Self::Migrating | Self::RollingBack | Self::Uninitializing
        )
    }

    /// Whether the feature's data migration has been applied and not rolled back.
    ///
    /// Used as the "migrated or later" dependency gate: a disabled feature
    /// still has its schema and data in place.
    #[must_use]
    pub const fn is_migrated(self) -> bool {
        matches!(self, Self::Migrated | Self::Enabled | Self::Disabled)
    }
}

/// One persisted status row per registered feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub name: String,
    pub status: FeatureStatus,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

/// Merged view of a feature: registry metadata plus the persisted row.
///
/// A registered feature without a persisted row reports [`FeatureStatus::Uncreated`]
/// and carries no timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureInfo {
    pub name: String,
    pub status: FeatureStatus,
    pub depends_on: Vec<String>,
    pub conflicts_with: Vec<String>,
    pub created_date: Option<DateTime<Utc>>,
    pub updated_date: Option<DateTime<Utc>>,
}

/// Minimal projection for the hot-path enabled-features read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledFeature {
    pub name: String,
    pub status: FeatureStatus,
}
