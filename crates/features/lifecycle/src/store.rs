use async_trait::async_trait;
use fxhash::FxHashMap;
use rollout_domain::features::{FeatureRecord, FeatureStatus};
use std::borrow::Cow;

/// Errors surfaced by the persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A write affected zero rows: the feature row does not exist,
    /// or another caller raced this one.
    #[error("Feature row not found: {name}")]
    NotFound { name: String },

    /// Backend failure (connectivity, constraint violation, malformed row).
    #[error("Store backend error: {message}")]
    Backend { message: Cow<'static, str> },
}

impl StoreError {
    pub fn backend(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Backend { message: message.into() }
    }
}

/// Typed row filter for [`FeatureStore::select_features`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureFilter {
    All,
    Name(String),
    Status(FeatureStatus),
}

/// Selection result: names ordered by creation time descending, deduplicated,
/// alongside a name-keyed dictionary of the rows.
#[derive(Debug, Clone, Default)]
pub struct FeatureRows {
    pub list: Vec<String>,
    pub map: FxHashMap<String, FeatureRecord>,
}

impl FeatureRows {
    /// Builds the list/dictionary pair from rows already ordered by creation
    /// time descending. Later duplicates of a name are discarded.
    #[must_use]
    pub fn from_ordered(rows: Vec<FeatureRecord>) -> Self {
        let mut out = Self::default();
        for row in rows {
            if out.map.contains_key(&row.name) {
                continue;
            }
            out.list.push(row.name.clone());
            out.map.insert(row.name.clone(), row);
        }
        out
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FeatureRecord> {
        self.map.get(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.list.len()
    }
}

/// Partial update payload: only the provided fields are written, plus an
/// always-updated `updated_date`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeaturePatch {
    pub status: Option<FeatureStatus>,
}

impl FeaturePatch {
    #[must_use]
    pub const fn status(status: FeatureStatus) -> Self {
        Self { status: Some(status) }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
    }
}

/// Persistence collaborator for feature status rows, keyed by name.
///
/// Implementations must order selections by creation time descending and
/// deduplicate by name, and must report zero-rows-affected writes as
/// [`StoreError::NotFound`] rather than succeeding silently.
#[async_trait]
pub trait FeatureStore: Send + Sync {
    async fn select_features(&self, filter: FeatureFilter) -> Result<FeatureRows, StoreError>;

    /// Creates the status row for `name`. Fails if the row already exists
    /// or the write affects zero rows.
    async fn insert_feature(&self, name: &str) -> Result<(), StoreError>;

    /// Applies a partial update to the row keyed by `name`.
    async fn update_partial_feature(
        &self,
        name: &str,
        patch: FeaturePatch,
    ) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: FeatureStore + ?Sized> FeatureStore for std::sync::Arc<S> {
    async fn select_features(&self, filter: FeatureFilter) -> Result<FeatureRows, StoreError> {
        (**self).select_features(filter).await
    }

    async fn insert_feature(&self, name: &str) -> Result<(), StoreError> {
        (**self).insert_feature(name).await
    }

    async fn update_partial_feature(
        &self,
        name: &str,
        patch: FeaturePatch,
    ) -> Result<(), StoreError> {
        (**self).update_partial_feature(name, patch).await
    }
}
