use crate::Database;
use async_trait::async_trait;
use rollout_domain::features::FeatureRecord;
use rollout_lifecycle::{FeatureFilter, FeaturePatch, FeatureRows, FeatureStore, StoreError};
use tracing::{instrument, trace};

const SELECT_FIELDS: &str = "name, status, created_date, updated_date";

/// `SurrealDB`-backed implementation of the lifecycle store contract.
///
/// The `feature` table carries a unique index on `name`, so a duplicate
/// insert surfaces as a backend error and partial updates are keyed reliably.
#[derive(Debug, Clone)]
pub struct SurrealFeatureStore {
    db: Database,
}

impl SurrealFeatureStore {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn backend(e: surrealdb::Error) -> StoreError {
        StoreError::backend(e.to_string())
    }
}

#[async_trait]
impl FeatureStore for SurrealFeatureStore {
    #[instrument(skip(self))]
    async fn select_features(&self, filter: FeatureFilter) -> Result<FeatureRows, StoreError> {
        let response = match filter {
            FeatureFilter::All => {
                self.db
                    .query(format!(
                        "SELECT {SELECT_FIELDS} FROM feature ORDER BY created_date DESC"
                    ))
                    .await
            },
            FeatureFilter::Name(name) => {
                self.db
                    .query(format!(
                        "SELECT {SELECT_FIELDS} FROM feature WHERE name = $name \
                         ORDER BY created_date DESC"
                    ))
                    .bind(("name", name))
                    .await
            },
            FeatureFilter::Status(status) => {
                self.db
                    .query(format!(
                        "SELECT {SELECT_FIELDS} FROM feature WHERE status = $status \
                         ORDER BY created_date DESC"
                    ))
                    .bind(("status", status))
                    .await
            },
        };

        let rows: Vec<FeatureRecord> =
            response.map_err(Self::backend)?.take(0).map_err(Self::backend)?;
        trace!(rows = rows.len(), "Selected feature rows");
        Ok(FeatureRows::from_ordered(rows))
    }

    #[instrument(skip(self))]
    async fn insert_feature(&self, name: &str) -> Result<(), StoreError> {
        let created: Vec<FeatureRecord> = self
            .db
            .query("CREATE feature CONTENT { name: $name, status: 'created' }")
            .bind(("name", name.to_owned()))
            .await
            .map_err(Self::backend)?
            .take(0)
            .map_err(Self::backend)?;

        if created.is_empty() {
            return Err(StoreError::NotFound { name: name.to_owned() });
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_partial_feature(
        &self,
        name: &str,
        patch: FeaturePatch,
    ) -> Result<(), StoreError> {
        // only the provided fields, plus the always-updated timestamp
        let mut sets = vec!["updated_date = time::now()"];
        if patch.status.is_some() {
            sets.push("status = $status");
        }
        let statement =
            format!("UPDATE feature SET {} WHERE name = $name RETURN AFTER", sets.join(", "));

        let mut query = self.db.query(statement).bind(("name", name.to_owned()));
        if let Some(status) = patch.status {
            query = query.bind(("status", status));
        }

        let updated: Vec<FeatureRecord> =
            query.await.map_err(Self::backend)?.take(0).map_err(Self::backend)?;

        if updated.is_empty() {
            return Err(StoreError::NotFound { name: name.to_owned() });
        }
        Ok(())
    }
}
