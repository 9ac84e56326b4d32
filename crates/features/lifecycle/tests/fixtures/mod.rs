use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::RwLock;
use rollout_domain::features::{FeatureRecord, FeatureStatus};
use rollout_lifecycle::{FeatureFilter, FeaturePatch, FeatureRows, FeatureStore, Migration, StoreError};
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory stand-in for the persistence collaborator.
///
/// Mimics the real store's contract: creation-time-descending selection
/// order, unique name key, zero-rows-affected updates reported as NotFound.
/// Counts operations so tests can assert that some code paths never touch
/// the store.
#[derive(Debug, Default)]
pub struct MemoryFeatureStore {
    rows: RwLock<Vec<FeatureRecord>>,
    ops: AtomicUsize,
}

impl MemoryFeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total store calls made so far.
    pub fn op_count(&self) -> usize {
        self.ops.load(Ordering::SeqCst)
    }

    /// Current persisted status of `name`, if a row exists.
    pub fn status_of(&self, name: &str) -> Option<FeatureStatus> {
        self.rows.read().iter().find(|row| row.name == name).map(|row| row.status)
    }

    /// Seeds a row directly, bypassing the insert contract.
    pub fn seed(&self, name: &str, status: FeatureStatus) {
        let mut rows = self.rows.write();
        // spread created_date so descending order is deterministic
        let stamp = Utc::now() + Duration::seconds(rows.len() as i64);
        rows.push(FeatureRecord {
            name: name.to_owned(),
            status,
            created_date: stamp,
            updated_date: stamp,
        });
    }
}

#[async_trait]
impl FeatureStore for MemoryFeatureStore {
    async fn select_features(&self, filter: FeatureFilter) -> Result<FeatureRows, StoreError> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        let mut rows: Vec<FeatureRecord> = self
            .rows
            .read()
            .iter()
            .filter(|row| match &filter {
                FeatureFilter::All => true,
                FeatureFilter::Name(name) => &row.name == name,
                FeatureFilter::Status(status) => row.status == *status,
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_date.cmp(&a.created_date));
        Ok(FeatureRows::from_ordered(rows))
    }

    async fn insert_feature(&self, name: &str) -> Result<(), StoreError> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.write();
        if rows.iter().any(|row| row.name == name) {
            return Err(StoreError::backend(format!("duplicate feature row: {name}")));
        }
        let stamp = Utc::now() + Duration::seconds(rows.len() as i64);
        rows.push(FeatureRecord {
            name: name.to_owned(),
            status: FeatureStatus::Created,
            created_date: stamp,
            updated_date: stamp,
        });
        Ok(())
    }

    async fn update_partial_feature(
        &self,
        name: &str,
        patch: FeaturePatch,
    ) -> Result<(), StoreError> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.write();
        let Some(row) = rows.iter_mut().find(|row| row.name == name) else {
            return Err(StoreError::NotFound { name: name.to_owned() });
        };
        if let Some(status) = patch.status {
            row.status = status;
        }
        row.updated_date = Utc::now();
        Ok(())
    }
}

/// Migration whose phases succeed or fail according to a fixed script.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedMigration {
    pub fail_init_forward: bool,
    pub fail_init_back: bool,
    pub fail_migrate_forward: bool,
    pub fail_migrate_back: bool,
}

impl ScriptedMigration {
    pub fn ok() -> Self {
        Self::default()
    }

    fn phase(fail: bool, name: &str) -> anyhow::Result<()> {
        if fail { Err(anyhow::anyhow!("{name} failed by script")) } else { Ok(()) }
    }
}

#[async_trait]
impl Migration for ScriptedMigration {
    async fn init_forward(&self) -> anyhow::Result<()> {
        Self::phase(self.fail_init_forward, "init_forward")
    }

    async fn init_back(&self) -> anyhow::Result<()> {
        Self::phase(self.fail_init_back, "init_back")
    }

    async fn migrate_forward(&self) -> anyhow::Result<()> {
        Self::phase(self.fail_migrate_forward, "migrate_forward")
    }

    async fn migrate_back(&self) -> anyhow::Result<()> {
        Self::phase(self.fail_migrate_back, "migrate_back")
    }
}
