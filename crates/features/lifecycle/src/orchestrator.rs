use crate::error::{LifecycleError, LifecycleErrorExt};
use crate::registry::{FeatureDescriptor, FeatureRegistry};
use crate::store::{FeatureFilter, FeaturePatch, FeatureStore};
use fxhash::FxHashMap;
use rollout_domain::features::{EnabledFeature, FeatureInfo, FeatureStatus};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Which orchestrated migration entry point a lifecycle operation invokes.
#[derive(Debug, Clone, Copy)]
enum EntryPoint {
    Initialize,
    Up,
    Down,
    Uninitialize,
}

impl EntryPoint {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Up => "up",
            Self::Down => "down",
            Self::Uninitialize => "uninitialize",
        }
    }
}

/// Drives a named feature through its lifecycle, persisting status transitions
/// around each migration entry point.
///
/// Every operation follows one protocol: resolve the descriptor (unregistered
/// names fail immediately, before any store access), write the transitional
/// status, invoke the migration entry point, then write the terminal or
/// reverted status. A `no-rollback` failure deliberately leaves the feature
/// parked in its transitional status as the stuck-state marker; operator
/// intervention is required before the feature can be operated on again.
///
/// The three status/phase steps are independent awaits, not one atomic unit.
/// A process crash between the transitional and terminal writes leaves the
/// row parked exactly like a no-rollback failure and is resolved the same
/// way. The orchestrator assumes at most one in-flight lifecycle operation
/// per feature name; serialization across callers must be imposed externally.
pub struct FeatureOrchestrator<S> {
    registry: Arc<FeatureRegistry>,
    store: S,
}

impl<S> fmt::Debug for FeatureOrchestrator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureOrchestrator")
            .field("features", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl<S: FeatureStore> FeatureOrchestrator<S> {
    pub fn new(registry: Arc<FeatureRegistry>, store: S) -> Self {
        Self { registry, store }
    }

    #[must_use]
    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    /// Creates the status row for a registered feature.
    ///
    /// Expected precondition: no existing row. The unique name key in the
    /// store turns a duplicate insert into an error.
    #[instrument(skip(self))]
    pub async fn insert(&self, name: &str) -> Result<(), LifecycleError> {
        self.resolve(name)?;
        self.store.insert_feature(name).await.context("Inserting feature row")?;
        info!(feature = name, "Feature row created");
        Ok(())
    }

    /// `initializing` → migration.initialize() → `initialized`, reverting to
    /// `created` when the failed init was rolled back.
    #[instrument(skip(self))]
    pub async fn initialize(&self, name: &str) -> Result<(), LifecycleError> {
        let descriptor = self.resolve(name)?;
        self.drive(
            descriptor,
            EntryPoint::Initialize,
            FeatureStatus::Initializing,
            FeatureStatus::Initialized,
            FeatureStatus::Created,
        )
        .await
    }

    /// `migrating` → migration.up() → `migrated`, reverting to `initialized`
    /// when the failed migration was rolled back.
    ///
    /// Precondition: every `depends_on` feature has reached migrated or later
    /// (migrated, enabled, or disabled).
    #[instrument(skip(self))]
    pub async fn migrate(&self, name: &str) -> Result<(), LifecycleError> {
        let descriptor = self.resolve(name)?;

        if !descriptor.depends_on.is_empty() {
            let rows = self.store.select_features(FeatureFilter::All).await?;
            for dependency in &descriptor.depends_on {
                let ready = rows.get(dependency).is_some_and(|row| row.status.is_migrated());
                if !ready {
                    return Err(LifecycleError::DependencyNotReady {
                        message: format!("{name} requires {dependency} at migrated or later")
                            .into(),
                        context: None,
                    });
                }
            }
        }

        self.drive(
            descriptor,
            EntryPoint::Up,
            FeatureStatus::Migrating,
            FeatureStatus::Migrated,
            FeatureStatus::Initialized,
        )
        .await
    }

    /// Marks the feature live. Direct status write; no migration side effects.
    ///
    /// Precondition: no `conflicts_with` feature is currently enabled.
    #[instrument(skip(self))]
    pub async fn enable(&self, name: &str) -> Result<(), LifecycleError> {
        let descriptor = self.resolve(name)?;

        if !descriptor.conflicts_with.is_empty() {
            let enabled =
                self.store.select_features(FeatureFilter::Status(FeatureStatus::Enabled)).await?;
            if let Some(conflict) =
                descriptor.conflicts_with.iter().find(|c| enabled.get(c).is_some())
            {
                return Err(LifecycleError::ConflictEnabled {
                    message: format!("{name} conflicts with enabled feature {conflict}").into(),
                    context: None,
                });
            }
        }

        self.store
            .update_partial_feature(name, FeaturePatch::status(FeatureStatus::Enabled))
            .await
            .context("Enabling feature")?;
        info!(feature = name, "Feature enabled");
        Ok(())
    }

    /// Marks the feature off. Direct status write; no migration side effects.
    #[instrument(skip(self))]
    pub async fn disable(&self, name: &str) -> Result<(), LifecycleError> {
        self.resolve(name)?;
        self.store
            .update_partial_feature(name, FeaturePatch::status(FeatureStatus::Disabled))
            .await
            .context("Disabling feature")?;
        info!(feature = name, "Feature disabled");
        Ok(())
    }

    /// `rolling-back` → migration.down() → `rolled-back`. When the rollback's
    /// own compensating action succeeded, the data is still in place and the
    /// feature reverts to `disabled`.
    #[instrument(skip(self))]
    pub async fn rollback(&self, name: &str) -> Result<(), LifecycleError> {
        let descriptor = self.resolve(name)?;
        self.drive(
            descriptor,
            EntryPoint::Down,
            FeatureStatus::RollingBack,
            FeatureStatus::RolledBack,
            FeatureStatus::Disabled,
        )
        .await
    }

    /// `uninitializing` → migration.uninitialize() → `uninitialized`,
    /// reverting to `initialized` when the failed teardown was rolled back.
    #[instrument(skip(self))]
    pub async fn uninitialize(&self, name: &str) -> Result<(), LifecycleError> {
        let descriptor = self.resolve(name)?;
        self.drive(
            descriptor,
            EntryPoint::Uninitialize,
            FeatureStatus::Uninitializing,
            FeatureStatus::Uninitialized,
            FeatureStatus::Initialized,
        )
        .await
    }

    /// Merges the persisted row with the registry's dependency/conflict
    /// metadata. A registered feature without a row reports `uncreated`.
    #[instrument(skip(self))]
    pub async fn get_feature(&self, name: &str) -> Result<FeatureInfo, LifecycleError> {
        let descriptor = self.resolve(name)?;
        let rows = self.store.select_features(FeatureFilter::Name(name.to_owned())).await?;
        let record = rows.get(name);

        Ok(FeatureInfo {
            name: name.to_owned(),
            status: record.map_or(FeatureStatus::Uncreated, |row| row.status),
            depends_on: descriptor.depends_on.clone(),
            conflicts_with: descriptor.conflicts_with.clone(),
            created_date: record.map(|row| row.created_date),
            updated_date: record.map(|row| row.updated_date),
        })
    }

    /// Name-keyed map of features whose persisted status is exactly `enabled`.
    ///
    /// Kept minimal on purpose: this read sits on the per-request hot path of
    /// feature-conditional code.
    pub async fn enabled_features(
        &self,
    ) -> Result<FxHashMap<String, EnabledFeature>, LifecycleError> {
        let rows =
            self.store.select_features(FeatureFilter::Status(FeatureStatus::Enabled)).await?;
        Ok(rows
            .map
            .into_values()
            .map(|row| (row.name.clone(), EnabledFeature { name: row.name, status: row.status }))
            .collect())
    }

    fn resolve(&self, name: &str) -> Result<&FeatureDescriptor, LifecycleError> {
        self.registry.get(name).ok_or_else(|| LifecycleError::MissingFeature {
            message: name.to_owned().into(),
            context: None,
        })
    }

    /// Shared transition protocol: transitional write, entry point call,
    /// terminal or reverted write.
    async fn drive(
        &self,
        descriptor: &FeatureDescriptor,
        entry: EntryPoint,
        transitional: FeatureStatus,
        success: FeatureStatus,
        reverted: FeatureStatus,
    ) -> Result<(), LifecycleError> {
        let name = descriptor.name.as_str();

        self.store
            .update_partial_feature(name, FeaturePatch::status(transitional))
            .await
            .context("Recording transitional status")?;

        let result = match entry {
            EntryPoint::Initialize => descriptor.migration.initialize().await,
            EntryPoint::Up => descriptor.migration.up().await,
            EntryPoint::Down => descriptor.migration.down().await,
            EntryPoint::Uninitialize => descriptor.migration.uninitialize().await,
        };

        match result {
            Ok(()) => {
                self.store
                    .update_partial_feature(name, FeaturePatch::status(success))
                    .await
                    .context("Recording terminal status")?;
                info!(
                    feature = name,
                    entry = entry.as_str(),
                    status = %success,
                    "Lifecycle operation complete"
                );
                Ok(())
            },
            Err(failure) if failure.is_rolled_back() => {
                self.store
                    .update_partial_feature(name, FeaturePatch::status(reverted))
                    .await
                    .context("Recording reverted status")?;
                warn!(
                    feature = name,
                    entry = entry.as_str(),
                    status = %reverted,
                    error = %failure,
                    "Lifecycle operation failed and was rolled back"
                );
                Err(failure.into())
            },
            Err(failure) => {
                // The transitional row is the stuck-state marker; no write.
                error!(
                    feature = name,
                    entry = entry.as_str(),
                    status = %transitional,
                    error = %failure,
                    "Lifecycle operation failed without rollback, feature parked for manual repair"
                );
                Err(failure.into())
            },
        }
    }
}
