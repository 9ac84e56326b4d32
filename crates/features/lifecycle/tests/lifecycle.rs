mod fixtures;

use fixtures::{MemoryFeatureStore, ScriptedMigration};
use rollout_domain::features::FeatureStatus;
use rollout_lifecycle::{
    FeatureDescriptor, FeatureOrchestrator, FeatureRegistry, LifecycleError, MigrationOutcome,
};
use std::sync::Arc;

fn setup(
    descriptors: Vec<FeatureDescriptor>,
) -> (FeatureOrchestrator<Arc<MemoryFeatureStore>>, Arc<MemoryFeatureStore>) {
    let mut registry = FeatureRegistry::new();
    for descriptor in descriptors {
        registry.register(descriptor).expect("register descriptor");
    }
    let store = Arc::new(MemoryFeatureStore::new());
    (FeatureOrchestrator::new(Arc::new(registry), store.clone()), store)
}

fn feature(name: &str, migration: ScriptedMigration) -> FeatureDescriptor {
    FeatureDescriptor::new(name, Arc::new(migration))
}

#[tokio::test]
async fn video_uploads_walks_the_full_lifecycle() {
    let (orchestrator, store) =
        setup(vec![feature("video-uploads", ScriptedMigration::ok())]);

    orchestrator.insert("video-uploads").await.expect("insert");
    assert_eq!(store.status_of("video-uploads"), Some(FeatureStatus::Created));

    orchestrator.initialize("video-uploads").await.expect("initialize");
    assert_eq!(store.status_of("video-uploads"), Some(FeatureStatus::Initialized));

    orchestrator.migrate("video-uploads").await.expect("migrate");
    assert_eq!(store.status_of("video-uploads"), Some(FeatureStatus::Migrated));

    orchestrator.enable("video-uploads").await.expect("enable");
    assert_eq!(store.status_of("video-uploads"), Some(FeatureStatus::Enabled));

    let enabled = orchestrator.enabled_features().await.expect("enabled features");
    let entry = enabled.get("video-uploads").expect("video-uploads is enabled");
    assert_eq!(entry.name, "video-uploads");
    assert_eq!(entry.status, FeatureStatus::Enabled);
}

#[tokio::test]
async fn broken_feature_initialize_rolls_back_to_created() {
    let (orchestrator, store) = setup(vec![feature(
        "broken-feature",
        ScriptedMigration { fail_init_forward: true, ..ScriptedMigration::ok() },
    )]);

    orchestrator.insert("broken-feature").await.expect("insert");
    let err = orchestrator.initialize("broken-feature").await.expect_err("initialize fails");

    assert_eq!(err.migration_outcome(), Some(MigrationOutcome::RolledBack));
    assert_eq!(store.status_of("broken-feature"), Some(FeatureStatus::Created));
}

#[tokio::test]
async fn unrecoverable_migrate_stays_parked_in_migrating() {
    let (orchestrator, store) = setup(vec![feature(
        "unrecoverable",
        ScriptedMigration {
            fail_migrate_forward: true,
            fail_migrate_back: true,
            ..ScriptedMigration::ok()
        },
    )]);

    orchestrator.insert("unrecoverable").await.expect("insert");
    orchestrator.initialize("unrecoverable").await.expect("initialize");

    let err = orchestrator.migrate("unrecoverable").await.expect_err("migrate fails");
    assert_eq!(err.migration_outcome(), Some(MigrationOutcome::NoRollback));
    // the transitional row is the stuck-state marker
    assert_eq!(store.status_of("unrecoverable"), Some(FeatureStatus::Migrating));
}

#[tokio::test]
async fn migrate_rolled_back_failure_reverts_to_initialized() {
    let (orchestrator, store) = setup(vec![feature(
        "flaky",
        ScriptedMigration { fail_migrate_forward: true, ..ScriptedMigration::ok() },
    )]);

    orchestrator.insert("flaky").await.expect("insert");
    orchestrator.initialize("flaky").await.expect("initialize");

    let err = orchestrator.migrate("flaky").await.expect_err("migrate fails");
    assert_eq!(err.migration_outcome(), Some(MigrationOutcome::RolledBack));
    assert_eq!(store.status_of("flaky"), Some(FeatureStatus::Initialized));
}

#[tokio::test]
async fn rollback_from_enabled_reaches_rolled_back() {
    let (orchestrator, store) = setup(vec![feature("retired", ScriptedMigration::ok())]);
    store.seed("retired", FeatureStatus::Enabled);

    orchestrator.rollback("retired").await.expect("rollback");
    assert_eq!(store.status_of("retired"), Some(FeatureStatus::RolledBack));
}

#[tokio::test]
async fn failed_rollback_whose_compensation_succeeds_lands_in_disabled() {
    // down fails, its compensating migrate_forward succeeds: data still there
    let (orchestrator, store) = setup(vec![feature(
        "sticky",
        ScriptedMigration { fail_migrate_back: true, ..ScriptedMigration::ok() },
    )]);
    store.seed("sticky", FeatureStatus::Disabled);

    let err = orchestrator.rollback("sticky").await.expect_err("rollback fails");
    assert_eq!(err.migration_outcome(), Some(MigrationOutcome::RolledBack));
    assert_eq!(store.status_of("sticky"), Some(FeatureStatus::Disabled));
}

#[tokio::test]
async fn rollback_without_compensation_stays_parked() {
    let (orchestrator, store) = setup(vec![feature(
        "wedged",
        ScriptedMigration {
            fail_migrate_back: true,
            fail_migrate_forward: true,
            ..ScriptedMigration::ok()
        },
    )]);
    store.seed("wedged", FeatureStatus::Disabled);

    let err = orchestrator.rollback("wedged").await.expect_err("rollback fails");
    assert_eq!(err.migration_outcome(), Some(MigrationOutcome::NoRollback));
    assert_eq!(store.status_of("wedged"), Some(FeatureStatus::RollingBack));
}

#[tokio::test]
async fn uninitialize_success_and_reverted_paths() {
    let (orchestrator, store) = setup(vec![
        feature("teardown-ok", ScriptedMigration::ok()),
        feature(
            "teardown-flaky",
            ScriptedMigration { fail_init_back: true, ..ScriptedMigration::ok() },
        ),
    ]);
    store.seed("teardown-ok", FeatureStatus::RolledBack);
    store.seed("teardown-flaky", FeatureStatus::RolledBack);

    orchestrator.uninitialize("teardown-ok").await.expect("uninitialize");
    assert_eq!(store.status_of("teardown-ok"), Some(FeatureStatus::Uninitialized));

    let err = orchestrator.uninitialize("teardown-flaky").await.expect_err("uninitialize fails");
    assert_eq!(err.migration_outcome(), Some(MigrationOutcome::RolledBack));
    assert_eq!(store.status_of("teardown-flaky"), Some(FeatureStatus::Initialized));
}

#[tokio::test]
async fn unregistered_name_fails_without_store_access() {
    let (orchestrator, store) = setup(vec![feature("known", ScriptedMigration::ok())]);

    let err = orchestrator.get_feature("phantom").await.expect_err("missing feature");
    assert!(matches!(err, LifecycleError::MissingFeature { .. }));

    let err = orchestrator.migrate("phantom").await.expect_err("missing feature");
    assert!(matches!(err, LifecycleError::MissingFeature { .. }));

    assert_eq!(store.op_count(), 0, "missing-feature errors must not touch the store");
}

#[tokio::test]
async fn get_feature_merges_registry_metadata() {
    let (orchestrator, store) = setup(vec![
        feature("base", ScriptedMigration::ok()),
        FeatureDescriptor::new("layered", Arc::new(ScriptedMigration::ok()))
            .depends_on(["base"])
            .conflicts_with(["legacy-layered"]),
    ]);
    store.seed("layered", FeatureStatus::Initialized);

    let info = orchestrator.get_feature("layered").await.expect("get feature");
    assert_eq!(info.status, FeatureStatus::Initialized);
    assert_eq!(info.depends_on, vec!["base".to_owned()]);
    assert_eq!(info.conflicts_with, vec!["legacy-layered".to_owned()]);
    assert!(info.created_date.is_some());

    // registered but never inserted: reports uncreated with no timestamps
    let info = orchestrator.get_feature("base").await.expect("get feature");
    assert_eq!(info.status, FeatureStatus::Uncreated);
    assert!(info.created_date.is_none());
    assert!(info.updated_date.is_none());
}

#[tokio::test]
async fn enabled_features_excludes_partial_and_stuck_states() {
    let (orchestrator, store) = setup(vec![
        feature("on", ScriptedMigration::ok()),
        feature("off", ScriptedMigration::ok()),
        feature("stuck", ScriptedMigration::ok()),
        feature("done", ScriptedMigration::ok()),
    ]);
    store.seed("on", FeatureStatus::Enabled);
    store.seed("off", FeatureStatus::Disabled);
    store.seed("stuck", FeatureStatus::Migrating);
    store.seed("done", FeatureStatus::Migrated);

    let enabled = orchestrator.enabled_features().await.expect("enabled features");
    assert_eq!(enabled.len(), 1);
    assert!(enabled.contains_key("on"));
}

#[tokio::test]
async fn migrate_requires_dependencies_at_migrated_or_later() {
    let (orchestrator, store) = setup(vec![
        feature("storage", ScriptedMigration::ok()),
        FeatureDescriptor::new("thumbnails", Arc::new(ScriptedMigration::ok()))
            .depends_on(["storage"]),
    ]);
    store.seed("storage", FeatureStatus::Initialized);
    store.seed("thumbnails", FeatureStatus::Initialized);

    let err = orchestrator.migrate("thumbnails").await.expect_err("dependency not ready");
    assert!(matches!(err, LifecycleError::DependencyNotReady { .. }));
    // precondition failure leaves the status untouched
    assert_eq!(store.status_of("thumbnails"), Some(FeatureStatus::Initialized));

    orchestrator.migrate("storage").await.expect("migrate dependency");
    orchestrator.migrate("thumbnails").await.expect("migrate dependent");
    assert_eq!(store.status_of("thumbnails"), Some(FeatureStatus::Migrated));
}

#[tokio::test]
async fn enable_refuses_while_a_conflicting_feature_is_enabled() {
    let (orchestrator, store) = setup(vec![
        feature("uploads-v1", ScriptedMigration::ok()),
        FeatureDescriptor::new("uploads-v2", Arc::new(ScriptedMigration::ok()))
            .conflicts_with(["uploads-v1"]),
    ]);
    store.seed("uploads-v1", FeatureStatus::Enabled);
    store.seed("uploads-v2", FeatureStatus::Migrated);

    let err = orchestrator.enable("uploads-v2").await.expect_err("conflict");
    assert!(matches!(err, LifecycleError::ConflictEnabled { .. }));
    assert_eq!(store.status_of("uploads-v2"), Some(FeatureStatus::Migrated));

    orchestrator.disable("uploads-v1").await.expect("disable v1");
    orchestrator.enable("uploads-v2").await.expect("enable v2");
    assert_eq!(store.status_of("uploads-v2"), Some(FeatureStatus::Enabled));
}

#[tokio::test]
async fn duplicate_insert_surfaces_a_store_error() {
    let (orchestrator, _store) = setup(vec![feature("once", ScriptedMigration::ok())]);

    orchestrator.insert("once").await.expect("first insert");
    let err = orchestrator.insert("once").await.expect_err("duplicate insert");
    assert!(matches!(err, LifecycleError::Store { .. }));
}
