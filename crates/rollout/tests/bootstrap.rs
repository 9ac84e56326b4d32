use async_trait::async_trait;
use rollout::domain::config::AppConfig;
use rollout::domain::features::FeatureStatus;
use rollout::lifecycle::{FeatureDescriptor, FeatureRegistry, Migration};
use std::sync::Arc;

#[derive(Debug)]
struct NoopMigration;

#[async_trait]
impl Migration for NoopMigration {
    async fn init_forward(&self) -> anyhow::Result<()> {
        Ok(())
    }
    async fn init_back(&self) -> anyhow::Result<()> {
        Ok(())
    }
    async fn migrate_forward(&self) -> anyhow::Result<()> {
        Ok(())
    }
    async fn migrate_back(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn default_config_wires_an_orchestrator() {
    let mut registry = FeatureRegistry::new();
    registry
        .register(FeatureDescriptor::new("search-index", Arc::new(NoopMigration)))
        .expect("register");

    // defaults point at mem://, so this spins up an embedded engine
    let orchestrator =
        rollout::init(&AppConfig::default(), Arc::new(registry)).await.expect("init");

    orchestrator.insert("search-index").await.expect("insert");
    orchestrator.initialize("search-index").await.expect("initialize");

    let info = orchestrator.get_feature("search-index").await.expect("get feature");
    assert_eq!(info.status, FeatureStatus::Initialized);
}
