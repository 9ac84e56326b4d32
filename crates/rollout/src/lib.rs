//! Facade crate for the feature rollout platform.
//! Re-exports domain/kernel primitives and wires the lifecycle slice to its infrastructure.
//! Keep this crate thin: it should compose other crates, not implement business logic.
//!
//! ## Usage
//! - Register feature slices in a [`FeatureRegistry`](lifecycle::FeatureRegistry).
//! - Call [`init`] with an [`AppConfig`](domain::config::AppConfig) to get a ready
//!   [`FeatureOrchestrator`](lifecycle::FeatureOrchestrator) backed by `SurrealDB`.

pub use rollout_database as database;
pub use rollout_domain as domain;
pub use rollout_kernel as kernel;
pub use rollout_lifecycle as lifecycle;
pub use rollout_logger as logger;

use rollout_database::{Database, DatabaseError, SurrealFeatureStore};
use rollout_domain::config::{AppConfig, LogConfig};
use rollout_lifecycle::{FeatureOrchestrator, FeatureRegistry};
use rollout_logger::{Logger, LoggerError};
use std::sync::Arc;

/// Initializes the logging system from [`LogConfig`].
///
/// The returned [`Logger`] guard must be kept alive for the lifetime of the
/// process to keep the background file writer flushing.
///
/// # Errors
/// Returns an error if a global subscriber is already installed or the
/// configuration is invalid.
pub fn init_logging(config: &LogConfig) -> Result<Logger, LoggerError> {
    let mut builder = Logger::builder("rollout")
        .console(true)
        .level(config.level.parse().unwrap_or(rollout_logger::LevelFilter::INFO));

    if let Some(dir) = &config.dir {
        builder = builder.path(dir);
        if config.json {
            builder = builder.json();
        }
    }

    builder.init()
}

/// Connects to the database described by `config` and wires the registered
/// feature slices to a store-backed orchestrator.
///
/// # Errors
/// Returns an error if the database connection, authentication, or schema
/// bootstrap fails.
pub async fn init(
    config: &AppConfig,
    registry: Arc<FeatureRegistry>,
) -> Result<FeatureOrchestrator<SurrealFeatureStore>, DatabaseError> {
    let mut builder = Database::builder()
        .url(&config.database.url)
        .session(&config.database.namespace, &config.database.database);

    if let Some(credentials) = &config.database.credentials {
        builder = builder.auth(&credentials.username, &credentials.password);
    }

    let db = builder.init().await?;
    Ok(FeatureOrchestrator::new(registry, SurrealFeatureStore::new(db)))
}
