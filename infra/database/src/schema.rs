use crate::error::{DatabaseError, DatabaseErrorExt};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use tracing::info;

/// Additive, idempotent bootstrap DDL for the feature status table.
///
/// Safe to re-run against a live system: every statement is `IF NOT EXISTS`
/// and only adds definitions, never drops or rewrites data.
const FEATURE_TABLE_DDL: &str = "
    DEFINE TABLE IF NOT EXISTS feature SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS name ON TABLE feature TYPE string;
    DEFINE FIELD IF NOT EXISTS status ON TABLE feature TYPE string
        ASSERT $value INSIDE [
            'uncreated', 'created',
            'initializing', 'initialized',
            'migrating', 'migrated',
            'enabled', 'disabled',
            'rolling-back', 'rolled-back',
            'uninitializing', 'uninitialized'
        ];
    DEFINE FIELD IF NOT EXISTS created_date ON TABLE feature TYPE datetime DEFAULT time::now();
    DEFINE FIELD IF NOT EXISTS updated_date ON TABLE feature TYPE datetime DEFAULT time::now();
    DEFINE INDEX IF NOT EXISTS idx_feature_name ON TABLE feature COLUMNS name UNIQUE;
";

/// Applies the feature-table schema to the active session.
pub(crate) async fn define_schema(db: &Surreal<Any>) -> Result<(), DatabaseError> {
    db.query(FEATURE_TABLE_DDL)
        .await
        .context("Applying feature table schema")?
        .check()
        .map_err(|e| DatabaseError::Schema {
            message: e.to_string().into(),
            context: Some("Feature table bootstrap rejected".into()),
        })?;

    info!("Feature table schema applied");
    Ok(())
}
