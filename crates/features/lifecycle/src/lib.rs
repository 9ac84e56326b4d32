//! # Feature Lifecycle
//!
//! Feature slice owning the migration contract and the lifecycle state
//! machine (create, initialize, migrate, enable/disable, rollback,
//! uninitialize) with automatic rollback-on-failure and stuck-state
//! discipline.
//!
//! ## Architecture
//!
//! 1. **Migration contract ([`migration`]):** four phase methods per feature
//!    change, wrapped by four orchestrated entry points that attempt the
//!    paired compensating phase on failure.
//! 2. **Registry ([`registry`]):** the table of known features, built once
//!    and injected into the orchestrator.
//! 3. **Store contract ([`store`]):** the persistence collaborator seam;
//!    implemented by the database infrastructure crate.
//! 4. **Orchestrator ([`orchestrator`]):** resolves descriptors, persists
//!    transitional and terminal statuses around each migration call.

mod error;
pub mod migration;
pub mod orchestrator;
pub mod registry;
pub mod store;

pub use crate::error::{LifecycleError, LifecycleErrorExt};
pub use crate::migration::{Migration, MigrationFailure, MigrationOutcome, recover_on_failure};
pub use crate::orchestrator::FeatureOrchestrator;
pub use crate::registry::{FeatureDescriptor, FeatureRegistry};
pub use crate::store::{FeatureFilter, FeaturePatch, FeatureRows, FeatureStore, StoreError};
