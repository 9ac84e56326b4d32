use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use tracing::{error, warn};

/// Outcome tag of a failed migration entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The primary phase failed but the compensating phase succeeded.
    /// The datastore is back in its pre-call, known-good state.
    RolledBack,
    /// Both the primary and compensating phases failed.
    /// The datastore is in an undefined state; manual repair is required.
    NoRollback,
}

impl fmt::Display for MigrationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RolledBack => "rolled-back",
            Self::NoRollback => "no-rollback",
        })
    }
}

/// A failed migration entry point, tagged with its rollback outcome.
///
/// For [`MigrationOutcome::RolledBack`] the cause is the primary phase's
/// failure; for [`MigrationOutcome::NoRollback`] it is the compensating
/// phase's failure, since that is the one leaving state undefined.
#[derive(Debug, thiserror::Error)]
#[error("{outcome} migration failure: {cause}")]
pub struct MigrationFailure {
    pub outcome: MigrationOutcome,
    pub cause: anyhow::Error,
}

impl MigrationFailure {
    #[must_use]
    pub const fn is_rolled_back(&self) -> bool {
        matches!(self.outcome, MigrationOutcome::RolledBack)
    }
}

/// The unit of schema/data change bound to one feature.
///
/// Implementors provide the four *phase* methods. The four orchestrated entry
/// points ([`initialize`](Migration::initialize), [`uninitialize`](Migration::uninitialize),
/// [`up`](Migration::up), [`down`](Migration::down)) come for free and add
/// automatic rollback-on-failure via [`recover_on_failure`].
///
/// Contract for implementors:
/// * `init_forward`/`init_back` must be additive and non-destructive (new
///   tables, nullable columns, new enum values) so they are safe against a
///   live system with no data loss.
/// * `migrate_forward`/`migrate_back` perform the actual data transformation
///   and should be idempotent where feasible, since a forward migration may
///   be re-invoked after a no-rollback failure has been manually repaired.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Apply the schema preparation for this feature.
    async fn init_forward(&self) -> anyhow::Result<()>;

    /// Undo the schema preparation.
    async fn init_back(&self) -> anyhow::Result<()>;

    /// Apply the data transformation.
    async fn migrate_forward(&self) -> anyhow::Result<()>;

    /// Undo the data transformation.
    async fn migrate_back(&self) -> anyhow::Result<()>;

    /// Run `init_forward`, compensating with `init_back` on failure.
    async fn initialize(&self) -> Result<(), MigrationFailure> {
        recover_on_failure("initialize", self.init_forward(), self.init_back()).await
    }

    /// Run `init_back`, compensating with `init_forward` on failure.
    async fn uninitialize(&self) -> Result<(), MigrationFailure> {
        recover_on_failure("uninitialize", self.init_back(), self.init_forward()).await
    }

    /// Run `migrate_forward`, compensating with `migrate_back` on failure.
    async fn up(&self) -> Result<(), MigrationFailure> {
        recover_on_failure("up", self.migrate_forward(), self.migrate_back()).await
    }

    /// Run `migrate_back`, compensating with `migrate_forward` on failure.
    async fn down(&self) -> Result<(), MigrationFailure> {
        recover_on_failure("down", self.migrate_back(), self.migrate_forward()).await
    }
}

/// Shared rollback-wrapping protocol for one primary/compensating phase pair.
///
/// Runs the primary phase; on success, returns. On failure, logs it and runs
/// the compensating phase: if that succeeds the datastore is back in its
/// pre-call state and the failure is reported as `rolled-back`; if it also
/// fails the datastore state is undefined and the failure is reported as
/// `no-rollback`.
///
/// The compensating future is only polled when the primary phase fails.
pub async fn recover_on_failure<P, C>(
    entry: &str,
    primary: P,
    compensating: C,
) -> Result<(), MigrationFailure>
where
    P: Future<Output = anyhow::Result<()>> + Send,
    C: Future<Output = anyhow::Result<()>> + Send,
{
    let Err(cause) = primary.await else {
        return Ok(());
    };

    warn!(entry, error = %cause, "Primary phase failed, attempting compensating phase");

    match compensating.await {
        Ok(()) => {
            warn!(entry, "Compensating phase succeeded, datastore restored to pre-call state");
            Err(MigrationFailure { outcome: MigrationOutcome::RolledBack, cause })
        },
        Err(compensating_cause) => {
            error!(
                entry,
                error = %compensating_cause,
                "Compensating phase failed, datastore state is undefined"
            );
            Err(MigrationFailure { outcome: MigrationOutcome::NoRollback, cause: compensating_cause })
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Phase script: which phases fail, and how often each ran.
    #[derive(Debug, Default)]
    struct Scripted {
        fail_forward: bool,
        fail_back: bool,
        forward_calls: AtomicUsize,
        back_calls: AtomicUsize,
    }

    impl Scripted {
        fn phase(&self, fail: bool, calls: &AtomicUsize, name: &str) -> anyhow::Result<()> {
            calls.fetch_add(1, Ordering::SeqCst);
            if fail { Err(anyhow!("{name} exploded")) } else { Ok(()) }
        }
    }

    #[async_trait]
    impl Migration for Scripted {
        async fn init_forward(&self) -> anyhow::Result<()> {
            self.phase(self.fail_forward, &self.forward_calls, "init_forward")
        }
        async fn init_back(&self) -> anyhow::Result<()> {
            self.phase(self.fail_back, &self.back_calls, "init_back")
        }
        async fn migrate_forward(&self) -> anyhow::Result<()> {
            self.phase(self.fail_forward, &self.forward_calls, "migrate_forward")
        }
        async fn migrate_back(&self) -> anyhow::Result<()> {
            self.phase(self.fail_back, &self.back_calls, "migrate_back")
        }
    }

    #[tokio::test]
    async fn successful_primary_skips_compensation() {
        let migration = Scripted::default();
        migration.initialize().await.expect("initialize");
        assert_eq!(migration.forward_calls.load(Ordering::SeqCst), 1);
        assert_eq!(migration.back_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_primary_with_good_compensation_reports_rolled_back() {
        let migration = Scripted { fail_forward: true, ..Scripted::default() };
        let failure = migration.up().await.unwrap_err();
        assert_eq!(failure.outcome, MigrationOutcome::RolledBack);
        // rolled-back carries the primary phase's failure
        assert!(failure.cause.to_string().contains("migrate_forward"));
        assert_eq!(migration.forward_calls.load(Ordering::SeqCst), 1);
        assert_eq!(migration.back_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_compensation_reports_no_rollback() {
        let migration = Scripted { fail_forward: true, fail_back: true, ..Scripted::default() };
        let failure = migration.up().await.unwrap_err();
        assert_eq!(failure.outcome, MigrationOutcome::NoRollback);
        // no-rollback carries the compensating phase's failure
        assert!(failure.cause.to_string().contains("migrate_back"));
    }

    #[tokio::test]
    async fn down_pairs_migrate_back_with_migrate_forward() {
        let migration = Scripted { fail_back: true, ..Scripted::default() };
        let failure = migration.down().await.unwrap_err();
        assert_eq!(failure.outcome, MigrationOutcome::RolledBack);
        assert!(failure.cause.to_string().contains("migrate_back"));
        // compensating phase for down is migrate_forward
        assert_eq!(migration.forward_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn uninitialize_pairs_init_back_with_init_forward() {
        let migration = Scripted { fail_back: true, fail_forward: true, ..Scripted::default() };
        let failure = migration.uninitialize().await.unwrap_err();
        assert_eq!(failure.outcome, MigrationOutcome::NoRollback);
        assert!(failure.cause.to_string().contains("init_forward"));
    }
}
