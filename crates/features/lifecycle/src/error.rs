use crate::migration::{MigrationFailure, MigrationOutcome};
use crate::store::StoreError;
use std::borrow::Cow;

/// A specialized [`LifecycleError`] enum of this crate.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// Caller referenced a name absent from the registry.
    /// Surfaced immediately, before any persisted-state side effect.
    #[error("Unknown feature{}: {message}", format_context(.context))]
    MissingFeature { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A name was registered twice; the first registration wins.
    #[error("Feature already registered{}: {message}", format_context(.context))]
    DuplicateFeature { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A `depends_on` feature has not reached migrated-or-later.
    #[error("Dependency not ready{}: {message}", format_context(.context))]
    DependencyNotReady { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A `conflicts_with` feature is currently enabled.
    #[error("Conflicting feature enabled{}: {message}", format_context(.context))]
    ConflictEnabled { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A migration phase failed. The outcome tag tells whether the
    /// compensating phase restored the pre-call state.
    #[error("Migration failed ({outcome}){}: {cause}", format_context(.context))]
    Migration {
        outcome: MigrationOutcome,
        cause: anyhow::Error,
        context: Option<Cow<'static, str>>,
    },

    /// A wrapper for persistence collaborator errors.
    #[error("Store error{}: {source}", format_context(.context))]
    Store {
        #[source]
        source: StoreError,
        context: Option<Cow<'static, str>>,
    },
}

impl LifecycleError {
    /// The rollback outcome, if this error originated from a migration phase.
    #[must_use]
    pub const fn migration_outcome(&self) -> Option<MigrationOutcome> {
        match self {
            Self::Migration { outcome, .. } => Some(*outcome),
            _ => None,
        }
    }
}

impl From<StoreError> for LifecycleError {
    #[inline]
    fn from(source: StoreError) -> Self {
        Self::Store { source, context: None }
    }
}

impl From<MigrationFailure> for LifecycleError {
    #[inline]
    fn from(failure: MigrationFailure) -> Self {
        Self::Migration { outcome: failure.outcome, cause: failure.cause, context: None }
    }
}

pub trait LifecycleErrorExt<T> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, LifecycleError>;
}

impl<T> LifecycleErrorExt<T> for Result<T, LifecycleError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                LifecycleError::MissingFeature { context: c, .. }
                | LifecycleError::DuplicateFeature { context: c, .. }
                | LifecycleError::DependencyNotReady { context: c, .. }
                | LifecycleError::ConflictEnabled { context: c, .. }
                | LifecycleError::Migration { context: c, .. }
                | LifecycleError::Store { context: c, .. } => *c = Some(context.into()),
            }
            e
        })
    }
}

impl<T> LifecycleErrorExt<T> for Result<T, StoreError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, LifecycleError> {
        self.map_err(|source| LifecycleError::Store { source, context: Some(context.into()) })
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
