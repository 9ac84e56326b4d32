use crate::error::LifecycleError;
use crate::migration::Migration;
use fxhash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Static description of one registered feature: its name, the features it
/// depends on, the features it cannot be enabled alongside, and the bound
/// migration instance.
#[derive(Clone)]
pub struct FeatureDescriptor {
    pub name: String,
    pub depends_on: Vec<String>,
    pub conflicts_with: Vec<String>,
    pub migration: Arc<dyn Migration>,
}

impl FeatureDescriptor {
    pub fn new(name: impl Into<String>, migration: Arc<dyn Migration>) -> Self {
        Self { name: name.into(), depends_on: Vec::new(), conflicts_with: Vec::new(), migration }
    }

    #[must_use]
    pub fn depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn conflicts_with<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conflicts_with = names.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Debug for FeatureDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureDescriptor")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .field("conflicts_with", &self.conflicts_with)
            .finish_non_exhaustive()
    }
}

/// The table of known features, built once at startup and handed to the
/// orchestrator as an explicit value.
///
/// Iteration follows registration order. A feature absent from this registry
/// can never acquire a persisted status row through the orchestrator.
#[derive(Debug, Default)]
pub struct FeatureRegistry {
    order: Vec<String>,
    entries: FxHashMap<String, FeatureDescriptor>,
}

impl FeatureRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor. The first registration of a name wins;
    /// re-registering is rejected.
    ///
    /// # Errors
    /// Returns [`LifecycleError::DuplicateFeature`] if the name is taken.
    pub fn register(&mut self, descriptor: FeatureDescriptor) -> Result<(), LifecycleError> {
        if self.entries.contains_key(&descriptor.name) {
            return Err(LifecycleError::DuplicateFeature {
                message: descriptor.name.clone().into(),
                context: None,
            });
        }
        self.order.push(descriptor.name.clone());
        self.entries.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FeatureDescriptor> {
        self.entries.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, in registration order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &FeatureDescriptor> {
        self.order.iter().filter_map(|name| self.entries.get(name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
