//! Pool pre-warming
//!
//! Walks an [`InitializerConfig`] at startup, creates the requested number of
//! instances per prototype, then retires them all so the first gameplay
//! requests are served from the pool instead of instantiating mid-frame.
//!
//! Prototypes are named in configuration and resolved through a
//! [`PrototypeCatalog`]. Their concrete types are unknown here, so creation
//! and retirement go through the registry's type-erased entry points.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::rc::Rc;

use crate::config::InitializerConfig;
use crate::pool::{PoolError, PoolRegistry, Prototype};

/// Resolves configuration names to prototype values
pub trait PrototypeCatalog {
    /// Look up a prototype by name
    fn resolve(&self, name: &str) -> Option<Rc<dyn Any>>;

    /// Look up a prototype by name, failing on unknown names
    fn require(&self, name: &str) -> Result<Rc<dyn Any>, PoolError> {
        self.resolve(name)
            .ok_or_else(|| PoolError::UnknownPrototype(name.to_string()))
    }
}

/// Name-to-prototype map
#[derive(Default)]
pub struct NamedPrototypes {
    entries: HashMap<String, Rc<dyn Any>>,
}

impl NamedPrototypes {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `prototype` under `name`, replacing any previous entry
    pub fn insert<P: Prototype>(&mut self, name: impl Into<String>, prototype: &Rc<P>) {
        let erased: Rc<dyn Any> = Rc::clone(prototype) as Rc<dyn Any>;
        self.entries.insert(name.into(), erased);
    }

    /// Number of registered names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no names are registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PrototypeCatalog for NamedPrototypes {
    fn resolve(&self, name: &str) -> Option<Rc<dyn Any>> {
        self.entries.get(name).cloned()
    }
}

/// Outcome of a pre-warm pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrewarmReport {
    /// Instances created across all elements
    pub created: usize,
    /// Names of elements that were skipped
    pub skipped: Vec<String>,
}

/// Startup pre-warmer driven by configuration
pub struct PoolInitializer {
    config: InitializerConfig,
    /// Created instances keyed by their prototype's type
    created: Vec<(TypeId, Box<dyn Any>)>,
}

impl PoolInitializer {
    /// Create an initializer for `config`
    pub const fn new(config: InitializerConfig) -> Self {
        Self {
            config,
            created: Vec::new(),
        }
    }

    /// Load and validate a config file, then wrap it
    pub fn from_file(path: &str) -> Result<Self, PoolError> {
        let config = InitializerConfig::load_validated(path)?;
        Ok(Self::new(config))
    }

    /// Configuration this initializer runs
    pub const fn config(&self) -> &InitializerConfig {
        &self.config
    }

    /// Instances created by `prewarm` and not retired yet
    pub fn pending(&self) -> usize {
        self.created.len()
    }

    /// Create every configured instance
    ///
    /// Elements whose name is not in the catalog, or whose prototype type
    /// has no dispatch entry, are logged and skipped; the rest of the batch
    /// still runs.
    pub fn prewarm<H>(
        &mut self,
        registry: &mut PoolRegistry<H>,
        host: &mut H,
        catalog: &dyn PrototypeCatalog,
    ) -> PrewarmReport {
        let mut report = PrewarmReport::default();

        for element in &self.config.elements {
            let prototype = match catalog.require(&element.prototype) {
                Ok(prototype) => prototype,
                Err(err) => {
                    log::warn!("Skipping pre-warm element: {}", err);
                    report.skipped.push(element.prototype.clone());
                    continue;
                }
            };

            let prototype_type = (*prototype).type_id();
            match registry.create_instances_dyn(
                host,
                prototype,
                element.quantity,
                element.keep_across_context_reset,
            ) {
                Ok(instances) => {
                    report.created += instances.len();
                    self.created
                        .extend(instances.into_iter().map(|instance| (prototype_type, instance)));
                }
                Err(err) => {
                    log::error!("Skipping pre-warm element `{}`: {}", element.prototype, err);
                    report.skipped.push(element.prototype.clone());
                }
            }
        }

        log::info!(
            "Pre-warmed {} instances from {} elements ({} skipped)",
            report.created,
            self.config.elements.len(),
            report.skipped.len()
        );
        report
    }

    /// Deactivate every instance created by `prewarm`
    ///
    /// Deactivation retires each instance into its pool. Returns how many
    /// were retired.
    pub fn retire_created<H>(&mut self, registry: &PoolRegistry<H>, host: &mut H) -> usize {
        let mut retired = 0;
        for (prototype_type, instance) in self.created.drain(..) {
            match registry.deactivate_dyn(host, prototype_type, instance.as_ref()) {
                Ok(()) => retired += 1,
                Err(err) => log::error!("Failed to retire pre-warmed instance: {}", err),
            }
        }

        log::debug!("Retired {} pre-warmed instances", retired);
        retired
    }

    /// Pre-warm, then retire everything that was created
    pub fn run<H>(
        &mut self,
        registry: &mut PoolRegistry<H>,
        host: &mut H,
        catalog: &dyn PrototypeCatalog,
    ) -> PrewarmReport {
        let report = self.prewarm(registry, host, catalog);
        self.retire_created(registry, host);
        report
    }
}

impl std::fmt::Debug for PoolInitializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolInitializer")
            .field("config", &self.config)
            .field("pending", &self.created.len())
            .finish()
    }
}
