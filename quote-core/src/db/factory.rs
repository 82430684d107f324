use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use super::repository::{QuotationRepository, RepositoryError};

/// Where quotations, clients and the product catalog are stored.
///
/// Comes from the `[database]` section of `quote.toml` or the `--backend`
/// and `--db` flags. `connection_string` goes to the backend untouched.
///
/// | backend    | connection_string examples                   |
/// |------------|----------------------------------------------|
/// | `sqlite`   | `quotes.db`, `sqlite:quotes.db`, `:memory:`  |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        }
    }
}

/// Opens a [`QuotationRepository`] for one storage backend.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Name matched against [`DbConfig::backend`], e.g. `"sqlite"`.
    fn backend_name(&self) -> &'static str;

    /// Returns a repository with its schema in place, ready for `quote`
    /// commands. Seeding sample products and clients is up to the backend.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn QuotationRepository>, RepositoryError>;
}

/// Backends the `quote` binary can open, keyed by name.
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A later factory with the same name replaces the earlier one.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Opens the repository for `config.backend`.
    ///
    /// An unknown backend is a [`RepositoryError::Configuration`] naming the
    /// backends that are available; factory errors pass through unchanged.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn QuotationRepository>, RepositoryError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                RepositoryError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        debug!(backend = %config.backend, "creating repository");
        factory.create(config).await
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}
