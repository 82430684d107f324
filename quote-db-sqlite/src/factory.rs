use std::path::PathBuf;

use async_trait::async_trait;
use quote_core::db::{DbConfig, RepositoryFactory};
use quote_core::{QuotationRepository, RepositoryError};
use tracing::info;

use crate::repository::SqliteRepository;

/// Environment variable that overrides where seed SQL files are read from.
pub const SEEDS_DIR_ENV: &str = "QUOTE_DB_SQLITE_SEEDS_DIR";

/// Resolve the seeds directory at runtime.
///
/// Resolution order:
/// 1. **`QUOTE_DB_SQLITE_SEEDS_DIR`** if set.
/// 2. **`./seeds`** if the directory exists in the current working directory.
/// 3. **`$CARGO_MANIFEST_DIR/seeds`** as a last resort (dev/tests).
pub fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(SEEDS_DIR_ENV) {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// [`RepositoryFactory`] for SQLite.
///
/// ```rust,no_run
/// use quote_core::db::RepositoryRegistry;
/// use quote_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database named by `config.connection_string` (a bare path,
    /// a `sqlite:` URL or `:memory:`), migrate it and apply the seed files.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn QuotationRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;

        let seeds = seeds_dir();
        if seeds.is_dir() {
            repo.run_seeds(&seeds)
                .await
                .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        }

        info!(connection = %config.connection_string, "sqlite repository ready");
        Ok(Box::new(repo))
    }
}

#[cfg(test)]
mod tests {
    use quote_core::db::{DbConfig, RepositoryFactory};

    use super::SqliteRepositoryFactory;

    #[test]
    fn backend_name_is_sqlite() {
        assert_eq!(SqliteRepositoryFactory.backend_name(), "sqlite");
    }

    #[tokio::test]
    async fn creates_seeded_in_memory_repository() {
        let config = DbConfig {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        };

        let repo = SqliteRepositoryFactory
            .create(&config)
            .await
            .expect("failed to create in-memory repository");

        assert_eq!(repo.list_products().await.unwrap().len(), 2);
        assert_eq!(repo.count_quotations().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn invalid_connection_string_is_a_connection_error() {
        let config = DbConfig {
            backend: "sqlite".to_string(),
            connection_string: "sqlite:/nonexistent-dir/sub/quotes.db".to_string(),
        };

        let result = SqliteRepositoryFactory.create(&config).await;

        assert!(matches!(result, Err(quote_core::RepositoryError::Connection(_))));
    }
}
