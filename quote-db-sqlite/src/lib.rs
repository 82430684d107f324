pub mod decimal;
mod factory;
mod repository;

pub use factory::{SEEDS_DIR_ENV, SqliteRepositoryFactory, seeds_dir};
pub use repository::SqliteRepository;
