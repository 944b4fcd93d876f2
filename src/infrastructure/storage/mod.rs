//! Storage infrastructure - backend selection and connection settings

mod factory;
mod postgres;

pub use factory::{sample_wines, RepositoryFactory, StorageConfig, StorageType, WINE_TABLE};
pub use postgres::PostgresConfig;
