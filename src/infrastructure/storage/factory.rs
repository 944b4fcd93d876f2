//! Repository factory for runtime storage selection

use std::sync::Arc;

use tracing::info;

use crate::domain::wine::{Wine, WineRepository};
use crate::domain::DomainError;
use crate::infrastructure::wine::{InMemoryWineRepository, PostgresWineRepository};

use super::postgres::PostgresConfig;

/// Table holding wine rows
pub const WINE_TABLE: &str = "wines";

/// Supported storage types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl StorageType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// In-memory storage, optionally seeded with the sample catalogue
    InMemory { seed: bool },
    /// PostgreSQL storage configuration
    Postgres(PostgresConfig),
}

impl StorageConfig {
    /// Creates an empty in-memory storage configuration
    pub fn in_memory() -> Self {
        Self::InMemory { seed: false }
    }

    /// Creates an in-memory configuration seeded with sample wines
    pub fn seeded_in_memory() -> Self {
        Self::InMemory { seed: true }
    }

    /// Creates a PostgreSQL storage configuration
    pub fn postgres(config: PostgresConfig) -> Self {
        Self::Postgres(config)
    }

    /// Creates a PostgreSQL configuration from a URL
    pub fn postgres_url(url: impl Into<String>) -> Self {
        Self::Postgres(PostgresConfig::new(url))
    }

    /// Returns the storage type
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory { .. } => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }
}

/// Factory for creating wine repositories
#[derive(Debug)]
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Creates a repository based on the configuration
    pub async fn create(config: &StorageConfig) -> Result<Arc<dyn WineRepository>, DomainError> {
        match config {
            StorageConfig::InMemory { seed } => {
                info!(seed = *seed, "Using in-memory wine storage");
                Ok(Self::create_in_memory(*seed))
            }
            StorageConfig::Postgres(pg_config) => {
                info!("Using PostgreSQL wine storage");
                Ok(Self::create_postgres(pg_config).await?)
            }
        }
    }

    /// Creates an in-memory repository
    pub fn create_in_memory(seed: bool) -> Arc<InMemoryWineRepository> {
        if seed {
            Arc::new(InMemoryWineRepository::with_wines(sample_wines()))
        } else {
            Arc::new(InMemoryWineRepository::new())
        }
    }

    /// Creates a PostgreSQL repository and makes sure its table exists
    pub async fn create_postgres(
        config: &PostgresConfig,
    ) -> Result<Arc<PostgresWineRepository>, DomainError> {
        let repository = PostgresWineRepository::connect(config, WINE_TABLE).await?;
        repository.ensure_table().await?;
        Ok(Arc::new(repository))
    }
}

/// Small catalogue used to seed in-memory storage
pub fn sample_wines() -> Vec<Wine> {
    vec![
        Wine::new("Château Margaux", "Margaux", 450.0),
        Wine::new("Château Latour", "Pauillac", 600.0),
        Wine::new("Château Palmer", "Margaux", 310.0),
        Wine::new("Château Pétrus", "Pomerol", 3000.0),
        Wine::new("Château d'Yquem", "Sauternes", 380.0),
        Wine::new("Château Haut-Brion", "Pessac-Léognan", 520.0),
    ]
}
