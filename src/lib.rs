//! Wine Catalog
//!
//! A wine catalogue service with:
//! - Lookup by ID and by appellation
//! - Paged listing with optional ordering
//! - In-memory or PostgreSQL storage

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use domain::WineRepository;
use infrastructure::storage::RepositoryFactory;
use infrastructure::wine::WineService;

/// Build the wine service for the configured storage backend
pub async fn create_wine_service(
    config: &AppConfig,
) -> anyhow::Result<WineService<dyn WineRepository>> {
    let storage = config.storage.to_storage_config()?;
    let repository = RepositoryFactory::create(&storage).await?;

    Ok(WineService::new(repository))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Wine;

    #[tokio::test]
    async fn test_default_config_builds_seeded_service() {
        let service = create_wine_service(&AppConfig::default()).await.unwrap();

        let wines = service.get_all().await.unwrap();
        assert!(!wines.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_backend_fails() {
        let mut config = AppConfig::default();
        config.storage.backend = "mongo".to_string();

        assert!(create_wine_service(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_catalogue_walkthrough() {
        let mut config = AppConfig::default();
        config.storage.seed = false;
        let service = create_wine_service(&config).await.unwrap();

        let bordeaux = service
            .add(Wine::new("Château Lafleur", "Bordeaux", 75.0))
            .await
            .unwrap();
        assert_eq!(bordeaux.id().map(i32::from), Some(1));

        assert_eq!(service.get_by_id(1).await.unwrap(), Some(bordeaux));
        assert!(service.get_by_id(2).await.unwrap().is_none());

        let err = service.delete_by_id(2).await.unwrap_err();
        assert!(err.to_string().contains('2'));

        service.delete_by_id(1).await.unwrap();
        assert!(service.get_by_id(1).await.unwrap().is_none());
    }
}
