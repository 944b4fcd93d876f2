//! Wine repository trait

use async_trait::async_trait;

use super::entity::{Wine, WineId};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Repository for wine persistence
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WineRepository: Send + Sync {
    /// Check if a wine exists
    async fn exists_by_id(&self, id: WineId) -> Result<bool, DomainError>;

    /// Get a wine by ID
    async fn find_by_id(&self, id: WineId) -> Result<Option<Wine>, DomainError>;

    /// List all wines, ordered by ID
    async fn find_all(&self) -> Result<Vec<Wine>, DomainError>;

    /// Get one page of wines
    async fn find_all_paged(&self, request: &PageRequest) -> Result<Page<Wine>, DomainError>;

    /// List wines whose appellation equals the given value
    async fn find_by_appellation(&self, appellation: &str) -> Result<Vec<Wine>, DomainError>;

    /// Insert a wine without an ID, or insert/overwrite one with an ID
    async fn save(&self, wine: Wine) -> Result<Wine, DomainError>;

    /// Delete a wine by ID, returns true if a wine was removed
    async fn delete_by_id(&self, id: WineId) -> Result<bool, DomainError>;

    /// Overwrite the stored wine with the same ID, if there is one
    async fn update_if_exists(&self, wine: Wine) -> Result<Option<Wine>, DomainError>;

    /// Count all wines
    async fn count(&self) -> Result<u64, DomainError>;
}
