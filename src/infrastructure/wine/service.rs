//! Wine service for catalogue management

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::pagination::{Page, PageRequest};
use crate::domain::wine::{Wine, WineId, WineRepository};
use crate::domain::DomainError;

/// Wine service over a wine repository
///
/// Lookups report a missing wine as `None`. Only `delete_by_id` turns a
/// missing wine into an error.
#[derive(Debug)]
pub struct WineService<R: WineRepository + ?Sized> {
    repository: Arc<R>,
}

impl<R: WineRepository + ?Sized> Clone for WineService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: WineRepository + ?Sized> WineService<R> {
    /// Create a new wine service
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// List all wines in repository order
    pub async fn get_all(&self) -> Result<Vec<Wine>, DomainError> {
        debug!("Listing wines");
        self.repository.find_all().await
    }

    /// List wines with exactly this appellation
    pub async fn find_by_appellation(&self, appellation: &str) -> Result<Vec<Wine>, DomainError> {
        debug!(appellation = %appellation, "Finding wines by appellation");
        self.repository.find_by_appellation(appellation).await
    }

    /// Get a wine by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<Wine>, DomainError> {
        debug!(id = id, "Getting wine");
        self.repository.find_by_id(WineId::new(id)).await
    }

    /// Delete a wine, failing with `NotFound` when there is none
    pub async fn delete_by_id(&self, id: i32) -> Result<(), DomainError> {
        info!(id = id, "Deleting wine");

        if self.repository.delete_by_id(WineId::new(id)).await? {
            Ok(())
        } else {
            Err(DomainError::not_found(format!(
                "Wine with id {} does not exist",
                id
            )))
        }
    }

    /// Persist a new wine
    ///
    /// A caller-supplied ID is passed through; the repository decides what
    /// happens to it.
    pub async fn add(&self, wine: Wine) -> Result<Wine, DomainError> {
        info!(appellation = %wine.appellation(), "Adding wine");
        let saved = self.repository.save(wine).await?;
        debug!(id = ?saved.id(), "Wine added");
        Ok(saved)
    }

    /// Overwrite an existing wine, returns `None` when there is nothing to update
    pub async fn update(&self, wine: Wine) -> Result<Option<Wine>, DomainError> {
        info!(id = ?wine.id(), "Updating wine");
        let updated = self.repository.update_if_exists(wine).await?;

        if updated.is_none() {
            debug!("No wine to update");
        }

        Ok(updated)
    }

    /// Get one page of wines
    pub async fn pageable(&self, request: &PageRequest) -> Result<Page<Wine>, DomainError> {
        debug!(page = request.page(), size = request.size(), "Paging wines");
        self.repository.find_all_paged(request).await
    }
}
