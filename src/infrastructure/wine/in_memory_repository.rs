//! In-memory wine repository

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::pagination::{Direction, Page, PageRequest, Sort, SortField};
use crate::domain::wine::{Wine, WineId, WineRepository};
use crate::domain::DomainError;

#[derive(Debug)]
struct State {
    wines: BTreeMap<WineId, Wine>,
    /// `None` once `i32::MAX` has been handed out or reserved
    next_id: Option<i32>,
}

impl State {
    fn assign_id(&mut self) -> Result<WineId, DomainError> {
        let id = self
            .next_id
            .ok_or_else(|| DomainError::storage("wine id sequence exhausted"))?;
        self.next_id = id.checked_add(1);
        Ok(WineId::new(id))
    }

    fn reserve(&mut self, id: WineId) {
        if let Some(next) = self.next_id {
            if id.value() >= next {
                self.next_id = id.value().checked_add(1);
            }
        }
    }
}

/// Thread-safe in-memory wine repository
///
/// Wines are kept ordered by ID. IDs are handed out from a sequence starting
/// at 1. Data is lost when the process terminates.
#[derive(Debug)]
pub struct InMemoryWineRepository {
    state: RwLock<State>,
}

impl Default for InMemoryWineRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryWineRepository {
    /// Creates an empty repository
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                wines: BTreeMap::new(),
                next_id: Some(1),
            }),
        }
    }

    /// Creates a repository pre-populated with wines
    ///
    /// Wines without an ID get one from the sequence.
    pub fn with_wines(wines: Vec<Wine>) -> Self {
        let repository = Self::new();
        {
            let mut state = repository
                .state
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());

            for wine in wines {
                if let Err(e) = insert(&mut state, wine) {
                    warn!(error = %e, "Skipping seed wine");
                }
            }
        }
        repository
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, DomainError> {
        self.state
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, DomainError> {
        self.state
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))
    }
}

fn insert(state: &mut State, mut wine: Wine) -> Result<Wine, DomainError> {
    let id = match wine.id() {
        Some(id) => {
            state.reserve(id);
            id
        }
        None => {
            let id = state.assign_id()?;
            wine.set_id(id);
            id
        }
    };

    state.wines.insert(id, wine.clone());
    Ok(wine)
}

fn compare(a: &Wine, b: &Wine, sort: Sort) -> Ordering {
    let ordering = match sort.field {
        SortField::Id => a.id().cmp(&b.id()),
        SortField::Chateau => a.chateau().cmp(b.chateau()),
        SortField::Appellation => a.appellation().cmp(b.appellation()),
        SortField::Price => a.price().total_cmp(&b.price()),
    };

    match sort.direction {
        Direction::Asc => ordering,
        Direction::Desc => ordering.reverse(),
    }
}

#[async_trait]
impl WineRepository for InMemoryWineRepository {
    async fn exists_by_id(&self, id: WineId) -> Result<bool, DomainError> {
        Ok(self.read()?.wines.contains_key(&id))
    }

    async fn find_by_id(&self, id: WineId) -> Result<Option<Wine>, DomainError> {
        Ok(self.read()?.wines.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Wine>, DomainError> {
        Ok(self.read()?.wines.values().cloned().collect())
    }

    async fn find_all_paged(&self, request: &PageRequest) -> Result<Page<Wine>, DomainError> {
        let mut wines: Vec<Wine> = self.read()?.wines.values().cloned().collect();
        let total = wines.len() as u64;

        // Stable sort keeps ID order among equal keys
        if let Some(sort) = request.sort() {
            wines.sort_by(|a, b| compare(a, b, sort));
        }

        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let content = wines
            .into_iter()
            .skip(offset)
            .take(request.size() as usize)
            .collect();

        Ok(Page::new(content, request, total))
    }

    async fn find_by_appellation(&self, appellation: &str) -> Result<Vec<Wine>, DomainError> {
        Ok(self
            .read()?
            .wines
            .values()
            .filter(|wine| wine.appellation() == appellation)
            .cloned()
            .collect())
    }

    async fn save(&self, wine: Wine) -> Result<Wine, DomainError> {
        let mut state = self.write()?;
        insert(&mut state, wine)
    }

    async fn delete_by_id(&self, id: WineId) -> Result<bool, DomainError> {
        Ok(self.write()?.wines.remove(&id).is_some())
    }

    async fn update_if_exists(&self, wine: Wine) -> Result<Option<Wine>, DomainError> {
        let Some(id) = wine.id() else {
            return Ok(None);
        };

        let mut state = self.write()?;

        match state.wines.get_mut(&id) {
            Some(stored) => {
                *stored = wine.clone();
                Ok(Some(wine))
            }
            None => Ok(None),
        }
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(self.read()?.wines.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wine(chateau: &str, appellation: &str, price: f64) -> Wine {
        Wine::new(chateau, appellation, price)
    }

    fn seeded() -> InMemoryWineRepository {
        InMemoryWineRepository::with_wines(vec![
            wine("Château Margaux", "Margaux", 450.0),
            wine("Château Pétrus", "Pomerol", 3000.0),
            wine("Château Palmer", "Margaux", 310.0),
            wine("Château d'Yquem", "Sauternes", 380.0),
        ])
    }

    #[tokio::test]
    async fn test_save_assigns_sequential_ids() {
        let repo = InMemoryWineRepository::new();

        let first = repo.save(wine("A", "Bordeaux", 10.0)).await.unwrap();
        let second = repo.save(wine("B", "Bordeaux", 12.0)).await.unwrap();

        assert_eq!(first.id(), Some(WineId::new(1)));
        assert_eq!(second.id(), Some(WineId::new(2)));
    }

    #[tokio::test]
    async fn test_save_with_id_overwrites() {
        let repo = seeded();

        repo.save(wine("Château Lascombes", "Margaux", 90.0).with_id(1))
            .await
            .unwrap();

        let stored = repo.find_by_id(WineId::new(1)).await.unwrap().unwrap();
        assert_eq!(stored.chateau(), "Château Lascombes");
        assert_eq!(repo.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_save_with_explicit_id_advances_sequence() {
        let repo = InMemoryWineRepository::new();

        repo.save(wine("A", "Bordeaux", 10.0).with_id(10)).await.unwrap();
        let next = repo.save(wine("B", "Bordeaux", 10.0)).await.unwrap();

        assert_eq!(next.id(), Some(WineId::new(11)));
    }

    #[tokio::test]
    async fn test_explicit_max_id_exhausts_sequence() {
        let repo = InMemoryWineRepository::new();

        let top = repo
            .save(wine("A", "Bordeaux", 1.0).with_id(i32::MAX))
            .await
            .unwrap();
        assert_eq!(top.id(), Some(WineId::new(i32::MAX)));

        let err = repo.save(wine("B", "Bordeaux", 2.0)).await.unwrap_err();
        assert!(matches!(err, DomainError::Storage { .. }));
        assert_eq!(repo.count().await.unwrap(), 1);

        // Lock is not poisoned, reads and explicit-id writes keep working
        assert_eq!(
            repo.find_by_id(WineId::new(i32::MAX)).await.unwrap(),
            Some(top)
        );
        repo.save(wine("C", "Graves", 3.0).with_id(5)).await.unwrap();
        assert_eq!(repo.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_sequence_hands_out_max_id_once() {
        let repo = InMemoryWineRepository::new();
        repo.save(wine("A", "Bordeaux", 1.0).with_id(i32::MAX - 1))
            .await
            .unwrap();

        let last = repo.save(wine("B", "Bordeaux", 2.0)).await.unwrap();
        assert_eq!(last.id(), Some(WineId::new(i32::MAX)));
        assert!(repo.save(wine("C", "Bordeaux", 3.0)).await.is_err());
    }

    #[tokio::test]
    async fn test_find_all_is_ordered_by_id() {
        let repo = seeded();

        let ids: Vec<i32> = repo
            .find_all()
            .await
            .unwrap()
            .iter()
            .filter_map(|w| w.id().map(i32::from))
            .collect();

        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_find_by_appellation_exact_match() {
        let repo = seeded();

        let margaux = repo.find_by_appellation("Margaux").await.unwrap();
        assert_eq!(margaux.len(), 2);
        assert!(margaux.iter().all(|w| w.appellation() == "Margaux"));

        assert!(repo.find_by_appellation("margaux").await.unwrap().is_empty());
        assert!(repo.find_by_appellation("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_reports_removal() {
        let repo = seeded();

        assert!(repo.delete_by_id(WineId::new(2)).await.unwrap());
        assert!(!repo.delete_by_id(WineId::new(2)).await.unwrap());
        assert!(!repo.exists_by_id(WineId::new(2)).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_if_exists() {
        let repo = seeded();

        let updated = repo
            .update_if_exists(wine("Château Palmer", "Margaux", 330.0).with_id(3))
            .await
            .unwrap();
        assert_eq!(updated.map(|w| w.price()), Some(330.0));

        let missing = repo
            .update_if_exists(wine("Ghost", "Nowhere", 1.0).with_id(42))
            .await
            .unwrap();
        assert!(missing.is_none());
        assert!(!repo.exists_by_id(WineId::new(42)).await.unwrap());

        let unsaved = repo.update_if_exists(wine("Ghost", "Nowhere", 1.0)).await.unwrap();
        assert!(unsaved.is_none());
        assert_eq!(repo.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_paging_slices_in_id_order() {
        let repo = seeded();

        let page = repo.find_all_paged(&PageRequest::of(1, 3)).await.unwrap();

        assert_eq!(page.content.len(), 1);
        assert_eq!(page.content[0].id(), Some(WineId::new(4)));
        assert_eq!(page.total_elements, 4);
        assert_eq!(page.total_pages(), 2);
        assert!(page.is_last());
    }

    #[tokio::test]
    async fn test_paging_beyond_end_is_empty() {
        let repo = seeded();

        let page = repo.find_all_paged(&PageRequest::of(5, 2)).await.unwrap();

        assert!(page.content.is_empty());
        assert_eq!(page.total_elements, 4);
        assert_eq!(page.page, 5);
    }

    #[tokio::test]
    async fn test_paging_with_sort() {
        let repo = seeded();

        let request = PageRequest::of(0, 2).with_sort(Sort::desc(SortField::Price));
        let page = repo.find_all_paged(&request).await.unwrap();
        let prices: Vec<f64> = page.content.iter().map(Wine::price).collect();
        assert_eq!(prices, vec![3000.0, 450.0]);

        let request = PageRequest::of(0, 4).with_sort(Sort::asc(SortField::Appellation));
        let page = repo.find_all_paged(&request).await.unwrap();
        let appellations: Vec<&str> = page.content.iter().map(Wine::appellation).collect();
        assert_eq!(appellations, vec!["Margaux", "Margaux", "Pomerol", "Sauternes"]);
        // Ties keep ID order
        assert_eq!(page.content[0].id(), Some(WineId::new(1)));
    }
}
