//! Domain layer - entities, repository ports and errors

pub mod error;
pub mod pagination;
pub mod wine;

pub use error::DomainError;
pub use pagination::{Direction, Page, PageRequest, Sort, SortField};
pub use wine::{Wine, WineId, WineRepository};
