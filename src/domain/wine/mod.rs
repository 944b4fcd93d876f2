//! Wine domain module
//!
//! A wine is identified by an integer key and filtered by appellation.

mod entity;
mod repository;

pub use entity::{Wine, WineId};
pub use repository::WineRepository;

#[cfg(test)]
pub use repository::MockWineRepository;
