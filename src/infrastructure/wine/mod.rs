//! Wine infrastructure implementations

mod in_memory_repository;
mod postgres_repository;
mod service;

pub use in_memory_repository::InMemoryWineRepository;
pub use postgres_repository::PostgresWineRepository;
pub use service::WineService;
