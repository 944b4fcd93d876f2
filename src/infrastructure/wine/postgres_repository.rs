//! PostgreSQL-backed wine repository

use async_trait::async_trait;
use sqlx::postgres::{PgConnection, PgPool, PgRow};
use sqlx::Row;
use tracing::debug;

use crate::domain::pagination::{Direction, Page, PageRequest, SortField};
use crate::domain::wine::{Wine, WineId, WineRepository};
use crate::domain::DomainError;
use crate::infrastructure::storage::PostgresConfig;

const COLUMNS: &str = "id, chateau, appellation, price";

/// PostgreSQL implementation of WineRepository
///
/// Stores one row per wine in a table with a `SERIAL` primary key.
pub struct PostgresWineRepository {
    pool: PgPool,
    table_name: String,
}

impl std::fmt::Debug for PostgresWineRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresWineRepository")
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl PostgresWineRepository {
    /// Creates a repository over an existing pool
    pub fn new(pool: PgPool, table_name: impl Into<String>) -> Self {
        Self {
            pool,
            table_name: table_name.into(),
        }
    }

    /// Creates a repository with its own connection pool
    pub async fn connect(
        config: &PostgresConfig,
        table_name: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let pool = config.pool_options().connect(&config.url).await.map_err(|e| {
            DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e))
        })?;

        Ok(Self::new(pool, table_name))
    }

    /// Ensures the wine table exists
    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        let query = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id SERIAL PRIMARY KEY,
                chateau TEXT NOT NULL,
                appellation TEXT NOT NULL,
                price DOUBLE PRECISION NOT NULL
            )
            "#,
            self.table_name
        );

        sqlx::query(&query)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create table: {}", e)))?;

        let index = format!(
            "CREATE INDEX IF NOT EXISTS {0}_appellation_idx ON {0} (appellation)",
            self.table_name
        );

        sqlx::query(&index)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create index: {}", e)))?;

        debug!(table = %self.table_name, "Wine table ready");
        Ok(())
    }

    /// Moves the SERIAL sequence past every stored ID, never backwards
    ///
    /// Runs inside the explicit-ID save transaction, after the table lock.
    async fn advance_sequence(&self, conn: &mut PgConnection) -> Result<(), DomainError> {
        sqlx::query(&advance_sequence_query(&self.table_name))
            .execute(conn)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to sync id sequence: {}", e)))?;

        Ok(())
    }
}

fn advance_sequence_query(table_name: &str) -> String {
    format!(
        r#"
        WITH seq AS (SELECT pg_get_serial_sequence('{0}', 'id')::regclass AS name)
        SELECT setval(
            seq.name,
            GREATEST(
                (SELECT COALESCE(MAX(id), 0) FROM {0}),
                COALESCE(pg_sequence_last_value(seq.name), 0),
                1
            )
        )
        FROM seq
        "#,
        table_name
    )
}

fn wine_from_row(row: &PgRow) -> Result<Wine, DomainError> {
    let map_err = |e: sqlx::Error| DomainError::storage(format!("Failed to read wine row: {}", e));

    let id: i32 = row.try_get("id").map_err(map_err)?;
    let chateau: String = row.try_get("chateau").map_err(map_err)?;
    let appellation: String = row.try_get("appellation").map_err(map_err)?;
    let price: f64 = row.try_get("price").map_err(map_err)?;

    Ok(Wine::new(chateau, appellation, price).with_id(id))
}

fn wines_from_rows(rows: &[PgRow]) -> Result<Vec<Wine>, DomainError> {
    rows.iter().map(wine_from_row).collect()
}

fn order_by_clause(request: &PageRequest) -> String {
    match request.sort() {
        Some(sort) => {
            let column = match sort.field {
                SortField::Id => "id",
                SortField::Chateau => "chateau",
                SortField::Appellation => "appellation",
                SortField::Price => "price",
            };
            let direction = match sort.direction {
                Direction::Asc => "ASC",
                Direction::Desc => "DESC",
            };
            format!("ORDER BY {} {}, id ASC", column, direction)
        }
        None => "ORDER BY id ASC".to_string(),
    }
}

#[async_trait]
impl WineRepository for PostgresWineRepository {
    async fn exists_by_id(&self, id: WineId) -> Result<bool, DomainError> {
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1) as exists",
            self.table_name
        );

        let row = sqlx::query(&query)
            .bind(id.value())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check existence: {}", e)))?;

        row.try_get("exists")
            .map_err(|e| DomainError::storage(format!("Failed to check existence: {}", e)))
    }

    async fn find_by_id(&self, id: WineId) -> Result<Option<Wine>, DomainError> {
        let query = format!("SELECT {} FROM {} WHERE id = $1", COLUMNS, self.table_name);

        let row = sqlx::query(&query)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get wine: {}", e)))?;

        row.as_ref().map(wine_from_row).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Wine>, DomainError> {
        let query = format!("SELECT {} FROM {} ORDER BY id", COLUMNS, self.table_name);

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list wines: {}", e)))?;

        wines_from_rows(&rows)
    }

    async fn find_all_paged(&self, request: &PageRequest) -> Result<Page<Wine>, DomainError> {
        let total = self.count().await?;

        let query = format!(
            "SELECT {} FROM {} {} LIMIT $1 OFFSET $2",
            COLUMNS,
            self.table_name,
            order_by_clause(request)
        );

        let offset = i64::try_from(request.offset()).unwrap_or(i64::MAX);
        let rows = sqlx::query(&query)
            .bind(i64::from(request.size()))
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to page wines: {}", e)))?;

        Ok(Page::new(wines_from_rows(&rows)?, request, total))
    }

    async fn find_by_appellation(&self, appellation: &str) -> Result<Vec<Wine>, DomainError> {
        let query = format!(
            "SELECT {} FROM {} WHERE appellation = $1 ORDER BY id",
            COLUMNS, self.table_name
        );

        let rows = sqlx::query(&query)
            .bind(appellation)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to find wines by appellation: {}", e))
            })?;

        wines_from_rows(&rows)
    }

    async fn save(&self, wine: Wine) -> Result<Wine, DomainError> {
        let row = match wine.id() {
            Some(id) => {
                let query = format!(
                    r#"
                    INSERT INTO {} (id, chateau, appellation, price)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (id) DO UPDATE
                    SET chateau = EXCLUDED.chateau,
                        appellation = EXCLUDED.appellation,
                        price = EXCLUDED.price
                    RETURNING {}
                    "#,
                    self.table_name, COLUMNS
                );

                let map_err =
                    |e: sqlx::Error| DomainError::storage(format!("Failed to save wine: {}", e));

                // Plain inserts draw from the sequence, so hold them off
                // until it has been moved past the explicit ID
                let mut tx = self.pool.begin().await.map_err(map_err)?;

                sqlx::query(&format!(
                    "LOCK TABLE {} IN SHARE ROW EXCLUSIVE MODE",
                    self.table_name
                ))
                .execute(&mut *tx)
                .await
                .map_err(map_err)?;

                let row = sqlx::query(&query)
                    .bind(id.value())
                    .bind(wine.chateau())
                    .bind(wine.appellation())
                    .bind(wine.price())
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(map_err)?;

                self.advance_sequence(&mut *tx).await?;
                tx.commit().await.map_err(map_err)?;
                row
            }
            None => {
                let query = format!(
                    r#"
                    INSERT INTO {} (chateau, appellation, price)
                    VALUES ($1, $2, $3)
                    RETURNING {}
                    "#,
                    self.table_name, COLUMNS
                );

                sqlx::query(&query)
                    .bind(wine.chateau())
                    .bind(wine.appellation())
                    .bind(wine.price())
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| DomainError::storage(format!("Failed to save wine: {}", e)))?
            }
        };

        wine_from_row(&row)
    }

    async fn delete_by_id(&self, id: WineId) -> Result<bool, DomainError> {
        let query = format!("DELETE FROM {} WHERE id = $1", self.table_name);

        let result = sqlx::query(&query)
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete wine: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_if_exists(&self, wine: Wine) -> Result<Option<Wine>, DomainError> {
        let Some(id) = wine.id() else {
            return Ok(None);
        };

        let query = format!(
            r#"
            UPDATE {}
            SET chateau = $2, appellation = $3, price = $4
            WHERE id = $1
            RETURNING {}
            "#,
            self.table_name, COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id.value())
            .bind(wine.chateau())
            .bind(wine.appellation())
            .bind(wine.price())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to update wine: {}", e)))?;

        row.as_ref().map(wine_from_row).transpose()
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let query = format!("SELECT COUNT(*) as count FROM {}", self.table_name);

        let row = sqlx::query(&query)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count wines: {}", e)))?;

        let count: i64 = row
            .try_get("count")
            .map_err(|e| DomainError::storage(format!("Failed to count wines: {}", e)))?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pagination::Sort;

    #[test]
    fn test_default_order_is_by_id() {
        assert_eq!(order_by_clause(&PageRequest::of(0, 10)), "ORDER BY id ASC");
    }

    #[test]
    fn test_order_by_sort_field() {
        let request = PageRequest::of(0, 10).with_sort(Sort::desc(SortField::Price));
        assert_eq!(order_by_clause(&request), "ORDER BY price DESC, id ASC");

        let request = PageRequest::of(0, 10).with_sort(Sort::asc(SortField::Appellation));
        assert_eq!(order_by_clause(&request), "ORDER BY appellation ASC, id ASC");
    }

    #[test]
    fn test_sequence_sync_keeps_last_value() {
        let query = advance_sequence_query("wines");

        assert!(query.contains("pg_get_serial_sequence('wines', 'id')"));
        assert!(query.contains("(SELECT COALESCE(MAX(id), 0) FROM wines)"));
        assert!(query.contains("COALESCE(pg_sequence_last_value(seq.name), 0)"));
    }

    // Note: These tests require a running PostgreSQL instance
    // Run with: DATABASE_URL=postgres://... cargo test -- --ignored

    async fn test_repository(table: &str) -> PostgresWineRepository {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/wine_catalog_test".to_string());
        let config = PostgresConfig::new(url);
        let repo = PostgresWineRepository::connect(&config, table).await.unwrap();

        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(&repo.pool)
            .await
            .unwrap();
        repo.ensure_table().await.unwrap();
        repo
    }

    #[tokio::test]
    #[ignore = "Requires running PostgreSQL instance"]
    async fn test_postgres_explicit_id_advances_sequence() {
        let repo = test_repository("wines_explicit_id_test").await;

        repo.save(Wine::new("A", "Bordeaux", 10.0).with_id(10))
            .await
            .unwrap();
        let next = repo.save(Wine::new("B", "Bordeaux", 12.0)).await.unwrap();

        assert_eq!(next.id(), Some(WineId::new(11)));
    }

    #[tokio::test]
    #[ignore = "Requires running PostgreSQL instance"]
    async fn test_postgres_deleted_ids_are_not_reused() {
        let repo = test_repository("wines_no_reuse_test").await;

        repo.save(Wine::new("A", "Bordeaux", 10.0)).await.unwrap();
        let second = repo.save(Wine::new("B", "Bordeaux", 12.0)).await.unwrap();
        assert_eq!(second.id(), Some(WineId::new(2)));

        assert!(repo.delete_by_id(WineId::new(2)).await.unwrap());
        repo.save(Wine::new("A2", "Bordeaux", 11.0).with_id(1))
            .await
            .unwrap();

        let third = repo.save(Wine::new("C", "Graves", 9.0)).await.unwrap();
        assert_eq!(third.id(), Some(WineId::new(3)));
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    #[ignore = "Requires running PostgreSQL instance"]
    async fn test_postgres_conditional_update_and_delete() {
        let repo = test_repository("wines_conditional_test").await;

        let saved = repo.save(Wine::new("A", "Margaux", 10.0)).await.unwrap();
        let id = saved.id().unwrap();

        let updated = repo
            .update_if_exists(Wine::new("A", "Margaux", 20.0).with_id(id.value()))
            .await
            .unwrap();
        assert_eq!(updated.map(|w| w.price()), Some(20.0));

        let missing = repo
            .update_if_exists(Wine::new("X", "Nowhere", 1.0).with_id(99))
            .await
            .unwrap();
        assert!(missing.is_none());

        assert!(repo.delete_by_id(id).await.unwrap());
        assert!(!repo.delete_by_id(id).await.unwrap());
    }
}
