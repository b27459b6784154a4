//! Postgres-backed inventory store.
//!
//! One row per item in the `inventory` table. Conditional writes are single
//! statements guarded by `revision = $n`, so the revision check and the write
//! are atomic without an explicit transaction.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Concurrent insert of the same name |
//! | Database (check constraint violation) | `23514` | `InvalidDocument` | quantity <= 0 reached the table |
//! | Database (other) | Any other | `Backend` | Other database errors |
//! | PoolClosed / PoolTimedOut / Io | N/A | `Unavailable` | Connection failures |
//! | Other | N/A | `Backend` | Decode errors, protocol errors, etc. |

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use tracing::{info, instrument, warn};

use stockpile_core::{ExpectedVersion, Revision};
use stockpile_inventory::{ItemName, Quantity};

use super::{COLLECTION, InventoryStore, StoreError, StoredItem};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS inventory (
    name TEXT PRIMARY KEY,
    quantity BIGINT NOT NULL CHECK (quantity > 0),
    revision BIGINT NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

/// Postgres-backed inventory collection.
///
/// `PostgresInventoryStore` is `Send + Sync` and cheap to clone; all
/// operations go through the shared SQLx connection pool.
#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: Arc<PgPool>,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect to `database_url` and make sure the `inventory` table exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Create the `inventory` table if it does not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        info!(collection = COLLECTION, "inventory schema ready");
        Ok(())
    }

    async fn insert_if_absent(
        &self,
        name: &ItemName,
        quantity: Quantity,
    ) -> Result<StoredItem, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO inventory (name, quantity, revision, updated_at)
            VALUES ($1, $2, 1, NOW())
            ON CONFLICT (name) DO NOTHING
            RETURNING name, quantity, revision, updated_at
            "#,
        )
        .bind(name.as_str())
        .bind(quantity.as_i64())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_if_absent", e))?;

        match row {
            Some(row) => decode(&row),
            None => Err(StoreError::Conflict(format!("{name}: expected absent document"))),
        }
    }

    async fn update_at_revision(
        &self,
        name: &ItemName,
        quantity: Quantity,
        revision: Revision,
    ) -> Result<StoredItem, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE inventory
            SET quantity = $2, revision = revision + 1, updated_at = NOW()
            WHERE name = $1 AND revision = $3
            RETURNING name, quantity, revision, updated_at
            "#,
        )
        .bind(name.as_str())
        .bind(quantity.as_i64())
        .bind(revision.get() as i64)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_at_revision", e))?;

        match row {
            Some(row) => decode(&row),
            None => Err(StoreError::Conflict(format!(
                "{name}: expected revision {revision}"
            ))),
        }
    }

    async fn upsert(&self, name: &ItemName, quantity: Quantity) -> Result<StoredItem, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO inventory (name, quantity, revision, updated_at)
            VALUES ($1, $2, 1, NOW())
            ON CONFLICT (name)
            DO UPDATE SET
                quantity = EXCLUDED.quantity,
                revision = inventory.revision + 1,
                updated_at = NOW()
            RETURNING name, quantity, revision, updated_at
            "#,
        )
        .bind(name.as_str())
        .bind(quantity.as_i64())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert", e))?;

        decode(&row)
    }
}

#[async_trait::async_trait]
impl InventoryStore for PostgresInventoryStore {
    #[instrument(skip(self), err)]
    async fn list_all(&self) -> Result<Vec<StoredItem>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT name, quantity, revision, updated_at
            FROM inventory
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_all", e))?;

        Ok(keep_decodable(rows.iter().map(decode)))
    }

    #[instrument(skip(self), fields(item = %name), err)]
    async fn read(&self, name: &ItemName) -> Result<Option<StoredItem>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT name, quantity, revision, updated_at
            FROM inventory
            WHERE name = $1
            "#,
        )
        .bind(name.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("read", e))?;

        row.as_ref().map(decode).transpose()
    }

    #[instrument(skip(self), fields(item = %name, quantity = %quantity), err)]
    async fn write(
        &self,
        name: &ItemName,
        quantity: Quantity,
        expected: ExpectedVersion,
    ) -> Result<StoredItem, StoreError> {
        match expected {
            ExpectedVersion::Any => self.upsert(name, quantity).await,
            ExpectedVersion::Exact(r) if r.is_absent() => self.insert_if_absent(name, quantity).await,
            ExpectedVersion::Exact(r) => self.update_at_revision(name, quantity, r).await,
        }
    }

    #[instrument(skip(self), fields(item = %name), err)]
    async fn delete(&self, name: &ItemName, expected: ExpectedVersion) -> Result<(), StoreError> {
        match expected {
            ExpectedVersion::Any => {
                sqlx::query("DELETE FROM inventory WHERE name = $1")
                    .bind(name.as_str())
                    .execute(&*self.pool)
                    .await
                    .map_err(|e| map_sqlx_error("delete", e))?;
                Ok(())
            }
            ExpectedVersion::Exact(r) if r.is_absent() => {
                // Nothing to delete; only verify the document is still absent.
                match self.read(name).await? {
                    None => Ok(()),
                    Some(doc) => Err(StoreError::Conflict(format!(
                        "{name}: expected absent document, found revision {}",
                        doc.revision
                    ))),
                }
            }
            ExpectedVersion::Exact(r) => {
                let result = sqlx::query("DELETE FROM inventory WHERE name = $1 AND revision = $2")
                    .bind(name.as_str())
                    .bind(r.get() as i64)
                    .execute(&*self.pool)
                    .await
                    .map_err(|e| map_sqlx_error("delete_at_revision", e))?;

                if result.rows_affected() == 0 {
                    return Err(StoreError::Conflict(format!("{name}: expected revision {r}")));
                }
                Ok(())
            }
        }
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23514") => StoreError::InvalidDocument(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool unavailable in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {operation}: {e}")),
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}

/// Raw `inventory` row, before domain validation.
#[derive(Debug)]
struct InventoryRow {
    name: String,
    quantity: i64,
    revision: i64,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for InventoryRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(InventoryRow {
            name: row.try_get("name")?,
            quantity: row.try_get("quantity")?,
            revision: row.try_get("revision")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<InventoryRow> for StoredItem {
    type Error = StoreError;

    fn try_from(row: InventoryRow) -> Result<Self, Self::Error> {
        let name = ItemName::parse(&row.name)
            .map_err(|e| StoreError::InvalidDocument(format!("{:?}: {e}", row.name)))?;
        let quantity = Quantity::from_signed(row.quantity)
            .map_err(|e| StoreError::InvalidDocument(format!("{name}: {e}")))?;
        let revision = u64::try_from(row.revision)
            .map(Revision::new)
            .map_err(|_| StoreError::InvalidDocument(format!("{name}: negative revision")))?;

        Ok(StoredItem {
            name,
            quantity,
            revision,
            updated_at: row.updated_at,
        })
    }
}

/// Rows that violate the inventory invariants (written by another client) are
/// logged and left out of a listing instead of failing it; single-document
/// reads still report them as `InvalidDocument`.
fn keep_decodable(rows: impl IntoIterator<Item = Result<StoredItem, StoreError>>) -> Vec<StoredItem> {
    rows.into_iter()
        .filter_map(|row| match row {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(collection = COLLECTION, error = %e, "skipping unreadable inventory document");
                None
            }
        })
        .collect()
}

fn decode(row: &sqlx::postgres::PgRow) -> Result<StoredItem, StoreError> {
    let raw = InventoryRow::from_row(row)
        .map_err(|e| StoreError::InvalidDocument(format!("failed to decode inventory row: {e}")))?;
    StoredItem::try_from(raw)
}
