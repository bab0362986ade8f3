use sqlx::sqlite::SqliteRow;

use procura_core::domain::vendor::{Vendor, VendorId};
use procura_core::ports::{CascadeOutcome, RepositoryError, VendorRepository};

use super::{column, database_error, parse_timestamp, timestamp};
use crate::DbPool;

const VENDOR_COLUMNS: &str = "id, name, email, tags, created_at";

pub struct SqlVendorRepository {
    pool: DbPool,
}

impl SqlVendorRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Decodes vendor columns, optionally aliased with `prefix` in joined queries.
pub(crate) fn row_to_vendor(row: &SqliteRow, prefix: &str) -> Result<Vendor, RepositoryError> {
    let id: String = column(row, &format!("{prefix}id"))?;
    let name: String = column(row, &format!("{prefix}name"))?;
    let email: String = column(row, &format!("{prefix}email"))?;
    let tags: Option<String> = column(row, &format!("{prefix}tags"))?;
    let created_at: String = column(row, &format!("{prefix}created_at"))?;

    Ok(Vendor {
        id: VendorId(id),
        name,
        email,
        tags,
        created_at: parse_timestamp(&created_at)?,
    })
}

#[async_trait::async_trait]
impl VendorRepository for SqlVendorRepository {
    async fn list(&self) -> Result<Vec<Vendor>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {VENDOR_COLUMNS} FROM vendor ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.iter().map(|row| row_to_vendor(row, "")).collect()
    }

    async fn find_by_id(&self, id: &VendorId) -> Result<Option<Vendor>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {VENDOR_COLUMNS} FROM vendor WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        row.as_ref().map(|row| row_to_vendor(row, "")).transpose()
    }

    async fn find_by_ids(&self, ids: &[VendorId]) -> Result<Vec<Vendor>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {VENDOR_COLUMNS} FROM vendor WHERE id IN ({placeholders})
             ORDER BY created_at ASC, rowid ASC"
        );
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(&id.0);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(database_error)?;

        rows.iter().map(|row| row_to_vendor(row, "")).collect()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Vendor>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {VENDOR_COLUMNS} FROM vendor WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        row.as_ref().map(|row| row_to_vendor(row, "")).transpose()
    }

    async fn insert(&self, vendor: Vendor) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO vendor (id, name, email, tags, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&vendor.id.0)
        .bind(&vendor.name)
        .bind(&vendor.email)
        .bind(&vendor.tags)
        .bind(timestamp(&vendor.created_at))
        .execute(&self.pool)
        .await
        .map_err(|error| match database_error(error) {
            RepositoryError::Conflict(_) => RepositoryError::Conflict(format!(
                "vendor email `{}` is already registered",
                vendor.email
            )),
            other => other,
        })?;

        Ok(())
    }

    async fn delete_cascade(
        &self,
        id: &VendorId,
    ) -> Result<Option<CascadeOutcome>, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        let proposals = sqlx::query("DELETE FROM proposal WHERE vendor_id = ?")
            .bind(&id.0)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;
        let vendors = sqlx::query("DELETE FROM vendor WHERE id = ?")
            .bind(&id.0)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;

        if vendors.rows_affected() == 0 {
            tx.rollback().await.map_err(database_error)?;
            return Ok(None);
        }

        tx.commit().await.map_err(database_error)?;
        Ok(Some(CascadeOutcome { proposals_removed: proposals.rows_affected() }))
    }
}
