use chrono::Utc;
use sqlx::sqlite::SqliteRow;

use procura_core::domain::rfp::{ProposalCount, Rfp, RfpId, RfpStatus, RfpSummary};
use procura_core::ports::{CascadeOutcome, RepositoryError, RfpRepository};

use super::{column, database_error, decode_json, encode_json, parse_timestamp, timestamp};
use crate::DbPool;

pub struct SqlRfpRepository {
    pool: DbPool,
}

impl SqlRfpRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_rfp(row: &SqliteRow) -> Result<Rfp, RepositoryError> {
    let id: String = column(row, "id")?;
    let title: String = column(row, "title")?;
    let description: String = column(row, "description")?;
    let structured_data: String = column(row, "structured_data")?;
    let status: String = column(row, "status")?;
    let created_at: String = column(row, "created_at")?;
    let updated_at: String = column(row, "updated_at")?;

    Ok(Rfp {
        id: RfpId(id),
        title,
        description,
        structured_data: decode_json(&structured_data)?,
        status: status.parse().map_err(|e| RepositoryError::Decode(format!("{e}")))?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[async_trait::async_trait]
impl RfpRepository for SqlRfpRepository {
    async fn list_with_counts(&self) -> Result<Vec<RfpSummary>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT r.id, r.title, r.description, r.structured_data,
                    r.status, r.created_at, r.updated_at,
                    (SELECT COUNT(*) FROM proposal p WHERE p.rfp_id = r.id) AS proposal_count
             FROM rfp r
             ORDER BY r.created_at DESC, r.rowid DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.iter()
            .map(|row| {
                let proposals: i64 = column(row, "proposal_count")?;
                Ok(RfpSummary {
                    rfp: row_to_rfp(row)?,
                    count: ProposalCount { proposals: u64::try_from(proposals).unwrap_or(0) },
                })
            })
            .collect()
    }

    async fn find_by_id(&self, id: &RfpId) -> Result<Option<Rfp>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, title, description, structured_data,
                    status, created_at, updated_at
             FROM rfp WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.as_ref().map(row_to_rfp).transpose()
    }

    async fn insert(&self, rfp: Rfp) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO rfp (id, title, description, structured_data, status, created_at,
                              updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&rfp.id.0)
        .bind(&rfp.title)
        .bind(&rfp.description)
        .bind(encode_json(&rfp.structured_data)?)
        .bind(rfp.status.as_str())
        .bind(timestamp(&rfp.created_at))
        .bind(timestamp(&rfp.updated_at))
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(())
    }

    async fn transition_status(
        &self,
        id: &RfpId,
        from: RfpStatus,
        to: RfpStatus,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("UPDATE rfp SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
                .bind(to.as_str())
                .bind(timestamp(&Utc::now()))
                .bind(&id.0)
                .bind(from.as_str())
                .execute(&self.pool)
                .await
                .map_err(database_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_cascade(&self, id: &RfpId) -> Result<Option<CascadeOutcome>, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        let proposals = sqlx::query("DELETE FROM proposal WHERE rfp_id = ?")
            .bind(&id.0)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;
        let rfps = sqlx::query("DELETE FROM rfp WHERE id = ?")
            .bind(&id.0)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;

        if rfps.rows_affected() == 0 {
            tx.rollback().await.map_err(database_error)?;
            return Ok(None);
        }

        tx.commit().await.map_err(database_error)?;
        Ok(Some(CascadeOutcome { proposals_removed: proposals.rows_affected() }))
    }
}
