use sqlx::sqlite::SqliteRow;

use procura_core::domain::proposal::{Proposal, ProposalId, ProposalWithVendor};
use procura_core::domain::rfp::RfpId;
use procura_core::domain::vendor::VendorId;
use procura_core::ports::{ProposalRepository, RepositoryError};

use super::vendor::row_to_vendor;
use super::{column, database_error, decode_json, encode_json, parse_timestamp, timestamp};
use crate::DbPool;

pub struct SqlProposalRepository {
    pool: DbPool,
}

impl SqlProposalRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_proposal(row: &SqliteRow) -> Result<Proposal, RepositoryError> {
    let id: String = column(row, "id")?;
    let rfp_id: String = column(row, "rfp_id")?;
    let vendor_id: String = column(row, "vendor_id")?;
    let content: String = column(row, "content")?;
    let structured_analysis: String = column(row, "structured_analysis")?;
    let score: f64 = column(row, "score")?;
    let created_at: String = column(row, "created_at")?;

    Ok(Proposal {
        id: ProposalId(id),
        rfp_id: RfpId(rfp_id),
        vendor_id: VendorId(vendor_id),
        raw_body: content,
        structured_analysis: decode_json(&structured_analysis)?,
        score,
        created_at: parse_timestamp(&created_at)?,
    })
}

#[async_trait::async_trait]
impl ProposalRepository for SqlProposalRepository {
    async fn list_for_rfp(
        &self,
        rfp_id: &RfpId,
    ) -> Result<Vec<ProposalWithVendor>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT p.id, p.rfp_id, p.vendor_id, p.content, p.structured_analysis, p.score,
                    p.created_at,
                    v.id AS v_id, v.name AS v_name, v.email AS v_email, v.tags AS v_tags,
                    v.created_at AS v_created_at
             FROM proposal p
             JOIN vendor v ON v.id = p.vendor_id
             WHERE p.rfp_id = ?
             ORDER BY p.created_at ASC, p.rowid ASC",
        )
        .bind(&rfp_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.iter()
            .map(|row| {
                Ok(ProposalWithVendor {
                    proposal: row_to_proposal(row)?,
                    vendor: row_to_vendor(row, "v_")?,
                })
            })
            .collect()
    }

    async fn exists(
        &self,
        rfp_id: &RfpId,
        vendor_id: &VendorId,
        raw_body: &str,
    ) -> Result<bool, RepositoryError> {
        let row = sqlx::query(
            "SELECT 1 FROM proposal WHERE rfp_id = ? AND vendor_id = ? AND content = ? LIMIT 1",
        )
        .bind(&rfp_id.0)
        .bind(&vendor_id.0)
        .bind(raw_body)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(row.is_some())
    }

    async fn insert_if_absent(&self, proposal: Proposal) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO proposal (id, rfp_id, vendor_id, content, structured_analysis,
                                   score, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(rfp_id, vendor_id, content) DO NOTHING",
        )
        .bind(&proposal.id.0)
        .bind(&proposal.rfp_id.0)
        .bind(&proposal.vendor_id.0)
        .bind(&proposal.raw_body)
        .bind(encode_json(&proposal.structured_analysis)?)
        .bind(proposal.score)
        .bind(timestamp(&proposal.created_at))
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected() == 1)
    }
}
