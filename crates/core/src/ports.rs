//! Seams between the procurement workflow and the outside world.
//!
//! Persistence, mail and structured extraction are all reached through these
//! traits so the lifecycle can run against SQLite, an HTTP relay and a hosted
//! model in production, and against in-memory doubles in tests.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::correlation::CorrelationTag;
use crate::domain::proposal::{Proposal, ProposalSummary, ProposalWithVendor};
use crate::domain::rfp::{Rfp, RfpId, RfpStatus, RfpSummary};
use crate::domain::structured::{ProposalAnalysis, RfpStructure};
use crate::domain::vendor::{Vendor, VendorId};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Rows removed alongside a parent record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CascadeOutcome {
    pub proposals_removed: u64,
}

#[async_trait]
pub trait VendorRepository: Send + Sync {
    /// All vendors, newest first.
    async fn list(&self) -> Result<Vec<Vendor>, RepositoryError>;
    async fn find_by_id(&self, id: &VendorId) -> Result<Option<Vendor>, RepositoryError>;
    /// Resolves the ids that exist; unknown ids are silently absent from the result.
    async fn find_by_ids(&self, ids: &[VendorId]) -> Result<Vec<Vendor>, RepositoryError>;
    /// Exact, case-sensitive address lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<Vendor>, RepositoryError>;
    /// Fails with [`RepositoryError::Conflict`] when the email is already registered.
    async fn insert(&self, vendor: Vendor) -> Result<(), RepositoryError>;
    /// Removes the vendor and every proposal it submitted. `None` when absent.
    async fn delete_cascade(&self, id: &VendorId)
        -> Result<Option<CascadeOutcome>, RepositoryError>;
}

#[async_trait]
pub trait RfpRepository: Send + Sync {
    /// All RFPs, newest first, with their proposal counts.
    async fn list_with_counts(&self) -> Result<Vec<RfpSummary>, RepositoryError>;
    async fn find_by_id(&self, id: &RfpId) -> Result<Option<Rfp>, RepositoryError>;
    async fn insert(&self, rfp: Rfp) -> Result<(), RepositoryError>;
    /// Moves the RFP to `to` only while it is still in `from`. Returns whether a row changed.
    async fn transition_status(
        &self,
        id: &RfpId,
        from: RfpStatus,
        to: RfpStatus,
    ) -> Result<bool, RepositoryError>;
    async fn delete_cascade(&self, id: &RfpId) -> Result<Option<CascadeOutcome>, RepositoryError>;
}

#[async_trait]
pub trait ProposalRepository: Send + Sync {
    /// Proposals for one RFP in arrival order, each joined with its vendor.
    async fn list_for_rfp(&self, rfp_id: &RfpId)
        -> Result<Vec<ProposalWithVendor>, RepositoryError>;
    async fn exists(
        &self,
        rfp_id: &RfpId,
        vendor_id: &VendorId,
        raw_body: &str,
    ) -> Result<bool, RepositoryError>;
    /// Inserts unless an identical `(rfp, vendor, body)` row is already stored.
    /// Returns whether a row was written.
    async fn insert_if_absent(&self, proposal: Proposal) -> Result<bool, RepositoryError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEmail {
    pub from: String,
    pub subject: String,
    pub body: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("mail service unavailable: {0}")]
    Unavailable(String),
    #[error("mail service rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("mail service returned malformed payload: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<(), TransportError>;
    /// Messages whose subject carries the tag. Implementations may match loosely;
    /// callers re-check each subject with [`CorrelationTag::matches`].
    async fn fetch_responses(
        &self,
        tag: &CorrelationTag,
    ) -> Result<Vec<InboundEmail>, TransportError>;
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("extraction exceeded its {budget:?} budget")]
    Timeout { budget: Duration },
    #[error("extraction upstream failed: {0}")]
    Upstream(String),
    #[error("extraction returned malformed output: {0}")]
    Malformed(String),
    #[error("extraction returned no content")]
    Empty,
}

/// Turns free text into typed structures. RFP extraction and comparison degrade
/// to fallback values on failure; proposal analysis reports the error so the
/// caller can skip the message.
#[async_trait]
pub trait StructuredExtractor: Send + Sync {
    async fn extract_rfp(&self, prompt: &str) -> RfpStructure;
    async fn analyze_proposal(&self, body: &str) -> Result<ProposalAnalysis, ExtractionError>;
    async fn compare(&self, proposals: &[ProposalSummary]) -> String;
}
