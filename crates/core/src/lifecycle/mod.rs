//! RFP lifecycle: drafting, dispatch, response correlation and comparison.
//!
//! The manager owns RFP and proposal state. Vendors are only read, through the
//! email-address join used while correlating replies.

mod compare;
mod correlate;
mod dispatch;

use std::sync::Arc;

use tracing::info;

pub use compare::NO_PROPOSALS;
pub use correlate::CorrelationReport;
pub use dispatch::{DispatchReport, Invitation, InvitationTemplate};

use crate::domain::rfp::{Rfp, RfpDetail, RfpId, RfpStatus, RfpSummary};
use crate::errors::{ApplicationError, DomainError};
use crate::ports::{
    CascadeOutcome, MailTransport, ProposalRepository, RfpRepository, StructuredExtractor,
    VendorRepository,
};

/// Collaborators handed to [`RfpLifecycleManager::new`].
#[derive(Clone)]
pub struct LifecyclePorts {
    pub rfps: Arc<dyn RfpRepository>,
    pub vendors: Arc<dyn VendorRepository>,
    pub proposals: Arc<dyn ProposalRepository>,
    pub mail: Arc<dyn MailTransport>,
    pub extractor: Arc<dyn StructuredExtractor>,
}

#[derive(Clone)]
pub struct RfpLifecycleManager {
    rfps: Arc<dyn RfpRepository>,
    vendors: Arc<dyn VendorRepository>,
    proposals: Arc<dyn ProposalRepository>,
    mail: Arc<dyn MailTransport>,
    extractor: Arc<dyn StructuredExtractor>,
    invitation: Arc<InvitationTemplate>,
}

impl RfpLifecycleManager {
    pub fn new(ports: LifecyclePorts) -> Result<Self, ApplicationError> {
        let invitation = InvitationTemplate::load().map_err(|error| {
            ApplicationError::Configuration(format!("invitation template failed to load: {error}"))
        })?;

        Ok(Self {
            rfps: ports.rfps,
            vendors: ports.vendors,
            proposals: ports.proposals,
            mail: ports.mail,
            extractor: ports.extractor,
            invitation: Arc::new(invitation),
        })
    }

    /// Drafts an RFP from a free-text request. Extraction never fails here: a
    /// slow or broken model yields fallback structure and the draft is still stored.
    pub async fn create_rfp(&self, prompt: &str) -> Result<Rfp, ApplicationError> {
        if prompt.trim().is_empty() {
            return Err(DomainError::Validation("prompt must not be empty".to_string()).into());
        }

        let structure = self.extractor.extract_rfp(prompt).await;
        let rfp = Rfp::draft(prompt, structure);
        self.rfps.insert(rfp.clone()).await?;

        info!(
            event_name = "rfp.lifecycle.created",
            rfp_id = %rfp.id,
            title = %rfp.title,
            "rfp drafted"
        );
        Ok(rfp)
    }

    pub async fn list(&self) -> Result<Vec<RfpSummary>, ApplicationError> {
        Ok(self.rfps.list_with_counts().await?)
    }

    /// The RFP with its proposals in arrival order, or `None` when absent.
    pub async fn get(&self, id: &RfpId) -> Result<Option<RfpDetail>, ApplicationError> {
        let Some(rfp) = self.rfps.find_by_id(id).await? else {
            return Ok(None);
        };
        let proposals = self.proposals.list_for_rfp(id).await?;
        Ok(Some(RfpDetail { rfp, proposals }))
    }

    /// Moves a draft or sent RFP to `closed`. Closing twice is a no-op.
    pub async fn close(&self, id: &RfpId) -> Result<Rfp, ApplicationError> {
        loop {
            let mut rfp = self
                .rfps
                .find_by_id(id)
                .await?
                .ok_or_else(|| ApplicationError::not_found("rfp", id.0.clone()))?;

            let read_as = rfp.status;
            if !rfp.close() {
                return Ok(rfp);
            }
            if self.rfps.transition_status(&rfp.id, read_as, RfpStatus::Closed).await? {
                info!(event_name = "rfp.lifecycle.closed", rfp_id = %rfp.id, "rfp closed");
                return Ok(rfp);
            }
            // status advanced concurrently; re-read
        }
    }

    /// Deletes the RFP and all of its proposals.
    pub async fn delete(&self, id: &RfpId) -> Result<CascadeOutcome, ApplicationError> {
        let outcome = self
            .rfps
            .delete_cascade(id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("rfp", id.0.clone()))?;

        info!(
            event_name = "rfp.lifecycle.deleted",
            rfp_id = %id,
            proposals_removed = outcome.proposals_removed,
            "rfp deleted"
        );
        Ok(outcome)
    }
}
