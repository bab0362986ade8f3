use tracing::{debug, error, info, warn};

use super::RfpLifecycleManager;
use crate::correlation::CorrelationTag;
use crate::domain::proposal::Proposal;
use crate::domain::rfp::{Rfp, RfpId};
use crate::errors::ApplicationError;
use crate::ports::{ExtractionError, InboundEmail, RepositoryError};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CorrelationReport {
    pub count: usize,
    pub proposals: Vec<Proposal>,
}

/// Why a fetched message did not become a proposal.
#[derive(Debug)]
enum Skip {
    Untagged,
    UnknownSender,
    Duplicate,
    Extraction(ExtractionError),
    EmptyAnalysis,
    Lost,
    Repository(RepositoryError),
}

impl From<RepositoryError> for Skip {
    fn from(value: RepositoryError) -> Self {
        Self::Repository(value)
    }
}

impl RfpLifecycleManager {
    /// Scans the mailbox for replies tagged with this RFP and records each new one.
    ///
    /// Only a mailbox failure aborts the pass. Every message is its own unit of
    /// work: skips and per-message failures are logged and never undo proposals
    /// already stored earlier in the pass.
    pub async fn check_responses(
        &self,
        rfp_id: &RfpId,
    ) -> Result<CorrelationReport, ApplicationError> {
        let rfp = self
            .rfps
            .find_by_id(rfp_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("rfp", rfp_id.0.clone()))?;
        let tag = rfp.correlation_tag();

        let messages = self.mail.fetch_responses(&tag).await.map_err(|error| {
            error!(
                event_name = "rfp.correlate.fetch_failed",
                rfp_id = %rfp.id,
                error = %error,
                "mailbox fetch failed"
            );
            ApplicationError::from(error)
        })?;
        let fetched = messages.len();

        let mut proposals = Vec::new();
        for message in messages {
            match self.correlate_one(&rfp, &tag, &message).await {
                Ok(proposal) => {
                    info!(
                        event_name = "rfp.correlate.proposal_created",
                        rfp_id = %rfp.id,
                        vendor_id = %proposal.vendor_id,
                        proposal_id = %proposal.id,
                        "proposal recorded from vendor reply"
                    );
                    proposals.push(proposal);
                }
                Err(skip) => log_skip(&rfp, &message, skip),
            }
        }

        info!(
            event_name = "rfp.correlate.completed",
            rfp_id = %rfp.id,
            fetched,
            created = proposals.len(),
            "response correlation pass finished"
        );
        Ok(CorrelationReport { count: proposals.len(), proposals })
    }

    async fn correlate_one(
        &self,
        rfp: &Rfp,
        tag: &CorrelationTag,
        message: &InboundEmail,
    ) -> Result<Proposal, Skip> {
        if !tag.matches(&message.subject) {
            return Err(Skip::Untagged);
        }

        let vendor = self.vendors.find_by_email(&message.from).await?.ok_or(Skip::UnknownSender)?;

        if self.proposals.exists(&rfp.id, &vendor.id, &message.body).await? {
            return Err(Skip::Duplicate);
        }

        let analysis =
            self.extractor.analyze_proposal(&message.body).await.map_err(Skip::Extraction)?;
        if analysis.is_empty() {
            return Err(Skip::EmptyAnalysis);
        }

        let proposal = Proposal::record(rfp.id.clone(), vendor.id, message.body.clone(), analysis);
        if !self.proposals.insert_if_absent(proposal.clone()).await? {
            return Err(Skip::Lost);
        }
        Ok(proposal)
    }
}

fn log_skip(rfp: &Rfp, message: &InboundEmail, skip: Skip) {
    match skip {
        Skip::Untagged => warn!(
            event_name = "rfp.correlate.untagged_skipped",
            rfp_id = %rfp.id,
            subject = %message.subject,
            "reply subject lacks the exact correlation tag"
        ),
        Skip::UnknownSender => warn!(
            event_name = "rfp.correlate.unknown_sender_skipped",
            rfp_id = %rfp.id,
            sender = %message.from,
            "reply from an address with no registered vendor"
        ),
        Skip::Duplicate => debug!(
            event_name = "rfp.correlate.duplicate_skipped",
            rfp_id = %rfp.id,
            sender = %message.from,
            "reply already recorded"
        ),
        Skip::Lost => debug!(
            event_name = "rfp.correlate.concurrent_duplicate_skipped",
            rfp_id = %rfp.id,
            sender = %message.from,
            "reply recorded by a concurrent pass"
        ),
        Skip::Extraction(error) => warn!(
            event_name = "rfp.correlate.extraction_skipped",
            rfp_id = %rfp.id,
            sender = %message.from,
            error = %error,
            "proposal analysis failed"
        ),
        Skip::EmptyAnalysis => warn!(
            event_name = "rfp.correlate.extraction_skipped",
            rfp_id = %rfp.id,
            sender = %message.from,
            error = %ExtractionError::Empty,
            "proposal analysis came back empty"
        ),
        Skip::Repository(error) => warn!(
            event_name = "rfp.correlate.storage_skipped",
            rfp_id = %rfp.id,
            sender = %message.from,
            error = %error,
            "storage failure while correlating reply"
        ),
    }
}
