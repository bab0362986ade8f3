use tracing::info;

use super::RfpLifecycleManager;
use crate::domain::proposal::ProposalSummary;
use crate::domain::rfp::RfpId;
use crate::errors::ApplicationError;

pub const NO_PROPOSALS: &str = "No proposals to compare.";

impl RfpLifecycleManager {
    /// Ranks every proposal an RFP has collected. Recomputed on each call.
    ///
    /// An RFP with no proposals, or an unknown id, yields [`NO_PROPOSALS`] and
    /// the extractor is not called.
    pub async fn compare(&self, rfp_id: &RfpId) -> Result<String, ApplicationError> {
        if self.rfps.find_by_id(rfp_id).await?.is_none() {
            return Ok(NO_PROPOSALS.to_string());
        }

        let proposals = self.proposals.list_for_rfp(rfp_id).await?;
        if proposals.is_empty() {
            return Ok(NO_PROPOSALS.to_string());
        }

        let summaries: Vec<ProposalSummary> = proposals.iter().map(ProposalSummary::from).collect();
        let analysis = self.extractor.compare(&summaries).await;

        info!(
            event_name = "rfp.compare.completed",
            rfp_id = %rfp_id,
            proposals = summaries.len(),
            "proposal comparison generated"
        );
        Ok(analysis)
    }
}
