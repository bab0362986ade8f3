use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::rfp::RfpId;
use crate::domain::structured::ProposalAnalysis;
use crate::domain::vendor::{Vendor, VendorId};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProposalId(pub String);

impl ProposalId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A vendor reply to one RFP. Immutable once recorded; `(rfp_id, vendor_id,
/// raw_body)` is unique.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: ProposalId,
    pub rfp_id: RfpId,
    pub vendor_id: VendorId,
    #[serde(rename = "content")]
    pub raw_body: String,
    pub structured_analysis: ProposalAnalysis,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

impl Proposal {
    pub fn record(
        rfp_id: RfpId,
        vendor_id: VendorId,
        raw_body: impl Into<String>,
        structured_analysis: ProposalAnalysis,
    ) -> Self {
        Self {
            id: ProposalId::generate(),
            rfp_id,
            vendor_id,
            raw_body: raw_body.into(),
            structured_analysis,
            score: 0.0,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProposalWithVendor {
    #[serde(flatten)]
    pub proposal: Proposal,
    pub vendor: Vendor,
}

/// One row of input to the ranking call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProposalSummary {
    pub vendor: String,
    pub data: ProposalAnalysis,
}

impl From<&ProposalWithVendor> for ProposalSummary {
    fn from(value: &ProposalWithVendor) -> Self {
        Self {
            vendor: value.vendor.name.clone(),
            data: value.proposal.structured_analysis.clone(),
        }
    }
}
