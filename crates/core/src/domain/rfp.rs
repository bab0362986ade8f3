use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::correlation::CorrelationTag;
use crate::domain::proposal::ProposalWithVendor;
use crate::domain::structured::RfpStructure;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RfpId(pub String);

impl RfpId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for RfpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RfpStatus {
    Draft,
    Sent,
    Closed,
}

impl RfpStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for RfpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RfpStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "draft" => Ok(Self::Draft),
            "sent" => Ok(Self::Sent),
            "closed" => Ok(Self::Closed),
            other => Err(DomainError::Validation(format!("unknown rfp status `{other}`"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rfp {
    pub id: RfpId,
    pub title: String,
    /// The free-text request the RFP was drafted from, verbatim.
    pub description: String,
    pub structured_data: RfpStructure,
    pub status: RfpStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rfp {
    pub const UNTITLED: &'static str = "Untitled RFP";

    /// Builds a draft from the free-text request and whatever extraction produced.
    pub fn draft(prompt: impl Into<String>, structured_data: RfpStructure) -> Self {
        let now = Utc::now();
        let title = structured_data
            .title
            .clone()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| Self::UNTITLED.to_string());

        Self {
            id: RfpId::generate(),
            title,
            description: prompt.into(),
            structured_data,
            status: RfpStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn correlation_tag(&self) -> CorrelationTag {
        CorrelationTag::for_rfp(&self.id)
    }

    pub fn can_transition_to(&self, next: RfpStatus) -> bool {
        matches!(
            (self.status, next),
            (RfpStatus::Draft, RfpStatus::Sent)
                | (RfpStatus::Draft, RfpStatus::Closed)
                | (RfpStatus::Sent, RfpStatus::Closed)
        )
    }

    pub fn transition_to(&mut self, next: RfpStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            self.updated_at = Utc::now();
            return Ok(());
        }

        Err(DomainError::InvalidRfpTransition { from: self.status, to: next })
    }

    /// Records a dispatch. Re-sending keeps `sent`, and a closed RFP stays closed.
    /// Returns whether the status changed.
    pub fn mark_sent(&mut self) -> bool {
        self.transition_to(RfpStatus::Sent).is_ok()
    }

    /// Closing is idempotent. Returns whether the status changed.
    pub fn close(&mut self) -> bool {
        self.transition_to(RfpStatus::Closed).is_ok()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalCount {
    pub proposals: u64,
}

/// List row: an RFP plus how many proposals it has collected.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RfpSummary {
    #[serde(flatten)]
    pub rfp: Rfp,
    #[serde(rename = "_count")]
    pub count: ProposalCount,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RfpDetail {
    #[serde(flatten)]
    pub rfp: Rfp,
    pub proposals: Vec<ProposalWithVendor>,
}
