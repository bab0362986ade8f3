use std::fmt;

use crate::domain::rfp::RfpId;

/// Subject-line marker that ties a vendor reply back to the RFP it answers.
///
/// Renders as `[RFP #<id>]`. Matching is an exact, case-sensitive substring test:
/// mailbox searches are usually case-insensitive, so every fetched subject is
/// re-checked here before a reply is accepted.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CorrelationTag {
    rfp_id: RfpId,
    rendered: String,
}

impl CorrelationTag {
    pub fn for_rfp(id: &RfpId) -> Self {
        Self { rfp_id: id.clone(), rendered: format!("[RFP #{}]", id.0) }
    }

    pub fn rfp_id(&self) -> &RfpId {
        &self.rfp_id
    }

    pub fn as_str(&self) -> &str {
        &self.rendered
    }

    pub fn matches(&self, subject: &str) -> bool {
        subject.contains(&self.rendered)
    }
}

impl fmt::Display for CorrelationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::CorrelationTag;
    use crate::domain::rfp::RfpId;

    #[test]
    fn tag_renders_bracketed_id() {
        let tag = CorrelationTag::for_rfp(&RfpId("abc-123".to_string()));
        assert_eq!(tag.as_str(), "[RFP #abc-123]");
    }

    #[test]
    fn reply_prefixes_still_match() {
        let tag = CorrelationTag::for_rfp(&RfpId("abc-123".to_string()));
        assert!(tag.matches("Re: Request for Proposal: Laptops [RFP #abc-123]"));
        assert!(tag.matches("FW: re: [RFP #abc-123] quote attached"));
    }

    #[test]
    fn match_is_case_sensitive_and_exact() {
        let tag = CorrelationTag::for_rfp(&RfpId("abc-123".to_string()));
        assert!(!tag.matches("Re: [rfp #abc-123]"));
        assert!(!tag.matches("Re: [RFP #ABC-123]"));
        assert!(!tag.matches("Re: [RFP #abc-1234]"));
        assert!(!tag.matches("Re: Laptops"));
    }
}
