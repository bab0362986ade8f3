use async_trait::async_trait;
use tracing::{info, warn};

use procura_core::correlation::CorrelationTag;
use procura_core::ports::{InboundEmail, MailTransport, OutboundEmail, TransportError};

pub const SIMULATED_SENDER: &str = "sales@techcorp.com";

const SIMULATED_BODY: &str = "Hi there,

Thanks for the RFP. We can supply the 20 laptops you requested.
Our price is $2,200 per unit, so $44,000 total.
We can deliver in 14 days.
Warranty is 2 years included.

Pros: Fast delivery, Extended warranty.
Cons: Payment upfront required.

Best,
TechCorp Sales";

/// Transport for running without a mail relay: outbound mail goes to the log.
#[derive(Clone, Debug, Default)]
pub struct LogTransport {
    simulate_replies: bool,
}

impl LogTransport {
    pub fn new(simulate_replies: bool) -> Self {
        Self { simulate_replies }
    }
}

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, email: OutboundEmail) -> Result<(), TransportError> {
        info!(
            event_name = "mail.log.sent",
            to = %email.to,
            subject = %email.subject,
            body = %email.text,
            "outbound mail recorded (no relay configured)"
        );
        Ok(())
    }

    async fn fetch_responses(
        &self,
        tag: &CorrelationTag,
    ) -> Result<Vec<InboundEmail>, TransportError> {
        if !self.simulate_replies {
            return Ok(Vec::new());
        }

        warn!(
            event_name = "mail.log.simulated_reply",
            rfp_id = %tag.rfp_id(),
            "no relay configured, returning a simulated vendor reply"
        );
        Ok(vec![InboundEmail {
            from: SIMULATED_SENDER.to_string(),
            subject: format!("Re: Request for Proposal: Laptops {tag}"),
            body: SIMULATED_BODY.to_string(),
        }])
    }
}
