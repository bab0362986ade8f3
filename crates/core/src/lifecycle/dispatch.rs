use rust_decimal::Decimal;
use tera::{Context, Tera};
use tracing::{info, warn};

use super::RfpLifecycleManager;
use crate::domain::rfp::{Rfp, RfpId, RfpStatus};
use crate::domain::structured::RfpItem;
use crate::domain::vendor::{Vendor, VendorId};
use crate::errors::ApplicationError;
use crate::ports::OutboundEmail;

const INVITATION: &str = "rfp_invitation.txt";

/// Outcome of a send call. `count` is the number of vendors a send was attempted for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchReport {
    pub count: usize,
    pub delivered: usize,
}

/// Plain-text invitation, rendered once per send.
#[derive(Clone, Debug)]
pub struct InvitationTemplate {
    tera: Tera,
}

/// A rendered invitation. Addressing it to a vendor cannot fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invitation {
    pub subject: String,
    pub body: String,
}

impl Invitation {
    pub fn address(&self, vendor: &Vendor) -> OutboundEmail {
        OutboundEmail {
            to: vendor.email.clone(),
            subject: self.subject.clone(),
            text: format!("Dear {},\n\n{}", vendor.name, self.body),
        }
    }
}

impl InvitationTemplate {
    pub fn load() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_template(
            INVITATION,
            include_str!("../../../../templates/rfp_invitation.txt"),
        )?;
        Ok(Self { tera })
    }

    pub fn render(&self, rfp: &Rfp) -> Result<Invitation, tera::Error> {
        let structure = &rfp.structured_data;
        let tag = rfp.correlation_tag();
        let item_lines = match structure.items.as_deref() {
            Some(items) if !items.is_empty() => items.iter().map(item_line).collect(),
            _ => vec!["See description.".to_string()],
        };
        let budget = structure.budget.map(format_budget).unwrap_or_else(|| "Negotiable".into());
        let delivery = structure
            .delivery_date
            .as_deref()
            .or_else(|| structure.extra_text("dueDate"))
            .unwrap_or("ASAP");

        let mut context = Context::new();
        context.insert("title", &rfp.title);
        context.insert("overview", &rfp.description);
        context.insert("item_lines", &item_lines);
        context.insert("budget", &budget);
        context.insert("delivery", delivery);
        context.insert("terms", structure.terms.as_deref().unwrap_or_default());
        context.insert("tag", tag.as_str());

        Ok(Invitation {
            subject: format!("Request for Proposal: {} {}", rfp.title, tag),
            body: self.tera.render(INVITATION, &context)?,
        })
    }
}

fn item_line(item: &RfpItem) -> String {
    let mut line = String::from("- ");
    if let Some(quantity) = item.quantity {
        line.push_str(&format!("{quantity}x "));
    }
    line.push_str(&item.name);
    if let Some(specs) = item.specs.as_deref() {
        line.push_str(&format!(" ({specs})"));
    }
    line
}

/// `50000` renders as `$50,000`; fractional digits are kept as-is.
fn format_budget(amount: Decimal) -> String {
    let normalized = amount.normalize().to_string();
    let (sign, unsigned) = match normalized.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", normalized.as_str()),
    };
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(fraction) => format!("{sign}${grouped}.{fraction}"),
        None => format!("{sign}${grouped}"),
    }
}

impl RfpLifecycleManager {
    /// Best-effort fan-out of the invitation to every resolvable vendor.
    ///
    /// Unknown vendor ids are skipped. A failed send is logged and the loop moves
    /// on; the RFP is marked sent afterwards regardless of individual outcomes,
    /// unless its status moved while the invitations were going out.
    pub async fn send(
        &self,
        rfp_id: &RfpId,
        vendor_ids: &[VendorId],
    ) -> Result<DispatchReport, ApplicationError> {
        let mut rfp = self
            .rfps
            .find_by_id(rfp_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("rfp", rfp_id.0.clone()))?;
        let vendors = self.vendors.find_by_ids(vendor_ids).await?;
        let invitation = self.invitation.render(&rfp).map_err(|error| {
            ApplicationError::Configuration(format!("invitation template failed: {error}"))
        })?;

        let mut delivered = 0;
        for vendor in &vendors {
            match self.mail.send(invitation.address(vendor)).await {
                Ok(()) => delivered += 1,
                Err(error) => warn!(
                    event_name = "rfp.send.vendor_failed",
                    rfp_id = %rfp.id,
                    vendor_id = %vendor.id,
                    error = %error,
                    "failed to send rfp invitation"
                ),
            }
        }

        let read_as = rfp.status;
        if rfp.mark_sent()
            && !self.rfps.transition_status(&rfp.id, read_as, RfpStatus::Sent).await?
        {
            // closed or deleted during the fan-out; the stored status stands
            if let Some(current) = self.rfps.find_by_id(&rfp.id).await? {
                rfp = current;
            }
        }

        info!(
            event_name = "rfp.send.completed",
            rfp_id = %rfp.id,
            attempted = vendors.len(),
            delivered,
            status = %rfp.status,
            "rfp invitations dispatched"
        );
        Ok(DispatchReport { count: vendors.len(), delivered })
    }
}
