//! Mail transport adapters for RFP dispatch and reply collection.
//!
//! - `relay` - HTTP client for a mail relay that fronts SMTP and IMAP
//! - `log` - records outbound mail in the log, optionally simulating a reply
//! - `memory` - in-process mailbox for tests

use std::sync::Arc;

use procura_core::config::MailConfig;
use procura_core::ports::{MailTransport, TransportError};

pub mod log;
pub mod memory;
pub mod relay;

pub use log::LogTransport;
pub use memory::InMemoryMailbox;
pub use relay::HttpRelayTransport;

/// Picks the relay when one is configured, the log transport otherwise.
pub fn transport_from_config(
    config: &MailConfig,
) -> Result<(Arc<dyn MailTransport>, &'static str), TransportError> {
    match config.relay_url.as_deref().map(str::trim).filter(|url| !url.is_empty()) {
        Some(url) => Ok((Arc::new(HttpRelayTransport::new(url, config.timeout_secs)?), "http_relay")),
        None => Ok((Arc::new(LogTransport::new(config.simulate_replies)), "log")),
    }
}
