pub mod config;
pub mod correlation;
pub mod directory;
pub mod domain;
pub mod errors;
pub mod lifecycle;
pub mod ports;

pub use config::AppConfig;
pub use correlation::CorrelationTag;
pub use directory::VendorDirectory;
pub use domain::proposal::{Proposal, ProposalId, ProposalSummary, ProposalWithVendor};
pub use domain::rfp::{Rfp, RfpDetail, RfpId, RfpStatus, RfpSummary};
pub use domain::structured::{ProposalAnalysis, RfpItem, RfpStructure};
pub use domain::vendor::{NewVendor, Vendor, VendorId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use lifecycle::{CorrelationReport, DispatchReport, LifecyclePorts, RfpLifecycleManager};
pub use ports::{
    CascadeOutcome, ExtractionError, InboundEmail, MailTransport, OutboundEmail,
    ProposalRepository, RepositoryError, RfpRepository, StructuredExtractor, TransportError,
    VendorRepository,
};
