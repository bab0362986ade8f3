use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::{Barrier, Notify};

use procura_agent::{ChatRequest, ExtractionBackend, ExtractionService, LlmClient, LlmError};
use procura_core::correlation::CorrelationTag;
use procura_core::directory::VendorDirectory;
use procura_core::domain::proposal::ProposalSummary;
use procura_core::domain::rfp::{RfpId, RfpStatus};
use procura_core::domain::structured::{parse_amount, ProposalAnalysis, RfpStructure};
use procura_core::domain::vendor::{NewVendor, Vendor, VendorId};
use procura_core::errors::ApplicationError;
use procura_core::lifecycle::{LifecyclePorts, RfpLifecycleManager, NO_PROPOSALS};
use procura_core::ports::{
    ExtractionError, InboundEmail, MailTransport, OutboundEmail, StructuredExtractor,
    TransportError,
};
use procura_db::{
    connect_with_settings, migrations, DbPool, SqlProposalRepository, SqlRfpRepository,
    SqlVendorRepository,
};
use procura_mail::InMemoryMailbox;

/// Deterministic extractor: prices come from the first amount in the body and a
/// body containing "garbled" fails analysis.
#[derive(Default)]
struct ScriptedExtractor {
    analyze_calls: AtomicUsize,
    compare_calls: AtomicUsize,
}

#[async_trait]
impl StructuredExtractor for ScriptedExtractor {
    async fn extract_rfp(&self, prompt: &str) -> RfpStructure {
        RfpStructure {
            title: Some(format!("Request: {prompt}")),
            description: Some(prompt.to_string()),
            ..RfpStructure::default()
        }
    }

    async fn analyze_proposal(&self, body: &str) -> Result<ProposalAnalysis, ExtractionError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        if body.contains("garbled") {
            return Err(ExtractionError::Malformed("not json".to_string()));
        }
        Ok(ProposalAnalysis { price: parse_amount(body), ..ProposalAnalysis::default() })
    }

    async fn compare(&self, proposals: &[ProposalSummary]) -> String {
        self.compare_calls.fetch_add(1, Ordering::SeqCst);
        format!("ranked {} proposals", proposals.len())
    }
}

struct Harness {
    pool: DbPool,
    lifecycle: RfpLifecycleManager,
    directory: VendorDirectory,
    mailbox: Arc<InMemoryMailbox>,
    extractor: Arc<ScriptedExtractor>,
}

async fn harness() -> Harness {
    let extractor = Arc::new(ScriptedExtractor::default());
    let (pool, lifecycle, directory, mailbox) = wire(extractor.clone()).await;
    Harness { pool, lifecycle, directory, mailbox, extractor }
}

async fn wire(
    extractor: Arc<dyn StructuredExtractor>,
) -> (DbPool, RfpLifecycleManager, VendorDirectory, Arc<InMemoryMailbox>) {
    let mailbox = Arc::new(InMemoryMailbox::default());
    let (pool, lifecycle, directory) = wire_with_mail(extractor, mailbox.clone()).await;
    (pool, lifecycle, directory, mailbox)
}

async fn wire_with_mail(
    extractor: Arc<dyn StructuredExtractor>,
    mail: Arc<dyn MailTransport>,
) -> (DbPool, RfpLifecycleManager, VendorDirectory) {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");

    let vendors = Arc::new(SqlVendorRepository::new(pool.clone()));
    let lifecycle = RfpLifecycleManager::new(LifecyclePorts {
        rfps: Arc::new(SqlRfpRepository::new(pool.clone())),
        vendors: vendors.clone(),
        proposals: Arc::new(SqlProposalRepository::new(pool.clone())),
        mail,
        extractor,
    })
    .expect("lifecycle");

    (pool, lifecycle, VendorDirectory::new(vendors))
}

async fn register(harness: &Harness, name: &str, email: &str) -> Vendor {
    harness
        .directory
        .create(NewVendor { name: name.to_string(), email: email.to_string(), tags: None })
        .await
        .expect("vendor")
}

fn reply(from: &str, subject: String, body: &str) -> InboundEmail {
    InboundEmail { from: from.to_string(), subject, body: body.to_string() }
}

async fn status_of(lifecycle: &RfpLifecycleManager, id: &RfpId) -> RfpStatus {
    lifecycle.get(id).await.expect("get").expect("rfp exists").rfp.status
}

#[tokio::test]
async fn tagged_reply_becomes_one_proposal_and_rescans_add_nothing() {
    let h = harness().await;
    let vendor = register(&h, "TechCorp", "techcorp@example.com").await;
    let rfp = h.lifecycle.create_rfp("20 laptops").await.expect("create");
    assert_eq!(rfp.status, RfpStatus::Draft);

    let report = h.lifecycle.send(&rfp.id, &[vendor.id.clone()]).await.expect("send");
    assert_eq!(report.count, 1);
    let sent = h.mailbox.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "techcorp@example.com");
    let tag = format!("[RFP #{}]", rfp.id);
    assert!(sent[0].subject.ends_with(&tag));

    h.mailbox
        .deliver(reply(
            "techcorp@example.com",
            format!("Re: Request for Proposal {tag}"),
            "price $44000, 14 days, 2yr warranty",
        ))
        .await;

    let first = h.lifecycle.check_responses(&rfp.id).await.expect("first pass");
    assert_eq!(first.count, 1);
    assert_eq!(first.proposals[0].vendor_id, vendor.id);
    assert_eq!(first.proposals[0].structured_analysis.price, Some(Decimal::from(44_000)));

    let second = h.lifecycle.check_responses(&rfp.id).await.expect("second pass");
    assert_eq!(second.count, 0);

    let detail = h.lifecycle.get(&rfp.id).await.expect("get").expect("rfp exists");
    assert_eq!(detail.rfp.status, RfpStatus::Sent);
    assert_eq!(detail.proposals.len(), 1);
    assert_eq!(detail.proposals[0].vendor.email, "techcorp@example.com");
    assert_eq!(h.extractor.analyze_calls.load(Ordering::SeqCst), 1, "duplicates skip extraction");
}

#[tokio::test]
async fn unknown_senders_and_inexact_tags_never_produce_proposals() {
    let h = harness().await;
    register(&h, "TechCorp", "techcorp@example.com").await;
    let rfp = h.lifecycle.create_rfp("monitors").await.expect("create");
    let tag = format!("[RFP #{}]", rfp.id);

    h.mailbox.deliver(reply("stranger@example.com", format!("Re: {tag}"), "price $10")).await;
    h.mailbox
        .deliver(reply("techcorp@example.com", format!("Re: {}", tag.to_lowercase()), "price $20"))
        .await;
    h.mailbox
        .deliver(reply("techcorp@example.com", format!("Re: {}", tag.to_uppercase()), "price $30"))
        .await;

    let report = h.lifecycle.check_responses(&rfp.id).await.expect("pass");
    assert_eq!(report.count, 0);
    assert_eq!(h.extractor.analyze_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn identical_bodies_from_one_vendor_collapse_to_one_proposal() {
    let h = harness().await;
    let vendor = register(&h, "TechCorp", "techcorp@example.com").await;
    let other = register(&h, "Globex", "bids@globex.example").await;
    let rfp = h.lifecycle.create_rfp("chairs").await.expect("create");
    let tag = format!("[RFP #{}]", rfp.id);

    h.mailbox.deliver(reply(&vendor.email, format!("Re: {tag}"), "price $900")).await;
    h.mailbox.deliver(reply(&vendor.email, format!("Fwd: {tag}"), "price $900")).await;
    h.mailbox.deliver(reply(&vendor.email, format!("Re: {tag}"), "price $900 ")).await;
    h.mailbox.deliver(reply(&other.email, format!("Re: {tag}"), "price $900")).await;

    let report = h.lifecycle.check_responses(&rfp.id).await.expect("pass");

    // Dedup compares the exact body, so trailing whitespace counts as new text.
    assert_eq!(report.count, 3);
    let detail = h.lifecycle.get(&rfp.id).await.expect("get").expect("rfp");
    assert_eq!(detail.proposals.iter().filter(|p| p.vendor.id == vendor.id).count(), 2);
}

#[tokio::test]
async fn extraction_failure_skips_only_that_message() {
    let h = harness().await;
    let first = register(&h, "TechCorp", "techcorp@example.com").await;
    let second = register(&h, "Globex", "bids@globex.example").await;
    let rfp = h.lifecycle.create_rfp("desks").await.expect("create");
    let tag = format!("[RFP #{}]", rfp.id);

    h.mailbox.deliver(reply(&first.email, format!("Re: {tag}"), "garbled attachment")).await;
    h.mailbox.deliver(reply(&second.email, format!("Re: {tag}"), "price $1,250")).await;

    let report = h.lifecycle.check_responses(&rfp.id).await.expect("pass");
    assert_eq!(report.count, 1);
    assert_eq!(report.proposals[0].vendor_id, second.id);
    assert_eq!(report.proposals[0].structured_analysis.price, Some(Decimal::from(1_250)));
}

#[tokio::test]
async fn mailbox_failure_aborts_the_pass() {
    let h = harness().await;
    let rfp = h.lifecycle.create_rfp("servers").await.expect("create");
    h.mailbox.fail_fetches(Some("imap connection refused".to_string())).await;

    let error = h.lifecycle.check_responses(&rfp.id).await.expect_err("fetch fails");
    assert!(matches!(error, ApplicationError::UpstreamUnavailable(_)));
}

#[tokio::test]
async fn failed_vendor_send_does_not_block_the_rest() {
    let h = harness().await;
    let up = register(&h, "TechCorp", "techcorp@example.com").await;
    let down = register(&h, "Globex", "bids@globex.example").await;
    h.mailbox.fail_sends_to("bids@globex.example").await;
    let rfp = h.lifecycle.create_rfp("routers").await.expect("create");

    let unknown = VendorId("missing".to_string());
    let report = h.lifecycle.send(&rfp.id, &[down.id, up.id, unknown]).await.expect("send");

    assert_eq!(report.count, 2);
    assert_eq!(report.delivered, 1);
    assert_eq!(h.mailbox.sent().await.len(), 1);
    assert_eq!(status_of(&h.lifecycle, &rfp.id).await, RfpStatus::Sent);
}

#[tokio::test]
async fn status_never_moves_backwards() {
    let h = harness().await;
    let vendor = register(&h, "TechCorp", "techcorp@example.com").await;
    let rfp = h.lifecycle.create_rfp("tablets").await.expect("create");

    h.lifecycle.send(&rfp.id, &[vendor.id.clone()]).await.expect("first send");
    h.lifecycle.send(&rfp.id, &[vendor.id.clone()]).await.expect("second send");
    assert_eq!(status_of(&h.lifecycle, &rfp.id).await, RfpStatus::Sent);

    let closed = h.lifecycle.close(&rfp.id).await.expect("close");
    assert_eq!(closed.status, RfpStatus::Closed);
    h.lifecycle.send(&rfp.id, &[vendor.id]).await.expect("send after close");
    assert_eq!(status_of(&h.lifecycle, &rfp.id).await, RfpStatus::Closed);
}

#[tokio::test]
async fn deletes_cascade_to_proposals() {
    let h = harness().await;
    let kept = register(&h, "TechCorp", "techcorp@example.com").await;
    let removed = register(&h, "Globex", "bids@globex.example").await;
    let rfp = h.lifecycle.create_rfp("phones").await.expect("create");
    let tag = format!("[RFP #{}]", rfp.id);
    h.mailbox.deliver(reply(&kept.email, format!("Re: {tag}"), "price $5")).await;
    h.mailbox.deliver(reply(&removed.email, format!("Re: {tag}"), "price $6")).await;
    assert_eq!(h.lifecycle.check_responses(&rfp.id).await.expect("pass").count, 2);

    let outcome = h.directory.delete(&removed.id).await.expect("delete vendor");
    assert_eq!(outcome.proposals_removed, 1);
    let detail = h.lifecycle.get(&rfp.id).await.expect("get").expect("rfp");
    assert!(detail.proposals.iter().all(|p| p.vendor.id == kept.id));

    let outcome = h.lifecycle.delete(&rfp.id).await.expect("delete rfp");
    assert_eq!(outcome.proposals_removed, 1);
    let (left,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM proposal").fetch_one(&h.pool).await.expect("count");
    assert_eq!(left, 0);
    assert!(h.lifecycle.get(&rfp.id).await.expect("get").is_none());
}

#[tokio::test]
async fn missing_records_are_not_found() {
    let h = harness().await;
    let ghost = RfpId("ghost".to_string());

    assert!(h.lifecycle.get(&ghost).await.expect("get").is_none());
    for error in [
        h.lifecycle.send(&ghost, &[]).await.map(|_| ()).expect_err("send"),
        h.lifecycle.check_responses(&ghost).await.map(|_| ()).expect_err("check"),
        h.lifecycle.close(&ghost).await.map(|_| ()).expect_err("close"),
        h.lifecycle.delete(&ghost).await.map(|_| ()).expect_err("delete"),
        h.directory.delete(&VendorId("ghost".to_string())).await.map(|_| ()).expect_err("vendor"),
    ] {
        assert!(matches!(error, ApplicationError::NotFound { .. }), "unexpected: {error:?}");
    }
}

#[tokio::test]
async fn comparison_without_proposals_skips_the_extractor() {
    let h = harness().await;
    let rfp = h.lifecycle.create_rfp("printers").await.expect("create");

    assert_eq!(h.lifecycle.compare(&rfp.id).await.expect("compare"), NO_PROPOSALS);
    assert_eq!(h.lifecycle.compare(&RfpId("ghost".into())).await.expect("compare"), NO_PROPOSALS);
    assert_eq!(h.extractor.compare_calls.load(Ordering::SeqCst), 0);

    let vendor = register(&h, "TechCorp", "techcorp@example.com").await;
    let tag = format!("[RFP #{}]", rfp.id);
    h.mailbox.deliver(reply(&vendor.email, format!("Re: {tag}"), "price $77")).await;
    h.lifecycle.check_responses(&rfp.id).await.expect("pass");

    assert_eq!(h.lifecycle.compare(&rfp.id).await.expect("compare"), "ranked 1 proposals");
    assert_eq!(h.extractor.compare_calls.load(Ordering::SeqCst), 1);
}

struct StalledModel;

#[async_trait]
impl LlmClient for StalledModel {
    async fn complete(&self, _request: ChatRequest) -> Result<String, LlmError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok("{\"title\": \"too late\"}".to_string())
    }
}

#[tokio::test]
async fn slow_extraction_still_creates_a_draft_from_fallback_structure() {
    let backend = ExtractionBackend::Model {
        client: Arc::new(StalledModel),
        model: "test-model".to_string(),
        compare_model: "test-model".to_string(),
    };
    let service = Arc::new(ExtractionService::new(backend, Duration::from_millis(50)));
    let (_pool, lifecycle, _directory, _mailbox) = wire(service).await;

    let rfp = lifecycle.create_rfp("20 laptops").await.expect("create");

    assert_eq!(rfp.status, RfpStatus::Draft);
    assert_eq!(rfp.title, "Procurement Request (Fallback)");
    assert_eq!(rfp.description, "20 laptops");
    assert_eq!(rfp.structured_data.budget, Some(Decimal::from(50_000)));
}

#[tokio::test]
async fn blank_prompt_is_rejected() {
    let h = harness().await;
    let error = h.lifecycle.create_rfp("   ").await.expect_err("blank prompt");
    assert!(matches!(error, ApplicationError::Domain(_)));
}

/// Holds every outgoing send until released, so other calls can land mid-fan-out.
#[derive(Default)]
struct GatedTransport {
    mailbox: InMemoryMailbox,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl MailTransport for GatedTransport {
    async fn send(&self, email: OutboundEmail) -> Result<(), TransportError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.mailbox.send(email).await
    }

    async fn fetch_responses(
        &self,
        tag: &CorrelationTag,
    ) -> Result<Vec<InboundEmail>, TransportError> {
        self.mailbox.fetch_responses(tag).await
    }
}

#[tokio::test]
async fn close_during_a_send_is_not_reverted() {
    let gate = Arc::new(GatedTransport::default());
    let (_pool, lifecycle, directory) =
        wire_with_mail(Arc::new(ScriptedExtractor::default()), gate.clone()).await;
    let vendor = directory
        .create(NewVendor {
            name: "TechCorp".to_string(),
            email: "techcorp@example.com".to_string(),
            tags: None,
        })
        .await
        .expect("vendor");
    let rfp = lifecycle.create_rfp("20 laptops").await.expect("create");

    let sending = tokio::spawn({
        let lifecycle = lifecycle.clone();
        let rfp_id = rfp.id.clone();
        async move { lifecycle.send(&rfp_id, &[vendor.id]).await }
    });

    gate.entered.notified().await;
    let closed = lifecycle.close(&rfp.id).await.expect("close");
    assert_eq!(closed.status, RfpStatus::Closed);
    gate.release.notify_one();

    let report = sending.await.expect("join").expect("send");
    assert_eq!(report.count, 1);
    assert_eq!(report.delivered, 1);
    assert_eq!(gate.mailbox.sent().await.len(), 1);
    assert_eq!(status_of(&lifecycle, &rfp.id).await, RfpStatus::Closed);
}

/// Analysis waits until both passes reach it, so both pass the duplicate check first.
struct RendezvousExtractor {
    inner: ScriptedExtractor,
    rendezvous: Barrier,
}

#[async_trait]
impl StructuredExtractor for RendezvousExtractor {
    async fn extract_rfp(&self, prompt: &str) -> RfpStructure {
        self.inner.extract_rfp(prompt).await
    }

    async fn analyze_proposal(&self, body: &str) -> Result<ProposalAnalysis, ExtractionError> {
        self.rendezvous.wait().await;
        self.inner.analyze_proposal(body).await
    }

    async fn compare(&self, proposals: &[ProposalSummary]) -> String {
        self.inner.compare(proposals).await
    }
}

#[tokio::test]
async fn concurrent_passes_over_one_inbox_record_a_reply_once() {
    let extractor = Arc::new(RendezvousExtractor {
        inner: ScriptedExtractor::default(),
        rendezvous: Barrier::new(2),
    });
    let (_pool, lifecycle, directory, mailbox) = wire(extractor.clone()).await;
    let vendor = directory
        .create(NewVendor {
            name: "TechCorp".to_string(),
            email: "techcorp@example.com".to_string(),
            tags: None,
        })
        .await
        .expect("vendor");
    let rfp = lifecycle.create_rfp("20 laptops").await.expect("create");
    let tag = format!("[RFP #{}]", rfp.id);
    mailbox.deliver(reply(&vendor.email, format!("Re: {tag}"), "price $44000")).await;

    let (first, second) = tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(lifecycle.check_responses(&rfp.id), lifecycle.check_responses(&rfp.id))
    })
    .await
    .expect("both passes finish");
    let (first, second) = (first.expect("first pass"), second.expect("second pass"));

    assert_eq!(extractor.inner.analyze_calls.load(Ordering::SeqCst), 2);
    assert_eq!(first.count + second.count, 1);
    let detail = lifecycle.get(&rfp.id).await.expect("get").expect("rfp exists");
    assert_eq!(detail.proposals.len(), 1);
    assert_eq!(detail.proposals[0].proposal.structured_analysis.price, Some(Decimal::from(44_000)));
}
