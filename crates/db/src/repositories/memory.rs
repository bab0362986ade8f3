use std::collections::HashMap;

use tokio::sync::RwLock;

use procura_core::domain::proposal::{Proposal, ProposalWithVendor};
use procura_core::domain::rfp::{ProposalCount, Rfp, RfpId, RfpStatus, RfpSummary};
use procura_core::domain::vendor::{Vendor, VendorId};
use procura_core::ports::{
    CascadeOutcome, ProposalRepository, RepositoryError, RfpRepository, VendorRepository,
};

#[derive(Default)]
struct Tables {
    vendors: HashMap<String, Vendor>,
    rfps: HashMap<String, Rfp>,
    /// Insertion order doubles as arrival order.
    proposals: Vec<Proposal>,
}

/// One lock over all three tables so cascades and joins see a consistent state.
#[derive(Default)]
pub struct InMemoryProcurementStore {
    tables: RwLock<Tables>,
}

fn newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> chrono::DateTime<chrono::Utc>) {
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
}

#[async_trait::async_trait]
impl VendorRepository for InMemoryProcurementStore {
    async fn list(&self) -> Result<Vec<Vendor>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut vendors: Vec<Vendor> = tables.vendors.values().cloned().collect();
        newest_first(&mut vendors, |vendor| vendor.created_at);
        Ok(vendors)
    }

    async fn find_by_id(&self, id: &VendorId) -> Result<Option<Vendor>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.vendors.get(&id.0).cloned())
    }

    async fn find_by_ids(&self, ids: &[VendorId]) -> Result<Vec<Vendor>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut found: Vec<Vendor> = Vec::new();
        for id in ids {
            if let Some(vendor) = tables.vendors.get(&id.0) {
                if !found.iter().any(|existing| existing.id == vendor.id) {
                    found.push(vendor.clone());
                }
            }
        }
        Ok(found)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Vendor>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.vendors.values().find(|vendor| vendor.email == email).cloned())
    }

    async fn insert(&self, vendor: Vendor) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.vendors.values().any(|existing| existing.email == vendor.email) {
            return Err(RepositoryError::Conflict(format!(
                "vendor email `{}` is already registered",
                vendor.email
            )));
        }
        tables.vendors.insert(vendor.id.0.clone(), vendor);
        Ok(())
    }

    async fn delete_cascade(
        &self,
        id: &VendorId,
    ) -> Result<Option<CascadeOutcome>, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.vendors.remove(&id.0).is_none() {
            return Ok(None);
        }
        let before = tables.proposals.len();
        tables.proposals.retain(|proposal| proposal.vendor_id != *id);
        Ok(Some(CascadeOutcome { proposals_removed: (before - tables.proposals.len()) as u64 }))
    }
}

#[async_trait::async_trait]
impl RfpRepository for InMemoryProcurementStore {
    async fn list_with_counts(&self) -> Result<Vec<RfpSummary>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut summaries: Vec<RfpSummary> = tables
            .rfps
            .values()
            .map(|rfp| RfpSummary {
                rfp: rfp.clone(),
                count: ProposalCount {
                    proposals: tables.proposals.iter().filter(|p| p.rfp_id == rfp.id).count()
                        as u64,
                },
            })
            .collect();
        newest_first(&mut summaries, |summary| summary.rfp.created_at);
        Ok(summaries)
    }

    async fn find_by_id(&self, id: &RfpId) -> Result<Option<Rfp>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.rfps.get(&id.0).cloned())
    }

    async fn insert(&self, rfp: Rfp) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.rfps.contains_key(&rfp.id.0) {
            return Err(RepositoryError::Conflict(format!("rfp `{}` already exists", rfp.id)));
        }
        tables.rfps.insert(rfp.id.0.clone(), rfp);
        Ok(())
    }

    async fn transition_status(
        &self,
        id: &RfpId,
        from: RfpStatus,
        to: RfpStatus,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        match tables.rfps.get_mut(&id.0) {
            Some(rfp) if rfp.status == from => {
                rfp.status = to;
                rfp.updated_at = chrono::Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_cascade(&self, id: &RfpId) -> Result<Option<CascadeOutcome>, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.rfps.remove(&id.0).is_none() {
            return Ok(None);
        }
        let before = tables.proposals.len();
        tables.proposals.retain(|proposal| proposal.rfp_id != *id);
        Ok(Some(CascadeOutcome { proposals_removed: (before - tables.proposals.len()) as u64 }))
    }
}

#[async_trait::async_trait]
impl ProposalRepository for InMemoryProcurementStore {
    async fn list_for_rfp(
        &self,
        rfp_id: &RfpId,
    ) -> Result<Vec<ProposalWithVendor>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .proposals
            .iter()
            .filter(|proposal| proposal.rfp_id == *rfp_id)
            .filter_map(|proposal| {
                tables.vendors.get(&proposal.vendor_id.0).map(|vendor| ProposalWithVendor {
                    proposal: proposal.clone(),
                    vendor: vendor.clone(),
                })
            })
            .collect())
    }

    async fn exists(
        &self,
        rfp_id: &RfpId,
        vendor_id: &VendorId,
        raw_body: &str,
    ) -> Result<bool, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.proposals.iter().any(|proposal| {
            proposal.rfp_id == *rfp_id
                && proposal.vendor_id == *vendor_id
                && proposal.raw_body == raw_body
        }))
    }

    async fn insert_if_absent(&self, proposal: Proposal) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.rfps.contains_key(&proposal.rfp_id.0)
            || !tables.vendors.contains_key(&proposal.vendor_id.0)
        {
            return Err(RepositoryError::Database(format!(
                "proposal `{}` references a missing rfp or vendor",
                proposal.id
            )));
        }
        let duplicate = tables.proposals.iter().any(|existing| {
            existing.rfp_id == proposal.rfp_id
                && existing.vendor_id == proposal.vendor_id
                && existing.raw_body == proposal.raw_body
        });
        if duplicate {
            return Ok(false);
        }
        tables.proposals.push(proposal);
        Ok(true)
    }
}
