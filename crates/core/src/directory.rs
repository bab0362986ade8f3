use std::sync::Arc;

use tracing::info;

use crate::domain::vendor::{NewVendor, Vendor, VendorId};
use crate::errors::ApplicationError;
use crate::ports::{CascadeOutcome, VendorRepository};

/// Registration, listing and removal of suppliers.
#[derive(Clone)]
pub struct VendorDirectory {
    vendors: Arc<dyn VendorRepository>,
}

impl VendorDirectory {
    pub fn new(vendors: Arc<dyn VendorRepository>) -> Self {
        Self { vendors }
    }

    pub async fn create(&self, payload: NewVendor) -> Result<Vendor, ApplicationError> {
        let vendor = payload.into_vendor()?;
        self.vendors.insert(vendor.clone()).await?;

        info!(
            event_name = "directory.vendor.created",
            vendor_id = %vendor.id,
            "vendor registered"
        );
        Ok(vendor)
    }

    pub async fn list(&self) -> Result<Vec<Vendor>, ApplicationError> {
        Ok(self.vendors.list().await?)
    }

    /// Deletes the vendor together with every proposal it submitted.
    pub async fn delete(&self, id: &VendorId) -> Result<CascadeOutcome, ApplicationError> {
        let outcome = self
            .vendors
            .delete_cascade(id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("vendor", id.0.clone()))?;

        info!(
            event_name = "directory.vendor.deleted",
            vendor_id = %id,
            proposals_removed = outcome.proposals_removed,
            "vendor deleted"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::VendorDirectory;
    use crate::domain::vendor::{NewVendor, Vendor, VendorId};
    use crate::errors::{ApplicationError, DomainError};
    use crate::ports::{CascadeOutcome, RepositoryError, VendorRepository};

    #[derive(Default)]
    struct VendorTable {
        rows: Mutex<Vec<Vendor>>,
    }

    #[async_trait]
    impl VendorRepository for VendorTable {
        async fn list(&self) -> Result<Vec<Vendor>, RepositoryError> {
            Ok(self.rows.lock().expect("lock").clone())
        }

        async fn find_by_id(&self, id: &VendorId) -> Result<Option<Vendor>, RepositoryError> {
            Ok(self.rows.lock().expect("lock").iter().find(|v| v.id == *id).cloned())
        }

        async fn find_by_ids(&self, ids: &[VendorId]) -> Result<Vec<Vendor>, RepositoryError> {
            Ok(self.rows.lock().expect("lock").iter().filter(|v| ids.contains(&v.id)).cloned().collect())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<Vendor>, RepositoryError> {
            Ok(self.rows.lock().expect("lock").iter().find(|v| v.email == email).cloned())
        }

        async fn insert(&self, vendor: Vendor) -> Result<(), RepositoryError> {
            let mut rows = self.rows.lock().expect("lock");
            if rows.iter().any(|existing| existing.email == vendor.email) {
                return Err(RepositoryError::Conflict(format!("email `{}` taken", vendor.email)));
            }
            rows.push(vendor);
            Ok(())
        }

        async fn delete_cascade(
            &self,
            id: &VendorId,
        ) -> Result<Option<CascadeOutcome>, RepositoryError> {
            let mut rows = self.rows.lock().expect("lock");
            let before = rows.len();
            rows.retain(|v| v.id != *id);
            Ok((rows.len() < before).then_some(CascadeOutcome { proposals_removed: 0 }))
        }
    }

    fn new_vendor(name: &str, email: &str) -> NewVendor {
        NewVendor { name: name.to_string(), email: email.to_string(), tags: Some(" ".to_string()) }
    }

    #[tokio::test]
    async fn create_trims_and_rejects_duplicates() {
        let directory = VendorDirectory::new(Arc::new(VendorTable::default()));

        let vendor =
            directory.create(new_vendor("  TechCorp ", " sales@techcorp.com ")).await.expect("create");
        assert_eq!(vendor.name, "TechCorp");
        assert_eq!(vendor.email, "sales@techcorp.com");
        assert_eq!(vendor.tags, None);

        let duplicate = directory.create(new_vendor("Other", "sales@techcorp.com")).await;
        assert!(matches!(duplicate, Err(ApplicationError::Domain(DomainError::Validation(_)))));
        assert_eq!(directory.list().await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn delete_of_unknown_vendor_is_not_found() {
        let directory = VendorDirectory::new(Arc::new(VendorTable::default()));
        let vendor = directory.create(new_vendor("Globex", "bids@globex.example")).await.expect("create");

        directory.delete(&vendor.id).await.expect("first delete");
        let again = directory.delete(&vendor.id).await;
        assert!(matches!(again, Err(ApplicationError::NotFound { entity: "vendor", .. })));
    }
}
