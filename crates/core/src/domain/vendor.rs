use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VendorId(pub String);

impl VendorId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A supplier identity. `email` is the case-sensitive key replies are matched on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
    pub email: String,
    pub tags: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct NewVendor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub tags: Option<String>,
}

impl NewVendor {
    /// Validates the payload and assigns a fresh id. Surrounding whitespace is
    /// trimmed; letter case in the email is preserved.
    pub fn into_vendor(self) -> Result<Vendor, DomainError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation("vendor name must not be empty".to_string()));
        }

        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::Validation(format!(
                "vendor email `{email}` is not a mail address"
            )));
        }

        let tags = self.tags.map(|tags| tags.trim().to_string()).filter(|tags| !tags.is_empty());

        Ok(Vendor {
            id: VendorId::generate(),
            name: name.to_string(),
            email: email.to_string(),
            tags,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::NewVendor;
    use crate::errors::DomainError;

    #[test]
    fn new_vendor_keeps_email_case_and_trims_whitespace() {
        let vendor = NewVendor {
            name: "  TechCorp ".to_string(),
            email: " Sales@TechCorp.example ".to_string(),
            tags: Some("  ".to_string()),
        }
        .into_vendor()
        .expect("valid vendor");

        assert_eq!(vendor.name, "TechCorp");
        assert_eq!(vendor.email, "Sales@TechCorp.example");
        assert_eq!(vendor.tags, None);
    }

    #[test]
    fn new_vendor_rejects_missing_name_or_address() {
        let missing_name =
            NewVendor { email: "a@b.example".to_string(), ..NewVendor::default() }.into_vendor();
        assert!(matches!(missing_name, Err(DomainError::Validation(_))));

        let bad_email = NewVendor {
            name: "Acme".to_string(),
            email: "acme.example".to_string(),
            tags: None,
        }
        .into_vendor();
        assert!(matches!(bad_email, Err(DomainError::Validation(ref m)) if m.contains("acme.example")));
    }
}
