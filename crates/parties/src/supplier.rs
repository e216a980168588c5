use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rentstock_core::{
    patch, require_non_blank, DomainError, DomainResult, Entity, Patch, SupplierId,
};

/// External party equipment is rented from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Tax registration number.
    pub document: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Supplier {
    type Id = SupplierId;

    fn id(&self) -> SupplierId {
        self.id
    }
}

impl Supplier {
    pub fn apply_changes(&mut self, changes: SupplierChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(email) = changes.email {
            self.email = email;
        }
        patch::apply(&mut self.phone, changes.phone);
        patch::apply(&mut self.address, changes.address);
        patch::apply(&mut self.document, changes.document);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSupplier {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub document: Option<String>,
}

impl NewSupplier {
    pub fn validate(&self) -> DomainResult<()> {
        require_non_blank("name", &self.name)?;
        validate_email(&self.email)
    }

    pub fn into_supplier(self, id: SupplierId, created_at: DateTime<Utc>) -> Supplier {
        Supplier {
            id,
            name: self.name,
            email: self.email.trim().to_string(),
            phone: non_empty(self.phone),
            address: non_empty(self.address),
            document: non_empty(self.document),
            created_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub phone: Patch<String>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub address: Patch<String>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub document: Patch<String>,
}

impl SupplierChanges {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            require_non_blank("name", name)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

pub(crate) fn validate_email(email: &str) -> DomainResult<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(DomainError::validation("email must be a valid address")),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
