use serde::{Deserialize, Serialize};

use stockorder_core::{CustomerId, DomainError, DomainResult, Entity};

/// Contact information for a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A customer record as returned by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    id: CustomerId,
    name: String,
    contact: ContactInfo,
}

impl Customer {
    pub fn new(id: CustomerId, name: impl Into<String>, contact: ContactInfo) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("customer name must not be empty"));
        }
        Ok(Self { id, name, contact })
    }

    pub fn id_typed(&self) -> CustomerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> CustomerId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_contact_details() {
        let contact = ContactInfo {
            email: Some("ada@example.com".to_string()),
            phone: None,
        };
        let c = Customer::new(CustomerId::new(7), "Ada", contact.clone()).unwrap();
        assert_eq!(c.id(), CustomerId::new(7));
        assert_eq!(c.contact(), &contact);
    }

    #[test]
    fn rejects_blank_name() {
        assert!(Customer::new(CustomerId::new(1), "", ContactInfo::default()).is_err());
    }
}
