use uuid::Uuid;

use crate::errors::{SlotError, SlotResult};

/// Who is acting on a request. Built by the HTTP layer once credentials have
/// been checked and passed explicitly to every service call that needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Provider { provider_id: Uuid },
    Customer { customer_id: String, name: String },
}

impl Session {
    pub fn provider(provider_id: Uuid) -> Self {
        Session::Provider { provider_id }
    }

    pub fn customer(customer_id: &str, name: &str) -> SlotResult<Self> {
        let customer_id = customer_id.trim();
        let name = name.trim();
        if customer_id.is_empty() {
            return Err(SlotError::Authentication(
                "Please login to book a service".to_string(),
            ));
        }
        if name.is_empty() {
            return Err(SlotError::Validation("Customer name is required".to_string()));
        }
        Ok(Session::Customer {
            customer_id: customer_id.to_string(),
            name: name.to_string(),
        })
    }

    /// Fails unless this session belongs to `provider_id`.
    pub fn require_provider(&self, provider_id: Uuid) -> SlotResult<()> {
        match self {
            Session::Provider { provider_id: own } if *own == provider_id => Ok(()),
            Session::Provider { .. } => Err(SlotError::Authorization(
                "Providers can only manage their own availability".to_string(),
            )),
            Session::Customer { .. } => Err(SlotError::Authorization(
                "Only the provider can manage availability".to_string(),
            )),
        }
    }
}
