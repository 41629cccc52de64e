//! Contractor model
//!
//! Contractors are owned by the account system; the scheduler only reads them.

use serde::{Deserialize, Serialize};

/// Contractor who can book demos
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contractor {
    pub id: i32,
    pub email: String,
    pub company_name: String,
    pub contact_name: Option<String>,
}

impl Contractor {
    /// Name used when addressing the contractor
    pub fn greeting_name(&self) -> &str {
        self.contact_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.company_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_name_falls_back_to_company() {
        let mut contractor = Contractor {
            id: 1,
            email: "ops@acme.test".to_string(),
            company_name: "Acme Roofing".to_string(),
            contact_name: Some("Dana".to_string()),
        };
        assert_eq!(contractor.greeting_name(), "Dana");
        contractor.contact_name = Some("  ".to_string());
        assert_eq!(contractor.greeting_name(), "Acme Roofing");
        contractor.contact_name = None;
        assert_eq!(contractor.greeting_name(), "Acme Roofing");
    }
}
