//! Public form submissions: contact messages and sponsorship inquiries.

use serde::{Deserialize, Serialize};

use crate::errors::PortalError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
}

impl ContactMessage {
    pub fn validate(&self) -> Result<(), PortalError> {
        require_text("Name", &self.name)?;
        require_email(&self.email)?;
        require_text("Message", &self.message)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SponsorshipInquiry {
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SponsorshipInquiry {
    pub fn validate(&self) -> Result<(), PortalError> {
        require_text("Company name", &self.company_name)?;
        require_text("Contact name", &self.contact_name)?;
        require_email(&self.email)
    }
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), PortalError> {
    if value.trim().is_empty() {
        return Err(PortalError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Shape check only: something before and after a single `@`, a dot in the domain.
pub(crate) fn require_email(value: &str) -> Result<(), PortalError> {
    let value = value.trim();
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(PortalError::Validation(
            "Please enter a valid email address".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_validation() {
        let mut msg = ContactMessage {
            name: "Sam".into(),
            email: "sam@example.org".into(),
            subject: None,
            message: "Hello!".into(),
        };
        assert!(msg.validate().is_ok());

        msg.email = "sam@localhost".into();
        assert!(msg.validate().is_err());

        msg.email = "sam@example.org".into();
        msg.message = "   ".into();
        assert!(matches!(msg.validate(), Err(PortalError::Validation(_))));
    }

    #[test]
    fn test_email_shapes() {
        assert!(require_email("a@b.co").is_ok());
        assert!(require_email("@b.co").is_err());
        assert!(require_email("a@@b.co").is_err());
        assert!(require_email("a@b.").is_err());
        assert!(require_email("plain").is_err());
    }
}
