use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::DomainError;
use crate::validation::patterns;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl NewContact {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = Vec::new();
        let required = [
            ("First name", &self.first_name),
            ("Last name", &self.last_name),
            ("Email", &self.email),
            ("Phone", &self.phone),
            ("Subject", &self.subject),
            ("Message", &self.message),
        ];
        for (label, value) in required {
            if value.trim().is_empty() {
                errors.push(format!("{label} is required."));
            }
        }
        if !self.email.trim().is_empty() && !patterns::is_email(&self.email) {
            errors.push("Valid Email ID is required.".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(errors))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub id: Uuid,
    #[serde(flatten)]
    pub contact: NewContact,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_are_all_reported() {
        let err = NewContact {
            first_name: "Ravi".into(),
            email: "not-an-email".into(),
            ..Default::default()
        }
        .validate()
        .unwrap_err();

        let DomainError::Validation(messages) = err else {
            panic!("expected validation error");
        };
        assert!(messages.contains(&"Phone is required.".to_string()));
        assert!(messages.contains(&"Valid Email ID is required.".to_string()));
        assert!(!messages.iter().any(|m| m.starts_with("First name")));
    }
}
