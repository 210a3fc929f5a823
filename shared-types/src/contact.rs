use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

/// Lifecycle flag owned by the wider CRM workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    Active,
    Inactive,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::Active => "active",
            ContactStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown contact status: {0}")]
pub struct ParseContactStatusError(pub String);

impl FromStr for ContactStatus {
    type Err = ParseContactStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ContactStatus::Active),
            "inactive" => Ok(ContactStatus::Inactive),
            other => Err(ParseContactStatusError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<ContactStatus>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<ContactStatus>,
}

#[derive(Debug, Default, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContactRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<ContactStatus>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct ContactsResponse {
    pub contacts: Vec<Contact>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!("Active".parse::<ContactStatus>(), Ok(ContactStatus::Active));
        assert_eq!(" inactive ".parse::<ContactStatus>(), Ok(ContactStatus::Inactive));
        assert!("archived".parse::<ContactStatus>().is_err());
    }

    #[test]
    fn test_contact_serializes_camel_case() {
        let contact = Contact {
            id: "c-1".to_string(),
            full_name: Some("Ada Lovelace".to_string()),
            email: None,
            phone: Some("555-0100".to_string()),
            status: Some(ContactStatus::Active),
            created_at: 10,
            updated_at: 20,
        };

        let json = serde_json::to_value(&contact).unwrap();
        assert_eq!(json["fullName"], "Ada Lovelace");
        assert_eq!(json["status"], "active");
        assert_eq!(json["updatedAt"], 20);
        assert!(json["email"].is_null());
    }
}
