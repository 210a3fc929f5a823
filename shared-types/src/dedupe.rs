use crate::contact::{Contact, ContactStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

/// Which identity keys the duplicate scan groups on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Email,
    Phone,
    Both,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Email => "email",
            GroupBy::Phone => "phone",
            GroupBy::Both => "both",
        }
    }

    pub fn includes_email(&self) -> bool {
        matches!(self, GroupBy::Email | GroupBy::Both)
    }

    pub fn includes_phone(&self) -> bool {
        matches!(self, GroupBy::Phone | GroupBy::Both)
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown grouping mode: {0}")]
pub struct ParseGroupByError(pub String);

impl FromStr for GroupBy {
    type Err = ParseGroupByError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(GroupBy::Email),
            "phone" => Ok(GroupBy::Phone),
            "both" => Ok(GroupBy::Both),
            other => Err(ParseGroupByError(other.to_string())),
        }
    }
}

/// The identity key a duplicate group was formed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    Email,
    Phone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ContactPreview {
    pub id: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<ContactStatus>,
    pub updated_at: i64,
}

impl From<&Contact> for ContactPreview {
    fn from(contact: &Contact) -> Self {
        Self {
            id: contact.id.clone(),
            full_name: contact.full_name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            status: contact.status,
            updated_at: contact.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DuplicateGroup {
    pub kind: KeyKind,
    pub key: String,
    pub count: usize,
    pub ids: Vec<String>,
    pub preview: Vec<ContactPreview>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct DuplicatesResponse {
    pub ok: bool,
    pub items: Vec<DuplicateGroup>,
    pub by: GroupBy,
}

/// Explicit field overrides chosen by the operator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MergePicks {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<ContactStatus>,
}

/// Raw merge request body. Required fields are optional here so that a
/// missing value surfaces as a validation reason instead of a parse error.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    pub survivor_id: Option<String>,
    pub merge_ids: Option<Vec<String>>,
    pub picks: Option<MergePicks>,
    #[serde(default)]
    pub dry_run: bool,
    pub note: Option<String>,
}

/// Field set written onto the survivor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ContactUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<ContactStatus>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MergeDryRunResponse {
    pub ok: bool,
    pub dry_run: bool,
    pub survivor_id: String,
    pub merge_ids: Vec<String>,
    pub will_update: ContactUpdate,
    pub will_delete: Vec<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MergeAppliedResponse {
    pub ok: bool,
    pub survivor_id: String,
    pub deleted: Vec<String>,
    pub updated: ContactUpdate,
}

/// Audit trail entry written for every applied merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ContactMergeRecord {
    pub id: i64,
    pub survivor_id: String,
    pub merged_ids: Vec<String>,
    pub fields: ContactUpdate,
    pub note: String,
    pub created_at: i64,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct ContactMergesResponse {
    pub merges: Vec<ContactMergeRecord>,
}
