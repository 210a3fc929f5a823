use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub mod contact;
pub mod dedupe;

pub use contact::{
    Contact, ContactStatus, ContactsResponse, CreateContactRequest, ParseContactStatusError,
    UpdateContactRequest,
};
pub use dedupe::{
    ContactMergeRecord, ContactMergesResponse, ContactPreview, ContactUpdate, DuplicateGroup,
    DuplicatesResponse, GroupBy, KeyKind, MergeAppliedResponse, MergeDryRunResponse, MergePicks,
    MergeRequest, ParseGroupByError,
};

/// Rejection for caller mistakes (4xx): a machine-readable reason code.
#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FailureResponse {
    pub ok: bool,
    pub reason: String,
}

impl FailureResponse {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: reason.into(),
        }
    }
}

/// Error response for API endpoints
#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
        }
    }
}
