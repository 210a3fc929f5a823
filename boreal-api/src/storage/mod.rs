pub mod sqlite_storage;

pub use sqlite_storage::SqliteContactStore;

use crate::database::StoreResult;
use async_trait::async_trait;
use shared_types::{Contact, ContactMergeRecord, ContactUpdate, CreateContactRequest};

/// Persistence seam for contacts. Handlers, the finder and the merge
/// executor receive an implementation explicitly; none of them touches the pool.
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn insert_contact(&self, request: &CreateContactRequest) -> StoreResult<Contact>;
    async fn get_contact(&self, id: &str) -> StoreResult<Contact>;
    /// Newest first, at most `limit` rows.
    async fn list_contacts(&self, limit: usize) -> StoreResult<Vec<Contact>>;
    async fn list_all_contacts(&self) -> StoreResult<Vec<Contact>>;
    async fn find_contacts_by_ids(&self, ids: &[String]) -> StoreResult<Vec<Contact>>;
    async fn update_contact(&self, id: &str, update: &ContactUpdate) -> StoreResult<Contact>;
    async fn delete_contacts(&self, ids: &[String]) -> StoreResult<usize>;

    /// Survivor update, loser deletes and audit note as a single unit.
    /// Returns the audit record id.
    async fn apply_merge(
        &self,
        survivor_id: &str,
        update: &ContactUpdate,
        losers: &[String],
        note: &str,
    ) -> StoreResult<i64>;

    async fn list_merges(&self, limit: usize) -> StoreResult<Vec<ContactMergeRecord>>;
}
