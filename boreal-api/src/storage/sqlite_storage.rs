use super::ContactStore;
use crate::database::{contacts, merges, AsyncDbConnection, StoreResult};
use async_trait::async_trait;
use shared_types::{Contact, ContactMergeRecord, ContactUpdate, CreateContactRequest};

#[derive(Clone)]
pub struct SqliteContactStore {
    conn: AsyncDbConnection,
}

impl SqliteContactStore {
    pub fn new(conn: AsyncDbConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl ContactStore for SqliteContactStore {
    async fn insert_contact(&self, request: &CreateContactRequest) -> StoreResult<Contact> {
        contacts::insert_contact(self.conn.clone(), request).await
    }

    async fn get_contact(&self, id: &str) -> StoreResult<Contact> {
        contacts::get_contact(self.conn.clone(), id).await
    }

    async fn list_contacts(&self, limit: usize) -> StoreResult<Vec<Contact>> {
        contacts::list_contacts(self.conn.clone(), limit).await
    }

    async fn list_all_contacts(&self) -> StoreResult<Vec<Contact>> {
        contacts::list_all_contacts(self.conn.clone()).await
    }

    async fn find_contacts_by_ids(&self, ids: &[String]) -> StoreResult<Vec<Contact>> {
        contacts::find_contacts_by_ids(self.conn.clone(), ids).await
    }

    async fn update_contact(&self, id: &str, update: &ContactUpdate) -> StoreResult<Contact> {
        contacts::update_contact(self.conn.clone(), id, update).await
    }

    async fn delete_contacts(&self, ids: &[String]) -> StoreResult<usize> {
        contacts::delete_contacts(self.conn.clone(), ids).await
    }

    async fn apply_merge(
        &self,
        survivor_id: &str,
        update: &ContactUpdate,
        losers: &[String],
        note: &str,
    ) -> StoreResult<i64> {
        merges::apply_merge(self.conn.clone(), survivor_id, update, losers, note).await
    }

    async fn list_merges(&self, limit: usize) -> StoreResult<Vec<ContactMergeRecord>> {
        merges::list_merges(self.conn.clone(), limit).await
    }
}
