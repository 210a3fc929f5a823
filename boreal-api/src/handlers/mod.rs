pub mod contacts;
pub mod duplicates;

use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;

use crate::database::Database;
use crate::dedupe::{DuplicateFinder, IdentityNormalizer, MergeExecutor};
use crate::storage::{ContactStore, SqliteContactStore};

/// Everything the handlers pull out of `app_data`, wired once at startup.
#[derive(Clone)]
pub struct AppServices {
    pub db: Arc<Database>,
    pub store: Arc<dyn ContactStore>,
    pub finder: Arc<DuplicateFinder>,
    pub executor: Arc<MergeExecutor>,
}

impl AppServices {
    pub fn new(db: Arc<Database>, normalizer: IdentityNormalizer) -> Self {
        let store: Arc<dyn ContactStore> =
            Arc::new(SqliteContactStore::new(db.async_connection.clone()));
        Self::with_store(db, store, normalizer)
    }

    pub fn with_store(
        db: Arc<Database>,
        store: Arc<dyn ContactStore>,
        normalizer: IdentityNormalizer,
    ) -> Self {
        let normalizer = Arc::new(normalizer);
        Self {
            finder: Arc::new(DuplicateFinder::new(store.clone(), normalizer.clone())),
            executor: Arc::new(MergeExecutor::new(store.clone(), normalizer)),
            store,
            db,
        }
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.db.clone()))
            .app_data(web::Data::new(self.store.clone()))
            .app_data(web::Data::new(self.finder.clone()))
            .app_data(web::Data::new(self.executor.clone()));
        configure_routes(cfg);
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(contacts::json_config())
        .app_data(contacts::query_config())
        .route("/health", web::get().to(health))
        .route("/api/contacts", web::get().to(contacts::list_contacts))
        .route("/api/contacts", web::post().to(contacts::create_contact))
        .route("/api/contacts/duplicates", web::get().to(duplicates::find_duplicates))
        .route("/api/contacts/merge", web::post().to(duplicates::merge_contacts))
        .route("/api/contacts/merges", web::get().to(duplicates::list_merges))
        .route("/api/contacts/{id}", web::get().to(contacts::get_contact))
        .route("/api/contacts/{id}", web::put().to(contacts::update_contact))
        .route("/api/contacts/{id}", web::delete().to(contacts::delete_contact));
}

pub async fn health(db: web::Data<Arc<Database>>) -> impl Responder {
    match db.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "database": "connected"
        })),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "database": "disconnected"
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::contacts::test_support::{open_test_database, seed_contact};
    use crate::database::{StoreError, StoreResult};
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use shared_types::{Contact, ContactMergeRecord, ContactUpdate, CreateContactRequest};

    macro_rules! app {
        ($services:expr) => {
            test::init_service(App::new().configure(|cfg| $services.configure(cfg))).await
        };
    }

    fn services(db: &Arc<Database>) -> AppServices {
        AppServices::new(db.clone(), IdentityNormalizer::default())
    }

    struct BrokenStore;

    #[async_trait]
    impl ContactStore for BrokenStore {
        async fn insert_contact(&self, _request: &CreateContactRequest) -> StoreResult<Contact> {
            Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery))
        }

        async fn get_contact(&self, _id: &str) -> StoreResult<Contact> {
            Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery))
        }

        async fn list_contacts(&self, _limit: usize) -> StoreResult<Vec<Contact>> {
            Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery))
        }

        async fn list_all_contacts(&self) -> StoreResult<Vec<Contact>> {
            Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery))
        }

        async fn find_contacts_by_ids(&self, _ids: &[String]) -> StoreResult<Vec<Contact>> {
            Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery))
        }

        async fn update_contact(&self, _id: &str, _update: &ContactUpdate) -> StoreResult<Contact> {
            Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery))
        }

        async fn delete_contacts(&self, _ids: &[String]) -> StoreResult<usize> {
            Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery))
        }

        async fn apply_merge(
            &self,
            _survivor_id: &str,
            _update: &ContactUpdate,
            _losers: &[String],
            _note: &str,
        ) -> StoreResult<i64> {
            Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery))
        }

        async fn list_merges(&self, _limit: usize) -> StoreResult<Vec<ContactMergeRecord>> {
            Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery))
        }
    }

    /// Every lookup succeeds, but a loser is already gone when the merge
    /// is written, as after a concurrent merge commits first.
    struct StaleStore;

    #[async_trait]
    impl ContactStore for StaleStore {
        async fn insert_contact(&self, _request: &CreateContactRequest) -> StoreResult<Contact> {
            Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery))
        }

        async fn get_contact(&self, id: &str) -> StoreResult<Contact> {
            Err(StoreError::NotFound(id.to_string()))
        }

        async fn list_contacts(&self, _limit: usize) -> StoreResult<Vec<Contact>> {
            Ok(Vec::new())
        }

        async fn list_all_contacts(&self) -> StoreResult<Vec<Contact>> {
            Ok(Vec::new())
        }

        async fn find_contacts_by_ids(&self, ids: &[String]) -> StoreResult<Vec<Contact>> {
            Ok(ids
                .iter()
                .map(|id| Contact {
                    id: id.clone(),
                    full_name: None,
                    email: None,
                    phone: None,
                    status: None,
                    created_at: 1,
                    updated_at: 1,
                })
                .collect())
        }

        async fn update_contact(&self, id: &str, _update: &ContactUpdate) -> StoreResult<Contact> {
            Err(StoreError::NotFound(id.to_string()))
        }

        async fn delete_contacts(&self, ids: &[String]) -> StoreResult<usize> {
            Err(StoreError::NotFound(ids.first().cloned().unwrap_or_default()))
        }

        async fn apply_merge(
            &self,
            _survivor_id: &str,
            _update: &ContactUpdate,
            losers: &[String],
            _note: &str,
        ) -> StoreResult<i64> {
            Err(StoreError::NotFound(losers.first().cloned().unwrap_or_default()))
        }

        async fn list_merges(&self, _limit: usize) -> StoreResult<Vec<ContactMergeRecord>> {
            Ok(Vec::new())
        }
    }

    #[actix_web::test]
    async fn test_health() {
        let (_dir, db) = open_test_database();
        let services = services(&db);
        let app = app!(services);

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
    }

    #[actix_web::test]
    async fn test_contact_crud_round() {
        let (_dir, db) = open_test_database();
        let services = services(&db);
        let app = app!(services);

        let req = test::TestRequest::post()
            .uri("/api/contacts")
            .set_json(json!({ "fullName": "Dana Lee", "email": "dana@x.com" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        let id = created["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::put()
            .uri(&format!("/api/contacts/{id}"))
            .set_json(json!({ "phone": "555-0101", "status": "inactive" }))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["fullName"], "Dana Lee");
        assert_eq!(updated["phone"], "555-0101");
        assert_eq!(updated["status"], "inactive");

        let req = test::TestRequest::get().uri("/api/contacts?limit=5").to_request();
        let listed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed["contacts"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/contacts/{id}"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri(&format!("/api/contacts/{id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "ok": false, "reason": "not_found" }));
    }

    #[actix_web::test]
    async fn test_create_requires_some_field() {
        let (_dir, db) = open_test_database();
        let services = services(&db);
        let app = app!(services);

        let req = test::TestRequest::post()
            .uri("/api/contacts")
            .set_json(json!({ "fullName": "  " }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_find_duplicates_by_email_default() {
        let (_dir, db) = open_test_database();
        seed_contact(&db, "A", None, Some("x@gmail.com"), Some("555"), 1).await;
        seed_contact(&db, "B", None, Some("X.@gmail.com"), Some("555"), 2).await;
        seed_contact(&db, "C", None, Some("c@x.com"), None, 3).await;
        let services = services(&db);
        let app = app!(services);

        let req = test::TestRequest::get().uri("/api/contacts/duplicates").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["ok"], true);
        assert_eq!(body["by"], "email");
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["key"], "x@gmail.com");
        assert_eq!(items[0]["count"], 2);
        assert_eq!(items[0]["ids"], json!(["A", "B"]));

        let req = test::TestRequest::get()
            .uri("/api/contacts/duplicates?by=both")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["by"], "both");
        assert_eq!(body["items"].as_array().unwrap().len(), 2);

        for uri in ["/api/contacts/duplicates?by=", "/api/contacts/duplicates?by=%20"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["by"], "email");
            assert_eq!(body["items"].as_array().unwrap().len(), 1);
        }
    }

    #[actix_web::test]
    async fn test_find_duplicates_rejects_unknown_mode() {
        let (_dir, db) = open_test_database();
        let services = services(&db);
        let app = app!(services);

        let req = test::TestRequest::get()
            .uri("/api/contacts/duplicates?by=name")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["reason"], "invalid_by");
    }

    #[actix_web::test]
    async fn test_find_duplicates_storage_failure_is_flagged() {
        let (_dir, db) = open_test_database();
        let services = AppServices::with_store(db, Arc::new(BrokenStore), IdentityNormalizer::default());
        let app = app!(services);

        let req = test::TestRequest::get().uri("/api/contacts/duplicates").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["items"], json!([]));
        assert_eq!(body["error"], "failed to load contacts");
    }

    #[actix_web::test]
    async fn test_merge_validation_and_body_errors() {
        let (_dir, db) = open_test_database();
        let services = services(&db);
        let app = app!(services);

        let cases = [
            (json!({ "mergeIds": ["b"] }), "survivorId_required"),
            (json!({ "survivorId": "a", "mergeIds": [] }), "mergeIds_required"),
            (json!({ "survivorId": "a", "mergeIds": ["a"] }), "mergeIds_required"),
            (json!({ "survivorId": "a", "mergeIds": "b" }), "invalid_body"),
        ];

        for (payload, reason) in cases {
            let req = test::TestRequest::post()
                .uri("/api/contacts/merge")
                .set_json(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body, json!({ "ok": false, "reason": reason }));
        }
    }

    #[actix_web::test]
    async fn test_merge_unknown_id_is_404() {
        let (_dir, db) = open_test_database();
        seed_contact(&db, "A", None, None, None, 1).await;
        let services = services(&db);
        let app = app!(services);

        let req = test::TestRequest::post()
            .uri("/api/contacts/merge")
            .set_json(json!({ "survivorId": "A", "mergeIds": ["ghost"] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "ok": false, "reason": "not_found" }));
    }

    #[actix_web::test]
    async fn test_merge_losing_race_to_concurrent_merge_is_404() {
        let (_dir, db) = open_test_database();
        let services = AppServices::with_store(db, Arc::new(StaleStore), IdentityNormalizer::default());
        let app = app!(services);

        let req = test::TestRequest::post()
            .uri("/api/contacts/merge")
            .set_json(json!({ "survivorId": "C", "mergeIds": ["B"] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "ok": false, "reason": "not_found" }));
    }

    #[actix_web::test]
    async fn test_contact_reads_and_writes_go_through_the_store() {
        let (_dir, db) = open_test_database();
        seed_contact(&db, "A", Some("Ann"), None, None, 1).await;
        let services = AppServices::with_store(db, Arc::new(BrokenStore), IdentityNormalizer::default());
        let app = app!(services);

        let requests = [
            test::TestRequest::get().uri("/api/contacts").to_request(),
            test::TestRequest::get().uri("/api/contacts/A").to_request(),
            test::TestRequest::post()
                .uri("/api/contacts")
                .set_json(json!({ "fullName": "Bo" }))
                .to_request(),
        ];

        for req in requests {
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body, json!({ "ok": false, "error": "internal error" }));
        }
    }

    #[actix_web::test]
    async fn test_merge_storage_failure_is_500() {
        let (_dir, db) = open_test_database();
        let services = AppServices::with_store(db, Arc::new(BrokenStore), IdentityNormalizer::default());
        let app = app!(services);

        let req = test::TestRequest::post()
            .uri("/api/contacts/merge")
            .set_json(json!({ "survivorId": "A", "mergeIds": ["B"] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "ok": false, "error": "merge failed" }));
    }

    #[actix_web::test]
    async fn test_merge_dry_run_then_apply() {
        let (_dir, db) = open_test_database();
        seed_contact(&db, "A", Some("Ann"), None, None, 1).await;
        seed_contact(&db, "B", None, Some("b@x.com"), None, 5).await;
        seed_contact(&db, "C", None, Some("c@x.com"), None, 3).await;
        let services = services(&db);
        let app = app!(services);

        let req = test::TestRequest::post()
            .uri("/api/contacts/merge")
            .set_json(json!({ "survivorId": "A", "mergeIds": ["B", "C", "A"], "dryRun": true }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["dryRun"], true);
        assert_eq!(body["mergeIds"], json!(["B", "C"]));
        assert_eq!(body["willDelete"], json!(["B", "C"]));
        assert_eq!(body["willUpdate"]["email"], "b@x.com");
        assert_eq!(body["willUpdate"]["fullName"], "Ann");

        let req = test::TestRequest::get().uri("/api/contacts?limit=10").to_request();
        let listed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed["contacts"].as_array().unwrap().len(), 3);

        let req = test::TestRequest::post()
            .uri("/api/contacts/merge")
            .set_json(json!({
                "survivorId": "A",
                "mergeIds": ["B", "C"],
                "picks": { "status": "inactive" },
                "note": "same applicant"
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["survivorId"], "A");
        assert_eq!(body["deleted"], json!(["B", "C"]));
        assert_eq!(body["updated"]["status"], "inactive");
        assert!(body.get("dryRun").is_none());

        let req = test::TestRequest::get().uri("/api/contacts/A").to_request();
        let survivor: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(survivor["email"], "b@x.com");
        assert_eq!(survivor["status"], "inactive");

        for id in ["B", "C"] {
            let req = test::TestRequest::get()
                .uri(&format!("/api/contacts/{id}"))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
        }

        let req = test::TestRequest::get().uri("/api/contacts/merges").to_request();
        let merges: Value = test::call_and_read_body_json(&app, req).await;
        let merges = merges["merges"].as_array().unwrap();
        assert_eq!(merges.len(), 1);
        assert_eq!(
            merges[0]["note"],
            "Merged 2 contact(s) [B, C] into A. Note: same applicant"
        );
    }

    #[actix_web::test]
    async fn test_created_contacts_show_up_as_duplicates() {
        let (_dir, db) = open_test_database();
        let services = services(&db);
        let app = app!(services);

        for email in ["Pat.Kim+loans@gmail.com", "patkim@googlemail.com"] {
            let req = test::TestRequest::post()
                .uri("/api/contacts")
                .set_json(json!({ "fullName": "Pat Kim", "email": email }))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get().uri("/api/contacts/duplicates").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["items"][0]["key"], "patkim@gmail.com");
        assert_eq!(body["items"][0]["count"], 2);
    }
}
