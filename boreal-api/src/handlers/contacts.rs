use actix_web::{web, HttpResponse, Result as ActixResult};
use serde::Deserialize;
use shared_types::{
    ContactUpdate, ContactsResponse, CreateContactRequest, ErrorResponse, FailureResponse,
    UpdateContactRequest,
};
use std::sync::Arc;

use crate::database::StoreError;
use crate::storage::ContactStore;

const DEFAULT_LIST_LIMIT: usize = 100;
const MAX_LIST_LIMIT: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ContactApiError {
    #[error("{0}")]
    Validation(String),
    #[error("not_found")]
    NotFound,
    /// Safe message only; the underlying error is logged where it occurs.
    #[error("{0}")]
    Internal(&'static str),
}

impl From<StoreError> for ContactApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ContactApiError::NotFound,
            other => {
                tracing::error!("Contact storage error: {}", other);
                ContactApiError::Internal("internal error")
            }
        }
    }
}

impl actix_web::error::ResponseError for ContactApiError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ContactApiError::Validation(reason) => {
                HttpResponse::BadRequest().json(FailureResponse::new(reason.clone()))
            }
            ContactApiError::NotFound => {
                HttpResponse::NotFound().json(FailureResponse::new("not_found"))
            }
            ContactApiError::Internal(msg) => {
                HttpResponse::InternalServerError().json(ErrorResponse::new(*msg))
            }
        }
    }
}

/// Body parse failures answer in the same `{ ok, reason }` envelope as
/// validation errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        tracing::debug!("Rejected request body: {}", err);
        let response = HttpResponse::BadRequest().json(FailureResponse::new("invalid_body"));
        actix_web::error::InternalError::from_response(err, response).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(FailureResponse::new("invalid_query"));
        actix_web::error::InternalError::from_response(err, response).into()
    })
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }
}

pub async fn list_contacts(
    store: web::Data<Arc<dyn ContactStore>>,
    query: web::Query<ListQuery>,
) -> ActixResult<HttpResponse> {
    let contacts = store
        .list_contacts(query.limit())
        .await
        .map_err(ContactApiError::from)?;

    Ok(HttpResponse::Ok().json(ContactsResponse { contacts }))
}

pub async fn get_contact(
    store: web::Data<Arc<dyn ContactStore>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let contact_id = path.into_inner();

    let contact = store
        .get_contact(&contact_id)
        .await
        .map_err(ContactApiError::from)?;

    Ok(HttpResponse::Ok().json(contact))
}

pub async fn create_contact(
    store: web::Data<Arc<dyn ContactStore>>,
    request: web::Json<CreateContactRequest>,
) -> ActixResult<HttpResponse> {
    let req = request.into_inner();

    let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
    if blank(&req.full_name) && blank(&req.email) && blank(&req.phone) {
        return Err(ContactApiError::Validation("contact_fields_required".to_string()).into());
    }

    let contact = store
        .insert_contact(&req)
        .await
        .map_err(ContactApiError::from)?;

    tracing::info!("Created contact {}", contact.id);

    Ok(HttpResponse::Created().json(contact))
}

/// Partial update: absent fields keep their stored value.
pub async fn update_contact(
    store: web::Data<Arc<dyn ContactStore>>,
    path: web::Path<String>,
    request: web::Json<UpdateContactRequest>,
) -> ActixResult<HttpResponse> {
    let contact_id = path.into_inner();
    let req = request.into_inner();

    let current = store
        .find_contacts_by_ids(std::slice::from_ref(&contact_id))
        .await
        .map_err(ContactApiError::from)?
        .into_iter()
        .next()
        .ok_or(ContactApiError::NotFound)?;

    let update = ContactUpdate {
        full_name: req.full_name.or(current.full_name),
        email: req.email.or(current.email),
        phone: req.phone.or(current.phone),
        status: req.status.or(current.status),
    };

    let contact = store
        .update_contact(&contact_id, &update)
        .await
        .map_err(ContactApiError::from)?;

    Ok(HttpResponse::Ok().json(contact))
}

pub async fn delete_contact(
    store: web::Data<Arc<dyn ContactStore>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let contact_id = path.into_inner();

    store
        .delete_contacts(std::slice::from_ref(&contact_id))
        .await
        .map_err(ContactApiError::from)?;

    tracing::info!("Deleted contact {}", contact_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ok": true,
        "deleted": [contact_id]
    })))
}
