use actix_web::{web, HttpResponse, Result as ActixResult};
use serde::Deserialize;
use shared_types::{
    ContactMergesResponse, DuplicatesResponse, GroupBy, MergeAppliedResponse,
    MergeDryRunResponse, MergeRequest,
};
use std::sync::Arc;

use super::contacts::{ContactApiError, ListQuery};
use crate::dedupe::{DuplicateFinder, MergeCommand, MergeError, MergeExecutor, MergeOutcome};
use crate::storage::ContactStore;

#[derive(Debug, Deserialize)]
pub struct DuplicatesQuery {
    pub by: Option<String>,
}

impl From<MergeError> for ContactApiError {
    fn from(err: MergeError) -> Self {
        match err {
            MergeError::Validation(reason) => ContactApiError::Validation(reason.to_string()),
            MergeError::NotFound => ContactApiError::NotFound,
            MergeError::Storage(e) => {
                tracing::error!("Contact merge storage error: {}", e);
                ContactApiError::Internal("merge failed")
            }
        }
    }
}

/// A failed scan answers with an empty, flagged result rather than an
/// unhandled error; callers must read it as "unknown", not "no duplicates".
pub async fn find_duplicates(
    finder: web::Data<Arc<DuplicateFinder>>,
    query: web::Query<DuplicatesQuery>,
) -> ActixResult<HttpResponse> {
    let requested = query.by.as_deref().map(str::trim).filter(|by| !by.is_empty());
    let mode = match requested.map(str::parse::<GroupBy>) {
        None => GroupBy::default(),
        Some(Ok(mode)) => mode,
        Some(Err(e)) => {
            tracing::debug!("Rejected duplicate scan: {}", e);
            return Err(ContactApiError::Validation("invalid_by".to_string()).into());
        }
    };

    match finder.find(mode).await {
        Ok(items) => Ok(HttpResponse::Ok().json(DuplicatesResponse {
            ok: true,
            items,
            by: mode,
        })),
        Err(e) => {
            tracing::error!("Duplicate scan by {} failed: {}", mode, e);
            Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "ok": false,
                "items": [],
                "error": "failed to load contacts"
            })))
        }
    }
}

pub async fn merge_contacts(
    executor: web::Data<Arc<MergeExecutor>>,
    request: web::Json<MergeRequest>,
) -> ActixResult<HttpResponse> {
    let command = MergeCommand::try_from(request.into_inner()).map_err(ContactApiError::from)?;

    tracing::info!(
        "Merge requested: survivor={}, merge_ids={:?}, dry_run={}",
        command.survivor_id,
        command.merge_ids,
        command.dry_run
    );

    let outcome = executor
        .merge(command)
        .await
        .map_err(ContactApiError::from)?;

    let response = match outcome {
        MergeOutcome::DryRun {
            survivor_id,
            merge_ids,
            will_update,
            will_delete,
        } => HttpResponse::Ok().json(MergeDryRunResponse {
            ok: true,
            dry_run: true,
            survivor_id,
            merge_ids,
            will_update,
            will_delete,
        }),
        MergeOutcome::Applied {
            survivor_id,
            deleted,
            updated,
            ..
        } => HttpResponse::Ok().json(MergeAppliedResponse {
            ok: true,
            survivor_id,
            deleted,
            updated,
        }),
    };

    Ok(response)
}

pub async fn list_merges(
    store: web::Data<Arc<dyn ContactStore>>,
    query: web::Query<ListQuery>,
) -> ActixResult<HttpResponse> {
    let merges = store
        .list_merges(query.limit())
        .await
        .map_err(ContactApiError::from)?;

    Ok(HttpResponse::Ok().json(ContactMergesResponse { merges }))
}
