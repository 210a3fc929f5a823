use crate::database::StoreError;
use crate::dedupe::normalize::IdentityNormalizer;
use crate::storage::ContactStore;
use shared_types::{Contact, ContactUpdate, MergePicks, MergeRequest};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Caller mistake, carries the reason code returned to the client.
    #[error("invalid merge request: {0}")]
    Validation(&'static str),
    #[error("one or more contacts were not found")]
    NotFound,
    #[error("storage failure during merge: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for MergeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => MergeError::NotFound,
            other => MergeError::Storage(other),
        }
    }
}

/// A merge request that passed shape validation.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeCommand {
    pub survivor_id: String,
    /// De-duplicated, blank-free, never contains `survivor_id`.
    pub merge_ids: Vec<String>,
    pub picks: MergePicks,
    pub dry_run: bool,
    pub note: Option<String>,
}

impl TryFrom<MergeRequest> for MergeCommand {
    type Error = MergeError;

    fn try_from(request: MergeRequest) -> Result<Self, Self::Error> {
        let survivor_id = request
            .survivor_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(MergeError::Validation("survivorId_required"))?
            .to_string();

        let mut seen = HashSet::new();
        let merge_ids: Vec<String> = request
            .merge_ids
            .unwrap_or_default()
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty() && *id != survivor_id)
            .filter(|id| seen.insert(id.to_string()))
            .map(str::to_string)
            .collect();

        if merge_ids.is_empty() {
            return Err(MergeError::Validation("mergeIds_required"));
        }

        Ok(Self {
            survivor_id,
            merge_ids,
            picks: request.picks.unwrap_or_default(),
            dry_run: request.dry_run,
            note: request
                .note
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        })
    }
}

impl MergeCommand {
    /// Survivor first, then merge ids in request order.
    pub fn id_set(&self) -> Vec<String> {
        std::iter::once(self.survivor_id.clone())
            .chain(self.merge_ids.iter().cloned())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergePlan {
    pub survivor_id: String,
    pub losers: Vec<String>,
    pub update: ContactUpdate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    DryRun {
        survivor_id: String,
        merge_ids: Vec<String>,
        will_update: ContactUpdate,
        will_delete: Vec<String>,
    },
    Applied {
        survivor_id: String,
        deleted: Vec<String>,
        updated: ContactUpdate,
        audit_id: i64,
    },
}

fn pick(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Reconcile the survivor's fields. `rows` must hold the survivor and every
/// loser, survivor first.
pub fn plan_merge(
    survivor: &Contact,
    rows: &[Contact],
    losers: Vec<String>,
    picks: &MergePicks,
    normalizer: &IdentityNormalizer,
) -> MergePlan {
    let email = pick(&picks.email)
        .map(|e| e.to_lowercase())
        .or_else(|| pick(&survivor.email))
        .or_else(|| most_recent_email(rows, normalizer));

    let update = ContactUpdate {
        full_name: pick(&picks.full_name).or_else(|| pick(&survivor.full_name)),
        email,
        phone: pick(&picks.phone).or_else(|| pick(&survivor.phone)),
        status: picks.status.or(survivor.status),
    };

    MergePlan {
        survivor_id: survivor.id.clone(),
        losers,
        update,
    }
}

/// Canonical email of the most recently updated row that has one. Earlier
/// rows win ties.
fn most_recent_email(rows: &[Contact], normalizer: &IdentityNormalizer) -> Option<String> {
    let mut best: Option<(i64, String)> = None;

    for row in rows {
        let email = normalizer.canonical_email(row.email.as_deref());
        if email.is_empty() {
            continue;
        }
        if best.as_ref().map_or(true, |(at, _)| row.updated_at > *at) {
            best = Some((row.updated_at, email));
        }
    }

    best.map(|(_, email)| email)
}

pub fn audit_note(plan: &MergePlan, operator_note: Option<&str>) -> String {
    let mut note = format!(
        "Merged {} contact(s) [{}] into {}",
        plan.losers.len(),
        plan.losers.join(", "),
        plan.survivor_id
    );
    if let Some(extra) = operator_note {
        note.push_str(". Note: ");
        note.push_str(extra);
    }
    note
}

/// Folds a set of duplicate contacts into one survivor.
pub struct MergeExecutor {
    store: Arc<dyn ContactStore>,
    normalizer: Arc<IdentityNormalizer>,
}

impl MergeExecutor {
    pub fn new(store: Arc<dyn ContactStore>, normalizer: Arc<IdentityNormalizer>) -> Self {
        Self { store, normalizer }
    }

    pub async fn merge(&self, command: MergeCommand) -> Result<MergeOutcome, MergeError> {
        let id_set = command.id_set();
        let fetched = self.store.find_contacts_by_ids(&id_set).await?;

        if fetched.len() != id_set.len() {
            let missing: Vec<&str> = id_set
                .iter()
                .filter(|id| !fetched.iter().any(|c| &c.id == *id))
                .map(String::as_str)
                .collect();
            tracing::warn!(
                "Merge into {} rejected, unknown contact ids: {:?}",
                command.survivor_id,
                missing
            );
            return Err(MergeError::NotFound);
        }

        let rows: Vec<Contact> = id_set
            .iter()
            .filter_map(|id| fetched.iter().find(|c| &c.id == id).cloned())
            .collect();
        let Some(survivor) = rows.first() else {
            return Err(MergeError::NotFound);
        };

        let plan = plan_merge(
            survivor,
            &rows,
            command.merge_ids.clone(),
            &command.picks,
            &self.normalizer,
        );

        if command.dry_run {
            tracing::info!(
                "Dry-run merge of {} contact(s) into {}",
                plan.losers.len(),
                plan.survivor_id
            );
            return Ok(MergeOutcome::DryRun {
                survivor_id: plan.survivor_id,
                merge_ids: command.merge_ids,
                will_update: plan.update,
                will_delete: plan.losers,
            });
        }

        let note = audit_note(&plan, command.note.as_deref());
        let audit_id = self
            .store
            .apply_merge(&plan.survivor_id, &plan.update, &plan.losers, &note)
            .await
            .map_err(|e| {
                tracing::error!("Merge into {} failed: {}", plan.survivor_id, e);
                MergeError::from(e)
            })?;

        tracing::info!(
            "Merged {} contact(s) into {} (audit entry {})",
            plan.losers.len(),
            plan.survivor_id,
            audit_id
        );

        Ok(MergeOutcome::Applied {
            survivor_id: plan.survivor_id,
            deleted: plan.losers,
            updated: plan.update,
            audit_id,
        })
    }
}
