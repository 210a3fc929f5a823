use crate::database::StoreResult;
use crate::dedupe::normalize::{canonical_phone, IdentityNormalizer};
use crate::storage::ContactStore;
use shared_types::{Contact, ContactPreview, DuplicateGroup, GroupBy, KeyKind};
use std::collections::HashMap;
use std::sync::Arc;

/// Groups contacts that share a canonical email and/or phone key.
pub struct DuplicateFinder {
    store: Arc<dyn ContactStore>,
    normalizer: Arc<IdentityNormalizer>,
}

impl DuplicateFinder {
    pub fn new(store: Arc<dyn ContactStore>, normalizer: Arc<IdentityNormalizer>) -> Self {
        Self { store, normalizer }
    }

    pub async fn find(&self, mode: GroupBy) -> StoreResult<Vec<DuplicateGroup>> {
        let contacts = self.store.list_all_contacts().await?;
        let groups = group_duplicates(&contacts, mode, &self.normalizer);

        tracing::debug!(
            "Duplicate scan by {}: {} contacts, {} groups",
            mode,
            contacts.len(),
            groups.len()
        );

        Ok(groups)
    }
}

/// Pure grouping step. A contact can land in one email group and one phone
/// group at the same time; grouping is per key, not a partition.
pub fn group_duplicates(
    contacts: &[Contact],
    mode: GroupBy,
    normalizer: &IdentityNormalizer,
) -> Vec<DuplicateGroup> {
    // Keys in first-seen order, so equal-sized groups keep discovery order.
    let mut order: Vec<(KeyKind, String)> = Vec::new();
    let mut members: HashMap<(KeyKind, String), Vec<&Contact>> = HashMap::new();

    for contact in contacts {
        let mut keys = Vec::with_capacity(2);
        if mode.includes_email() {
            keys.push((
                KeyKind::Email,
                normalizer.canonical_email(contact.email.as_deref()),
            ));
        }
        if mode.includes_phone() {
            keys.push((KeyKind::Phone, canonical_phone(contact.phone.as_deref())));
        }

        for slot in keys {
            if slot.1.is_empty() {
                continue;
            }
            if !members.contains_key(&slot) {
                order.push(slot.clone());
            }
            members.entry(slot).or_default().push(contact);
        }
    }

    let mut groups: Vec<DuplicateGroup> = order
        .into_iter()
        .filter_map(|slot| {
            let group = members.remove(&slot)?;
            if group.len() < 2 {
                return None;
            }
            let (kind, key) = slot;
            Some(DuplicateGroup {
                kind,
                key,
                count: group.len(),
                ids: group.iter().map(|c| c.id.clone()).collect(),
                preview: group.iter().map(|c| ContactPreview::from(*c)).collect(),
            })
        })
        .collect();

    // Stable: ties stay in discovery order.
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups
}
