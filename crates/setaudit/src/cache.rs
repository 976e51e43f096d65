//! Per-document snapshot cache for category roles and delete plans.
//!
//! Both are pure functions of the model snapshot and the configuration, so
//! entries are keyed by document id and discarded as soon as the document's
//! revision or the configuration fingerprint changes.

use std::collections::HashMap;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::category::CategoryRoles;
use crate::cleanup::{DeletePlan, DeletePlanner};
use crate::config::{CategoryConfig, CleanupConfig};
use crate::host::ModelHost;

type Fingerprint = [u8; 32];

#[derive(Debug, Default)]
struct SnapshotEntry {
    revision: u64,
    roles: Option<(Fingerprint, CategoryRoles)>,
    plan: Option<(Fingerprint, DeletePlan)>,
}

/// Cache of derived, snapshot-scoped data.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    entries: HashMap<String, SnapshotEntry>,
    hits: usize,
    misses: usize,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Category roles for the host's current snapshot.
    pub fn roles<H: ModelHost + ?Sized>(&mut self, host: &H, config: &CategoryConfig) -> &CategoryRoles {
        let key = fingerprint(config);
        let entry = Self::entry_for(&mut self.entries, host);

        match &entry.roles {
            Some((cached, _)) if *cached == key => self.hits += 1,
            _ => {
                entry.roles = None;
                entry.plan = None;
                self.misses += 1;
            }
        }

        &entry
            .roles
            .get_or_insert_with(|| (key, CategoryRoles::classify(&host.categories(), config)))
            .1
    }

    /// Delete plan for the host's current snapshot.
    pub fn delete_plan<H: ModelHost + ?Sized>(
        &mut self,
        host: &H,
        roles: &CategoryRoles,
        config: &CleanupConfig,
    ) -> &DeletePlan {
        let key = fingerprint(&(&roles.seed, &roles.proxy, &roles.blacklist, config));
        let entry = Self::entry_for(&mut self.entries, host);

        match &entry.plan {
            Some((cached, _)) if *cached == key => self.hits += 1,
            _ => {
                entry.plan = None;
                self.misses += 1;
            }
        }

        &entry
            .plan
            .get_or_insert_with(|| (key, DeletePlanner::new(config).build(host, roles)))
            .1
    }

    /// Drop everything cached for one document.
    pub fn invalidate(&mut self, document_id: &str) {
        self.entries.remove(document_id);
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of documents with cached data.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookups served from the cache.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Lookups that had to recompute.
    pub fn misses(&self) -> usize {
        self.misses
    }

    fn entry_for<'e, H: ModelHost + ?Sized>(
        entries: &'e mut HashMap<String, SnapshotEntry>,
        host: &H,
    ) -> &'e mut SnapshotEntry {
        let revision = host.revision();
        let entry = entries.entry(host.document_id().to_string()).or_default();
        if entry.revision != revision {
            debug!(document = host.document_id(), revision, "snapshot changed, dropping cached data");
            *entry = SnapshotEntry {
                revision,
                ..SnapshotEntry::default()
            };
        }
        entry
    }
}

fn fingerprint<T: Serialize + ?Sized>(value: &T) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(value).unwrap_or_default());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, CategoryType, Element, ElementId};
    use crate::host::MemoryModel;

    fn model(doc: &str) -> MemoryModel {
        MemoryModel::new(doc)
            .with_category(Category::new("walls", "Walls", CategoryType::Model))
            .with_element(Element::new("w1", "walls"), None)
    }

    #[test]
    fn test_roles_reused_until_config_changes() {
        let model = model("doc");
        let mut cache = SnapshotCache::new();

        let first = cache.roles(&model, &CategoryConfig::new()).clone();
        let second = cache.roles(&model, &CategoryConfig::new()).clone();
        assert_eq!(first, second);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);

        let blacklisted = cache.roles(&model, &CategoryConfig::new().with_blacklist(["walls"])).clone();
        assert!(blacklisted.is_blacklisted(&"walls".into()));
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn test_plan_dropped_when_revision_changes() {
        let mut model = model("doc");
        let mut cache = SnapshotCache::new();
        let cleanup = CleanupConfig::default();

        let roles = cache.roles(&model, &CategoryConfig::new()).clone();
        let plan = cache.delete_plan(&model, &roles, &cleanup).clone();
        assert!(plan.other_uids.contains(&ElementId::from("w1")));

        model.begin_transaction("add").unwrap();
        model.add_element(Element::new("w2", "walls"), None);
        model.commit().unwrap();

        let plan = cache.delete_plan(&model, &roles, &cleanup).clone();
        assert!(plan.other_uids.contains(&ElementId::from("w2")));
        assert_eq!(plan.revision, model.revision());
    }

    #[test]
    fn test_documents_cached_separately() {
        let a = model("a");
        let b = model("b");
        let mut cache = SnapshotCache::new();

        cache.roles(&a, &CategoryConfig::new());
        cache.roles(&b, &CategoryConfig::new());
        assert_eq!(cache.len(), 2);

        cache.invalidate("a");
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
