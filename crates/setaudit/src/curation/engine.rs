//! Curation engine: reconciles selection sets against the element graph.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::category::CategoryRoles;
use crate::config::CurationConfig;
use crate::host::ModelHost;
use crate::model::{BoundingVolume, Element, ElementId, SelectionSetRef, ViewId};

use super::plan::{CuratePlan, SetDelta};

/// Bucket label for removed members that no longer resolve.
const UNKNOWN_BUCKET: &str = "(Deleted/Unknown)";

/// Working state for one candidate set during a compute pass.
struct SetState {
    set: SelectionSetRef,
    raw: BTreeSet<ElementId>,
    resolved: HashMap<ElementId, Element>,
    explicit: bool,
}

/// Working state for one valid set.
struct ValidSet {
    state: SetState,
    volume: Option<BoundingVolume>,
    ambiguity: Vec<String>,
    expansion: BTreeMap<ElementId, Element>,
}

/// Computes a [`CuratePlan`] from the current state of a model.
///
/// Computing never mutates the model.
pub struct CurationEngine<'a> {
    roles: &'a CategoryRoles,
    config: &'a CurationConfig,
}

impl<'a> CurationEngine<'a> {
    /// Create an engine over classified category roles.
    pub fn new(roles: &'a CategoryRoles, config: &'a CurationConfig) -> Self {
        Self { roles, config }
    }

    /// Compute a plan for every selection set in the model.
    pub fn compute_all<H: ModelHost + ?Sized>(&self, host: &H) -> CuratePlan {
        self.compute(host, &[])
    }

    /// Compute a plan, optionally restricted to sets named by id or name.
    ///
    /// An empty `restrict_to` means every set. A non-empty `restrict_to`
    /// that matches no set yields an empty plan.
    pub fn compute<H: ModelHost + ?Sized>(&self, host: &H, restrict_to: &[String]) -> CuratePlan {
        let mut plan = CuratePlan::empty(host.document_id());

        let restricted = !restrict_to.is_empty();
        let candidates: Vec<SelectionSetRef> = host
            .selection_sets()
            .into_iter()
            .filter(|s| {
                !restricted
                    || restrict_to
                        .iter()
                        .any(|key| key == s.id.as_str() || key == &s.name)
            })
            .collect();

        if restricted && candidates.is_empty() {
            debug!(requested = restrict_to.len(), "no selection set matched restriction");
            return plan;
        }

        // Validity filter
        let mut valid: Vec<ValidSet> = Vec::new();
        for set in candidates {
            let state = self.load_set(host, set, restricted);
            if self.is_valid(&state) {
                valid.push(ValidSet {
                    state,
                    volume: None,
                    ambiguity: Vec::new(),
                    expansion: BTreeMap::new(),
                });
            } else {
                debug!(set = %state.set.name, "set has no seed-category member");
                if state.explicit {
                    plan.ignored_set_names.push(state.set.name.clone());
                }
            }
        }

        // Inclusion volumes
        for v in &mut valid {
            v.volume = self.inclusion_volume(host, &v.state);
            if v.volume.is_none() {
                debug!(set = %v.state.set.name, "no resolvable seed bounds, removal-only");
            }
        }

        let multi = valid.len() > 1;
        if multi {
            detect_ambiguity(&mut valid);
        }

        self.expand(host, &mut valid, multi);

        for v in &valid {
            plan.valid_set_names.push(v.state.set.name.clone());
            if !v.ambiguity.is_empty() {
                plan.ambiguous_set_names.push(v.state.set.name.clone());
            }
            plan.deltas.push(self.synthesize(v));
        }

        let summary = plan.summary();
        info!(
            document = %plan.document_id,
            valid = summary.valid_sets,
            ignored = summary.ignored_sets,
            ambiguous = summary.ambiguous_sets,
            added = summary.total_added,
            removed = summary.total_removed,
            "computed curate plan"
        );

        plan
    }

    fn load_set<H: ModelHost + ?Sized>(&self, host: &H, set: SelectionSetRef, explicit: bool) -> SetState {
        let raw: BTreeSet<ElementId> = host.members(&set.id).unwrap_or_default().into_iter().collect();
        let resolved = raw
            .iter()
            .filter_map(|id| host.element(id).map(|e| (id.clone(), e)))
            .collect();

        SetState {
            set,
            raw,
            resolved,
            explicit,
        }
    }

    /// A set is valid when a non-blacklisted member is in a seed category.
    fn is_valid(&self, state: &SetState) -> bool {
        state
            .resolved
            .values()
            .filter(|e| !self.roles.is_blacklisted(&e.category))
            .any(|e| self.roles.is_seed(&e.category))
    }

    /// Inflated union of the seed members' bounds.
    fn inclusion_volume<H: ModelHost + ?Sized>(&self, host: &H, state: &SetState) -> Option<BoundingVolume> {
        let volumes: Vec<BoundingVolume> = state
            .resolved
            .values()
            .filter(|e| self.roles.is_seed(&e.category))
            .filter_map(|e| host.bounds(&e.id, view_of(e)))
            .collect();

        BoundingVolume::union_all(volumes.iter()).map(|u| u.inflate(self.config.inflation_offset()))
    }

    /// Views used to scope proxy lookups for a set.
    fn proxy_scope<H: ModelHost + ?Sized>(&self, host: &H, state: &SetState) -> Vec<ViewId> {
        let views = host.set_views(&state.set.id);
        if !views.is_empty() || !self.config.proxy_scope_from_members {
            return views;
        }

        let owners: BTreeSet<ViewId> = state
            .resolved
            .values()
            .filter_map(|e| e.owner_view.clone())
            .collect();
        owners.into_iter().collect()
    }

    /// Spatial expansion with global claim tracking in multi-set mode.
    fn expand<H: ModelHost + ?Sized>(&self, host: &H, valid: &mut [ValidSet], multi: bool) {
        let mut claimed: HashMap<ElementId, usize> = HashMap::new();
        if multi {
            for (idx, v) in valid.iter().enumerate() {
                for id in &v.state.raw {
                    claimed.entry(id.clone()).or_insert(idx);
                }
            }
        }

        let has_proxy = !self.roles.proxy.is_empty();

        for idx in 0..valid.len() {
            let Some(volume) = valid[idx].volume else {
                continue;
            };

            let mut found: Vec<(ElementId, bool)> = host
                .query_by_volume(&volume, None)
                .into_iter()
                .map(|id| (id, false))
                .collect();

            if has_proxy {
                let scope = self.proxy_scope(host, &valid[idx].state);
                if scope.is_empty() {
                    debug!(set = %valid[idx].state.set.name, "no view scope for proxy lookup");
                } else {
                    found.extend(
                        host.query_by_volume(&volume, Some(scope.as_slice()))
                            .into_iter()
                            .map(|id| (id, true)),
                    );
                }
            }

            let mut accepted = BTreeMap::new();
            for (id, via_proxy_scope) in found {
                if valid[idx].state.raw.contains(&id) || accepted.contains_key(&id) {
                    continue;
                }
                if multi && claimed.get(&id).is_some_and(|owner| *owner != idx) {
                    continue;
                }
                let Some(element) = host.element(&id) else {
                    continue;
                };
                if self.admits(&element, via_proxy_scope) {
                    accepted.insert(id, element);
                }
            }

            if multi {
                for id in accepted.keys() {
                    claimed.insert(id.clone(), idx);
                }
            }

            debug!(
                set = %valid[idx].state.set.name,
                candidates = accepted.len(),
                "spatial expansion"
            );
            valid[idx].expansion = accepted;
        }
    }

    /// Category filter for expansion candidates.
    ///
    /// Proxy categories are only taken from the view-scoped lookup; the
    /// model-wide lookup admits every other eligible category.
    fn admits(&self, element: &Element, via_proxy_scope: bool) -> bool {
        let category = &element.category;
        if !self.roles.category_type(category).is_eligible() || self.roles.is_blacklisted(category) {
            return false;
        }
        if self.roles.proxy.is_empty() {
            return true;
        }
        if via_proxy_scope {
            self.roles.is_proxy(category)
        } else {
            !self.roles.is_proxy(category)
        }
    }

    fn synthesize(&self, v: &ValidSet) -> SetDelta {
        let state = &v.state;

        let unresolved: BTreeSet<ElementId> = state
            .raw
            .iter()
            .filter(|id| !state.resolved.contains_key(*id))
            .cloned()
            .collect();

        let blacklist_removals: BTreeSet<ElementId> = state
            .resolved
            .values()
            .filter(|e| self.roles.is_blacklisted(&e.category))
            .map(|e| e.id.clone())
            .collect();

        let after: BTreeSet<ElementId> = state
            .raw
            .iter()
            .filter(|id| !unresolved.contains(*id) && !blacklist_removals.contains(*id))
            .chain(v.expansion.keys())
            .cloned()
            .collect();

        let to_add: BTreeSet<ElementId> = after.difference(&state.raw).cloned().collect();
        let to_remove: BTreeSet<ElementId> = state.raw.difference(&after).cloned().collect();

        let details = self.describe(v, &to_add, &to_remove);

        SetDelta {
            set_name: state.set.name.clone(),
            filter_identity: state.set.id.clone(),
            before_ids: state.raw.clone(),
            to_add,
            to_remove,
            after_ids: after,
            unresolved_ids: unresolved,
            blacklist_removals,
            was_ambiguous: !v.ambiguity.is_empty(),
            details,
        }
    }

    /// Diff summary grouped by (Category, Family, Type).
    fn describe(&self, v: &ValidSet, to_add: &BTreeSet<ElementId>, to_remove: &BTreeSet<ElementId>) -> String {
        let mut lines = Vec::new();

        if to_add.is_empty() && to_remove.is_empty() {
            lines.push("No changes".to_string());
        } else {
            lines.push(format!("Added {}, removed {}", to_add.len(), to_remove.len()));
        }

        let lookup = |id: &ElementId| -> Option<&Element> {
            v.state.resolved.get(id).or_else(|| v.expansion.get(id))
        };
        let group = |ids: &BTreeSet<ElementId>| -> IndexMap<String, usize> {
            let mut groups: IndexMap<String, usize> = IndexMap::new();
            for id in ids {
                let key = lookup(id)
                    .map(|e| self.group_label(e))
                    .unwrap_or_else(|| UNKNOWN_BUCKET.to_string());
                *groups.entry(key).or_insert(0) += 1;
            }
            groups
        };

        let added = group(to_add);
        let removed = group(to_remove);

        for (label, count) in &added {
            lines.push(format!("  + {} ({})", label, count));
        }
        for (label, count) in &removed {
            lines.push(format!("  - {} ({})", label, count));
        }

        if !v.ambiguity.is_empty() {
            lines.push(format!("Ambiguous: {}", v.ambiguity.join("; ")));
        }

        lines.join("\n")
    }

    fn group_label(&self, e: &Element) -> String {
        format!(
            "{} / {} / {}",
            self.roles.category_name(&e.category),
            e.family.as_deref().unwrap_or("-"),
            e.type_name.as_deref().unwrap_or("-")
        )
    }
}

/// Owner view for view-specific elements, model space otherwise.
fn view_of(e: &Element) -> Option<&ViewId> {
    if e.view_specific {
        e.owner_view.as_ref()
    } else {
        None
    }
}

/// Mark sets that share raw members or whose inclusion volumes overlap.
fn detect_ambiguity(valid: &mut [ValidSet]) {
    let mut owners: HashMap<&ElementId, Vec<usize>> = HashMap::new();
    for (idx, v) in valid.iter().enumerate() {
        for id in &v.state.raw {
            owners.entry(id).or_default().push(idx);
        }
    }

    // (set, other set) -> shared element count
    let mut shared: IndexMap<(usize, usize), usize> = IndexMap::new();
    for sets in owners.values().filter(|sets| sets.len() > 1) {
        for &a in sets {
            for &b in sets {
                if a != b {
                    *shared.entry((a, b)).or_insert(0) += 1;
                }
            }
        }
    }
    shared.sort_keys();

    let mut reasons: Vec<Vec<String>> = vec![Vec::new(); valid.len()];
    for ((a, b), count) in &shared {
        reasons[*a].push(format!(
            "shares {} element(s) with '{}'",
            count, valid[*b].state.set.name
        ));
    }

    for a in 0..valid.len() {
        for b in (a + 1)..valid.len() {
            if let (Some(va), Some(vb)) = (valid[a].volume, valid[b].volume) {
                if va.intersects(&vb) {
                    let (na, nb) = (valid[a].state.set.name.clone(), valid[b].state.set.name.clone());
                    reasons[a].push(format!("inclusion volume overlaps '{}'", nb));
                    reasons[b].push(format!("inclusion volume overlaps '{}'", na));
                }
            }
        }
    }

    for (v, r) in valid.iter_mut().zip(reasons) {
        v.ambiguity = r;
    }
}
