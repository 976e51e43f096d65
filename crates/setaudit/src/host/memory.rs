//! In-memory model host for tests and JSON snapshots.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SetAuditError};
use crate::model::{
    BoundingVolume, Category, CategoryId, Element, ElementId, SelectionSetRef, SetId, ViewId,
};
use crate::persistence;

use super::traits::{DeleteRejected, FailureInterceptor, FailureSeverity, HostFailure, ModelHost};

/// An element as stored by the in-memory host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredElement {
    #[serde(flatten)]
    pub element: Element,

    /// Model-space bounds (view-space for view-specific elements).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundingVolume>,

    /// Views the element is visible in. Empty means every view.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub visible_in: BTreeSet<ViewId>,

    /// Host element; deleting the host cascades to this element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosted_by: Option<ElementId>,
}

/// A selection set as stored by the in-memory host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSet {
    pub id: SetId,
    pub name: String,
    #[serde(default)]
    pub members: BTreeSet<ElementId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub views: Vec<ViewId>,
}

/// Injected faults, for exercising failure paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faults {
    /// Elements whose deletion raises an Error-severity failure.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub poisoned: BTreeSet<ElementId>,

    /// Elements whose deletion raises a Warning-severity failure.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub warn_on_delete: BTreeSet<ElementId>,

    /// Sets whose membership writes are rejected.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub locked_sets: BTreeSet<SetId>,
}

/// Serialized form of a [`MemoryModel`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ModelSnapshot {
    document_id: String,
    #[serde(default)]
    revision: u64,
    #[serde(default)]
    categories: Vec<Category>,
    #[serde(default)]
    elements: Vec<StoredElement>,
    #[serde(default)]
    sets: Vec<StoredSet>,
    #[serde(default)]
    faults: Faults,
}

#[derive(Debug, Clone)]
struct OpenTransaction {
    name: String,
    elements: IndexMap<ElementId, StoredElement>,
    sets: Vec<StoredSet>,
    pending_warnings: Vec<String>,
}

/// A complete [`ModelHost`] over an in-memory element graph.
///
/// Cloning a model clones its committed state, which is how per-set
/// cleanup runs obtain an independent document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "ModelSnapshot", into = "ModelSnapshot")]
pub struct MemoryModel {
    document_id: String,
    revision: u64,
    categories: IndexMap<CategoryId, Category>,
    elements: IndexMap<ElementId, StoredElement>,
    sets: Vec<StoredSet>,
    faults: Faults,
    transaction: Option<OpenTransaction>,
    regenerations: usize,
    pending_warnings: Vec<String>,
}

impl From<ModelSnapshot> for MemoryModel {
    fn from(snapshot: ModelSnapshot) -> Self {
        Self {
            document_id: snapshot.document_id,
            revision: snapshot.revision,
            categories: snapshot
                .categories
                .into_iter()
                .map(|c| (c.id.clone(), c))
                .collect(),
            elements: snapshot
                .elements
                .into_iter()
                .map(|e| (e.element.id.clone(), e))
                .collect(),
            sets: snapshot.sets,
            faults: snapshot.faults,
            transaction: None,
            regenerations: 0,
            pending_warnings: Vec::new(),
        }
    }
}

impl From<MemoryModel> for ModelSnapshot {
    fn from(model: MemoryModel) -> Self {
        Self {
            document_id: model.document_id,
            revision: model.revision,
            categories: model.categories.into_values().collect(),
            elements: model.elements.into_values().collect(),
            sets: model.sets,
            faults: model.faults,
        }
    }
}

impl MemoryModel {
    /// Create an empty model.
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            ..Self::default()
        }
    }

    /// Add a category.
    pub fn with_category(mut self, category: Category) -> Self {
        self.add_category(category);
        self
    }

    /// Add an element with optional bounds.
    pub fn with_element(mut self, element: Element, bounds: Option<BoundingVolume>) -> Self {
        self.add_element(element, bounds);
        self
    }

    /// Add a selection set.
    pub fn with_set<I, E>(mut self, id: impl Into<SetId>, name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<ElementId>,
    {
        self.add_set(id, name, members);
        self
    }

    /// Add a category.
    pub fn add_category(&mut self, category: Category) {
        self.categories.insert(category.id.clone(), category);
    }

    /// Add (or replace) an element.
    pub fn add_element(&mut self, element: Element, bounds: Option<BoundingVolume>) {
        self.elements.insert(
            element.id.clone(),
            StoredElement {
                element,
                bounds,
                visible_in: BTreeSet::new(),
                hosted_by: None,
            },
        );
    }

    /// Add a selection set.
    pub fn add_set<I, E>(&mut self, id: impl Into<SetId>, name: impl Into<String>, members: I)
    where
        I: IntoIterator<Item = E>,
        E: Into<ElementId>,
    {
        self.sets.push(StoredSet {
            id: id.into(),
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
            views: Vec::new(),
        });
    }

    /// Associate views with a set.
    pub fn set_view_scope(&mut self, set: &SetId, views: Vec<ViewId>) -> Result<()> {
        let stored = self.set_mut(set)?;
        stored.views = views;
        Ok(())
    }

    /// Restrict the views an element is visible in.
    pub fn set_visible_in(&mut self, id: &ElementId, views: impl IntoIterator<Item = ViewId>) -> Result<()> {
        let stored = self.stored_mut(id)?;
        stored.visible_in = views.into_iter().collect();
        Ok(())
    }

    /// Make `id` a dependent of `host`: deleting the host deletes it too.
    pub fn set_hosted_by(&mut self, id: &ElementId, host: &ElementId) -> Result<()> {
        let stored = self.stored_mut(id)?;
        stored.hosted_by = Some(host.clone());
        Ok(())
    }

    /// Rename a set.
    pub fn rename_set(&mut self, set: &SetId, name: impl Into<String>) -> Result<()> {
        let stored = self.set_mut(set)?;
        stored.name = name.into();
        Ok(())
    }

    /// Make deletion of `id` raise an Error-severity failure.
    pub fn poison(&mut self, id: impl Into<ElementId>) {
        self.faults.poisoned.insert(id.into());
    }

    /// Make deletion of `id` raise a Warning-severity failure.
    pub fn warn_on_delete(&mut self, id: impl Into<ElementId>) {
        self.faults.warn_on_delete.insert(id.into());
    }

    /// Make membership writes to `set` fail.
    pub fn lock_set(&mut self, set: impl Into<SetId>) {
        self.faults.locked_sets.insert(set.into());
    }

    /// Whether the element exists.
    pub fn contains(&self, id: &ElementId) -> bool {
        self.elements.contains_key(id)
    }

    /// Number of elements.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Find a set by name.
    pub fn set_by_name(&self, name: &str) -> Option<&StoredSet> {
        self.sets.iter().find(|s| s.name == name)
    }

    /// How many times the model was regenerated.
    pub fn regenerations(&self) -> usize {
        self.regenerations
    }

    /// Whether a mutation scope is open.
    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    /// Warnings raised by deletions and left undismissed.
    pub fn pending_warnings(&self) -> &[String] {
        &self.pending_warnings
    }

    /// Load a model snapshot from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        persistence::load_json(path.as_ref(), "model snapshot")
    }

    /// Save the committed model state to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        persistence::save_json(path.as_ref(), self, "model snapshot")
    }

    fn stored_mut(&mut self, id: &ElementId) -> Result<&mut StoredElement> {
        self.elements
            .get_mut(id)
            .ok_or_else(|| SetAuditError::NotFound(format!("element '{}'", id)))
    }

    fn set_mut(&mut self, set: &SetId) -> Result<&mut StoredSet> {
        self.sets
            .iter_mut()
            .find(|s| &s.id == set)
            .ok_or_else(|| SetAuditError::NotFound(format!("selection set '{}'", set)))
    }

    fn require_transaction(&self, operation: &str) -> Result<()> {
        if self.transaction.is_none() {
            return Err(SetAuditError::Transaction(format!(
                "{} requires an open transaction",
                operation
            )));
        }
        Ok(())
    }

    /// `ids` plus every element transitively hosted by them.
    fn with_dependents(&self, ids: &[ElementId]) -> BTreeSet<ElementId> {
        let mut children: HashMap<&ElementId, Vec<&ElementId>> = HashMap::new();
        for (id, stored) in &self.elements {
            if let Some(host) = &stored.hosted_by {
                children.entry(host).or_default().push(id);
            }
        }

        let mut closure: BTreeSet<ElementId> = BTreeSet::new();
        let mut stack: Vec<&ElementId> = ids.iter().collect();
        while let Some(id) = stack.pop() {
            if closure.insert(id.clone()) {
                if let Some(kids) = children.get(id) {
                    stack.extend(kids.iter().copied());
                }
            }
        }
        closure
    }

    fn visible_in_scope(stored: &StoredElement, views: &[ViewId]) -> bool {
        if stored.element.view_specific {
            return stored
                .element
                .owner_view
                .as_ref()
                .is_some_and(|owner| views.contains(owner));
        }
        stored.visible_in.is_empty() || views.iter().any(|v| stored.visible_in.contains(v))
    }
}

impl ModelHost for MemoryModel {
    fn document_id(&self) -> &str {
        &self.document_id
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn categories(&self) -> Vec<Category> {
        self.categories.values().cloned().collect()
    }

    fn element_ids(&self) -> Vec<ElementId> {
        self.elements.keys().cloned().collect()
    }

    fn element(&self, id: &ElementId) -> Option<Element> {
        self.elements.get(id).map(|s| s.element.clone())
    }

    fn bounds(&self, id: &ElementId, view: Option<&ViewId>) -> Option<BoundingVolume> {
        let stored = self.elements.get(id)?;
        if stored.element.view_specific && stored.element.owner_view.as_ref() != view {
            return None;
        }
        stored.bounds
    }

    fn query_by_volume(&self, volume: &BoundingVolume, views: Option<&[ViewId]>) -> Vec<ElementId> {
        self.elements
            .values()
            .filter(|stored| match views {
                Some(scope) => Self::visible_in_scope(stored, scope),
                None => !stored.element.view_specific,
            })
            .filter(|stored| stored.bounds.is_some_and(|b| b.intersects(volume)))
            .map(|stored| stored.element.id.clone())
            .collect()
    }

    fn selection_sets(&self) -> Vec<SelectionSetRef> {
        self.sets
            .iter()
            .map(|s| SelectionSetRef {
                id: s.id.clone(),
                name: s.name.clone(),
            })
            .collect()
    }

    fn members(&self, set: &SetId) -> Option<Vec<ElementId>> {
        self.sets
            .iter()
            .find(|s| &s.id == set)
            .map(|s| s.members.iter().cloned().collect())
    }

    fn set_views(&self, set: &SetId) -> Vec<ViewId> {
        self.sets
            .iter()
            .find(|s| &s.id == set)
            .map(|s| s.views.clone())
            .unwrap_or_default()
    }

    fn resolve_stable_id(&self, uid: &str) -> Option<ElementId> {
        let id = ElementId::new(uid);
        self.elements.contains_key(&id).then_some(id)
    }

    fn set_members(&mut self, set: &SetId, ids: &BTreeSet<ElementId>) -> Result<()> {
        self.require_transaction("set_members")?;
        if self.faults.locked_sets.contains(set) {
            return Err(SetAuditError::Host(format!(
                "selection set '{}' is read-only",
                set
            )));
        }
        let stored = self.set_mut(set)?;
        stored.members = ids.clone();
        Ok(())
    }

    fn begin_transaction(&mut self, name: &str) -> Result<()> {
        if let Some(open) = &self.transaction {
            return Err(SetAuditError::Transaction(format!(
                "cannot start '{}': transaction '{}' is still open",
                name, open.name
            )));
        }
        self.transaction = Some(OpenTransaction {
            name: name.to_string(),
            elements: self.elements.clone(),
            sets: self.sets.clone(),
            pending_warnings: self.pending_warnings.clone(),
        });
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        match self.transaction.take() {
            Some(_) => {
                self.revision += 1;
                Ok(())
            }
            None => Err(SetAuditError::Transaction(
                "commit without an open transaction".to_string(),
            )),
        }
    }

    fn rollback(&mut self) {
        if let Some(open) = self.transaction.take() {
            self.elements = open.elements;
            self.sets = open.sets;
            self.pending_warnings = open.pending_warnings;
        }
    }

    fn regenerate(&mut self) -> Result<()> {
        self.regenerations += 1;
        Ok(())
    }

    fn delete_elements(
        &mut self,
        ids: &[ElementId],
        interceptor: &mut dyn FailureInterceptor,
    ) -> std::result::Result<usize, DeleteRejected> {
        if self.transaction.is_none() {
            return Err(DeleteRejected::new("delete requires an open transaction"));
        }

        if let Some(missing) = ids.iter().find(|id| !self.elements.contains_key(*id)) {
            return Err(DeleteRejected::new(format!(
                "Element '{}' does not exist",
                missing
            )));
        }

        let doomed = self.with_dependents(ids);

        let mut first_error: Option<String> = None;
        let mut warnings = Vec::new();
        for id in &doomed {
            let severity = if self.faults.poisoned.contains(id) {
                FailureSeverity::Error
            } else if self.faults.warn_on_delete.contains(id) {
                FailureSeverity::Warning
            } else {
                continue;
            };

            let text = match severity {
                FailureSeverity::Error => format!("Can't delete element '{}'", id),
                FailureSeverity::Warning => format!("Deleting '{}' affects other elements", id),
            };
            let mut failure = HostFailure::new(severity, text);
            interceptor.on_failure(&mut failure);

            match failure.severity() {
                FailureSeverity::Error if first_error.is_none() => {
                    first_error = Some(failure.description_text().to_string());
                }
                FailureSeverity::Error => {}
                FailureSeverity::Warning if !failure.is_dismissed() => {
                    warnings.push(failure.description_text().to_string());
                }
                FailureSeverity::Warning => {}
            }
        }

        if let Some(message) = first_error {
            return Err(DeleteRejected::new(message));
        }

        self.pending_warnings.extend(warnings);
        for id in &doomed {
            self.elements.shift_remove(id);
        }
        for set in &mut self.sets {
            set.members.retain(|m| !doomed.contains(m));
        }

        Ok(doomed.len())
    }
}
