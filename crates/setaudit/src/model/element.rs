//! Element, category and selection set records as seen by the core.

use serde::{Deserialize, Serialize};

use super::ids::{CategoryId, ElementId, SetId, ViewId};

/// Broad classification of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    /// Physical model geometry (walls, floors, equipment).
    Model,
    /// Annotation (tags, dimensions, grids, levels).
    Annotation,
    /// Anything else (internal, analytical).
    Other,
}

impl CategoryType {
    /// Whether elements of this type may be curated or deleted at all.
    pub fn is_eligible(&self) -> bool {
        matches!(self, CategoryType::Model | CategoryType::Annotation)
    }
}

/// A category of the model. Static for a model session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub category_type: CategoryType,
}

impl Category {
    /// Create a category.
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>, category_type: CategoryType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category_type,
        }
    }
}

/// Runtime class of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementClass {
    #[default]
    Element,
    View,
    Schedule,
    Sheet,
}

impl ElementClass {
    /// Views, schedules and sheets are never deleted by cleanup.
    pub fn is_view_like(&self) -> bool {
        !matches!(self, ElementClass::Element)
    }
}

/// Read-only description of an element, as reported by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Stable identifier.
    pub id: ElementId,

    /// Session-local numeric id. Diagnostic only.
    #[serde(default)]
    pub session_id: i64,

    /// Category of the element.
    pub category: CategoryId,

    /// Family name, if the element is a family instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    /// Type name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    /// Runtime class.
    #[serde(default)]
    pub class: ElementClass,

    /// Whether the element exists only in one view.
    #[serde(default)]
    pub view_specific: bool,

    /// Owning view of a view-specific element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_view: Option<ViewId>,

    /// Group the element belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<ElementId>,
}

impl Element {
    /// Create a plain model element in the given category.
    pub fn new(id: impl Into<ElementId>, category: impl Into<CategoryId>) -> Self {
        Self {
            id: id.into(),
            session_id: 0,
            category: category.into(),
            family: None,
            type_name: None,
            class: ElementClass::Element,
            view_specific: false,
            owner_view: None,
            group: None,
        }
    }

    /// Set family and type names.
    pub fn with_family_type(mut self, family: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self.type_name = Some(type_name.into());
        self
    }

    /// Mark the element as view-specific, owned by `view`.
    pub fn in_view(mut self, view: impl Into<ViewId>) -> Self {
        self.view_specific = true;
        self.owner_view = Some(view.into());
        self
    }

    /// Set the runtime class.
    pub fn with_class(mut self, class: ElementClass) -> Self {
        self.class = class;
        self
    }

    /// Mark the element as a member of a group.
    pub fn in_group(mut self, group: impl Into<ElementId>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// Lightweight handle to a host-persisted selection set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionSetRef {
    pub id: SetId,
    pub name: String,
}

