//! Core data model: identities, categories, elements and bounding volumes.

mod bounds;
mod element;
mod ids;

pub use bounds::{BoundingVolume, Point3};
pub use element::{Category, CategoryType, Element, ElementClass, SelectionSetRef};
pub use ids::{CategoryId, ElementId, SetId, ViewId};
