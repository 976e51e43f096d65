//! Identity newtypes.
//!
//! Every identity inside the core is a stable string key. Session-local numeric
//! ids differ between cloned documents and never cross a plan boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identity from any string-like key.
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Borrow the underlying key.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(key.to_string())
            }
        }

        impl From<String> for $name {
            fn from(key: String) -> Self {
                Self(key)
            }
        }
    };
}

string_id!(
    /// Stable element identifier, valid across document clones.
    ElementId
);

string_id!(
    /// Category identifier.
    CategoryId
);

string_id!(
    /// Stable selection set identifier. Preferred over the (mutable) set name.
    SetId
);

string_id!(
    /// View identifier.
    ViewId
);
