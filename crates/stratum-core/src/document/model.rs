//! Identifiers and the shape-free document representation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Field holding a document's identifier.
pub const ID_FIELD: &str = "_id";
/// Field holding a document's class.
pub const CLASS_FIELD: &str = "_class";
/// Field holding the container (space) a document belongs to.
pub const SPACE_FIELD: &str = "space";
/// Field stores stamp with the epoch-millis time of the last write.
pub const MODIFIED_ON_FIELD: &str = "modifiedOn";

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

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
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Globally unique, release-stable name of a module (plugin).
    ///
    /// Used as the key into persisted migration state, so it must never change
    /// once a module has shipped.
    ModuleId
);

string_id!(
    /// A storage partition within a workspace.
    Domain
);

string_id!(
    /// Identifier of a document, unique within its domain.
    DocId
);

string_id!(
    /// Reference to a container (space) document.
    SpaceRef
);

impl DocId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Domain holding persisted migration state records.
pub const DOMAIN_MIGRATION: &str = "migration";
/// Domain holding container (space) documents.
pub const DOMAIN_SPACE: &str = "space";

/// The workspace-wide space every workspace has.
pub const SPACE_WORKSPACE: &str = "core:space:Workspace";
/// The space container documents themselves live in.
pub const SPACE_SPACE: &str = "core:space:Space";

impl Domain {
    pub fn migration() -> Self {
        Self::new(DOMAIN_MIGRATION)
    }

    pub fn space() -> Self {
        Self::new(DOMAIN_SPACE)
    }

    /// True for domains owned by the engine rather than by application data.
    pub fn is_reserved(&self) -> bool {
        self.0 == DOMAIN_MIGRATION
    }
}

impl SpaceRef {
    pub fn workspace() -> Self {
        Self::new(SPACE_WORKSPACE)
    }
}

/// A shape-free document.
///
/// Migrations operate on legacy and evolving shapes, so a document is just a
/// JSON object. The accessors below read the reserved fields and return `None`
/// when a field is missing or has an unexpected type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Creates an empty document with the given identifier.
    pub fn new(id: impl Into<DocId>) -> Self {
        let id: DocId = id.into();
        let mut doc = Self::default();
        doc.set(ID_FIELD, Value::String(id.0));
        doc
    }

    /// Builder-style field setter.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn with_class(self, class: impl Into<String>) -> Self {
        let class: String = class.into();
        self.with(CLASS_FIELD, class)
    }

    pub fn with_space(self, space: &SpaceRef) -> Self {
        self.with(SPACE_FIELD, space.as_str())
    }

    pub fn id(&self) -> Option<DocId> {
        self.str_field(ID_FIELD).map(DocId::new)
    }

    pub fn class(&self) -> Option<&str> {
        self.str_field(CLASS_FIELD)
    }

    pub fn space(&self) -> Option<SpaceRef> {
        self.str_field(SPACE_FIELD).map(SpaceRef::new)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    pub fn unset(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Document {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
