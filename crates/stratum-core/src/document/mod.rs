//! Document model shared by every store and migration.

pub mod filter;
pub mod model;

pub use filter::{Condition, Filter, Patch, PatchOp};
pub use model::{
    CLASS_FIELD, DOMAIN_MIGRATION, DOMAIN_SPACE, DocId, Document, Domain, ID_FIELD,
    MODIFIED_ON_FIELD, ModuleId, SPACE_FIELD, SPACE_SPACE, SPACE_WORKSPACE, SpaceRef,
};
