//! Editing model: selection and edit operations

mod cursor;
mod operation;

pub use cursor::{Affinity, Selection};
pub use operation::{EditKind, EditOp, EditResult};
