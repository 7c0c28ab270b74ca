//! Row structs for each table.
//!
//! Each submodule contains a `FromRow` struct matching the database row and a
//! conversion into the matching `folio_core` domain type. Enum columns are
//! stored as text and parsed during conversion.

pub mod block;
pub mod lock;
pub mod project;
pub mod report_version;
pub mod section;
