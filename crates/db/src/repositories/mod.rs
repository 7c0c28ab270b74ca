//! Static repository structs, one per table.
//!
//! Every method takes any [`sqlx::PgExecutor`], so the same query runs
//! against the pool or inside a caller's transaction (`&mut *tx`).

pub mod block_repo;
pub mod lock_repo;
pub mod project_repo;
pub mod report_version_repo;
pub mod section_repo;

pub use block_repo::BlockRepo;
pub use lock_repo::LockRepo;
pub use project_repo::ProjectRepo;
pub use report_version_repo::ReportVersionRepo;
pub use section_repo::SectionRepo;
