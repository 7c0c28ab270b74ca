//! In-process implementation of every storage trait.
//!
//! All state sits behind one async mutex, so each trait call runs as a
//! single atomic unit exactly like a database transaction would. Used by the
//! test suites and by embedders that do not need durability.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::Mutex;

use crate::document::{Block, NewBlock, NewSection, Project, Section, SectionTree};
use crate::error::{CoreError, CoreResult};
use crate::locking::{plan_acquire, AcquirePlan, Lock, LockRequest, ResourceType};
use crate::snapshot::{NewReportVersion, ReportVersion, ReportVersionSummary, SectionSnapshot};
use crate::store::{DocumentStore, LockStore, VersionStore};
use crate::types::{DbId, Timestamp};

#[derive(Debug, Default)]
struct State {
    last_id: DbId,
    projects: BTreeMap<DbId, Project>,
    sections: BTreeMap<DbId, Section>,
    blocks: BTreeMap<DbId, Block>,
    locks: BTreeMap<DbId, Lock>,
    versions: BTreeMap<DbId, ReportVersion>,
}

impl State {
    fn next_id(&mut self) -> DbId {
        self.last_id += 1;
        self.last_id
    }

    fn lock_for(&self, resource_type: ResourceType, resource_id: DbId) -> Option<&Lock> {
        self.locks
            .values()
            .find(|l| l.resource_type == resource_type && l.resource_id == resource_id)
    }

    fn sections_of(&self, project_id: DbId) -> Vec<Section> {
        let mut sections: Vec<_> = self
            .sections
            .values()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect();
        sections.sort_by_key(|s| (s.order, s.id));
        sections
    }

    fn blocks_of(&self, section_id: DbId) -> Vec<Block> {
        let mut blocks: Vec<_> = self
            .blocks
            .values()
            .filter(|b| b.section_id == section_id)
            .cloned()
            .collect();
        blocks.sort_by_key(|b| (b.order, b.id));
        blocks
    }

    fn push_section(&mut self, input: &NewSection, now: Timestamp) -> Section {
        let section = Section {
            id: self.next_id(),
            project_id: input.project_id,
            heading_text: input.heading_text.clone(),
            heading_level: input.heading_level,
            order: input.order,
            created_at: now,
        };
        self.sections.insert(section.id, section.clone());
        section
    }

    fn push_block(&mut self, input: &NewBlock, now: Timestamp) -> Block {
        let block = Block {
            id: self.next_id(),
            project_id: input.project_id,
            section_id: input.section_id,
            order: input.order,
            block_type: input.block_type,
            markdown_text: input.markdown_text.clone(),
            last_edited_at: now,
        };
        self.blocks.insert(block.id, block.clone());
        block
    }
}

/// Storage backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a project. Projects are owned by an external collaborator in
    /// production; this exists for fixtures and embedded use.
    pub async fn create_project(&self, name: &str) -> Project {
        let mut state = self.state.lock().await;
        let project = Project {
            id: state.next_id(),
            name: name.to_string(),
            created_at: chrono::Utc::now(),
        };
        state.projects.insert(project.id, project.clone());
        project
    }
}

#[async_trait]
impl LockStore for MemoryStore {
    async fn acquire(
        &self,
        request: &LockRequest,
        now: Timestamp,
        ttl: Duration,
    ) -> CoreResult<Lock> {
        let mut state = self.state.lock().await;
        if !state.projects.contains_key(&request.project_id) {
            return Err(CoreError::NotFound {
                entity: "Project",
                id: request.project_id,
            });
        }
        let existing = state
            .lock_for(request.resource_type, request.resource_id)
            .cloned();

        match plan_acquire(existing.as_ref(), request.requester_id, now, ttl) {
            AcquirePlan::Deny { holder } => Err(CoreError::lock_held(&holder, ttl)),
            AcquirePlan::Refresh { lock_id } => {
                let lock = state.locks.get_mut(&lock_id).ok_or_else(|| {
                    CoreError::Internal(format!("Lock {lock_id} vanished during refresh"))
                })?;
                lock.locked_at = now;
                Ok(lock.clone())
            }
            AcquirePlan::Insert { evict } => {
                if let Some(stale) = evict {
                    state.locks.remove(&stale);
                }
                let lock = Lock {
                    id: state.next_id(),
                    project_id: request.project_id,
                    resource_type: request.resource_type,
                    resource_id: request.resource_id,
                    user_id: request.requester_id,
                    locked_at: now,
                };
                state.locks.insert(lock.id, lock.clone());
                Ok(lock)
            }
        }
    }

    async fn refresh(
        &self,
        lock_id: DbId,
        now: Timestamp,
        ttl: Duration,
    ) -> CoreResult<Option<Lock>> {
        let mut state = self.state.lock().await;
        Ok(state
            .locks
            .get_mut(&lock_id)
            .filter(|lock| lock.is_active(now, ttl))
            .map(|lock| {
                lock.locked_at = now;
                lock.clone()
            }))
    }

    async fn delete(&self, lock_id: DbId) -> CoreResult<bool> {
        Ok(self.state.lock().await.locks.remove(&lock_id).is_some())
    }

    async fn find_by_resource(
        &self,
        resource_type: ResourceType,
        resource_id: DbId,
    ) -> CoreResult<Option<Lock>> {
        let state = self.state.lock().await;
        Ok(state.lock_for(resource_type, resource_id).cloned())
    }

    async fn list_by_project(&self, project_id: DbId) -> CoreResult<Vec<Lock>> {
        let state = self.state.lock().await;
        Ok(state
            .locks
            .values()
            .filter(|l| l.project_id == project_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load_tree(&self, project_id: DbId) -> CoreResult<Option<Vec<SectionTree>>> {
        let state = self.state.lock().await;
        if !state.projects.contains_key(&project_id) {
            return Ok(None);
        }
        let trees = state
            .sections_of(project_id)
            .into_iter()
            .map(|section| {
                let blocks = state.blocks_of(section.id);
                SectionTree { section, blocks }
            })
            .collect();
        Ok(Some(trees))
    }

    async fn replace_tree(
        &self,
        project_id: DbId,
        sections: &[SectionSnapshot],
        now: Timestamp,
    ) -> CoreResult<bool> {
        let mut state = self.state.lock().await;
        if !state.projects.contains_key(&project_id) {
            return Ok(false);
        }

        state.blocks.retain(|_, b| b.project_id != project_id);
        state.sections.retain(|_, s| s.project_id != project_id);

        for snapshot in sections {
            let section = state.push_section(
                &NewSection {
                    project_id,
                    heading_text: snapshot.heading_text.clone(),
                    heading_level: snapshot.heading_level,
                    order: snapshot.order,
                },
                now,
            );
            for block in &snapshot.blocks {
                state.push_block(
                    &NewBlock {
                        project_id,
                        section_id: section.id,
                        order: block.order,
                        block_type: block.block_type,
                        markdown_text: block.markdown_text.clone(),
                    },
                    now,
                );
            }
        }
        Ok(true)
    }

    async fn list_sections(&self, project_id: DbId) -> CoreResult<Vec<Section>> {
        Ok(self.state.lock().await.sections_of(project_id))
    }

    async fn list_blocks(&self, section_id: DbId) -> CoreResult<Vec<Block>> {
        Ok(self.state.lock().await.blocks_of(section_id))
    }

    async fn insert_section(&self, input: &NewSection, now: Timestamp) -> CoreResult<Section> {
        let mut state = self.state.lock().await;
        if !state.projects.contains_key(&input.project_id) {
            return Err(CoreError::NotFound {
                entity: "Project",
                id: input.project_id,
            });
        }
        Ok(state.push_section(input, now))
    }

    async fn insert_block(&self, input: &NewBlock, now: Timestamp) -> CoreResult<Block> {
        let mut state = self.state.lock().await;
        let section = state
            .sections
            .get(&input.section_id)
            .ok_or(CoreError::NotFound {
                entity: "Section",
                id: input.section_id,
            })?;
        if section.project_id != input.project_id {
            return Err(CoreError::Validation(format!(
                "Section {} does not belong to project {}",
                input.section_id, input.project_id
            )));
        }
        Ok(state.push_block(input, now))
    }

    async fn update_section_heading(
        &self,
        section_id: DbId,
        heading_text: &str,
        heading_level: i32,
    ) -> CoreResult<Option<Section>> {
        let mut state = self.state.lock().await;
        Ok(state.sections.get_mut(&section_id).map(|section| {
            section.heading_text = heading_text.to_string();
            section.heading_level = heading_level;
            section.clone()
        }))
    }

    async fn update_block_text(
        &self,
        block_id: DbId,
        markdown_text: &str,
        now: Timestamp,
    ) -> CoreResult<Option<Block>> {
        let mut state = self.state.lock().await;
        Ok(state.blocks.get_mut(&block_id).map(|block| {
            block.markdown_text = markdown_text.to_string();
            block.last_edited_at = now;
            block.clone()
        }))
    }

    async fn delete_section(&self, section_id: DbId) -> CoreResult<bool> {
        let mut state = self.state.lock().await;
        if state.sections.remove(&section_id).is_none() {
            return Ok(false);
        }
        state.blocks.retain(|_, b| b.section_id != section_id);
        Ok(true)
    }

    async fn delete_block(&self, block_id: DbId) -> CoreResult<bool> {
        Ok(self.state.lock().await.blocks.remove(&block_id).is_some())
    }
}

#[async_trait]
impl VersionStore for MemoryStore {
    async fn insert_version(
        &self,
        input: &NewReportVersion,
        now: Timestamp,
    ) -> CoreResult<ReportVersion> {
        let mut state = self.state.lock().await;
        if !state.projects.contains_key(&input.project_id) {
            return Err(CoreError::NotFound {
                entity: "Project",
                id: input.project_id,
            });
        }
        let version = ReportVersion {
            id: state.next_id(),
            project_id: input.project_id,
            created_at: now,
            summary: input.summary.clone(),
            snapshot: input.snapshot.clone(),
            created_by_user_id: input.created_by_user_id,
        };
        state.versions.insert(version.id, version.clone());
        Ok(version)
    }

    async fn find_version(&self, version_id: DbId) -> CoreResult<Option<ReportVersion>> {
        Ok(self.state.lock().await.versions.get(&version_id).cloned())
    }

    async fn list_versions(&self, project_id: DbId) -> CoreResult<Vec<ReportVersionSummary>> {
        let state = self.state.lock().await;
        let mut versions: Vec<_> = state
            .versions
            .values()
            .filter(|v| v.project_id == project_id)
            .map(ReportVersionSummary::from)
            .collect();
        versions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(versions)
    }
}
