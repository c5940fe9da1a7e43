//! Read-only lookups the rule engine uses for display data.
//!
//! Lookup failures never fail an evaluation: callers pair each lookup with a
//! [`Fallback`] through [`LookupResultExt::or_fallback`].

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Lookup unavailable: {0}")]
    Unavailable(String),
}

impl LookupError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}

pub type LookupResult<T> = Result<T, LookupError>;

/// Display data for the rule engine, scoped by workspace where applicable.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Lookups: Send + Sync {
    async fn user_name(&self, user_id: Uuid) -> LookupResult<String>;

    async fn story_title(&self, story_id: Uuid, workspace_id: Uuid) -> LookupResult<String>;

    async fn status_name(&self, status_id: Uuid, workspace_id: Uuid) -> LookupResult<String>;

    /// Current assignee of a story, `None` when unassigned.
    async fn story_assignee(
        &self,
        story_id: Uuid,
        workspace_id: Uuid,
    ) -> LookupResult<Option<Uuid>>;

    async fn objective_title(&self, objective_id: Uuid, workspace_id: Uuid) -> LookupResult<String>;

    async fn key_result_title(
        &self,
        key_result_id: Uuid,
        workspace_id: Uuid,
    ) -> LookupResult<String>;
}

/// Display value used when a lookup fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    UserName,
    StoryTitle,
    StatusName,
    ObjectiveTitle,
    KeyResultTitle,
}

impl Fallback {
    pub fn value(self) -> &'static str {
        match self {
            Self::UserName => "Someone",
            Self::StoryTitle => "Story updated",
            Self::StatusName => "a new status",
            Self::ObjectiveTitle => "Objective updated",
            Self::KeyResultTitle => "Key result updated",
        }
    }
}

pub trait LookupResultExt {
    /// The looked-up value, or the fallback's display value on error.
    fn or_fallback(self, fallback: Fallback) -> String;
}

impl LookupResultExt for LookupResult<String> {
    fn or_fallback(self, fallback: Fallback) -> String {
        self.unwrap_or_else(|e| {
            debug!(error = %e, fallback = fallback.value(), "Lookup failed, using fallback");
            fallback.value().to_string()
        })
    }
}

#[derive(Debug, Clone)]
struct StoryEntry {
    workspace_id: Uuid,
    title: String,
    assignee_id: Option<Uuid>,
}

/// Immutable in-memory directory for tests and local runs.
///
/// Workspace-scoped entries only resolve within their own workspace.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    users: HashMap<Uuid, String>,
    stories: HashMap<Uuid, StoryEntry>,
    statuses: HashMap<(Uuid, Uuid), String>,
    objectives: HashMap<(Uuid, Uuid), String>,
    key_results: HashMap<(Uuid, Uuid), String>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, id: Uuid, name: impl Into<String>) -> Self {
        self.users.insert(id, name.into());
        self
    }

    pub fn with_story(
        mut self,
        id: Uuid,
        workspace_id: Uuid,
        title: impl Into<String>,
        assignee_id: Option<Uuid>,
    ) -> Self {
        self.stories.insert(
            id,
            StoryEntry {
                workspace_id,
                title: title.into(),
                assignee_id,
            },
        );
        self
    }

    pub fn with_status(mut self, id: Uuid, workspace_id: Uuid, name: impl Into<String>) -> Self {
        self.statuses.insert((id, workspace_id), name.into());
        self
    }

    pub fn with_objective(
        mut self,
        id: Uuid,
        workspace_id: Uuid,
        title: impl Into<String>,
    ) -> Self {
        self.objectives.insert((id, workspace_id), title.into());
        self
    }

    pub fn with_key_result(
        mut self,
        id: Uuid,
        workspace_id: Uuid,
        title: impl Into<String>,
    ) -> Self {
        self.key_results.insert((id, workspace_id), title.into());
        self
    }

    fn story(&self, story_id: Uuid, workspace_id: Uuid) -> LookupResult<&StoryEntry> {
        self.stories
            .get(&story_id)
            .filter(|s| s.workspace_id == workspace_id)
            .ok_or(LookupError::not_found("story", story_id))
    }
}

#[async_trait]
impl Lookups for InMemoryDirectory {
    async fn user_name(&self, user_id: Uuid) -> LookupResult<String> {
        self.users
            .get(&user_id)
            .cloned()
            .ok_or(LookupError::not_found("user", user_id))
    }

    async fn story_title(&self, story_id: Uuid, workspace_id: Uuid) -> LookupResult<String> {
        self.story(story_id, workspace_id).map(|s| s.title.clone())
    }

    async fn status_name(&self, status_id: Uuid, workspace_id: Uuid) -> LookupResult<String> {
        self.statuses
            .get(&(status_id, workspace_id))
            .cloned()
            .ok_or(LookupError::not_found("status", status_id))
    }

    async fn story_assignee(
        &self,
        story_id: Uuid,
        workspace_id: Uuid,
    ) -> LookupResult<Option<Uuid>> {
        self.story(story_id, workspace_id).map(|s| s.assignee_id)
    }

    async fn objective_title(
        &self,
        objective_id: Uuid,
        workspace_id: Uuid,
    ) -> LookupResult<String> {
        self.objectives
            .get(&(objective_id, workspace_id))
            .cloned()
            .ok_or(LookupError::not_found("objective", objective_id))
    }

    async fn key_result_title(
        &self,
        key_result_id: Uuid,
        workspace_id: Uuid,
    ) -> LookupResult<String> {
        self.key_results
            .get(&(key_result_id, workspace_id))
            .cloned()
            .ok_or(LookupError::not_found("key result", key_result_id))
    }
}
