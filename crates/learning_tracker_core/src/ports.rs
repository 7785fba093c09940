//! crates/learning_tracker_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like the storage
//! backend or the generative-language API.

use async_trait::async_trait;
use crate::domain::{LearningPlan, NewTopic, NewUser, PlanRequest, Topic, TopicResources, User};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Storage I/O error: {0}")]
    Io(String),
    #[error("Stored document is invalid: {0}")]
    Parse(String),
    #[error("Remote API error: {0}")]
    RemoteApi(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Whole-document storage of users and their nested topics.
///
/// `read_all` and `write_all` are fail-open: errors are logged and masked as an
/// empty result or a silent success. `load_document` and `save_document` are the
/// strict forms that report `Io` and `Parse` failures.
#[async_trait]
pub trait LearningStore: Send + Sync {
    /// Creates the storage directory (and any missing parents) if needed.
    async fn ensure_storage_ready(&self) -> PortResult<()>;

    async fn load_document(&self) -> PortResult<Vec<User>>;

    async fn save_document(&self, users: &[User]) -> PortResult<()>;

    /// Returns every stored user, or an empty list if storage cannot be read.
    async fn read_all(&self) -> Vec<User>;

    /// Overwrites the stored document. Failures are logged, not returned.
    async fn write_all(&self, users: &[User]);

    // --- Mutations ---
    async fn add_user(&self, fields: NewUser) -> PortResult<User>;

    async fn add_topic_to_user(&self, user_id: &str, fields: NewTopic) -> PortResult<Topic>;

    async fn update_topic_resources(
        &self,
        user_id: &str,
        topic_id: &str,
        resources: TopicResources,
    ) -> PortResult<()>;

    // --- Lookups ---
    async fn find_user(&self, user_id: &str) -> PortResult<User> {
        self.read_all()
            .await
            .into_iter()
            .find(|u| u.id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    /// Returns the first user whose email and password both match exactly.
    async fn find_user_by_credentials(&self, email: &str, password: &str) -> PortResult<User> {
        self.read_all()
            .await
            .into_iter()
            .find(|u| u.email == email && u.password == password)
            .ok_or_else(|| PortError::NotFound("No user matches those credentials".to_string()))
    }

    /// Logs where the document lives and what it currently contains.
    async fn log_data_storage(&self);
}

#[async_trait]
pub trait PlanGenerationService: Send + Sync {
    /// Generates a learning plan for the requested topic.
    async fn generate_plan(&self, request: &PlanRequest) -> PortResult<LearningPlan>;
}
