//! services/api/src/adapters/json_store.rs
//!
//! This module contains the storage adapter, which is the concrete implementation
//! of the `LearningStore` port from the `core` crate. All users and their topics
//! live in a single JSON document that is re-read and rewritten in full on every
//! mutation.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use learning_tracker_core::domain::{
    NewTopic, NewUser, Topic, TopicProgress, TopicResources, User,
};
use learning_tracker_core::ports::{LearningStore, PortError, PortResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use uuid::Uuid;

/// File name of the document inside the data directory.
pub const USERS_FILE_NAME: &str = "users.json";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A file-backed store that implements the `LearningStore` port.
pub struct JsonFileStore {
    data_dir: PathBuf,
    users_file: PathBuf,
    /// Held across every write of the document, including lazy creation and each
    /// mutation's whole read-modify-write cycle.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Creates a new `JsonFileStore` rooted at `data_dir`. Nothing is touched on
    /// disk until the first operation.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let users_file = data_dir.join(USERS_FILE_NAME);
        Self {
            data_dir,
            users_file,
            write_lock: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn users_file(&self) -> &Path {
        &self.users_file
    }

    /// Each write gets its own temp file so overlapping writers never share one.
    fn temp_file(&self) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}.tmp", USERS_FILE_NAME, Uuid::new_v4().simple()))
    }

    /// Writes `contents` to a sibling temp file and renames it over the document,
    /// so a crash mid-write never leaves a truncated document behind.
    async fn replace_file(&self, contents: &[u8]) -> PortResult<()> {
        let temp = self.temp_file();
        if let Err(e) = tokio::fs::write(&temp, contents).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(PortError::Io(format!("{}: {}", temp.display(), e)));
        }
        if let Err(e) = tokio::fs::rename(&temp, &self.users_file).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(PortError::Io(format!("{}: {}", self.users_file.display(), e)));
        }
        Ok(())
    }

    async fn document_exists(&self) -> PortResult<bool> {
        tokio::fs::try_exists(&self.users_file)
            .await
            .map_err(|e| PortError::Io(format!("{}: {}", self.users_file.display(), e)))
    }

    async fn parse_existing(&self) -> PortResult<Vec<User>> {
        let content = tokio::fs::read(&self.users_file)
            .await
            .map_err(|e| PortError::Io(format!("{}: {}", self.users_file.display(), e)))?;
        let document: DocumentRecord =
            serde_json::from_slice(&content).map_err(|e| PortError::Parse(e.to_string()))?;

        document
            .users
            .into_iter()
            .map(UserRecord::to_domain)
            .collect()
    }

    /// Strict load. The caller must hold `write_lock`: a missing document is
    /// created here.
    async fn load_locked(&self) -> PortResult<Vec<User>> {
        self.ensure_storage_ready().await?;
        if !self.document_exists().await? {
            debug!("No document at {}, creating an empty one", self.users_file.display());
            self.replace_file(&encode_document(&[])?).await?;
            return Ok(Vec::new());
        }
        self.parse_existing().await
    }

    /// Strict save. The caller must hold `write_lock`.
    async fn save_locked(&self, users: &[User]) -> PortResult<()> {
        self.ensure_storage_ready().await?;
        self.replace_file(&encode_document(users)?).await
    }

    /// Fail-open read used inside a mutation's read-modify-write cycle.
    async fn read_all_locked(&self) -> Vec<User> {
        self.load_locked().await.unwrap_or_else(|e| {
            error!("Error reading users data: {}", e);
            Vec::new()
        })
    }

    /// Fail-open write used inside a mutation's read-modify-write cycle.
    async fn write_all_locked(&self, users: &[User]) {
        if let Err(e) = self.save_locked(users).await {
            error!("Error writing users data: {}", e);
        }
    }
}

//=========================================================================================
// "Impure" Document Record Structs
//=========================================================================================

#[derive(Serialize, Deserialize, Default)]
struct DocumentRecord {
    users: Vec<UserRecord>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    id: String,
    name: String,
    institution: String,
    email: String,
    password: String,
    created_at: String,
    #[serde(default)]
    topics: Vec<TopicRecord>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopicRecord {
    id: String,
    title: String,
    is_beginner: bool,
    is_preparing_exam: bool,
    expected_date: String,
    created_at: String,
    resources: ResourcesRecord,
    progress: ProgressRecord,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourcesRecord {
    #[serde(default)]
    youtube_links: Vec<String>,
    #[serde(default)]
    blog_links: Vec<String>,
    #[serde(default)]
    key_points: Vec<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressRecord {
    #[serde(default)]
    completed_resources: Vec<String>,
    #[serde(default)]
    notes: Vec<String>,
    last_accessed: String,
}

/// Timestamps are persisted as ISO-8601 UTC with milliseconds, e.g.
/// `2024-05-01T10:00:00.123Z`.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(raw: &str) -> PortResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| PortError::Parse(format!("invalid timestamp '{}': {}", raw, e)))
}

impl UserRecord {
    fn to_domain(self) -> PortResult<User> {
        Ok(User {
            id: self.id,
            name: self.name,
            institution: self.institution,
            email: self.email,
            password: self.password,
            created_at: parse_timestamp(&self.created_at)?,
            topics: self
                .topics
                .into_iter()
                .map(TopicRecord::to_domain)
                .collect::<PortResult<Vec<_>>>()?,
        })
    }

    fn from_domain(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            institution: user.institution.clone(),
            email: user.email.clone(),
            password: user.password.clone(),
            created_at: format_timestamp(&user.created_at),
            topics: user.topics.iter().map(TopicRecord::from_domain).collect(),
        }
    }
}

impl TopicRecord {
    fn to_domain(self) -> PortResult<Topic> {
        Ok(Topic {
            id: self.id,
            title: self.title,
            is_beginner: self.is_beginner,
            is_preparing_exam: self.is_preparing_exam,
            expected_date: self.expected_date,
            created_at: parse_timestamp(&self.created_at)?,
            resources: TopicResources {
                youtube_links: self.resources.youtube_links,
                blog_links: self.resources.blog_links,
                key_points: self.resources.key_points,
            },
            progress: TopicProgress {
                completed_resources: self.progress.completed_resources,
                notes: self.progress.notes,
                last_accessed: parse_timestamp(&self.progress.last_accessed)?,
            },
        })
    }

    fn from_domain(topic: &Topic) -> Self {
        Self {
            id: topic.id.clone(),
            title: topic.title.clone(),
            is_beginner: topic.is_beginner,
            is_preparing_exam: topic.is_preparing_exam,
            expected_date: topic.expected_date.clone(),
            created_at: format_timestamp(&topic.created_at),
            resources: ResourcesRecord {
                youtube_links: topic.resources.youtube_links.clone(),
                blog_links: topic.resources.blog_links.clone(),
                key_points: topic.resources.key_points.clone(),
            },
            progress: ProgressRecord {
                completed_resources: topic.progress.completed_resources.clone(),
                notes: topic.progress.notes.clone(),
                last_accessed: format_timestamp(&topic.progress.last_accessed),
            },
        }
    }
}

fn encode_document(users: &[User]) -> PortResult<Vec<u8>> {
    let document = DocumentRecord {
        users: users.iter().map(UserRecord::from_domain).collect(),
    };
    serde_json::to_vec(&document).map_err(|e| PortError::Unexpected(e.to_string()))
}

//=========================================================================================
// `LearningStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl LearningStore for JsonFileStore {
    async fn ensure_storage_ready(&self) -> PortResult<()> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| PortError::Io(format!("{}: {}", self.data_dir.display(), e)))
    }

    async fn load_document(&self) -> PortResult<Vec<User>> {
        self.ensure_storage_ready().await?;
        // Existing documents are only ever replaced by rename, so reading needs no lock.
        if self.document_exists().await? {
            return self.parse_existing().await;
        }

        let _guard = self.write_lock.lock().await;
        self.load_locked().await
    }

    async fn save_document(&self, users: &[User]) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        self.save_locked(users).await
    }

    async fn read_all(&self) -> Vec<User> {
        match self.load_document().await {
            Ok(users) => users,
            Err(e) => {
                error!("Error reading users data: {}", e);
                Vec::new()
            }
        }
    }

    async fn write_all(&self, users: &[User]) {
        if let Err(e) = self.save_document(users).await {
            error!("Error writing users data: {}", e);
        }
    }

    async fn add_user(&self, fields: NewUser) -> PortResult<User> {
        let _guard = self.write_lock.lock().await;

        let mut users = self.read_all_locked().await;
        let user = User::create(fields);
        users.push(user.clone());
        self.write_all_locked(&users).await;

        info!("Created user {}", user.id);
        Ok(user)
    }

    async fn add_topic_to_user(&self, user_id: &str, fields: NewTopic) -> PortResult<Topic> {
        let _guard = self.write_lock.lock().await;

        let mut users = self.read_all_locked().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;

        let topic = Topic::create(fields);
        user.topics.push(topic.clone());
        self.write_all_locked(&users).await;

        info!("Created topic {} for user {}", topic.id, user_id);
        Ok(topic)
    }

    async fn update_topic_resources(
        &self,
        user_id: &str,
        topic_id: &str,
        resources: TopicResources,
    ) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut users = self.read_all_locked().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        let topic = user
            .find_topic_mut(topic_id)
            .ok_or_else(|| PortError::NotFound(format!("Topic {} not found", topic_id)))?;

        topic.resources = resources;
        self.write_all_locked(&users).await;

        info!("Updated resources of topic {} for user {}", topic_id, user_id);
        Ok(())
    }

    async fn log_data_storage(&self) {
        info!("Data directory: {}", self.data_dir.display());
        info!("Users file path: {}", self.users_file.display());

        match tokio::fs::try_exists(&self.users_file).await {
            Ok(true) => match tokio::fs::read_to_string(&self.users_file).await {
                Ok(content) => info!("Current data: {}", content),
                Err(e) => error!("Error reading file: {}", e),
            },
            Ok(false) => info!("File does not exist yet"),
            Err(e) => error!("Error reading file: {}", e),
        }
    }
}
