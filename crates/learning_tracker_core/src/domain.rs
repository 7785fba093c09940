//! crates/learning_tracker_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of the on-disk document format; the storage
//! adapter owns its own serializable record types.

use chrono::{DateTime, SubsecRound, Utc};

/// Returns the current time truncated to millisecond precision, which is the
/// precision timestamps are persisted with.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Generates a fresh, collision-resistant identifier for a user or topic.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A registered learner and the topics they own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub institution: String,
    pub email: String,
    // Stored as entered at sign-up.
    pub password: String,
    pub created_at: DateTime<Utc>,
    /// Insertion order is creation order.
    pub topics: Vec<Topic>,
}

/// The fields a caller supplies when signing a user up.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub institution: String,
    pub email: String,
    pub password: String,
}

impl User {
    /// Builds a brand new user with a generated id and no topics.
    pub fn create(fields: NewUser) -> Self {
        Self {
            id: generate_id(),
            name: fields.name,
            institution: fields.institution,
            email: fields.email,
            password: fields.password,
            created_at: now_millis(),
            topics: Vec::new(),
        }
    }

    pub fn find_topic(&self, topic_id: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == topic_id)
    }

    pub fn find_topic_mut(&mut self, topic_id: &str) -> Option<&mut Topic> {
        self.topics.iter_mut().find(|t| t.id == topic_id)
    }
}

/// Something a user wants to learn, together with its generated resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub id: String,
    pub title: String,
    pub is_beginner: bool,
    pub is_preparing_exam: bool,
    /// Free text such as "2w" or "next month".
    pub expected_date: String,
    pub created_at: DateTime<Utc>,
    pub resources: TopicResources,
    pub progress: TopicProgress,
}

/// The fields a caller supplies when creating a topic.
#[derive(Debug, Clone)]
pub struct NewTopic {
    pub title: String,
    pub is_beginner: bool,
    pub is_preparing_exam: bool,
    pub expected_date: String,
}

impl Topic {
    /// Builds a new topic with empty resources and untouched progress.
    pub fn create(fields: NewTopic) -> Self {
        let now = now_millis();
        Self {
            id: generate_id(),
            title: fields.title,
            is_beginner: fields.is_beginner,
            is_preparing_exam: fields.is_preparing_exam,
            expected_date: fields.expected_date,
            created_at: now,
            resources: TopicResources::default(),
            progress: TopicProgress {
                completed_resources: Vec::new(),
                notes: Vec::new(),
                last_accessed: now,
            },
        }
    }
}

/// Learning material attached to a topic. Replaced as a whole, never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicResources {
    pub youtube_links: Vec<String>,
    pub blog_links: Vec<String>,
    pub key_points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicProgress {
    pub completed_resources: Vec<String>,
    pub notes: Vec<String>,
    pub last_accessed: DateTime<Utc>,
}

//=========================================================================================
// Learning Plans
//=========================================================================================

/// The parameters a learning plan is generated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    pub title: String,
    pub is_beginner: bool,
    pub is_preparing_exam: bool,
    pub expected_date: String,
}

impl From<&Topic> for PlanRequest {
    fn from(topic: &Topic) -> Self {
        Self {
            title: topic.title.clone(),
            is_beginner: topic.is_beginner,
            is_preparing_exam: topic.is_preparing_exam,
            expected_date: topic.expected_date.clone(),
        }
    }
}

/// A recommended video in a generated plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanVideo {
    pub url: String,
    pub title: String,
    pub description: String,
}

/// The structured result of a plan generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LearningPlan {
    pub videos: Vec<PlanVideo>,
    pub key_points: Vec<String>,
    pub summary: String,
}

impl LearningPlan {
    /// Maps the plan onto the resource shape a topic stores.
    pub fn to_resources(&self) -> TopicResources {
        TopicResources {
            youtube_links: self
                .videos
                .iter()
                .filter(|v| !v.url.is_empty())
                .map(|v| v.url.clone())
                .collect(),
            blog_links: Vec::new(),
            key_points: self.key_points.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_topic() -> Topic {
        Topic::create(NewTopic {
            title: "Go".to_string(),
            is_beginner: true,
            is_preparing_exam: false,
            expected_date: "2w".to_string(),
        })
    }

    #[test]
    fn new_user_starts_without_topics() {
        let user = User::create(NewUser {
            name: "A".to_string(),
            institution: "I".to_string(),
            email: "a@x.com".to_string(),
            password: "p".to_string(),
        });
        assert!(user.topics.is_empty());
        assert!(!user.id.is_empty());
        assert_eq!(user.created_at, user.created_at.trunc_subsecs(3));
    }

    #[test]
    fn new_topic_has_empty_resources_and_progress() {
        let topic = sample_topic();
        assert_eq!(topic.resources, TopicResources::default());
        assert!(topic.progress.completed_resources.is_empty());
        assert!(topic.progress.notes.is_empty());
        assert_eq!(topic.progress.last_accessed, topic.created_at);
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(sample_topic().id, sample_topic().id);
    }

    #[test]
    fn plan_maps_video_urls_and_key_points() {
        let plan = LearningPlan {
            videos: vec![
                PlanVideo {
                    url: "https://y/1".to_string(),
                    ..Default::default()
                },
                PlanVideo::default(),
            ],
            key_points: vec!["k1".to_string()],
            summary: "s".to_string(),
        };
        let resources = plan.to_resources();
        assert_eq!(resources.youtube_links, vec!["https://y/1".to_string()]);
        assert!(resources.blog_links.is_empty());
        assert_eq!(resources.key_points, vec!["k1".to_string()]);
    }

    #[test]
    fn plan_request_copies_topic_attributes() {
        let topic = sample_topic();
        let request = PlanRequest::from(&topic);
        assert_eq!(request.title, "Go");
        assert!(request.is_beginner);
        assert!(!request.is_preparing_exam);
        assert_eq!(request.expected_date, "2w");
    }
}
