//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the topic endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{
    auth::{AuthResponse, LoginRequest, SignupRequest},
    state::{AppState, CurrentUser},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use learning_tracker_core::{
    domain::{LearningPlan, NewTopic, PlanRequest, PlanVideo, Topic, TopicResources},
    ports::PortError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        list_topics_handler,
        create_topic_handler,
        get_topic_handler,
        generate_plan_handler,
    ),
    components(
        schemas(
            SignupRequest,
            LoginRequest,
            AuthResponse,
            CreateTopicRequest,
            TopicResponse,
            ResourcesResponse,
            ProgressResponse,
            PlanResponse,
            PlanVideoResponse,
        )
    ),
    tags(
        (name = "Learning Tracker API", description = "Sign up, track topics, and generate learning plans.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Maps a port error onto the status code and message a client sees.
pub fn port_error_response(e: PortError) -> (StatusCode, String) {
    let status = match &e {
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::Unauthorized => StatusCode::UNAUTHORIZED,
        PortError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        PortError::RemoteApi(_) => StatusCode::BAD_GATEWAY,
        PortError::Io(_) | PortError::Parse(_) | PortError::Unexpected(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTopicRequest {
    pub title: String,
    pub is_beginner: bool,
    pub is_preparing_exam: bool,
    pub expected_date: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesResponse {
    pub youtube_links: Vec<String>,
    pub blog_links: Vec<String>,
    pub key_points: Vec<String>,
}

impl From<TopicResources> for ResourcesResponse {
    fn from(r: TopicResources) -> Self {
        Self {
            youtube_links: r.youtube_links,
            blog_links: r.blog_links,
            key_points: r.key_points,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub completed_resources: Vec<String>,
    pub notes: Vec<String>,
    pub last_accessed: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopicResponse {
    pub id: String,
    pub title: String,
    pub is_beginner: bool,
    pub is_preparing_exam: bool,
    pub expected_date: String,
    pub created_at: DateTime<Utc>,
    pub resources: ResourcesResponse,
    pub progress: ProgressResponse,
}

impl From<Topic> for TopicResponse {
    fn from(t: Topic) -> Self {
        Self {
            id: t.id,
            title: t.title,
            is_beginner: t.is_beginner,
            is_preparing_exam: t.is_preparing_exam,
            expected_date: t.expected_date,
            created_at: t.created_at,
            resources: t.resources.into(),
            progress: ProgressResponse {
                completed_resources: t.progress.completed_resources,
                notes: t.progress.notes,
                last_accessed: t.progress.last_accessed,
            },
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct PlanVideoResponse {
    pub url: String,
    pub title: String,
    pub description: String,
}

/// The generated plan, in the same shape the model is asked to produce.
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub videos: Vec<PlanVideoResponse>,
    pub key_points: Vec<String>,
    pub summary: String,
}

impl From<LearningPlan> for PlanResponse {
    fn from(plan: LearningPlan) -> Self {
        Self {
            videos: plan
                .videos
                .into_iter()
                .map(|PlanVideo { url, title, description }| PlanVideoResponse {
                    url,
                    title,
                    description,
                })
                .collect(),
            key_points: plan.key_points,
            summary: plan.summary,
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

async fn load_topic(
    app_state: &AppState,
    user_id: &str,
    topic_id: &str,
) -> Result<Topic, (StatusCode, String)> {
    let user = app_state
        .store
        .find_user(user_id)
        .await
        .map_err(port_error_response)?;
    user.find_topic(topic_id).cloned().ok_or_else(|| {
        port_error_response(PortError::NotFound(format!("Topic {} not found", topic_id)))
    })
}

/// List the current user's topics in creation order.
#[utoipa::path(
    get,
    path = "/topics",
    responses(
        (status = 200, description = "The user's topics", body = [TopicResponse]),
        (status = 401, description = "Missing or unknown x-user-id")
    ),
    params(
        ("x-user-id" = String, Header, description = "The id of the signed-in user.")
    )
)]
pub async fn list_topics_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = app_state
        .store
        .find_user(&current.user_id)
        .await
        .map_err(port_error_response)?;
    let topics: Vec<TopicResponse> = user.topics.into_iter().map(TopicResponse::from).collect();
    Ok(Json(topics))
}

/// Create a topic for the current user.
#[utoipa::path(
    post,
    path = "/topics",
    request_body = CreateTopicRequest,
    responses(
        (status = 201, description = "Topic created", body = TopicResponse),
        (status = 400, description = "Title or expected date is blank"),
        (status = 401, description = "Missing or unknown x-user-id")
    ),
    params(
        ("x-user-id" = String, Header, description = "The id of the signed-in user.")
    )
)]
pub async fn create_topic_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateTopicRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.title.trim().is_empty() || req.expected_date.trim().is_empty() {
        return Err(port_error_response(PortError::InvalidInput(
            "Please fill in all fields".to_string(),
        )));
    }

    let topic = app_state
        .store
        .add_topic_to_user(
            &current.user_id,
            NewTopic {
                title: req.title,
                is_beginner: req.is_beginner,
                is_preparing_exam: req.is_preparing_exam,
                expected_date: req.expected_date,
            },
        )
        .await
        .map_err(|e| {
            error!("Failed to create topic: {:?}", e);
            port_error_response(e)
        })?;

    app_state.store.log_data_storage().await;
    Ok((StatusCode::CREATED, Json(TopicResponse::from(topic))))
}

/// Fetch a single topic of the current user.
#[utoipa::path(
    get,
    path = "/topics/{topic_id}",
    responses(
        (status = 200, description = "The topic", body = TopicResponse),
        (status = 401, description = "Missing or unknown x-user-id"),
        (status = 404, description = "No such topic")
    ),
    params(
        ("topic_id" = String, Path, description = "The topic id."),
        ("x-user-id" = String, Header, description = "The id of the signed-in user.")
    )
)]
pub async fn get_topic_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(topic_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let topic = load_topic(&app_state, &current.user_id, &topic_id).await?;
    Ok(Json(TopicResponse::from(topic)))
}

/// Generate a learning plan for a topic and store it as the topic's resources.
#[utoipa::path(
    post,
    path = "/topics/{topic_id}/plan",
    responses(
        (status = 200, description = "Plan generated and saved", body = PlanResponse),
        (status = 401, description = "Missing or unknown x-user-id"),
        (status = 404, description = "No such topic"),
        (status = 502, description = "The generative-language API failed")
    ),
    params(
        ("topic_id" = String, Path, description = "The topic id."),
        ("x-user-id" = String, Header, description = "The id of the signed-in user.")
    )
)]
pub async fn generate_plan_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(topic_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let topic = load_topic(&app_state, &current.user_id, &topic_id).await?;

    let plan = app_state
        .plan_adapter
        .generate_plan(&PlanRequest::from(&topic))
        .await
        .map_err(|e| {
            error!("Failed to generate plan for topic {}: {:?}", topic_id, e);
            port_error_response(e)
        })?;

    app_state
        .store
        .update_topic_resources(&current.user_id, &topic_id, plan.to_resources())
        .await
        .map_err(|e| {
            error!("Failed to save plan for topic {}: {:?}", topic_id, e);
            port_error_response(e)
        })?;

    info!(
        "Stored plan for topic {} ({} videos, {} key points)",
        topic_id,
        plan.videos.len(),
        plan.key_points.len()
    );
    Ok(Json(PlanResponse::from(plan)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_errors_map_to_client_statuses() {
        let cases = [
            (PortError::NotFound("topic".to_string()), StatusCode::NOT_FOUND),
            (PortError::Unauthorized, StatusCode::UNAUTHORIZED),
            (PortError::InvalidInput("title".to_string()), StatusCode::BAD_REQUEST),
            (PortError::RemoteApi("quota".to_string()), StatusCode::BAD_GATEWAY),
            (PortError::Io("disk".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
            (PortError::Parse("json".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, expected) in cases {
            assert_eq!(port_error_response(error).0, expected);
        }
        assert_eq!(port_error_response(PortError::Unauthorized).1, "Unauthorized");
    }
}
