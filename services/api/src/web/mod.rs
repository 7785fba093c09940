pub mod auth;
pub mod middleware;
pub mod rest;
pub mod state;

pub use middleware::require_user;
pub use rest::{create_topic_handler, generate_plan_handler, get_topic_handler, list_topics_handler};

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::web::{
    auth::{login_handler, signup_handler},
    state::AppState,
};

/// Builds the API router: public auth routes plus the topic routes that act on
/// behalf of the `x-user-id` user.
pub fn router(app_state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler));

    let user_routes = Router::new()
        .route("/topics", get(list_topics_handler).post(create_topic_handler))
        .route("/topics/{topic_id}", get(get_topic_handler))
        .route("/topics/{topic_id}/plan", post(generate_plan_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_user,
        ));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{adapters::JsonFileStore, web::middleware::USER_ID_HEADER};
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use learning_tracker_core::{
        domain::{LearningPlan, PlanRequest, PlanVideo},
        ports::{LearningStore, PlanGenerationService, PortError, PortResult},
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    /// Returns a fixed plan, or a remote failure for topics titled "fail".
    struct FakePlanner;

    #[async_trait]
    impl PlanGenerationService for FakePlanner {
        async fn generate_plan(&self, request: &PlanRequest) -> PortResult<LearningPlan> {
            if request.title == "fail" {
                return Err(PortError::RemoteApi("quota exceeded".to_string()));
            }
            Ok(LearningPlan {
                videos: vec![PlanVideo {
                    url: "https://y/1".to_string(),
                    title: format!("{} intro", request.title),
                    description: "Basics".to_string(),
                }],
                key_points: vec!["k1".to_string()],
                summary: "Learn it.".to_string(),
            })
        }
    }

    fn test_app(dir: &TempDir) -> (Router, Arc<JsonFileStore>) {
        let store = Arc::new(JsonFileStore::new(dir.path().join("data")));
        let state = Arc::new(AppState {
            store: store.clone(),
            plan_adapter: Arc::new(FakePlanner),
        });
        (router(state), store)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        user_id: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(id) = user_id {
            builder = builder.header(USER_ID_HEADER, id);
        }
        let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn sign_up(app: &Router, email: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/auth/signup",
            None,
            Some(json!({ "name": "A", "institution": "I", "email": email, "password": "p" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["userId"].as_str().unwrap().to_string()
    }

    async fn create_topic(app: &Router, user_id: &str, title: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/topics",
            Some(user_id),
            Some(json!({
                "title": title,
                "isBeginner": true,
                "isPreparingExam": false,
                "expectedDate": "2w"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn signup_then_login_returns_the_same_user() {
        let dir = TempDir::new().unwrap();
        let (app, _) = test_app(&dir);

        let user_id = sign_up(&app, "a@x.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "a@x.com", "password": "p" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userId"], user_id.as_str());
        assert!(body.get("password").is_none());
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_unauthorized() {
        let dir = TempDir::new().unwrap();
        let (app, _) = test_app(&dir);
        sign_up(&app, "a@x.com").await;

        let (status, _) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "a@x.com", "password": "nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn blank_signup_fields_are_rejected() {
        let dir = TempDir::new().unwrap();
        let (app, store) = test_app(&dir);

        let (status, _) = send(
            &app,
            "POST",
            "/auth/signup",
            None,
            Some(json!({ "name": "", "institution": "I", "email": "a@x.com", "password": "p" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(store.read_all().await.is_empty());
    }

    #[tokio::test]
    async fn topic_routes_require_a_known_user() {
        let dir = TempDir::new().unwrap();
        let (app, _) = test_app(&dir);

        let (missing, _) = send(&app, "GET", "/topics", None, None).await;
        assert_eq!(missing, StatusCode::UNAUTHORIZED);

        let (unknown, _) = send(&app, "GET", "/topics", Some("ghost"), None).await;
        assert_eq!(unknown, StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/topics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Unauthorized");
    }

    #[tokio::test]
    async fn topics_are_listed_in_creation_order() {
        let dir = TempDir::new().unwrap();
        let (app, _) = test_app(&dir);
        let user_id = sign_up(&app, "a@x.com").await;

        let first = create_topic(&app, &user_id, "Go").await;
        let second = create_topic(&app, &user_id, "Rust").await;

        let (status, body) = send(&app, "GET", "/topics", Some(user_id.as_str()), None).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec![first.as_str(), second.as_str()]);
        assert_eq!(body[0]["resources"]["keyPoints"], json!([]));
    }

    #[tokio::test]
    async fn unknown_topic_is_not_found() {
        let dir = TempDir::new().unwrap();
        let (app, _) = test_app(&dir);
        let user_id = sign_up(&app, "a@x.com").await;

        let (status, _) = send(&app, "GET", "/topics/missing", Some(user_id.as_str()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "POST", "/topics/missing/plan", Some(user_id.as_str()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn generated_plan_is_stored_as_resources() {
        let dir = TempDir::new().unwrap();
        let (app, store) = test_app(&dir);
        let user_id = sign_up(&app, "a@x.com").await;
        let topic_id = create_topic(&app, &user_id, "Go").await;

        let uri = format!("/topics/{}/plan", topic_id);
        let (status, body) = send(&app, "POST", &uri, Some(user_id.as_str()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"], "Learn it.");
        assert_eq!(body["videos"][0]["title"], "Go intro");

        let users = store.read_all().await;
        let topic = users[0].find_topic(&topic_id).unwrap();
        assert_eq!(topic.resources.youtube_links, vec!["https://y/1".to_string()]);
        assert_eq!(topic.resources.key_points, vec!["k1".to_string()]);
    }

    #[tokio::test]
    async fn remote_failure_maps_to_bad_gateway_and_keeps_resources() {
        let dir = TempDir::new().unwrap();
        let (app, store) = test_app(&dir);
        let user_id = sign_up(&app, "a@x.com").await;
        let topic_id = create_topic(&app, &user_id, "fail").await;

        let uri = format!("/topics/{}/plan", topic_id);
        let (status, _) = send(&app, "POST", &uri, Some(user_id.as_str()), None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let users = store.read_all().await;
        assert!(users[0].topics[0].resources.key_points.is_empty());
    }
}
