//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-request session context.

use learning_tracker_core::ports::{LearningStore, PlanGenerationService};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LearningStore>,
    pub plan_adapter: Arc<dyn PlanGenerationService>,
}

//=========================================================================================
// CurrentUser (Specific to One Request)
//=========================================================================================

/// The signed-in user a request acts on behalf of.
///
/// Clients receive the id from sign-up or login and send it back in the
/// `x-user-id` header; forgetting it is how a client logs out. The
/// `require_user` middleware resolves it and stores this value in the request
/// extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: String,
}
