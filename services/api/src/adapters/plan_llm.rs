//! services/api/src/adapters/plan_llm.rs
//!
//! This module contains the adapter for the learning-plan LLM.
//! It implements the `PlanGenerationService` port from the `core` crate against
//! any OpenAI-compatible chat-completion endpoint (Gemini by default).

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use learning_tracker_core::{
    domain::{LearningPlan, PlanRequest},
    plan::{build_plan_prompt, parse_plan_response},
    ports::{PlanGenerationService, PortError, PortResult},
};
use tracing::{debug, info, warn};

const SYSTEM_INSTRUCTIONS: &str = "You are a study planner. You design short, focused learning plans \
made of real YouTube videos, key points, and a one-paragraph summary. \
Always answer with a single JSON code block and nothing else.";

/// The default OpenAI-compatible base URL of the Gemini API.
pub const GEMINI_OPENAI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `PlanGenerationService` using a generative-language model.
#[derive(Clone)]
pub struct GeminiPlanAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl GeminiPlanAdapter {
    /// Creates a new `GeminiPlanAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Builds a client for the given key and base URL.
    pub fn client_for(api_key: &str, api_base: &str) -> Client<OpenAIConfig> {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);
        Client::with_config(config)
    }
}

//=========================================================================================
// `PlanGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl PlanGenerationService for GeminiPlanAdapter {
    async fn generate_plan(&self, request: &PlanRequest) -> PortResult<LearningPlan> {
        let prompt = build_plan_prompt(request);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        info!("Requesting learning plan for '{}'", request.title);
        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e: OpenAIError| PortError::RemoteApi(e.to_string()))?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::RemoteApi("Plan generation returned no text content.".to_string())
            })?;
        debug!("Raw plan response: {}", text);

        let plan = parse_plan_response(&text);
        if plan == LearningPlan::default() {
            warn!("Plan response for '{}' could not be parsed; using an empty plan", request.title);
        }
        Ok(plan)
    }
}
