//! services/api/src/adapters/idea_llm.rs
//!
//! This module contains the adapter for the date-idea LLM.
//! It implements the `IdeaGenerationService` port from the `core` crate against
//! any OpenAI-compatible chat completion endpoint (Gemini's included).

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use chrono::Utc;
use couplequest_core::{
    domain::{idea_id_at, DateIdea, IdeaDraft, IdeaRequest},
    ports::{IdeaGenerationService, PortError, PortResult},
    prompt::{build_prompt, idea_json_schema, SYSTEM_INSTRUCTIONS},
};
use tracing::{debug, warn};

const SCHEMA_NAME: &str = "date_idea";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `IdeaGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiIdeaAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiIdeaAdapter {
    /// Creates a new `OpenAiIdeaAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `IdeaGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdeaGenerationService for OpenAiIdeaAdapter {
    async fn generate(&self, request: &IdeaRequest) -> PortResult<DateIdea> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(build_prompt(request))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let response_format = ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: Some("One date idea for a couple.".to_string()),
                name: SCHEMA_NAME.to_string(),
                schema: Some(idea_json_schema()),
                strict: Some(true),
            },
        };

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(response_format)
            .temperature(1.0_f32)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        debug!(model = %self.model, "Requesting a date idea from the upstream model.");

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e: OpenAIError| PortError::Unavailable(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::InvalidResponse(
                    "Idea generation LLM returned no text content.".to_string(),
                )
            })?;

        let draft = IdeaDraft::from_json(&content).map_err(|e| {
            warn!(error = %e, "Upstream model returned an idea outside the schema.");
            PortError::InvalidResponse(e.to_string())
        })?;

        Ok(draft.into_idea(idea_id_at(Utc::now())))
    }
}
