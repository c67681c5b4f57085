//! HTTP Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use agent_core::{AgentError, CatalogEntry, SessionId};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub completion_service_reachable: bool,
    pub tools: usize,
    pub sessions: usize,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub conversation_id: String,
}

#[derive(Debug, Serialize)]
pub struct ToolsResponse {
    pub tools: Vec<CatalogEntry>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

/// Errors a handler can answer with
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, error) = match self {
            Self::InvalidInput(message) | Self::Agent(AgentError::InvalidInput(message)) => {
                (StatusCode::BAD_REQUEST, "INVALID_INPUT", message)
            }
            Self::NotFound(id) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Conversation not found: {id}"),
            ),
            Self::Agent(e) => {
                tracing::error!(error = %e, "Agent run failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "AGENT_ERROR", e.user_message())
            }
        };

        (status, Json(ErrorResponse { error, code })).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider = state.agent.provider();
    let completion_service_reachable = provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: provider.name().to_string(),
        completion_service_reachable,
        tools: state.agent.catalog().len(),
        sessions: state.sessions.len().await,
    })
}

/// Tool catalog offered to the completion service
pub async fn list_tools(State(state): State<AppState>) -> Json<ToolsResponse> {
    Json(ToolsResponse {
        tools: state.agent.catalog().to_vec(),
    })
}

/// Run one user turn in a (possibly new) conversation.
///
/// The run works on a copy of the stored history and only commits it back
/// when it succeeds, so a failed or cancelled run leaves the conversation
/// exactly as it was. A new conversation is stored only once its first turn
/// succeeds.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if payload.message.trim().is_empty() {
        return Err(ApiError::InvalidInput("Message must not be empty".into()));
    }

    let session_id = payload
        .conversation_id
        .filter(|id| !id.trim().is_empty())
        .map(SessionId::from_string);
    let existing = match &session_id {
        Some(id) => state.sessions.get(id).await,
        None => None,
    };
    let cancel = state.shutdown.child_token();

    let Some(handle) = existing else {
        let id = session_id.unwrap_or_default();
        tracing::info!(conversation_id = %id, "Chat turn (new conversation)");

        let mut conversation = state.agent.new_conversation();
        let reply = state
            .agent
            .run_to_completion(&mut conversation, &payload.message, &cancel)
            .await?;

        state.sessions.get_or_create(Some(id.clone()), || conversation).await;
        return Ok(Json(ChatResponse {
            reply,
            conversation_id: id.to_string(),
        }));
    };

    let mut session = handle.lock().await;
    let mut conversation = session.conversation.clone();

    tracing::info!(conversation_id = %session.id, "Chat turn");
    let reply = state
        .agent
        .run_to_completion(&mut conversation, &payload.message, &cancel)
        .await?;

    session.commit(conversation);

    Ok(Json(ChatResponse {
        reply,
        conversation_id: session.id.to_string(),
    }))
}

/// Forget a conversation
pub async fn delete_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(&SessionId::from_string(id.clone())).await {
        tracing::info!(conversation_id = %id, "Conversation deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use agent_core::{
        CompletionOutcome, GenerationOptions, LlmProvider, Message, Result, ToolCallRequest,
    };
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use super::*;
    use crate::build_router;

    /// Completion service that replays a script
    struct ScriptedProvider {
        script: Mutex<VecDeque<Result<CompletionOutcome>>>,
        seen: Mutex<Vec<usize>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<CompletionOutcome>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            messages: &[Message],
            _tools: &[CatalogEntry],
            _options: &GenerationOptions,
        ) -> Result<CompletionOutcome> {
            self.seen.lock().unwrap().push(messages.len());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AgentError::Transport("script exhausted".into())))
        }
    }

    async fn app(provider: Arc<ScriptedProvider>) -> (axum::Router, AppState) {
        let agent = agent_core::Agent::connect(
            provider,
            Arc::new(agent_tools::default_registry()),
            agent_core::AgentConfig::default(),
        )
        .await
        .unwrap();
        let state = AppState::new(Arc::new(agent), CancellationToken::new());
        (build_router(state.clone()), state)
    }

    fn post_chat(body: &serde_json::Value) -> Request<Body> {
        Request::post("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_chat_with_tool_round() {
        let provider = ScriptedProvider::new(vec![
            Ok(CompletionOutcome::ToolCallsRequested {
                content: None,
                calls: vec![ToolCallRequest::new(
                    "call_1",
                    "Calculate",
                    r#"{"expression":"6*7"}"#,
                )],
            }),
            Ok(CompletionOutcome::Final("The answer is 42.".into())),
        ]);
        let (router, state) = app(provider.clone()).await;

        let response = router
            .oneshot(post_chat(&serde_json::json!({"message": "What is 6 times 7?"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["reply"], "The answer is 42.");

        // system, user, assistant(tool_calls), tool
        assert_eq!(*provider.seen.lock().unwrap(), vec![2, 4]);

        let id = SessionId::from_string(body["conversation_id"].as_str().unwrap());
        let session = state.sessions.get(&id).await.unwrap();
        assert_eq!(session.lock().await.message_count(), 5);
    }

    #[tokio::test]
    async fn test_conversation_is_carried_over() {
        let provider = ScriptedProvider::new(vec![
            Ok(CompletionOutcome::Final("Hello!".into())),
            Ok(CompletionOutcome::Final("You said hi.".into())),
        ]);
        let (router, _state) = app(provider.clone()).await;

        let first = json_body(
            router
                .clone()
                .oneshot(post_chat(&serde_json::json!({"message": "hi"})))
                .await
                .unwrap(),
        )
        .await;
        let id = first["conversation_id"].as_str().unwrap();

        let second = json_body(
            router
                .oneshot(post_chat(&serde_json::json!({"message": "what did I say?", "conversation_id": id})))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(second["conversation_id"], id);
        assert_eq!(second["reply"], "You said hi.");
        assert_eq!(*provider.seen.lock().unwrap(), vec![2, 4]);
    }

    #[tokio::test]
    async fn test_blank_message_is_bad_request() {
        let (router, _state) = app(ScriptedProvider::new(vec![])).await;
        let response = router
            .oneshot(post_chat(&serde_json::json!({"message": "   "})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_failed_run_leaves_history_untouched() {
        let provider = ScriptedProvider::new(vec![
            Ok(CompletionOutcome::Final("first".into())),
            Ok(CompletionOutcome::ToolCallsRequested {
                content: None,
                calls: vec![ToolCallRequest::new("call_1", "GetTime", "{}")],
            }),
            Err(AgentError::Transport("connection reset".into())),
        ]);
        let (router, state) = app(provider).await;

        let first = json_body(
            router
                .clone()
                .oneshot(post_chat(&serde_json::json!({"message": "hi"})))
                .await
                .unwrap(),
        )
        .await;
        let id = first["conversation_id"].as_str().unwrap().to_string();

        let response = router
            .oneshot(post_chat(&serde_json::json!({"message": "time?", "conversation_id": id})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["code"], "AGENT_ERROR");
        assert!(!body["error"].as_str().unwrap().contains("connection reset"));

        let session = state.sessions.get(&SessionId::from_string(id)).await.unwrap();
        assert_eq!(session.lock().await.message_count(), 3);
    }

    #[tokio::test]
    async fn test_failed_first_turn_stores_nothing() {
        let failures = (0..5)
            .map(|_| Err(AgentError::Transport("connection refused".into())))
            .collect();
        let (router, state) = app(ScriptedProvider::new(failures)).await;

        for body in [
            serde_json::json!({"message": "hi"}),
            serde_json::json!({"message": "hi"}),
            serde_json::json!({"message": "hi", "conversation_id": "client-chosen"}),
        ] {
            let response = router.clone().oneshot(post_chat(&body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }

        assert!(state.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_client_chosen_id_is_kept() {
        let provider = ScriptedProvider::new(vec![Ok(CompletionOutcome::Final("Hello!".into()))]);
        let (router, state) = app(provider).await;

        let body = json_body(
            router
                .oneshot(post_chat(&serde_json::json!({"message": "hi", "conversation_id": "mine"})))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(body["conversation_id"], "mine");
        let session = state.sessions.get(&SessionId::from_string("mine")).await.unwrap();
        assert_eq!(session.lock().await.message_count(), 3);
    }

    #[tokio::test]
    async fn test_delete_chat() {
        let (router, state) = app(ScriptedProvider::new(vec![])).await;
        state
            .sessions
            .get_or_create(Some(SessionId::from_string("abc")), agent_core::Conversation::default)
            .await;

        let delete = || Request::delete("/api/chat/abc").body(Body::empty()).unwrap();
        let response = router.clone().oneshot(delete()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = router.oneshot(delete()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tools_and_health() {
        let (router, _state) = app(ScriptedProvider::new(vec![])).await;

        let tools = json_body(
            router
                .clone()
                .oneshot(Request::get("/api/tools").body(Body::empty()).unwrap())
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(tools["tools"].as_array().unwrap().len(), 7);
        assert_eq!(tools["tools"][0]["type"], "function");

        let health = json_body(
            router
                .oneshot(Request::get("/health").body(Body::empty()).unwrap())
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["completion_service_reachable"], true);
        assert_eq!(health["tools"], 7);
    }
}
