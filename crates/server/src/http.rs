//! HTTP Endpoints
//!
//! REST API for the lead-capture assistant.

use axum::{
    extract::{Json, Path, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use lead_assistant_core::{ConversationState, Intent, Message, PropertyContext, Sender, Stage};
use lead_assistant_integrations::InquiryReceipt;

use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(
        &state.config.server.cors_origins,
        state.config.server.cors_enabled,
    );

    Router::new()
        // Session endpoints
        .route("/api/sessions", post(create_session).get(list_sessions))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/agent-messages", post(post_agent_message))
        // Chat endpoint
        .route("/api/chat/:session_id", post(chat))
        // Health check
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If cors_origins is empty or all invalid, defaults to localhost:3000
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("No valid CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static("http://localhost:3000"))
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

/// Session creation request
#[derive(Debug, Default, Deserialize)]
struct CreateSessionRequest {
    #[serde(default)]
    property: Option<PropertyContext>,
}

/// Session snapshot
#[derive(Debug, Serialize)]
struct SessionResponse {
    session_id: String,
    stage: Stage,
    state: ConversationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    property: Option<PropertyContext>,
    messages: Vec<Message>,
}

/// Create session
async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let session = state.sessions.create(request.property)?;
    let conversation = session.conversation.lock().await;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id: session.id.clone(),
            stage: conversation.state().stage(),
            state: conversation.state().clone(),
            property: session.property(),
            messages: conversation.messages().messages().to_vec(),
        }),
    ))
}

/// Get session info
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ServerError> {
    let session = state
        .sessions
        .get(&id)
        .ok_or(ServerError::SessionNotFound(id))?;
    let conversation = session.conversation.lock().await;

    Ok(Json(SessionResponse {
        session_id: session.id.clone(),
        stage: conversation.state().stage(),
        state: conversation.state().clone(),
        property: session.property(),
        messages: conversation.messages().messages().to_vec(),
    }))
}

/// Delete session
async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    if state.sessions.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServerError::SessionNotFound(id))
    }
}

/// List sessions
async fn list_sessions(State(state): State<AppState>) -> Json<serde_json::Value> {
    let sessions = state.sessions.list();
    Json(serde_json::json!({
        "sessions": sessions,
        "count": sessions.len(),
    }))
}

/// Chat request
#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    /// Replaces the session's property context when present
    #[serde(default)]
    property: Option<PropertyContext>,
}

/// Chat response
#[derive(Debug, Serialize)]
struct ChatResponse {
    reply: Message,
    intent: Option<Intent>,
    stage: Stage,
    state: ConversationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    inquiry: Option<InquiryReceipt>,
    messages: Vec<Message>,
}

/// Chat endpoint
async fn chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ServerError> {
    let session = state
        .sessions
        .get(&session_id)
        .ok_or(ServerError::SessionNotFound(session_id))?;

    session.touch();
    if let Some(property) = request.property {
        session.set_property(property);
    }
    let property = session.property();

    let mut conversation = session.conversation.lock().await;
    let outcome = conversation
        .handle_turn(&request.message, property.as_ref())
        .await?;

    Ok(Json(ChatResponse {
        reply: outcome.reply,
        intent: outcome.intent,
        stage: outcome.stage,
        state: conversation.state().clone(),
        inquiry: outcome.inquiry,
        messages: conversation.messages().messages().to_vec(),
    }))
}

/// Agent message request
#[derive(Debug, Deserialize)]
struct AgentMessageRequest {
    text: String,
    sender: Sender,
}

/// Append a message from a human agent
async fn post_agent_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AgentMessageRequest>,
) -> Result<impl IntoResponse, ServerError> {
    if request.text.trim().is_empty() {
        return Err(ServerError::InvalidRequest("text must not be empty".to_string()));
    }
    let session = state
        .sessions
        .get(&id)
        .ok_or(ServerError::SessionNotFound(id))?;

    session.touch();
    let message = session
        .conversation
        .lock()
        .await
        .record_agent_message(request.text, request.sender);

    Ok((StatusCode::CREATED, Json(message)))
}

/// Health check
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.sessions.count(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    use lead_assistant_config::Settings;
    use lead_assistant_integrations::{
        IntegrationError, InquiryRequest, InquirySubmitter, StubInquirySubmitter,
    };

    struct DownSubmitter;

    #[async_trait]
    impl InquirySubmitter for DownSubmitter {
        async fn submit(&self, _inquiry: &InquiryRequest) -> Result<InquiryReceipt, IntegrationError> {
            Err(IntegrationError::ConnectionFailed("connection refused".to_string()))
        }
    }

    fn app(submitter: Arc<dyn InquirySubmitter>) -> Router {
        create_router(AppState::new(Settings::default(), submitter))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(json) => Body::from(json.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn villa_json() -> serde_json::Value {
        serde_json::json!({
            "id": "p-1",
            "title": "Sea View Villa",
            "price": 1200000,
            "location": "Dubai Marina",
        })
    }

    async fn create(app: &Router) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/sessions",
            Some(serde_json::json!({ "property": villa_json() })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["stage"], "greeting");
        body["session_id"].as_str().unwrap().to_string()
    }

    async fn say(app: &Router, id: &str, text: &str) -> (StatusCode, serde_json::Value) {
        send(
            app,
            Method::POST,
            &format!("/api/chat/{}", id),
            Some(serde_json::json!({ "message": text })),
        )
        .await
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(Arc::new(StubInquirySubmitter::new()));
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_chat_lead_capture() {
        let app = app(Arc::new(StubInquirySubmitter::new()));
        let id = create(&app).await;

        let (status, body) = say(&app, &id, "I want to buy").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["intent"], "buy-intent");
        assert_eq!(body["stage"], "collecting_info");
        assert!(body["reply"]["text"].as_str().unwrap().contains("Sea View Villa"));

        say(&app, &id, "John").await;
        say(&app, &id, "+971501234567").await;
        let (status, body) = say(&app, &id, "john@example.com").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stage"], "inquiry_submitted");
        assert_eq!(body["inquiry"]["success"], true);
        assert_eq!(body["messages"].as_array().unwrap().len(), 8);

        let (status, body) = send(&app, Method::GET, &format!("/api/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["user_email"], "john@example.com");
    }

    #[tokio::test]
    async fn test_chat_price_question() {
        let app = app(Arc::new(StubInquirySubmitter::new()));
        let id = create(&app).await;

        let (status, body) = say(&app, &id, "What's the price?").await;
        assert_eq!(status, StatusCode::OK);
        let reply = body["reply"]["text"].as_str().unwrap();
        assert!(reply.contains("AED 1,200,000"));
        assert!(reply.contains("for sale"));
        assert_eq!(body["stage"], "greeting");
    }

    #[tokio::test]
    async fn test_submission_failure_maps_to_bad_gateway() {
        let app = app(Arc::new(DownSubmitter));
        let id = create(&app).await;
        for text in ["I want to buy", "John", "+971501234567"] {
            let (status, _) = say(&app, &id, text).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = say(&app, &id, "john@example.com").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("connection refused"));

        let (_, body) = send(&app, Method::GET, &format!("/api/sessions/{}", id), None).await;
        assert_eq!(body["stage"], "collecting_info");
        assert_eq!(body["messages"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let app = app(Arc::new(StubInquirySubmitter::new()));
        let (status, _) = say(&app, "missing", "hi").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::DELETE, "/api/sessions/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let app = app(Arc::new(StubInquirySubmitter::new()));
        let id = create(&app).await;
        let (status, _) = send(&app, Method::DELETE, &format!("/api/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::GET, &format!("/api/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_agent_message() {
        let app = app(Arc::new(StubInquirySubmitter::new()));
        let id = create(&app).await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/sessions/{}/agent-messages", id),
            Some(serde_json::json!({ "text": "Hi, this is Sara.", "sender": { "name": "Sara" } })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["kind"], "agent");
        assert_eq!(body["sender"]["name"], "Sara");
    }
}
