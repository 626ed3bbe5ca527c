use crate::agent::ChatAgent;
use crate::error::ChatError;
use crate::models::chat::QueryRequest;
use crate::server::page;
use crate::session::{ Session, SessionManager };
use std::sync::Arc;
use axum::{
    routing::{ get, post },
    Router,
    Json,
    extract::{ rejection::JsonRejection, State },
    response::{ Html, IntoResponse, Response },
    http::{ header, HeaderMap, StatusCode },
};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::{ Any, CorsLayer };
use log::{ error, warn };

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<ChatAgent>,
    pub sessions: Arc<SessionManager>,
}

#[derive(Serialize)]
struct ClearResponse {
    status: &'static str,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/query", post(query_handler))
        .route("/clear", post(clear_handler))
        .layer(cors)
        .with_state(state)
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed ({}): {}", status, self);
        } else {
            warn!("Request rejected ({}): {}", status, self);
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

/// Attaches the session cookie to responses that started a new session.
fn with_session(session: &Session, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    if let Some(cookie) = &session.set_cookie {
        response.headers_mut().insert(header::SET_COOKIE, cookie.clone());
    }
    response
}

fn resolve_session(state: &AppState, headers: &HeaderMap) -> Result<Session, Response> {
    state.sessions.resolve(headers).map_err(|e| {
        ChatError::Internal(format!("session resolution failed: {}", e)).into_response()
    })
}

async fn index_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = match resolve_session(&state, &headers) {
        Ok(session) => session,
        Err(resp) => {
            return resp;
        }
    };

    match state.agent.history(&session.id).await {
        Ok(history) => with_session(&session, Html(page::render_chat_page(&history))),
        Err(e) => with_session(&session, e),
    }
}

async fn query_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<QueryRequest>, JsonRejection>
) -> Response {
    let session = match resolve_session(&state, &headers) {
        Ok(session) => session,
        Err(resp) => {
            return resp;
        }
    };

    let result = match payload {
        Ok(Json(request)) => state.agent.handle_query(&session.id, request).await,
        Err(rejection) => Err(ChatError::InvalidRequest(rejection.body_text())),
    };

    match result {
        Ok(resp) => with_session(&session, (StatusCode::OK, Json(resp))),
        Err(e) => with_session(&session, e),
    }
}

async fn clear_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = match resolve_session(&state, &headers) {
        Ok(session) => session,
        Err(resp) => {
            return resp;
        }
    };

    match state.agent.clear_history(&session.id).await {
        Ok(()) => with_session(&session, Json(ClearResponse { status: "success" })),
        Err(e) => with_session(&session, e),
    }
}
