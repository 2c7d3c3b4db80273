use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::form::read_form;
use super::page::{is_renderable_url, render, Notice, PageView};
use super::state::AppState;
use crate::fal::FalError;
use crate::generation::{FormInput, GenerationRequest};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub api_key_configured: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        api_key_configured: state.api_key_configured(),
    })
}

pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(page(&state, &FormInput::default(), None))
}

/// Handle a form submission. Every outcome re-renders the form.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> (StatusCode, Html<String>) {
    let input = match read_form(&mut multipart).await {
        Ok(input) => input,
        Err(e) => {
            log::warn!("Rejected unreadable form: {}", e);
            let notice = Notice::Warning(format!("Could not read the submitted form: {}", e));
            return (
                e.status(),
                Html(page(&state, &FormInput::default(), Some(notice))),
            );
        }
    };

    // The page banner already explains a missing key.
    let Some(client) = state.client.as_ref() else {
        log::warn!("Refusing generation: {}", FalError::MissingApiKey);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Html(page(&state, &input, None)),
        );
    };

    let request = match GenerationRequest::validate(&input) {
        Ok(request) => request,
        Err(e) => {
            log::info!("Rejected submission: {}", e);
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(page(&state, &input, Some(Notice::Warning(e.to_string())))),
            );
        }
    };

    let (status, notice) = match client.generate(&request).await {
        Ok(video_url) if is_renderable_url(&video_url) => {
            (StatusCode::OK, Notice::Success { video_url })
        }
        Ok(video_url) => {
            log::warn!("Refusing to embed video URL: {}", video_url);
            let e = FalError::UnexpectedResponse(format!("unsupported video URL '{}'", video_url));
            (StatusCode::BAD_GATEWAY, Notice::Error(e.to_string()))
        }
        Err(e) => {
            log::error!("Generation failed: {}", e);
            (StatusCode::BAD_GATEWAY, Notice::Error(e.to_string()))
        }
    };

    (status, Html(page(&state, &input, Some(notice))))
}

fn page(state: &AppState, input: &FormInput, notice: Option<Notice>) -> String {
    render(&PageView {
        input,
        notice,
        api_key_configured: state.api_key_configured(),
    })
}
