use std::{future::Future, time::Duration};

use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use crate::state::AppState;
use docchat_service::{
	DocumentSearchRequest, DocumentSearchResponse, Error, GradedSearchRequest,
	GradedSearchResponse, HybridSearchRequest, RetrievalResult,
};

pub const SEARCH_FAILED_MESSAGE: &str = "Document search failed. Please try again.";

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/documents/search", post(search_documents))
		.route("/v1/documents/hybrid_search", post(hybrid_search))
		.route("/v1/documents/graded_search", post(graded_search))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search_documents(
	State(state): State<AppState>,
	payload: Result<Json<DocumentSearchRequest>, JsonRejection>,
) -> Result<Json<DocumentSearchResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = with_timeout(&state, state.service.search_documents(payload)).await?;

	Ok(Json(response))
}

async fn hybrid_search(
	State(state): State<AppState>,
	payload: Result<Json<HybridSearchRequest>, JsonRejection>,
) -> Result<Json<RetrievalResult>, ApiError> {
	let Json(payload) = payload?;
	let response = with_timeout(&state, state.service.hybrid_search(payload)).await?;

	Ok(Json(response))
}

async fn graded_search(
	State(state): State<AppState>,
	payload: Result<Json<GradedSearchRequest>, JsonRejection>,
) -> Result<Json<GradedSearchResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = with_timeout(&state, state.service.graded_search(payload)).await?;

	Ok(Json(response))
}

/// Dropping the search future on timeout cancels every in-flight provider and index call.
async fn with_timeout<T>(
	state: &AppState,
	search: impl Future<Output = docchat_service::Result<T>>,
) -> Result<T, ApiError> {
	let timeout_ms = state.service.cfg.search.timeout_ms;

	match tokio::time::timeout(Duration::from_millis(timeout_ms), search).await {
		Ok(result) => result.map_err(ApiError::from),
		Err(_) => {
			tracing::warn!(timeout_ms, "Document search timed out.");

			Err(json_error(StatusCode::GATEWAY_TIMEOUT, "timeout", SEARCH_FAILED_MESSAGE))
		},
	}
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_request", message),
			Error::Provider { .. } | Error::Retrieval { .. } | Error::Storage { .. } => {
				tracing::error!(error = %err, "Document search failed.");

				json_error(StatusCode::BAD_GATEWAY, "search_failed", SEARCH_FAILED_MESSAGE)
			},
		}
	}
}
impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		json_error(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text())
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError::new(status, code, message)
}
