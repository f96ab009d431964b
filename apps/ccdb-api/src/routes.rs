use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::get,
};
use serde::Serialize;
use serde_json::Value;

use ccdb_domain::SearchRequest;
use ccdb_service::{AggregationResponse, Error, SearchOutcome};

use crate::{export, state::AppState};

const DEFAULT_SUGGEST_SIZE: u32 = 6;

type Pairs = Query<Vec<(String, String)>>;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/complaints", get(search))
		.route("/v1/complaints/_suggest", get(suggest))
		.route("/v1/complaints/_suggest_company", get(suggest_company))
		.route("/v1/complaints/_suggest_zip", get(suggest_zip))
		.route("/v1/complaints/trends", get(trends))
		.route("/v1/complaints/states", get(states))
		.route("/v1/complaints/{id}", get(document))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(State(state): State<AppState>, Query(pairs): Pairs) -> Result<Response, ApiError> {
	let request = parse(&pairs)?;

	match state.service.search(&request).await? {
		SearchOutcome::Page(page) => Ok(Json(page).into_response()),
		SearchOutcome::Export(cursor) => Ok(export::response(cursor)),
		SearchOutcome::Unsupported => Ok(StatusCode::NO_CONTENT.into_response()),
	}
}

async fn suggest(
	State(state): State<AppState>,
	Query(pairs): Pairs,
) -> Result<Json<Vec<String>>, ApiError> {
	let size = match param(&pairs, "size") {
		Some(raw) => raw.parse::<u32>().map_err(|_| {
			json_error(
				StatusCode::BAD_REQUEST,
				"invalid_request",
				format!("Invalid value for size: '{raw}' must be a positive integer."),
				Some(vec!["size".to_string()]),
			)
		})?,
		None => DEFAULT_SUGGEST_SIZE,
	};
	let text = param(&pairs, "text").unwrap_or_default();

	Ok(Json(state.service.suggest(text, size).await?))
}

async fn suggest_company(
	State(state): State<AppState>,
	Query(pairs): Pairs,
) -> Result<Json<Vec<String>>, ApiError> {
	suggest_field(&state, "company", &pairs).await
}

async fn suggest_zip(
	State(state): State<AppState>,
	Query(pairs): Pairs,
) -> Result<Json<Vec<String>>, ApiError> {
	suggest_field(&state, "zip_code", &pairs).await
}

async fn trends(
	State(state): State<AppState>,
	Query(pairs): Pairs,
) -> Result<Json<AggregationResponse>, ApiError> {
	let request = parse(&pairs)?;

	Ok(Json(state.service.trends(&request).await?))
}

async fn states(
	State(state): State<AppState>,
	Query(pairs): Pairs,
) -> Result<Json<AggregationResponse>, ApiError> {
	let request = parse(&pairs)?;

	Ok(Json(state.service.states(&request).await?))
}

async fn document(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
	Ok(Json(state.service.document(&id).await?))
}

async fn suggest_field(
	state: &AppState,
	field: &str,
	pairs: &[(String, String)],
) -> Result<Json<Vec<String>>, ApiError> {
	let request = parse(pairs)?;
	let text = param(pairs, "text").unwrap_or_default();

	Ok(Json(state.service.suggest_filter(field, text, &request).await?))
}

fn parse(pairs: &[(String, String)]) -> Result<SearchRequest, ApiError> {
	SearchRequest::from_pairs(pairs.iter().map(|(key, value)| (key, value)))
		.map_err(|err| ApiError::from(Error::from(err)))
}

fn param<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
	pairs.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str())
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidFilter { field, message } => json_error(
				StatusCode::BAD_REQUEST,
				"invalid_request",
				format!("Invalid value for {field}: {message}"),
				Some(vec![field]),
			),
			Error::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "not_found", message, None),
			Error::EngineUnavailable { message } => {
				tracing::warn!(error = %message, "Search engine unavailable.");

				json_error(
					StatusCode::SERVICE_UNAVAILABLE,
					"dependency_unavailable",
					"Search engine is unavailable.",
					None,
				)
			},
			Error::Internal { message } => {
				tracing::error!(error = %message, "Request failed.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "Internal error.", None)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}
