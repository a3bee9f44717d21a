use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use mvc::{ActionOutput, Application, DispatchError, Params};
use serde_json::Value;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::RouteListing,
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info_span};
use uuid::Uuid;

/// Query parameter that carries the route instead of the URL path.
pub const ROUTE_PARAM: &str = "r";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub struct AppState {
    pub app: Arc<Application>,
}

pub fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/_routes", get(list_routes))
        .fallback(dispatch)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_routes(State(state): State<Arc<AppState>>) -> Json<RouteListing> {
    Json(state.app.routes())
}

async fn dispatch(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = Uuid::new_v4();
    let mut response = if method == Method::GET || method == Method::HEAD || method == Method::POST {
        run_request(&state, request_id, uri.path(), query, &headers, &body).await
    } else {
        error_response(
            StatusCode::METHOD_NOT_ALLOWED,
            ApiError::new(ErrorCode::BadRequest, format!("method {method} is not allowed")),
        )
    };

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

async fn run_request(
    state: &AppState,
    request_id: Uuid,
    path: &str,
    query: HashMap<String, String>,
    headers: &HeaderMap,
    body: &[u8],
) -> Response {
    let (route, params) = match request_input(path, query, headers, body) {
        Ok(input) => input,
        Err(err) => return dispatch_error_response(&err),
    };

    let span = info_span!("request", %request_id, route = %route);
    let app = Arc::clone(&state.app);
    let outcome = tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        app.handle_request(&route, &params)
    })
    .await;

    match outcome {
        Ok(Ok(output)) => output_response(output),
        Ok(Err(err)) => dispatch_error_response(&err),
        Err(join_error) => {
            error!(%request_id, error = %join_error, "dispatch task failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new(ErrorCode::Internal, "dispatch task failed"),
            )
        }
    }
}

/// Splits an HTTP request into the route to run and its parameters. Query
/// values arrive as strings; a JSON object body is merged over them.
pub(crate) fn request_input(
    path: &str,
    mut query: HashMap<String, String>,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(String, Params), DispatchError> {
    let route = match query.remove(ROUTE_PARAM) {
        Some(route) => route,
        None => path.trim_start_matches('/').to_string(),
    };
    let mut params: Params = query.into_iter().collect();

    if !body.is_empty() && is_json(headers) {
        let value: Value = serde_json::from_slice(body)
            .map_err(|err| DispatchError::BadRequest(format!("Invalid JSON body: {err}")))?;
        match value {
            Value::Object(map) => params.merge(Params::from(map)),
            _ => {
                return Err(DispatchError::BadRequest(
                    "The JSON body must be an object.".into(),
                ))
            }
        }
    }

    Ok((route, params))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

pub(crate) fn output_response(output: ActionOutput) -> Response {
    match output {
        None => StatusCode::NO_CONTENT.into_response(),
        Some(Value::String(page)) => Html(page).into_response(),
        Some(value) => Json(value).into_response(),
    }
}

pub(crate) fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
        ErrorCode::InvalidPath | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn dispatch_error_response(err: &DispatchError) -> Response {
    let status = status_for(err.code());
    if status.is_server_error() {
        error!(error = %err, "dispatch failed");
    }
    error_response(status, ApiError::from(err))
}

fn error_response(status: StatusCode, body: ApiError) -> Response {
    (status, Json(body)).into_response()
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
