//! REST handlers for the categorization and admin endpoints.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use txncat_core::feedback::FeedbackInput;
use txncat_core::taxonomy::Taxonomy;
use txncat_engine::EngineError;

use crate::server::AppState;

/// Uniform JSON response: a status code plus a JSON body.
pub type JsonResponse = (StatusCode, Json<serde_json::Value>);

/// Service banner and the endpoints a client will want first.
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "running",
        "service": "txncat",
        "endpoints": ["/predict", "/suggest", "/feedback", "/taxonomy"],
    }))
}

/// Health check with a glance at the loaded taxonomy.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let taxonomy = state.engine.taxonomy();
    Json(serde_json::json!({
        "status": "healthy",
        "taxonomy_version": taxonomy.version,
        "categories": taxonomy.categories.len(),
    }))
}

/// Classify a transaction description and log the prediction.
pub async fn predict(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> JsonResponse {
    let transaction = match require_str(&body, "transaction") {
        Ok(t) => t,
        Err(e) => return bad_request(e),
    };

    match state.engine.predict(transaction) {
        Ok(p) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "transaction_id": p.transaction_id,
                "category": p.category,
                "confidence": p.confidence,
                "method": p.method,
            })),
        ),
        Err(e) => engine_error(e),
    }
}

/// Up to three ranked category candidates. Never logs a prediction.
pub async fn suggest(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> JsonResponse {
    let transaction = match require_str(&body, "transaction") {
        Ok(t) => t,
        Err(e) => return bad_request(e),
    };
    let amount = optional_f64(&body, "amount");

    let suggestions = state.engine.suggest(transaction, amount);
    (
        StatusCode::OK,
        Json(serde_json::json!({ "suggestions": suggestions })),
    )
}

/// Record a category correction, optionally counting an alias vote.
pub async fn feedback(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> JsonResponse {
    let (Some(transaction_id), Some(corrected_category)) = (
        optional_i64(&body, "transaction_id"),
        optional_str(&body, "corrected_category"),
    ) else {
        return bad_request("transaction_id and corrected_category required");
    };

    let input = FeedbackInput {
        transaction_id,
        corrected_category: corrected_category.to_string(),
        user_id: optional_str(&body, "user_id").map(str::to_string),
        notes: optional_str(&body, "notes").map(str::to_string),
        transaction_text: optional_str(&body, "transaction_text").map(str::to_string),
        add_alias: body
            .get("add_alias")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
    };

    match state.engine.record_feedback(&input) {
        Ok(outcome) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ok", "vote": outcome })),
        ),
        Err(e) => engine_error(e),
    }
}

/// Current taxonomy document.
pub async fn get_taxonomy(State(state): State<AppState>) -> Json<Taxonomy> {
    Json(Taxonomy::clone(&state.engine.taxonomy()))
}

/// Replace the taxonomy document wholesale.
///
/// The token check runs before the body is parsed, so a bad token is a
/// 401 no matter what was sent.
pub async fn upload_taxonomy(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> JsonResponse {
    if !state.is_admin(&headers) {
        return unauthorized();
    }

    let doc: Taxonomy = match serde_json::from_str(&body) {
        Ok(doc) => doc,
        Err(_) => return bad_request("invalid json"),
    };

    match state.engine.replace_taxonomy(doc) {
        Ok(version) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ok", "version": version })),
        ),
        Err(e) => engine_error(e),
    }
}

/// Alias candidates still collecting votes, most-voted first.
pub async fn pending_aliases(State(state): State<AppState>) -> JsonResponse {
    match state.engine.pending_aliases() {
        Ok(pending) => (
            StatusCode::OK,
            Json(serde_json::json!({ "pending": pending })),
        ),
        Err(e) => engine_error(e),
    }
}

/// Force-promote an alias, bypassing the vote threshold.
pub async fn approve_alias(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> JsonResponse {
    if !state.is_admin(&headers) {
        return unauthorized();
    }

    let (Some(token), Some(category)) = (
        optional_str(&body, "token").filter(|t| !t.is_empty()),
        optional_str(&body, "category").filter(|c| !c.is_empty()),
    ) else {
        return bad_request("token and category required");
    };

    match state.engine.approve_alias(token, category) {
        Ok(promoted) => (
            StatusCode::OK,
            Json(serde_json::json!({ "promoted": promoted })),
        ),
        Err(e) => engine_error(e),
    }
}

/// Extract a required string field from a JSON body.
fn require_str<'a>(body: &'a serde_json::Value, key: &str) -> Result<&'a str, String> {
    body.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing required field: {key}"))
}

fn optional_str<'a>(body: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(|v| v.as_str())
}

fn optional_i64(body: &serde_json::Value, key: &str) -> Option<i64> {
    body.get(key).and_then(|v| v.as_i64())
}

fn optional_f64(body: &serde_json::Value, key: &str) -> Option<f64> {
    body.get(key).and_then(|v| v.as_f64())
}

fn bad_request(message: impl Into<String>) -> JsonResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message.into() })),
    )
}

fn unauthorized() -> JsonResponse {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": "unauthorized" })),
    )
}

fn engine_error(e: EngineError) -> JsonResponse {
    let status = match &e {
        EngineError::MalformedInput(_) => StatusCode::BAD_REQUEST,
        EngineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": e.to_string() })))
}
