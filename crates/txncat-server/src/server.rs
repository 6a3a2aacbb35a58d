use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use txncat_engine::Categorizer;

use crate::config::Config;
use crate::handlers;

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Categorizer>,
    pub admin_token: String,
}

impl AppState {
    /// Compare the `x-admin-token` header against the configured secret.
    pub(crate) fn is_admin(&self, headers: &HeaderMap) -> bool {
        headers.get("x-admin-token").and_then(|v| v.to_str().ok())
            == Some(self.admin_token.as_str())
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/predict", post(handlers::predict))
        .route("/suggest", post(handlers::suggest))
        .route("/feedback", post(handlers::feedback))
        .route(
            "/taxonomy",
            get(handlers::get_taxonomy).post(handlers::upload_taxonomy),
        )
        .route("/admin/pending_aliases", get(handlers::pending_aliases))
        .route("/admin/approve_alias", post(handlers::approve_alias))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Create and start the server. Returns a handle holding the bound port.
pub async fn start(config: Config, engine: Arc<Categorizer>) -> Result<ServerHandle, std::io::Error> {
    let state = AppState {
        engine,
        admin_token: config.admin_token,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(port = local_addr.port(), "txncat server started");

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        _server: server_handle,
    })
}

/// Handle returned by `start()` — keeps the accept loop alive.
pub struct ServerHandle {
    pub port: u16,
    _server: tokio::task::JoinHandle<()>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use txncat_engine::DEFAULT_PROMOTE_THRESHOLD;
    use txncat_store::Database;

    async fn serve() -> (ServerHandle, String) {
        let engine = Arc::new(Categorizer::new(
            Database::in_memory().unwrap(),
            DEFAULT_PROMOTE_THRESHOLD,
        ));
        let config = Config {
            port: 0, // Random port
            ..Config::default()
        };
        let handle = start(config, engine).await.unwrap();
        let base = format!("http://127.0.0.1:{}", handle.port);
        (handle, base)
    }

    #[tokio::test]
    async fn server_starts_and_serves_health() {
        let (handle, base) = serve().await;
        assert!(handle.port > 0);

        let resp = reqwest::get(format!("{base}/health")).await.unwrap();
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["taxonomy_version"], "1.0");
        assert_eq!(body["categories"], 0);
    }

    #[tokio::test]
    async fn root_lists_endpoints() {
        let (_handle, base) = serve().await;

        let body: serde_json::Value = reqwest::get(format!("{base}/"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["service"], "txncat");
        assert!(body["endpoints"]
            .as_array()
            .unwrap()
            .iter()
            .any(|e| e == "/predict"));
    }

    #[tokio::test]
    async fn predict_over_http() {
        let (_handle, base) = serve().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{base}/predict"))
            .json(&serde_json::json!({"transaction": "Amazon purchase", "amount": 999.0}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["transaction_id"], 1);
        assert_eq!(body["category"], "shopping");
        assert_eq!(body["method"], "model");

        // missing field is a 400 with a JSON error body
        let resp = client
            .post(format!("{base}/predict"))
            .json(&serde_json::json!({"amount": 10.0}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "missing required field: transaction");
    }

    #[tokio::test]
    async fn admin_token_gates_taxonomy_upload() {
        let (_handle, base) = serve().await;
        let client = reqwest::Client::new();
        let doc = serde_json::json!({
            "version": "2.0",
            "categories": [{"id": "food", "aliases": ["swiggy"]}],
        });

        // wrong token: 401 even with an unparsable body
        let resp = client
            .post(format!("{base}/taxonomy"))
            .header("x-admin-token", "wrong")
            .body("this is not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);

        let resp = client
            .post(format!("{base}/taxonomy"))
            .header("x-admin-token", "admin-token")
            .json(&doc)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], "2.0");

        let served: serde_json::Value = reqwest::get(format!("{base}/taxonomy"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(served["version"], "2.0");
        assert_eq!(served["categories"][0]["id"], "food");
    }

    // The whole crowd loop over the wire: votes accumulate through
    // /feedback, the third promotes, and the alias starts matching.
    #[tokio::test]
    async fn feedback_votes_promote_over_http() {
        let (_handle, base) = serve().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{base}/taxonomy"))
            .header("x-admin-token", "admin-token")
            .json(&serde_json::json!({
                "version": "2.0",
                "categories": [{"id": "food", "aliases": ["swiggy"]}],
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        for round in 1..=3 {
            let resp = client
                .post(format!("{base}/feedback"))
                .json(&serde_json::json!({
                    "transaction_id": round,
                    "corrected_category": "food",
                    "transaction_text": "milkshake",
                    "add_alias": true,
                }))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 200);

            let body: serde_json::Value = resp.json().await.unwrap();
            assert_eq!(body["status"], "ok");
            assert_eq!(body["vote"]["votes"], round);
            assert_eq!(body["vote"]["promoted"], round == 3);
        }

        let pending: serde_json::Value = reqwest::get(format!("{base}/admin/pending_aliases"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(pending["pending"].as_array().unwrap().is_empty());

        let resp = client
            .post(format!("{base}/predict"))
            .json(&serde_json::json!({"transaction": "MILKSHAKE 120"}))
            .send()
            .await
            .unwrap();
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["category"], "food");
        assert_eq!(body["method"], "alias_keyword");
    }

    #[tokio::test]
    async fn approve_alias_over_http() {
        let (_handle, base) = serve().await;
        let client = reqwest::Client::new();

        client
            .post(format!("{base}/taxonomy"))
            .header("x-admin-token", "admin-token")
            .json(&serde_json::json!({
                "version": "2.0",
                "categories": [{"id": "fuel", "aliases": []}],
            }))
            .send()
            .await
            .unwrap();

        let resp = client
            .post(format!("{base}/admin/approve_alias"))
            .header("x-admin-token", "admin-token")
            .json(&serde_json::json!({"token": "hpcl", "category": "fuel"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["promoted"], true);

        let resp = client
            .post(format!("{base}/admin/approve_alias"))
            .json(&serde_json::json!({"token": "hpcl", "category": "fuel"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
    }

    #[test]
    fn build_router_creates_routes() {
        let engine = Arc::new(Categorizer::new(
            Database::in_memory().unwrap(),
            DEFAULT_PROMOTE_THRESHOLD,
        ));
        let state = AppState {
            engine,
            admin_token: "admin-token".to_string(),
        };

        let _router = build_router(state);
        // If this doesn't panic, the router was built successfully
    }
}
