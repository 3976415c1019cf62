//! Route definitions.

use crate::auth::{AuthState, require_api_key};
use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the application router.
///
/// Only transfer submission sits behind the API key guard.
pub fn router(state: AppState, auth: AuthState) -> Router {
    let protected = Router::new()
        .route("/transfers", post(handlers::submit_transfer))
        .route_layer(middleware::from_fn_with_state(auth, require_api_key));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/balance", get(handlers::balance))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{API_KEY_HEADER, AuthConfig};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use solpay_domain::Endpoint;
    use solpay_execution::config::EngineConfig;
    use solpay_execution::engine::TransferEngine;
    use solpay_execution::provider::ProviderBridge;
    use solpay_execution::provider::scripted::ScriptedProvider;
    use solpay_protocols::rpc::SignatureState;
    use solpay_protocols::rpc::scripted::{ScriptedConnector, ScriptedRpc};
    use std::sync::Arc;
    use tower::ServiceExt;

    const RECIPIENT: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

    fn app(rpc: ScriptedRpc, keys: &str, poll_max_attempts: u32) -> Router {
        let config = EngineConfig {
            endpoints: vec![Endpoint::new("https://a", 0)],
            poll_max_attempts,
            ..EngineConfig::default()
        };
        let provider = Arc::new(ScriptedProvider::new().already_connected());
        let engine = TransferEngine::new(
            config,
            Arc::new(ScriptedConnector::new([rpc])),
            Arc::new(ProviderBridge::with_provider(provider)),
        )
        .unwrap();

        router(
            AppState::new(Arc::new(engine)),
            AuthState::new(AuthConfig::from_key_list(keys)),
        )
    }

    fn transfer_request(body: Value, key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/transfers")
            .header("content-type", "application/json");
        if let Some(key) = key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(ScriptedRpc::healthy("https://a", 1), "", 30);

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["endpoints"], 1);
        assert_eq!(body["wallet_connected"], true);
    }

    #[tokio::test]
    async fn test_confirmed_transfer() {
        let rpc = ScriptedRpc::healthy("https://a", 1).with_statuses([Ok(SignatureState::Succeeded)]);
        let app = app(rpc, "alpha", 30);

        let response = app
            .oneshot(transfer_request(
                json!({"recipient": RECIPIENT, "amount": "0.01"}),
                Some("alpha"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["signature"], "sig1");
        assert_eq!(body["confirmed"], true);
        assert_eq!(body["amount"], 10_000_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unconfirmed_transfer_is_accepted() {
        let app = app(ScriptedRpc::healthy("https://a", 1), "", 3);

        let response = app
            .oneshot(transfer_request(
                json!({"recipient": RECIPIENT, "amount": 1}),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = json_body(response).await;
        assert_eq!(body["confirmed"], false);
        assert!(body["warning"].as_str().is_some_and(|w| !w.is_empty()));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_rejected() {
        let app = app(ScriptedRpc::healthy("https://a", 1), "alpha", 30);

        let response = app
            .oneshot(transfer_request(
                json!({"recipient": RECIPIENT, "amount": "0.01"}),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["kind"], "missing_auth");
    }

    #[tokio::test]
    async fn test_wrong_api_key_is_rejected() {
        let app = app(ScriptedRpc::healthy("https://a", 1), "alpha", 30);

        let response = app
            .oneshot(transfer_request(
                json!({"recipient": RECIPIENT, "amount": "0.01"}),
                Some("beta"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_recipient_error_body() {
        let app = app(ScriptedRpc::healthy("https://a", 1), "", 30);

        let response = app
            .oneshot(transfer_request(
                json!({"recipient": "not-an-address", "amount": "0.01"}),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["kind"], "invalid_recipient");
        assert_eq!(body["message"], "Invalid recipient address");
        assert!(body["error"].as_str().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_unavailable_is_503() {
        let app = app(ScriptedRpc::hanging("https://a"), "", 30);

        let response = app
            .oneshot(transfer_request(
                json!({"recipient": RECIPIENT, "amount": "0.01"}),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["kind"], "network_unavailable");
    }

    #[tokio::test]
    async fn test_balance_of_given_address() {
        let app = app(ScriptedRpc::healthy("https://a", 1).with_balance(1_500_000_000), "", 30);

        let response = app
            .oneshot(
                Request::get(format!("/balance?address={RECIPIENT}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["address"], RECIPIENT);
        assert_eq!(body["lamports"], 1_500_000_000u64);
        assert_eq!(body["sol"], "1.5");
    }
}
