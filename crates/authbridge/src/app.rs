use std::time::Duration;

use authbridge_auth::{auth_routes, AuthState};
use axum::{
    http::{Method, StatusCode},
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::handlers::health::{healthz, livez};

/// Upper bound for a whole request, covering every upstream call of a callback.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Create the application router with all routes and middleware.
pub fn create_app(state: AuthState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/livez", get(livez))
        .route("/healthz", get(healthz))
        .merge(auth_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use authbridge_auth::{BrokerConfig, LocalBackend, MemoryPkceStore};
    use axum::{
        body::Body,
        http::{header, Request},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state(pairs: &[(&str, &str)]) -> AuthState {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = BrokerConfig::from_lookup(|key| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
        .unwrap();

        AuthState::new(
            &config,
            Arc::new(MemoryPkceStore::new(config.pkce_ttl)),
            Arc::new(LocalBackend::new(b"secret", config.credential_ttl)),
        )
        .unwrap()
    }

    fn both_providers() -> AuthState {
        test_state(&[
            ("AUTH_BASE_URL", "https://broker.example.com"),
            ("DISCORD_CLIENT_ID", "discord-id"),
            ("DISCORD_CLIENT_SECRET", "discord-secret"),
            ("X_CLIENT_ID", "x-id"),
            ("X_CLIENT_SECRET", "x-secret"),
        ])
    }

    #[tokio::test]
    async fn test_livez() {
        let app = create_app(test_state(&[]));

        let response = app
            .oneshot(Request::builder().uri("/livez").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_healthz_lists_providers() {
        let app = create_app(both_providers());

        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["status"], "ok");
        assert_eq!(json["providers"], serde_json::json!(["discord", "x"]));
    }

    #[tokio::test]
    async fn test_discord_login_redirects_to_discord() {
        let app = create_app(both_providers());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/auth/discord")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);

        let location = url::Url::parse(response.headers()[header::LOCATION].to_str().unwrap())
            .unwrap();
        assert_eq!(location.host_str(), Some("discord.com"));
        assert_eq!(location.path(), "/oauth2/authorize");

        let query: std::collections::HashMap<String, String> =
            location.query_pairs().into_owned().collect();
        assert_eq!(query["client_id"], "discord-id");
        assert_eq!(
            query["redirect_uri"],
            "https://broker.example.com/auth/discord/callback"
        );
    }

    #[tokio::test]
    async fn test_x_login_redirects_with_pkce() {
        let app = create_app(both_providers());

        let response = app
            .oneshot(Request::builder().uri("/auth/x").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);

        let location = url::Url::parse(response.headers()[header::LOCATION].to_str().unwrap())
            .unwrap();
        assert_eq!(location.host_str(), Some("twitter.com"));
        assert!(location
            .query_pairs()
            .any(|(k, v)| k == "code_challenge_method" && v == "S256"));
    }

    #[tokio::test]
    async fn test_unconfigured_provider_is_404() {
        let app = create_app(test_state(&[]));

        let response = app
            .oneshot(Request::builder().uri("/auth/x").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_callback_without_code_is_400() {
        let app = create_app(both_providers());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/auth/discord/callback")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
