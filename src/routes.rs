// src/routes.rs

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    handlers::{admin, auth, practice, student},
    state::AppState,
    store::sessions::SESSION_HEADER,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * `/api/quiz` and `/api/practice`: anonymous student flow.
/// * `/api/admin`: authoring, behind bearer auth and the admin role.
/// * Everything else falls through to the static frontend.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring malformed CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(SESSION_HEADER),
        ])
        .expose_headers([HeaderName::from_static(SESSION_HEADER)]);

    let quiz_routes = Router::new()
        .route("/start", post(student::start_quiz))
        .route("/instructions", get(student::get_instructions))
        .route("/questions", get(student::get_questions))
        .route("/submit", post(student::submit_quiz))
        .route("/review", get(student::get_review))
        .route("/{id}/leaderboard", get(student::get_leaderboard));

    let practice_routes = Router::new()
        .route("/questions", post(practice::practice_questions))
        .route("/check", post(practice::practice_check));

    let protected_admin_routes = Router::new()
        .route(
            "/quizzes",
            get(admin::list_quizzes).post(admin::create_quiz),
        )
        .route("/quizzes/import", post(admin::import_quiz))
        .route(
            "/quizzes/{id}",
            get(admin::get_quiz)
                .put(admin::update_quiz)
                .delete(admin::delete_quiz),
        )
        .route("/quizzes/{id}/questions", post(admin::append_questions))
        .route("/quizzes/{id}/pins", post(admin::regenerate_pins))
        .route("/quizzes/{id}/leaderboard", get(admin::quiz_leaderboard))
        // Auth runs first, then the role check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/login", post(auth::login))
        .merge(protected_admin_routes);

    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .nest("/api/quiz", quiz_routes)
        .nest("/api/practice", practice_routes)
        .nest("/api/admin", admin_routes)
        .fallback_service(static_files)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, store::test_pool};
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    fn config() -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "secret".to_string(),
            jwt_expiration: 60,
            rust_log: "error".to_string(),
            log_dir: "logs".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            admin_username: None,
            admin_password: None,
            attempt_ttl_seconds: 60,
            handoff_ttl_seconds: 60,
            allowed_origins: vec!["http://localhost:3000".to_string(), "not a url\n".to_string()],
            static_dir: "static".to_string(),
            env_warnings: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_admin_routes_reject_anonymous_callers() {
        let app = create_router(AppState::new(test_pool().await, config()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/admin/quizzes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_is_public() {
        let app = create_router(AppState::new(test_pool().await, config()));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/admin/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"nobody","password":"x"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Invalid username or password");
    }
}
