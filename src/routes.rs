use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use http::{HeaderValue, Method, StatusCode, header};
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{handlers, middleware_layer, state::AppState};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

async fn health() -> StatusCode {
    StatusCode::OK
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {}", o))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(86400)))
}

/// Builds the HTTP surface.
///
/// # Arguments
///
/// * `state` - The application state.
///
/// # Returns
///
/// The `Router`, or an error if the CORS or rate-limit settings are invalid.
pub fn create_router(state: AppState) -> anyhow::Result<Router> {
    let mut login_routes = Router::new()
        .route("/api/admin/login", post(handlers::auth::admin_login))
        .route("/api/employee/login", post(handlers::auth::employee_login))
        .with_state(state.clone());

    let mut protected_routes = Router::new()
        .route("/api/me", get(handlers::auth::me))
        .route(
            "/api/employees",
            get(handlers::employees::list_employees).post(handlers::employees::create_employee),
        )
        .route(
            "/api/employees/{code}",
            get(handlers::employees::get_employee)
                .put(handlers::employees::update_employee)
                .delete(handlers::employees::delete_employee),
        )
        .route("/api/work/start", post(handlers::work::clock_in))
        .route("/api/work/end", post(handlers::work::clock_out))
        .route("/api/work/today", get(handlers::work::today))
        .route("/api/work/logs/{code}", get(handlers::work::list_logs))
        .route(
            "/api/work/sessions/{id}",
            put(handlers::work::edit_session).delete(handlers::work::delete_session),
        )
        .route("/api/salary/calculate", post(handlers::salary::calculate_salary))
        .route(
            "/api/routines/{code}/{date}",
            get(handlers::routines::get_routine).post(handlers::routines::set_routine),
        )
        .route(
            "/api/routines/{code}/{date}/progress",
            get(handlers::routines::get_progress),
        )
        .route("/api/tasks/{id}/complete", put(handlers::routines::complete_task))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_auth,
        ))
        .with_state(state.clone());

    if state.config.rate_limit_enabled {
        let login_governor_conf = Arc::new(
            GovernorConfigBuilder::default()
                .per_second(2)
                .burst_size(10)
                .use_headers()
                .finish()
                .context("Invalid login rate-limit settings")?,
        );
        let protected_governor_conf = Arc::new(
            GovernorConfigBuilder::default()
                .per_millisecond(50)
                .burst_size(200)
                .use_headers()
                .finish()
                .context("Invalid API rate-limit settings")?,
        );

        login_routes = login_routes.layer(tower_governor::GovernorLayer::new(login_governor_conf));
        protected_routes =
            protected_routes.layer(tower_governor::GovernorLayer::new(protected_governor_conf));
        tracing::info!("✅ Rate limiting enabled");
    }

    let app = Router::new()
        .route("/health", get(health))
        .merge(login_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config.cors_origins)?);

    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::identity::Identity;
    use axum::body::Body;
    use http::Request;
    use chrono::Utc;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        state: AppState,
    }

    impl TestApp {
        fn new() -> Self {
            let (state, _) = AppState::in_memory();
            let router = create_router(state.clone()).unwrap();
            Self { router, state }
        }

        fn token_for(&self, identity: Identity) -> String {
            self.state.tokens.issue(&identity, Utc::now()).unwrap().token
        }

        fn admin_token(&self) -> String {
            self.token_for(Identity::Admin { username: "boss".to_string() })
        }

        async fn send(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        /// Registers an employee through the API and returns a token for them.
        async fn hire(&self, name: &str, rate: f64) -> (String, String) {
            let admin = self.admin_token();
            let (status, body) = self
                .send(
                    Method::POST,
                    "/api/employees",
                    Some(&admin),
                    Some(json!({ "name": name, "hourly_rate": rate })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
            let code = body["code"].as_str().unwrap().to_string();

            let (status, login) = self
                .send(
                    Method::POST,
                    "/api/employee/login",
                    None,
                    Some(json!({ "code": code.to_lowercase() })),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(login["role"], "employee");
            (code, login["token"].as_str().unwrap().to_string())
        }
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = TestApp::new();
        let (status, _) = app.send(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_need_a_valid_token() {
        let app = TestApp::new();
        let (status, body) = app.send(Method::GET, "/api/employees", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], "authentication_error");

        let (status, _) = app
            .send(Method::GET, "/api/employees", Some("not-a-token"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_login_issues_a_working_token() {
        let app = TestApp::new();
        let bootstrap = crate::config::BootstrapAdmin {
            username: "boss".to_string(),
            password: zeroize::Zeroizing::new("correct horse".to_string()),
        };
        crate::services::auth::ensure_bootstrap_admin(&app.state, &bootstrap)
            .await
            .unwrap();

        let (status, body) = app
            .send(
                Method::POST,
                "/api/admin/login",
                None,
                Some(json!({ "username": "boss", "password": "nope-nope" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid username or password");

        let (status, body) = app
            .send(
                Method::POST,
                "/api/admin/login",
                None,
                Some(json!({ "username": "boss", "password": "correct horse" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap();

        let (status, me) = app.send(Method::GET, "/api/me", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me, json!({ "role": "admin", "username": "boss" }));
    }

    #[tokio::test]
    async fn clock_cycle_over_http() {
        let app = TestApp::new();
        let (code, token) = app.hire("Kim", 15000.0).await;

        let (status, body) = app.send(Method::POST, "/api/work/end", Some(&token), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "no_open_session");

        let (status, opened) = app.send(Method::POST, "/api/work/start", Some(&token), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(opened["end_time"].is_null());

        let (status, body) = app.send(Method::POST, "/api/work/start", Some(&token), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "duplicate_clock_in");

        let (status, today) = app.send(Method::GET, "/api/work/today", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(today["status"], "working");

        let (status, closed) = app.send(Method::POST, "/api/work/end", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(closed["id"], opened["id"]);
        assert!(closed["total_hours"].is_number());

        let (status, logs) = app
            .send(Method::GET, &format!("/api/work/logs/{}", code), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(logs["logs"].as_array().unwrap().len(), 1);
        assert_eq!(logs["summary"]["completed_sessions"], 1);
    }

    #[tokio::test]
    async fn session_correction_rejects_end_before_start() {
        let app = TestApp::new();
        let (_, token) = app.hire("Kim", 15000.0).await;
        let (status, opened) = app.send(Method::POST, "/api/work/start", Some(&token), None).await;
        assert_eq!(status, StatusCode::CREATED);
        let uri = format!("/api/work/sessions/{}", opened["id"].as_str().unwrap());

        let (status, body) = app
            .send(
                Method::PUT,
                &uri,
                Some(&app.admin_token()),
                Some(json!({
                    "start_time": "2024-01-01T10:00:00Z",
                    "end_time": "2024-01-01T09:00:00Z",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation_error");

        let (status, fixed) = app
            .send(
                Method::PUT,
                &uri,
                Some(&app.admin_token()),
                Some(json!({
                    "start_time": "2024-01-01T09:00:00Z",
                    "end_time": "2024-01-01T10:30:00Z",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fixed["total_hours"], 1.5);
    }

    #[tokio::test]
    async fn roles_are_enforced_at_the_boundary() {
        let app = TestApp::new();
        let (kim, kim_token) = app.hire("Kim", 10.0).await;
        let (lee, _) = app.hire("Lee", 10.0).await;

        let (status, body) = app
            .send(
                Method::POST,
                "/api/employees",
                Some(&kim_token),
                Some(json!({ "name": "Mallory", "hourly_rate": 99.0 })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["kind"], "authorization_error");

        let (status, _) = app
            .send(Method::GET, &format!("/api/work/logs/{}", lee), Some(&kim_token), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let admin = app.admin_token();
        let (status, _) = app.send(Method::POST, "/api/work/start", Some(&admin), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .send(Method::GET, &format!("/api/work/logs/{}", kim), Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn routine_progress_over_http() {
        let app = TestApp::new();
        let admin = app.admin_token();
        let (code, token) = app.hire("Kim", 10.0).await;
        let uri = format!("/api/routines/{}/2024-01-01", code);

        let (status, body) = app
            .send(Method::POST, &uri, Some(&admin), Some(json!({ "tasks": [] })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "empty_task_list");

        let (status, body) = app
            .send(
                Method::POST,
                &uri,
                Some(&admin),
                Some(json!({ "tasks": ["Task1", "Task2", "Task3"] })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let second = body["tasks"][1]["id"].as_str().unwrap().to_string();

        let (status, task) = app
            .send(
                Method::PUT,
                &format!("/api/tasks/{}/complete", second),
                Some(&token),
                Some(json!({ "is_completed": true })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(task["is_completed"], true);

        let (status, progress) = app
            .send(Method::GET, &format!("{}/progress", uri), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(progress, json!({ "total": 3, "completed": 1, "percentage": 33 }));
    }

    #[tokio::test]
    async fn salary_uses_stored_rate_unless_given() {
        let app = TestApp::new();
        let admin = app.admin_token();
        let (code, _) = app.hire("Kim", 15000.0).await;

        let (status, quote) = app
            .send(
                Method::POST,
                "/api/salary/calculate",
                Some(&admin),
                Some(json!({
                    "employee_code": code,
                    "start_date": "2024-01-01",
                    "end_date": "2024-01-31"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(quote["hourly_rate"], 15000.0);
        assert_eq!(quote["salary"], 0.0);

        let (status, body) = app
            .send(
                Method::POST,
                "/api/salary/calculate",
                Some(&admin),
                Some(json!({
                    "employee_code": code,
                    "start_date": "2024-02-01",
                    "end_date": "2024-01-01",
                    "hourly_rate": 20.0
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation_error");
    }
}
