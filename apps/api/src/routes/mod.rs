pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::assessment::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/languages", get(handlers::handle_list_languages))
        // Session lifecycle
        .route(
            "/api/v1/sessions/:session_id/start",
            post(handlers::handle_start_session),
        )
        .route(
            "/api/v1/sessions/:session_id",
            get(handlers::handle_get_session),
        )
        .route(
            "/api/v1/sessions/:session_id/finalize",
            post(handlers::handle_finalize),
        )
        // Per-question actions
        .route(
            "/api/v1/sessions/:session_id/questions/:index/select",
            post(handlers::handle_select_question),
        )
        .route(
            "/api/v1/sessions/:session_id/questions/:index/run",
            post(handlers::handle_run),
        )
        .route(
            "/api/v1/sessions/:session_id/questions/:index/submit",
            post(handlers::handle_submit),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::assessment::controller::SessionDeps;
    use crate::assessment::generator::QuestionGenerator;
    use crate::assessment::models::{Difficulty, Topic};
    use crate::assessment::registry::SessionRegistry;
    use crate::assessment::testing::{
        RecordingScoreSink, ScriptedCompletion, ScriptedEvaluator, StaticTopics,
    };
    use crate::config::Config;

    fn test_config() -> Config {
        Config {
            groq_api_key: "test-key".to_string(),
            backend_api_url: "http://backend.test/api".to_string(),
            session_time_limit_secs: 1800,
            runs_per_question: 2,
            session_retention_secs: 3600,
            port: 0,
            rust_log: "info".to_string(),
        }
    }

    fn test_state(evaluator: ScriptedEvaluator, scores: Arc<RecordingScoreSink>) -> AppState {
        let topics = vec![
            Topic {
                id: 7,
                topic: "arrays".to_string(),
                difficulty: Difficulty::Easy,
            },
            Topic {
                id: 8,
                topic: "graphs".to_string(),
                difficulty: Difficulty::Hard,
            },
        ];
        AppState {
            config: test_config(),
            sessions: SessionRegistry::default(),
            deps: SessionDeps {
                topics: Arc::new(StaticTopics::new(topics)),
                generator: QuestionGenerator::new(Arc::new(ScriptedCompletion::failing())),
                evaluator: Arc::new(evaluator),
                scores,
            },
        }
    }

    const OWNER: &str = "Bearer t0ken";

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, OWNER)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn anonymous_post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_as(uri: &str, authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn start_request(session_id: &str) -> Request<Body> {
        post_as(&format!("/api/v1/sessions/{session_id}/start"), Some(OWNER))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_health_reports_service_name() {
        let app = build_router(test_state(
            ScriptedEvaluator::new(vec![], vec![]),
            Arc::new(RecordingScoreSink::default()),
        ));
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "session-api");
    }

    #[tokio::test]
    async fn test_languages_include_templates() {
        let app = build_router(test_state(
            ScriptedEvaluator::new(vec![], vec![]),
            Arc::new(RecordingScoreSink::default()),
        ));
        let request = Request::builder()
            .uri("/api/v1/languages")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        let languages = body.as_array().unwrap();
        assert_eq!(languages.len(), 3);
        assert_eq!(languages[1]["language"], "C++");
        assert!(languages[0]["template"].as_str().unwrap().contains("def solution"));
    }

    #[tokio::test]
    async fn test_start_without_token_is_unauthorized() {
        let app = build_router(test_state(
            ScriptedEvaluator::new(vec![], vec![]),
            Arc::new(RecordingScoreSink::default()),
        ));
        let (status, body) = send(&app, post_as("/api/v1/sessions/abc/start", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let app = build_router(test_state(
            ScriptedEvaluator::new(vec![], vec![]),
            Arc::new(RecordingScoreSink::default()),
        ));
        let request = Request::builder()
            .uri("/api/v1/sessions/missing")
            .header(header::AUTHORIZATION, OWNER)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let app = build_router(test_state(
            ScriptedEvaluator::new(vec![], vec![]),
            Arc::new(RecordingScoreSink::default()),
        ));
        let (status, first) = send(&app, start_request("s-1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["status"], "active");
        assert_eq!(first["questions"].as_array().unwrap().len(), 2);
        assert_eq!(first["clock"], "30:00");

        let (status, second) = send(&app, start_request("s-1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["questions"], first["questions"]);
    }

    #[tokio::test]
    async fn test_run_submit_and_finalize_flow() {
        let scores = Arc::new(RecordingScoreSink::default());
        let evaluator = ScriptedEvaluator::new(
            vec![Ok("[0, 1]".to_string())],
            vec![
                Ok("PASS".to_string()),
                Ok("FAIL: wrong".to_string()),
                Ok("PASS".to_string()),
            ],
        );
        let app = build_router(test_state(evaluator, scores.clone()));
        send(&app, start_request("s-2")).await;

        let (status, selected) = send(
            &app,
            post_json(
                "/api/v1/sessions/s-2/questions/0/select",
                json!({ "language": "Java" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(selected["code"].as_str().unwrap().contains("class Solution"));

        let (status, run) = send(
            &app,
            post_json(
                "/api/v1/sessions/s-2/questions/0/run",
                json!({ "language": "Python", "code": "print(1)" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(run["is_output"], true);
        assert_eq!(run["message"], "[0, 1]");

        let (status, submission) = send(
            &app,
            post_json(
                "/api/v1/sessions/s-2/questions/0/submit",
                json!({ "language": "Python", "code": "print(1)" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(submission["score"], 6);
        assert_eq!(submission["passed_count"], 2);
        assert_eq!(scores.saved().len(), 1);

        let (status, again) = send(
            &app,
            post_json(
                "/api/v1/sessions/s-2/questions/0/submit",
                json!({ "language": "Python", "code": "print(2)" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(again["error"]["code"], "CONFLICT");

        let finalize = || post_as("/api/v1/sessions/s-2/finalize", Some(OWNER));
        let (status, summary) = send(&app, finalize()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["total_score"], 6);
        assert_eq!(summary["max_score"], 20);
        assert_eq!(summary["attempted"], 1);

        let (_, repeat) = send(&app, finalize()).await;
        assert_eq!(repeat, summary);
    }

    #[tokio::test]
    async fn test_blank_code_is_rejected() {
        let app = build_router(test_state(
            ScriptedEvaluator::new(vec![], vec![]),
            Arc::new(RecordingScoreSink::default()),
        ));
        send(&app, start_request("s-3")).await;
        let (status, body) = send(
            &app,
            post_json(
                "/api/v1/sessions/s-3/questions/0/run",
                json!({ "language": "Python", "code": "   " }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_session_routes_reject_anonymous_callers() {
        let scores = Arc::new(RecordingScoreSink::default());
        let evaluator = ScriptedEvaluator::new(
            vec![Ok("1".to_string())],
            vec![Ok("PASS".to_string()); 3],
        );
        let app = build_router(test_state(evaluator, scores.clone()));
        send(&app, start_request("s-4")).await;

        let (status, _) = send(
            &app,
            anonymous_post_json(
                "/api/v1/sessions/s-4/questions/0/run",
                json!({ "language": "Python", "code": "print(1)" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            anonymous_post_json(
                "/api/v1/sessions/s-4/questions/0/submit",
                json!({ "language": "Python", "code": "print(1)" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(scores.attempts(), 0);

        let (status, body) = send(&app, post_as("/api/v1/sessions/s-4/finalize", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let request = Request::builder()
            .uri("/api/v1/sessions/s-4")
            .header(header::AUTHORIZATION, OWNER)
            .body(Body::empty())
            .unwrap();
        let (_, snapshot) = send(&app, request).await;
        assert_eq!(snapshot["status"], "active");
        assert_eq!(snapshot["questions"][0]["runs_remaining"], 2);
    }

    #[tokio::test]
    async fn test_session_routes_reject_foreign_token() {
        let app = build_router(test_state(
            ScriptedEvaluator::new(vec![], vec![]),
            Arc::new(RecordingScoreSink::default()),
        ));
        send(&app, start_request("s-5")).await;

        let (status, body) = send(
            &app,
            post_as("/api/v1/sessions/s-5/finalize", Some("Bearer intruder")),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");

        let (status, _) = send(
            &app,
            post_as("/api/v1/sessions/s-5/start", Some("Bearer intruder")),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, snapshot) = send(&app, start_request("s-5")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot["status"], "active");
    }
}
