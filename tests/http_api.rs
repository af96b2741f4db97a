use axum::extract::{Multipart, Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use quizhub_loadgen::api::{ApiError, HttpQuizApi, QuizApi};
use quizhub_loadgen::model::{LeaderboardScope, QuestionType, QuizUpdate, Registration, Role};
use quizhub_loadgen::fixtures::builtin_templates;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Minimal gateway mock. Responses deliberately mix key casing and
/// envelope shapes the way the real services do.
fn gateway() -> Router {
    Router::new()
        .route(
            "/api/users/auth/register",
            post(|mut form: Multipart| async move {
                let mut fields = HashMap::new();
                while let Ok(Some(field)) = form.next_field().await {
                    let name = field.name().unwrap_or_default().to_string();
                    fields.insert(name, field.text().await.unwrap_or_default());
                }
                if fields.get("username").map(String::as_str) == Some("taken") {
                    return (StatusCode::CONFLICT, Json(json!({"message": "exists"})));
                }
                if !fields.contains_key("firstName") || !fields.contains_key("lastName") {
                    return (StatusCode::BAD_REQUEST, Json(json!({})));
                }
                (StatusCode::CREATED, Json(json!({"Token": "reg-token", "User": {"Id": 42, "Role": "User"}})))
            }),
        )
        .route(
            "/api/users/auth/login",
            post(|Json(body): Json<Value>| async move {
                match body["usernameOrEmail"].as_str() {
                    Some("admin@quizhub.com") => Json(json!({
                        "success": true,
                        "data": {"token": "admin-token", "user": {"id": "u-1", "role": "Admin"}}
                    })),
                    _ => Json(json!({"success": false})),
                }
            }),
        )
        .route(
            "/api/users/:id/promote",
            put(|Path(id): Path<String>, headers: HeaderMap| async move {
                if bearer(&headers).is_some() && id == "42" { StatusCode::OK } else { StatusCode::FORBIDDEN }
            }),
        )
        .route(
            "/api/quizzes",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let size = q.get("pageSize").cloned().unwrap_or_default();
                Json(json!({
                    "Items": [
                        {"Id": "q-1", "Title": "Left over", "TimeLimitSeconds": 0},
                        {"Id": 7, "Title": size, "TimeLimitSeconds": 600}
                    ]
                }))
            })
            .post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                if bearer(&headers).as_deref() != Some("admin-token") {
                    return (StatusCode::UNAUTHORIZED, Json(json!({})));
                }
                if body["questions"][0]["questionType"].as_u64().is_none() {
                    return (StatusCode::BAD_REQUEST, Json(json!({})));
                }
                (StatusCode::CREATED, Json(json!({"Id": "new-quiz"})))
            }),
        )
        .route(
            "/api/quizzes/category/:category",
            get(|Path(category): Path<String>| async move { Json(json!([{"id": "c-1", "category": category}])) }),
        )
        .route(
            "/api/quizzes/:id",
            delete(|Path(id): Path<String>| async move {
                if id == "new-quiz" { StatusCode::NO_CONTENT } else { StatusCode::NOT_FOUND }
            })
            .put(|Json(body): Json<Value>| async move {
                if body["title"].is_string() { StatusCode::OK } else { StatusCode::BAD_REQUEST }
            }),
        )
        .route(
            "/api/quizzes/:id/with-questions",
            get(|Path(id): Path<String>| async move {
                Json(json!({
                    "Id": id,
                    "Title": "Mixed",
                    "Questions": [
                        {"Id": "qa", "QuestionType": "MultipleChoice", "Answers": [
                            {"Id": "a1", "Text": "x", "IsCorrect": true},
                            {"Id": "a2", "Text": "y", "IsCorrect": true},
                            {"Id": "a3", "Text": "z", "IsCorrect": false}
                        ]},
                        {"Id": "qb", "QuestionType": 3, "Answers": [{"Text": "Paris", "IsCorrect": true}]}
                    ]
                }))
            }),
        )
        .route(
            "/api/results/leaderboard/category/:category",
            get(|Path(category): Path<String>, Query(q): Query<HashMap<String, String>>| async move {
                if category == "General Knowledge" && q.get("top").map(String::as_str) == Some("5") {
                    StatusCode::OK
                } else {
                    StatusCode::BAD_REQUEST
                }
            }),
        )
        .route("/api/results", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
}

async fn spawn_gateway() -> HttpQuizApi {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, gateway()).await.unwrap();
    });
    HttpQuizApi::new(&format!("http://{addr}/"), Duration::from_secs(5)).unwrap()
}

fn registration(username: &str) -> Registration {
    Registration {
        username: username.into(),
        email: format!("{username}@stress-test.com"),
        password: "StressTest123Pass!".into(),
        first_name: "Stress".into(),
        last_name: "Test".into(),
        role: Some(Role::User),
    }
}

#[tokio::test]
async fn register_sends_multipart_and_reads_pascal_case() {
    let api = spawn_gateway().await;
    let session = api.register(&registration("stress_user_abc")).await.unwrap();
    assert_eq!(session.token, "reg-token");
    assert_eq!(session.user_id.as_deref(), Some("42"));
    assert_eq!(session.role, Some(Role::User));
}

#[tokio::test]
async fn conflict_is_reported_with_status() {
    let api = spawn_gateway().await;
    let err = api.register(&registration("taken")).await.unwrap_err();
    assert!(err.is_conflict());
    assert!(matches!(err, ApiError::Status { status: 409, ref body } if body.contains("exists")));
}

#[tokio::test]
async fn login_unwraps_data_envelope() {
    let api = spawn_gateway().await;
    let session = api.login("admin@quizhub.com", "pw").await.unwrap();
    assert_eq!(session.token, "admin-token");
    assert_eq!(session.role, Some(Role::Admin));

    let err = api.login("nobody", "pw").await.unwrap_err();
    assert!(matches!(err, ApiError::MissingField("token")));
}

#[tokio::test]
async fn promote_sends_bearer() {
    let api = spawn_gateway().await;
    api.promote("reg-token", "42").await.unwrap();
    assert_eq!(api.promote("reg-token", "43").await.unwrap_err().status(), Some(403));
}

#[tokio::test]
async fn lists_accept_envelope_and_bare_array() {
    let api = spawn_gateway().await;
    let rows = api.list_quizzes(Some("admin-token"), 1, 5).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id.as_deref(), Some("q-1"));
    assert_eq!(rows[0].time_limit_seconds, 0);
    assert_eq!(rows[1].id.as_deref(), Some("7"));
    assert_eq!(rows[1].title, "5");

    let rows = api.quizzes_by_category(None, "Science", 1, 10).await.unwrap();
    assert_eq!(rows[0].category, "Science");
}

#[tokio::test]
async fn quiz_lifecycle() {
    let api = spawn_gateway().await;
    let quiz = builtin_templates().unwrap().remove(0);

    assert_eq!(api.create_quiz("wrong", &quiz).await.unwrap_err().status(), Some(401));
    let id = api.create_quiz("admin-token", &quiz).await.unwrap();
    assert_eq!(id, "new-quiz");

    let update = QuizUpdate { title: "Updated".into(), description: String::new(), difficulty: 2 };
    api.update_quiz("admin-token", &id, &update).await.unwrap();
    api.delete_quiz("admin-token", &id).await.unwrap();
    assert_eq!(api.delete_quiz("admin-token", "gone").await.unwrap_err().status(), Some(404));
}

#[tokio::test]
async fn quiz_detail_is_normalized() {
    let api = spawn_gateway().await;
    let detail = api.quiz_with_questions("t", "q-9").await.unwrap();
    assert_eq!(detail.id.as_deref(), Some("q-9"));
    assert_eq!(detail.questions.len(), 2);
    assert_eq!(detail.questions[0].question_type, QuestionType::Multiple);
    assert_eq!(detail.questions[0].answers.iter().filter(|a| a.is_correct).count(), 2);
    assert_eq!(detail.questions[1].question_type, QuestionType::FillIn);
    assert_eq!(detail.questions[1].answers[0].id, None);
}

#[tokio::test]
async fn leaderboard_path_and_top() {
    let api = spawn_gateway().await;
    let scope = LeaderboardScope::Category("General Knowledge".into());
    api.leaderboard(None, &scope, 5).await.unwrap();
    assert!(api.leaderboard(None, &scope, 6).await.is_err());
}

#[tokio::test]
async fn server_errors_and_unknown_routes_fail() {
    let api = spawn_gateway().await;
    let sub = quizhub_loadgen::model::Submission {
        quiz_id: "q".into(),
        score: 50.0,
        time_taken_seconds: 60,
        answers: Vec::new(),
    };
    assert_eq!(api.submit_result("t", &sub).await.unwrap_err().status(), Some(500));
    assert_eq!(api.user_stats("t", "u-1").await.unwrap_err().status(), Some(404));
}

#[tokio::test]
async fn unreachable_gateway_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpQuizApi::new(&format!("http://{addr}"), Duration::from_secs(2)).unwrap();
    let err = api.list_quizzes(None, 1, 10).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(err.status(), None);
}
