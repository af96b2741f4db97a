use super::{decode, ApiError, AuthSession, QuizApi};
use crate::model::{
    LeaderboardScope, QuizDetail, QuizSpec, QuizSummary, QuizUpdate, Registration, Submission,
};
use crate::util::truncate;
use reqwest::{multipart::Form, Client, RequestBuilder, StatusCode};
use serde_json::json;
use std::{sync::Arc, time::Duration};

const OK: &[StatusCode] = &[StatusCode::OK];
const OK_OR_CREATED: &[StatusCode] = &[StatusCode::OK, StatusCode::CREATED];
const OK_OR_NO_CONTENT: &[StatusCode] = &[StatusCode::OK, StatusCode::NO_CONTENT];

/// Characters of a rejected body kept for the log line.
const BODY_PREVIEW: usize = 200;

/// reqwest-backed gateway client. Cheap to clone; every call carries the
/// configured timeout so a stalled service fails the action instead of
/// hanging the worker.
#[derive(Clone)]
pub struct HttpQuizApi {
    client: Client,
    base: Arc<str>,
}

impl HttpQuizApi {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self { client, base: Arc::from(base_url.trim_end_matches('/')) }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn authed(req: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(t) if !t.is_empty() => req.bearer_auth(t),
            _ => req,
        }
    }

    /// Sends the request and returns the body when the status is accepted.
    async fn send(&self, req: RequestBuilder, accepted: &[StatusCode]) -> Result<Vec<u8>, ApiError> {
        let res = req.send().await?;
        let status = res.status();
        let body = res.bytes().await?;
        if accepted.contains(&status) {
            Ok(body.to_vec())
        } else {
            Err(ApiError::Status {
                status: status.as_u16(),
                body: truncate(&String::from_utf8_lossy(&body), BODY_PREVIEW),
            })
        }
    }

    fn session(bytes: &[u8]) -> Result<AuthSession, ApiError> {
        let session = decode::decode_auth(bytes);
        if session.token.is_empty() {
            return Err(ApiError::MissingField("token"));
        }
        Ok(session)
    }
}

#[async_trait::async_trait]
impl QuizApi for HttpQuizApi {
    async fn register(&self, form: &Registration) -> Result<AuthSession, ApiError> {
        let mut body = Form::new()
            .text("username", form.username.clone())
            .text("email", form.email.clone())
            .text("password", form.password.clone())
            .text("firstName", form.first_name.clone())
            .text("lastName", form.last_name.clone());
        if let Some(role) = form.role {
            body = body.text("role", role.to_string());
        }
        let req = self.client.post(self.url("/api/users/auth/register")).multipart(body);
        Self::session(&self.send(req, OK_OR_CREATED).await?)
    }

    async fn login(&self, username_or_email: &str, password: &str) -> Result<AuthSession, ApiError> {
        let req = self
            .client
            .post(self.url("/api/users/auth/login"))
            .json(&json!({ "usernameOrEmail": username_or_email, "password": password }));
        Self::session(&self.send(req, OK).await?)
    }

    async fn promote(&self, token: &str, user_id: &str) -> Result<(), ApiError> {
        let req = self.client.put(self.url(&format!("/api/users/{user_id}/promote")));
        self.send(Self::authed(req, Some(token)), OK).await.map(drop)
    }

    async fn current_user(&self, token: &str) -> Result<(), ApiError> {
        let req = self.client.get(self.url("/api/users/auth/currentUser"));
        self.send(Self::authed(req, Some(token)), OK).await.map(drop)
    }

    async fn list_users(&self, token: &str) -> Result<(), ApiError> {
        let req = self.client.get(self.url("/api/users/"));
        self.send(Self::authed(req, Some(token)), OK).await.map(drop)
    }

    async fn list_quizzes(
        &self,
        token: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<QuizSummary>, ApiError> {
        let req = self
            .client
            .get(self.url("/api/quizzes"))
            .query(&[("page", page), ("pageSize", page_size)]);
        let body = self.send(Self::authed(req, token), OK).await?;
        Ok(decode::decode_quiz_list(&body))
    }

    async fn quizzes_by_category(
        &self,
        token: Option<&str>,
        category: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<QuizSummary>, ApiError> {
        let req = self
            .client
            .get(self.url(&format!("/api/quizzes/category/{category}")))
            .query(&[("page", page), ("pageSize", page_size)]);
        let body = self.send(Self::authed(req, token), OK).await?;
        Ok(decode::decode_quiz_list(&body))
    }

    async fn quiz(&self, token: Option<&str>, quiz_id: &str) -> Result<(), ApiError> {
        let req = self.client.get(self.url(&format!("/api/quizzes/{quiz_id}")));
        self.send(Self::authed(req, token), OK).await.map(drop)
    }

    async fn quiz_with_questions(&self, token: &str, quiz_id: &str) -> Result<QuizDetail, ApiError> {
        let req = self.client.get(self.url(&format!("/api/quizzes/{quiz_id}/with-questions")));
        let body = self.send(Self::authed(req, Some(token)), OK).await?;
        Ok(decode::decode_quiz_detail(&body))
    }

    async fn create_quiz(&self, token: &str, quiz: &QuizSpec) -> Result<String, ApiError> {
        let req = self.client.post(self.url("/api/quizzes")).json(quiz);
        let body = self.send(Self::authed(req, Some(token)), OK_OR_CREATED).await?;
        decode::decode_created_id(&body).ok_or(ApiError::MissingField("id"))
    }

    async fn update_quiz(&self, token: &str, quiz_id: &str, update: &QuizUpdate) -> Result<(), ApiError> {
        let req = self.client.put(self.url(&format!("/api/quizzes/{quiz_id}"))).json(update);
        self.send(Self::authed(req, Some(token)), OK).await.map(drop)
    }

    async fn delete_quiz(&self, token: &str, quiz_id: &str) -> Result<(), ApiError> {
        let req = self.client.delete(self.url(&format!("/api/quizzes/{quiz_id}")));
        self.send(Self::authed(req, Some(token)), OK_OR_NO_CONTENT).await.map(drop)
    }

    async fn submit_result(&self, token: &str, submission: &Submission) -> Result<(), ApiError> {
        let req = self.client.post(self.url("/api/results")).json(submission);
        self.send(Self::authed(req, Some(token)), OK_OR_CREATED).await.map(drop)
    }

    async fn leaderboard(
        &self,
        token: Option<&str>,
        scope: &LeaderboardScope,
        top: u32,
    ) -> Result<(), ApiError> {
        let req = self
            .client
            .get(self.url(&format!("/api/results/leaderboard/{}", scope.path())))
            .query(&[("top", top)]);
        self.send(Self::authed(req, token), OK).await.map(drop)
    }

    async fn user_stats(&self, token: &str, user_id: &str) -> Result<(), ApiError> {
        let req = self.client.get(self.url(&format!("/api/results/stats/{user_id}")));
        self.send(Self::authed(req, Some(token)), OK).await.map(drop)
    }
}
