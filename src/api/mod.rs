//! Client-side contract of the quiz platform gateway.
//!
//! Everything the harness knows about the remote service goes through
//! [`QuizApi`]. The reqwest implementation lives in [`http`]; tests plug in
//! their own implementations.

use crate::model::{
    LeaderboardScope, QuizDetail, QuizSpec, QuizSummary, QuizUpdate, Registration, Role,
    Submission,
};

pub mod decode;
pub mod http;

pub use http::HttpQuizApi;

/// Failure of a single API call. Always recovered at the action boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, timeout and friends.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a status outside the accepted set.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// A 2xx response lacked a field the caller cannot proceed without.
    #[error("response missing `{0}`")]
    MissingField(&'static str),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::MissingField(_) => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}

/// Normalized login/registration response.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuthSession {
    pub token: String,
    pub user_id: Option<String>,
    pub role: Option<Role>,
}

#[async_trait::async_trait]
pub trait QuizApi: Send + Sync + 'static {
    async fn register(&self, form: &Registration) -> Result<AuthSession, ApiError>;

    async fn login(&self, username_or_email: &str, password: &str) -> Result<AuthSession, ApiError>;

    /// Self-promotion to the elevated role. The caller must log in again to
    /// get a token carrying the new role claim.
    async fn promote(&self, token: &str, user_id: &str) -> Result<(), ApiError>;

    async fn current_user(&self, token: &str) -> Result<(), ApiError>;

    async fn list_users(&self, token: &str) -> Result<(), ApiError>;

    async fn list_quizzes(
        &self,
        token: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<QuizSummary>, ApiError>;

    async fn quizzes_by_category(
        &self,
        token: Option<&str>,
        category: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<QuizSummary>, ApiError>;

    async fn quiz(&self, token: Option<&str>, quiz_id: &str) -> Result<(), ApiError>;

    async fn quiz_with_questions(&self, token: &str, quiz_id: &str) -> Result<QuizDetail, ApiError>;

    /// Returns the identifier assigned by the service.
    async fn create_quiz(&self, token: &str, quiz: &QuizSpec) -> Result<String, ApiError>;

    async fn update_quiz(&self, token: &str, quiz_id: &str, update: &QuizUpdate) -> Result<(), ApiError>;

    async fn delete_quiz(&self, token: &str, quiz_id: &str) -> Result<(), ApiError>;

    async fn submit_result(&self, token: &str, submission: &Submission) -> Result<(), ApiError>;

    async fn leaderboard(
        &self,
        token: Option<&str>,
        scope: &LeaderboardScope,
        top: u32,
    ) -> Result<(), ApiError>;

    async fn user_stats(&self, token: &str, user_id: &str) -> Result<(), ApiError>;
}
