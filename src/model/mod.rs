use serde::{Deserialize, Serialize};
use std::fmt;


/// Privilege tier of an actor. Only `Admin` and `Teacher` may mutate quizzes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
#[default]
User,
Teacher,
Admin,
}

impl Role {
pub fn is_elevated(self) -> bool { matches!(self, Role::Admin | Role::Teacher) }

/// Lenient parse of the role claim echoed by the user service.
pub fn parse(raw: &str) -> Role {
match raw.trim().to_ascii_lowercase().as_str() {
"admin" => Role::Admin,
"teacher" => Role::Teacher,
_ => Role::User,
}
}
}

impl fmt::Display for Role {
fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
f.write_str(match self { Role::User => "User", Role::Teacher => "Teacher", Role::Admin => "Admin" })
}
}


/// A synthetic identity driving requests. Lives for one run only.
#[derive(Clone, Debug)]
pub struct Actor {
pub username: String,
pub email: String,
pub password: String,
pub token: String,
pub id: Option<String>,
pub role: Role,
}


/// Form fields sent to the registration endpoint.
#[derive(Clone, Debug)]
pub struct Registration {
pub username: String,
pub email: String,
pub password: String,
pub first_name: String,
pub last_name: String,
pub role: Option<Role>,
}


/// Wire ordinal of a question type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum QuestionType {
#[default]
Single,
Multiple,
TrueFalse,
FillIn,
}

impl From<u8> for QuestionType {
fn from(v: u8) -> Self {
match v { 1 => QuestionType::Multiple, 2 => QuestionType::TrueFalse, 3 => QuestionType::FillIn, _ => QuestionType::Single }
}
}

impl From<QuestionType> for u8 {
fn from(t: QuestionType) -> u8 {
match t { QuestionType::Single => 0, QuestionType::Multiple => 1, QuestionType::TrueFalse => 2, QuestionType::FillIn => 3 }
}
}


#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSpec {
pub text: String,
pub is_correct: bool,
}

impl AnswerSpec {
pub fn new(text: impl Into<String>, is_correct: bool) -> Self { Self { text: text.into(), is_correct } }
}


#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSpec {
pub text: String,
#[serde(default, alias = "type")]
pub question_type: QuestionType,
pub answers: Vec<AnswerSpec>,
#[serde(default = "default_points")]
pub points: u32,
#[serde(default)]
pub is_case_sensitive: bool,
}

fn default_points() -> u32 { 1 }


/// Work item fixture: a quiz as POSTed to the quiz service. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSpec {
pub title: String,
#[serde(default)]
pub description: String,
pub category: String,
pub difficulty: u8,
pub time_limit_seconds: u32,
pub questions: Vec<QuestionSpec>,
}


/// Partial update body for `PUT /api/quizzes/{id}`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizUpdate {
pub title: String,
pub description: String,
pub difficulty: u8,
}


/// Quiz row as returned by the list endpoints.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuizSummary {
pub id: Option<String>,
pub title: String,
pub category: String,
pub time_limit_seconds: u32,
}


#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnswerDetail {
pub id: Option<String>,
pub text: String,
pub is_correct: bool,
}


#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuestionDetail {
pub id: Option<String>,
pub text: String,
pub question_type: QuestionType,
pub answers: Vec<AnswerDetail>,
}


/// Quiz fetched via `/with-questions`, already normalized.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuizDetail {
pub id: Option<String>,
pub title: String,
pub questions: Vec<QuestionDetail>,
}


#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GivenAnswer {
pub question_id: Option<String>,
pub given_answer: String,
}


/// Body for `POST /api/results`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
pub quiz_id: String,
pub score: f64,
pub time_taken_seconds: u32,
pub answers: Vec<GivenAnswer>,
}


#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeaderboardScope {
Global,
Category(String),
Quiz(String),
}

impl LeaderboardScope {
pub fn path(&self) -> String {
match self {
LeaderboardScope::Global => "global".to_string(),
LeaderboardScope::Category(c) => format!("category/{c}"),
LeaderboardScope::Quiz(id) => format!("quiz/{id}"),
}
}
}
