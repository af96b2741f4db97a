//! Response normalization at the client boundary.
//!
//! The gateway forwards bodies from several services that disagree on key
//! casing (`token` vs `Token`), on list envelopes (bare array, `{quizzes}`,
//! `{items}`) and sometimes wrap the payload in `{success, data}`. Everything
//! is folded into one canonical shape here so the harness never sees the raw
//! JSON. Malformed input decodes to an empty/default record instead of an
//! error.

use crate::api::AuthSession;
use crate::model::{AnswerDetail, QuestionDetail, QuestionType, QuizDetail, QuizSummary, Role};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Lower-cases the first character of every object key, recursively.
pub fn normalize_keys(v: Value) -> Value {
    match v {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (lower_first(&k), normalize_keys(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

fn lower_first(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parses and normalizes a body, peeling a `{data: ...}` wrapper if present.
fn parse(bytes: &[u8]) -> Option<Value> {
    let v = normalize_keys(serde_json::from_slice::<Value>(bytes).ok()?);
    match v {
        Value::Object(mut map) if matches!(map.get("data"), Some(Value::Object(_) | Value::Array(_))) => {
            map.remove("data")
        }
        other => Some(other),
    }
}

fn decode_as<T: for<'de> Deserialize<'de> + Default>(bytes: &[u8]) -> T {
    parse(bytes)
        .and_then(|v| match serde_json::from_value(v) {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::debug!(error = %e, "response body did not match expected shape");
                None
            }
        })
        .unwrap_or_default()
}

/// Identifiers are opaque: GUID strings on most services, integers on some.
fn opaque_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct AuthWire {
    token: Option<String>,
    user: Option<UserWire>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct UserWire {
    #[serde(deserialize_with = "opaque_id")]
    id: Option<String>,
    role: Option<Value>,
}

pub fn decode_auth(bytes: &[u8]) -> AuthSession {
    let wire: AuthWire = decode_as(bytes);
    let user = wire.user.unwrap_or_default();
    AuthSession {
        token: wire.token.unwrap_or_default(),
        user_id: user.id,
        role: match user.role {
            Some(Value::String(s)) => Some(Role::parse(&s)),
            _ => None,
        },
    }
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct SummaryWire {
    #[serde(deserialize_with = "opaque_id")]
    id: Option<String>,
    title: Option<String>,
    category: Option<String>,
    time_limit_seconds: Option<u32>,
}

impl From<SummaryWire> for QuizSummary {
    fn from(w: SummaryWire) -> Self {
        QuizSummary {
            id: w.id,
            title: w.title.unwrap_or_default(),
            category: w.category.unwrap_or_default(),
            time_limit_seconds: w.time_limit_seconds.unwrap_or(0),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct EnvelopeWire {
    quizzes: Option<Vec<SummaryWire>>,
    items: Option<Vec<SummaryWire>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListWire {
    Bare(Vec<SummaryWire>),
    Envelope(EnvelopeWire),
}

impl Default for ListWire {
    fn default() -> Self {
        ListWire::Bare(Vec::new())
    }
}

pub fn decode_quiz_list(bytes: &[u8]) -> Vec<QuizSummary> {
    let rows = match decode_as::<ListWire>(bytes) {
        ListWire::Bare(rows) => rows,
        ListWire::Envelope(env) => env.quizzes.or(env.items).unwrap_or_default(),
    };
    rows.into_iter().map(QuizSummary::from).collect()
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct AnswerWire {
    #[serde(deserialize_with = "opaque_id")]
    id: Option<String>,
    text: Option<String>,
    is_correct: Option<bool>,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct QuestionWire {
    #[serde(deserialize_with = "opaque_id")]
    id: Option<String>,
    text: Option<String>,
    question_type: Option<Value>,
    answers: Option<Vec<AnswerWire>>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct DetailWire {
    #[serde(deserialize_with = "opaque_id")]
    id: Option<String>,
    title: Option<String>,
    questions: Option<Vec<QuestionWire>>,
}

/// Services emit the question type either as its ordinal or its enum name.
fn question_type(raw: Option<Value>) -> QuestionType {
    match raw {
        Some(Value::Number(n)) => n.as_u64().map(|n| QuestionType::from(n as u8)).unwrap_or_default(),
        Some(Value::String(s)) => {
            let s = s.to_ascii_lowercase();
            if s.contains("multiple") {
                QuestionType::Multiple
            } else if s.contains("true") {
                QuestionType::TrueFalse
            } else if s.contains("fill") {
                QuestionType::FillIn
            } else {
                QuestionType::Single
            }
        }
        _ => QuestionType::Single,
    }
}

pub fn decode_quiz_detail(bytes: &[u8]) -> QuizDetail {
    let wire: DetailWire = decode_as(bytes);
    QuizDetail {
        id: wire.id,
        title: wire.title.unwrap_or_default(),
        questions: wire
            .questions
            .unwrap_or_default()
            .into_iter()
            .map(|q| QuestionDetail {
                id: q.id,
                text: q.text.unwrap_or_default(),
                question_type: question_type(q.question_type),
                answers: q
                    .answers
                    .unwrap_or_default()
                    .into_iter()
                    .map(|a| AnswerDetail {
                        id: a.id,
                        text: a.text.unwrap_or_default(),
                        is_correct: a.is_correct.unwrap_or(false),
                    })
                    .collect(),
            })
            .collect(),
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CreatedWire {
    #[serde(deserialize_with = "opaque_id")]
    id: Option<String>,
}

pub fn decode_created_id(bytes: &[u8]) -> Option<String> {
    decode_as::<CreatedWire>(bytes).id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_and_camel_auth_bodies_agree() {
        let camel = br#"{"token":"t1","user":{"id":"u-1","role":"Admin"}}"#;
        let pascal = br#"{"Token":"t1","User":{"Id":"u-1","Role":"Admin"}}"#;
        assert_eq!(decode_auth(camel), decode_auth(pascal));
        assert_eq!(decode_auth(camel).role, Some(Role::Admin));
    }

    #[test]
    fn malformed_body_is_absence() {
        let s = decode_auth(b"<html>bad gateway</html>");
        assert!(s.token.is_empty());
        assert!(s.user_id.is_none());
        assert!(decode_quiz_list(b"not json").is_empty());
        assert_eq!(decode_created_id(b"{}"), None);
    }

    #[test]
    fn list_envelopes() {
        let bare = br#"[{"id":"a","title":"A"}]"#;
        let quizzes = br#"{"quizzes":[{"Id":"a","Title":"A"}],"total":1}"#;
        let items = br#"{"Items":[{"id":"a","title":"A"}]}"#;
        for body in [&bare[..], &quizzes[..], &items[..]] {
            let rows = decode_quiz_list(body);
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].id.as_deref(), Some("a"));
            assert_eq!(rows[0].title, "A");
        }
    }

    #[test]
    fn numeric_ids_and_data_wrapper() {
        assert_eq!(decode_created_id(br#"{"success":true,"data":{"Id":42}}"#).as_deref(), Some("42"));
    }

    #[test]
    fn question_type_by_name_or_ordinal() {
        let body = br#"{"id":"q","questions":[
            {"id":"1","text":"a","questionType":1,"answers":[]},
            {"id":"2","text":"b","QuestionType":"FillInTheBlank","answers":[{"text":"x","isCorrect":true}]}
        ]}"#;
        let d = decode_quiz_detail(body);
        assert_eq!(d.questions[0].question_type, QuestionType::Multiple);
        assert_eq!(d.questions[1].question_type, QuestionType::FillIn);
        assert!(d.questions[1].answers[0].is_correct);
    }
}
