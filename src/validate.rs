use crate::model::{QuestionType, QuizSpec};
use anyhow::{anyhow, bail, Context, Result};
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;


/// Checks quiz template sets before anything is sent to the quiz service.
pub struct Validator {
compiled: JSONSchema,
}


impl Validator {
pub fn new(schema: &Value) -> Result<Self> {
let compiled = JSONSchema::options().with_draft(Draft::Draft202012).compile(schema)
.map_err(|e| anyhow!("invalid template schema: {e}"))?;
Ok(Self { compiled })
}


/// Validator for the bundled template schema.
pub fn for_templates() -> Result<Self> {
let schema: Value = serde_json::from_str(include_str!("../schema/quiz_template.schema.json"))?;
Self::new(&schema)
}


pub fn validate_templates(&self, mut v: Value) -> Result<Vec<QuizSpec>> {
// stray whitespace from hand-edited files would break fill-in matching
if let Some(quizzes) = v.as_array_mut() {
for quiz in quizzes.iter_mut() {
let questions = quiz.get_mut("questions").and_then(|q| q.as_array_mut());
for question in questions.into_iter().flatten() {
for answer in question.get_mut("answers").and_then(|a| a.as_array_mut()).into_iter().flatten() {
if let Some(Value::String(text)) = answer.get_mut("text") { *text = text.trim().to_string(); }
}
}
}
}


if let Err(mut errors) = self.compiled.validate(&v) {
if let Some(first) = errors.next() {
bail!("template schema error at {}: {}", first.instance_path, first);
}
}

let quizzes: Vec<QuizSpec> = serde_json::from_value(v).context("decode quiz templates")?;
for quiz in &quizzes {
check_quiz(quiz).with_context(|| format!("template {:?}", quiz.title))?;
}
Ok(quizzes)
}
}


/// Invariants the schema cannot express.
pub fn check_quiz(quiz: &QuizSpec) -> Result<()> {
if quiz.questions.is_empty() { bail!("quiz has no questions"); }
for (n, q) in quiz.questions.iter().enumerate() {
let correct = q.answers.iter().filter(|a| a.is_correct).count();
if correct == 0 { bail!("question {} has no correct answer", n + 1); }
match q.question_type {
QuestionType::Single | QuestionType::TrueFalse if correct != 1 => {
bail!("question {} is single-answer but marks {} answers correct", n + 1, correct)
}
QuestionType::TrueFalse if q.answers.len() != 2 => bail!("question {} is true/false with {} answers", n + 1, q.answers.len()),
_ => {}
}
}
Ok(())
}
