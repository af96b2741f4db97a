//! Static fixture data: categories, seed identities and quiz templates.
//!
//! The bundled templates live in `fixtures/quiz_templates.json` and are parsed
//! and validated once on first use.

use crate::model::{AnswerSpec, QuestionSpec, QuestionType, QuizSpec, QuizUpdate, Registration, Role};
use crate::util::{random_suffix, read_to_string};
use crate::validate::Validator;
use anyhow::Result;
use once_cell::sync::Lazy;
use rand::{seq::SliceRandom, Rng};
use std::path::Path;

pub const CATEGORIES: [&str; 10] = [
    "Science",
    "History",
    "Geography",
    "Mathematics",
    "Technology",
    "Literature",
    "Sports",
    "Music",
    "Art",
    "General Knowledge",
];

pub const STRESS_PASSWORD: &str = "StressTest123Pass!";

#[derive(Clone, Copy, Debug)]
pub struct SeedProfile {
    pub username: &'static str,
    pub email: &'static str,
    pub first_name: &'static str,
    pub last_name: &'static str,
}

const fn profile(username: &'static str, email: &'static str, first_name: &'static str, last_name: &'static str) -> SeedProfile {
    SeedProfile { username, email, first_name, last_name }
}

/// Fixed identities used by the seeding run. Re-running against the same
/// backend hits 409s for these, which is expected.
pub const SEED_USERS: &[SeedProfile] = &[
    profile("alex_tech", "alex.tech@example.com", "Alex", "Technology"),
    profile("maria_science", "maria.sci@example.com", "Maria", "Science"),
    profile("john_history", "john.hist@example.com", "John", "History"),
    profile("sarah_arts", "sarah.arts@example.com", "Sarah", "Arts"),
    profile("david_math", "david.math@example.com", "David", "Mathematics"),
    profile("emma_lit", "emma.lit@example.com", "Emma", "Literature"),
    profile("james_sports", "james.sports@example.com", "James", "Sports"),
    profile("lisa_music", "lisa.music@example.com", "Lisa", "Music"),
    profile("robert_geo", "robert.geo@example.com", "Robert", "Geography"),
    profile("jennifer_bio", "jennifer.bio@example.com", "Jennifer", "Biology"),
    profile("michael_cs", "michael.cs@example.com", "Michael", "ComputerSci"),
    profile("emily_chem", "emily.chem@example.com", "Emily", "Chemistry"),
    profile("william_phys", "william.phys@example.com", "William", "Physics"),
    profile("sophia_lang", "sophia.lang@example.com", "Sophia", "Languages"),
    profile("oliver_eng", "oliver.eng@example.com", "Oliver", "Engineering"),
];

static BUILTIN_TEMPLATES: Lazy<Result<Vec<QuizSpec>, String>> = Lazy::new(|| {
    let raw = serde_json::from_str(include_str!("../fixtures/quiz_templates.json")).map_err(|e| e.to_string())?;
    Validator::for_templates()
        .and_then(|v| v.validate_templates(raw))
        .map_err(|e| format!("{e:#}"))
});

pub fn builtin_templates() -> Result<Vec<QuizSpec>> {
    BUILTIN_TEMPLATES.clone().map_err(anyhow::Error::msg)
}

/// Templates from `path` when given, the bundled set otherwise.
pub fn load_templates(path: Option<&Path>) -> Result<Vec<QuizSpec>> {
    match path {
        Some(p) => {
            let raw = serde_json::from_str(&read_to_string(p)?)?;
            Validator::for_templates()?.validate_templates(raw)
        }
        None => builtin_templates(),
    }
}

pub fn seed_registration(p: &SeedProfile, password: &str) -> Registration {
    Registration {
        username: p.username.to_string(),
        email: p.email.to_string(),
        password: password.to_string(),
        first_name: p.first_name.to_string(),
        last_name: p.last_name.to_string(),
        role: None,
    }
}

/// Randomized identity so repeated runs do not collide.
pub fn stress_registration<R: Rng>(rng: &mut R, role: Role) -> Registration {
    let username = format!("stress_{}_{}", role.to_string().to_lowercase(), random_suffix(rng, 8));
    Registration {
        email: format!("{username}@stress-test.com"),
        username,
        password: STRESS_PASSWORD.to_string(),
        first_name: format!("Stress{role}"),
        last_name: "Test".to_string(),
        role: Some(role),
    }
}

pub fn random_category<R: Rng>(rng: &mut R) -> &'static str {
    CATEGORIES.choose(rng).copied().unwrap_or("General Knowledge")
}

/// Throwaway single-choice quiz: 3 to 7 questions, one correct answer each.
pub fn generate_quiz<R: Rng>(rng: &mut R) -> QuizSpec {
    let category = random_category(rng);
    let questions = (1..=rng.gen_range(3..=7))
        .map(|i| {
            let mut answers = vec![
                AnswerSpec::new(format!("Correct Answer {i}"), true),
                AnswerSpec::new(format!("Wrong Answer {i}-A"), false),
                AnswerSpec::new(format!("Wrong Answer {i}-B"), false),
                AnswerSpec::new(format!("Wrong Answer {i}-C"), false),
            ];
            answers.shuffle(rng);
            QuestionSpec {
                text: format!("Question {i} about {category}?"),
                question_type: QuestionType::Single,
                answers,
                points: 1,
                is_case_sensitive: false,
            }
        })
        .collect();
    QuizSpec {
        title: format!("Stress Quiz - {category} {}", random_suffix(rng, 4)),
        description: format!("Automated test quiz for {category}"),
        category: category.to_string(),
        difficulty: rng.gen_range(1..=3),
        time_limit_seconds: 600,
        questions,
    }
}

pub fn generate_update<R: Rng>(rng: &mut R) -> QuizUpdate {
    QuizUpdate {
        title: format!("Updated Quiz {}", random_suffix(rng, 4)),
        description: "Updated description".to_string(),
        difficulty: rng.gen_range(1..=3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::check_quiz;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn bundled_templates_are_valid() {
        let templates = builtin_templates().unwrap();
        assert!(!templates.is_empty());
        assert!(templates.iter().any(|t| t.questions.iter().any(|q| q.question_type == QuestionType::FillIn)));
    }

    #[test]
    fn generated_quizzes_pass_invariants() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let q = generate_quiz(&mut rng);
            check_quiz(&q).unwrap();
            assert!((3..=7).contains(&q.questions.len()));
            assert!(CATEGORIES.contains(&q.category.as_str()));
        }
    }

    #[test]
    fn stress_identities_are_randomized() {
        let mut rng = StdRng::seed_from_u64(1);
        let a = stress_registration(&mut rng, Role::User);
        let b = stress_registration(&mut rng, Role::User);
        assert_ne!(a.username, b.username);
        assert!(a.username.starts_with("stress_user_"));
        assert_eq!(a.email, format!("{}@stress-test.com", a.username));
    }
}
