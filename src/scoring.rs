//! Simulated quiz attempts.
//!
//! Choice questions are graded server-side by answer id, so an id is
//! submitted whenever the fetched quiz exposes one (multiple choice: all
//! correct ids, comma-joined). Fill-in questions are graded by text.

use crate::model::{AnswerDetail, GivenAnswer, QuestionDetail, QuestionType, QuizDetail, Submission};
use rand::{seq::SliceRandom, Rng};

const WRONG: &str = "Wrong";

#[derive(Clone, Debug, PartialEq)]
pub struct Attempt {
    pub answers: Vec<GivenAnswer>,
    pub correct: usize,
    pub total: usize,
}

impl Attempt {
    pub fn score(&self) -> f64 {
        score_percent(self.correct, self.total)
    }
}

pub fn score_percent(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64 * 100.0
}

fn submitted_value(q: &QuestionDetail, a: &AnswerDetail) -> String {
    match (q.question_type, &a.id) {
        (QuestionType::FillIn, _) | (_, None) => a.text.clone(),
        (_, Some(id)) => id.clone(),
    }
}

fn correct_answer(q: &QuestionDetail) -> Option<String> {
    if q.question_type == QuestionType::Multiple {
        let all: Vec<String> = q
            .answers
            .iter()
            .filter(|a| a.is_correct)
            .map(|a| submitted_value(q, a))
            .collect();
        return (!all.is_empty()).then(|| all.join(","));
    }
    // fill-in may list several accepted literals; the first one is enough
    q.answers.iter().find(|a| a.is_correct).map(|a| submitted_value(q, a))
}

fn wrong_answer<R: Rng>(rng: &mut R, q: &QuestionDetail) -> String {
    let wrong: Vec<&AnswerDetail> = q.answers.iter().filter(|a| !a.is_correct).collect();
    wrong
        .choose(rng)
        .map(|a| submitted_value(q, a))
        .unwrap_or_else(|| WRONG.to_string())
}

/// Answers every question, each one correctly with probability `accuracy`.
pub fn answer_quiz<R: Rng>(rng: &mut R, quiz: &QuizDetail, accuracy: f64) -> Attempt {
    let p = if accuracy.is_nan() { 0.0 } else { accuracy.clamp(0.0, 1.0) };
    let mut correct = 0;
    let answers = quiz
        .questions
        .iter()
        .map(|q| {
            let given = match correct_answer(q) {
                Some(right) if rng.gen_bool(p) => {
                    correct += 1;
                    right
                }
                _ => wrong_answer(rng, q),
            };
            GivenAnswer { question_id: q.id.clone(), given_answer: given }
        })
        .collect();
    Attempt { answers, correct, total: quiz.questions.len() }
}

/// Draws a per-attempt accuracy: 20% poor, 50% average, 30% strong.
pub fn sample_accuracy<R: Rng>(rng: &mut R) -> f64 {
    let tier: f64 = rng.gen();
    if tier < 0.2 {
        rng.gen_range(0.30..=0.50)
    } else if tier < 0.7 {
        rng.gen_range(0.60..=0.80)
    } else {
        rng.gen_range(0.85..=1.0)
    }
}

/// Roughly a minute per question, between one and ten minutes.
pub fn time_taken<R: Rng>(rng: &mut R, questions: usize) -> u32 {
    let hi = (questions.min(10) as u32 * 60).max(60);
    rng.gen_range(60..=hi)
}

/// `None` when the quiz came back without questions; nothing is submitted then.
pub fn build_submission<R: Rng>(
    rng: &mut R,
    quiz_id: &str,
    quiz: &QuizDetail,
    accuracy: f64,
) -> Option<Submission> {
    if quiz.questions.is_empty() {
        return None;
    }
    let attempt = answer_quiz(rng, quiz, accuracy);
    Some(Submission {
        quiz_id: quiz_id.to_string(),
        score: attempt.score(),
        time_taken_seconds: time_taken(rng, attempt.total),
        answers: attempt.answers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn question(id: &str, ty: QuestionType, answers: &[(&str, bool)]) -> QuestionDetail {
        QuestionDetail {
            id: Some(id.to_string()),
            text: format!("question {id}"),
            question_type: ty,
            answers: answers
                .iter()
                .enumerate()
                .map(|(i, (text, ok))| AnswerDetail {
                    id: Some(format!("{id}-a{i}")),
                    text: text.to_string(),
                    is_correct: *ok,
                })
                .collect(),
        }
    }

    fn three_single_choice() -> QuizDetail {
        QuizDetail {
            id: Some("quiz".into()),
            title: "t".into(),
            questions: (1..=3)
                .map(|i| question(&i.to_string(), QuestionType::Single, &[("right", true), ("no", false), ("nope", false)]))
                .collect(),
        }
    }

    #[test]
    fn certain_accuracy_scores_full_marks() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = answer_quiz(&mut rng, &three_single_choice(), 1.0);
        assert_eq!(a.correct, 3);
        assert_eq!(a.score(), 100.0);
        assert_eq!(a.answers[0].given_answer, "1-a0");
    }

    #[test]
    fn zero_accuracy_scores_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = answer_quiz(&mut rng, &three_single_choice(), 0.0);
        assert_eq!(a.correct, 0);
        assert_eq!(a.score(), 0.0);
        assert!(a.answers.iter().all(|g| !g.given_answer.ends_with("a0")));
    }

    #[test]
    fn multiple_choice_joins_all_correct_ids() {
        let q = question("m", QuestionType::Multiple, &[("a", true), ("b", false), ("c", true)]);
        assert_eq!(correct_answer(&q).as_deref(), Some("m-a0,m-a2"));
    }

    #[test]
    fn fill_in_submits_text_and_falls_back_when_nothing_wrong() {
        let q = question("f", QuestionType::FillIn, &[("The Globe", true), ("Globe", true)]);
        assert_eq!(correct_answer(&q).as_deref(), Some("The Globe"));
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(wrong_answer(&mut rng, &q), WRONG);
    }

    #[test]
    fn time_taken_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        for n in [0, 1, 4, 30] {
            let t = time_taken(&mut rng, n);
            assert!((60..=600).contains(&t), "{t} for {n} questions");
        }
        assert_eq!(time_taken(&mut rng, 1), 60);
    }

    #[test]
    fn empty_quiz_is_not_submitted() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(build_submission(&mut rng, "q", &QuizDetail::default(), 1.0).is_none());
    }

    #[test]
    fn accuracy_tiers_cover_expected_range() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let a = sample_accuracy(&mut rng);
            assert!((0.30..=1.0).contains(&a));
            assert!(!(0.50 < a && a < 0.60) && !(0.80 < a && a < 0.85));
        }
    }
}
