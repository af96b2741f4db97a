//! Realistic data seeding: template quizzes plus graded attempts from a
//! fixed set of users.

use super::Harness;
use crate::api::QuizApi;
use crate::model::{Actor, QuizSpec};
use crate::scoring::sample_accuracy;
use rand::{seq::SliceRandom, Rng};
use std::ops::RangeInclusive;

impl<A: QuizApi> Harness<A> {
    /// Creates every template with `token`. Returns the ids that were
    /// assigned; failed creations are counted and skipped.
    pub async fn create_from_templates(&self, token: &str, templates: &[QuizSpec]) -> Vec<String> {
        let units = templates.iter().cloned().map(|quiz| {
            let h = self.clone();
            let token = token.to_string();
            async move {
                let id = h.create_quiz(&token, &quiz).await;
                match &id {
                    Some(id) => tracing::info!(quiz = %quiz.title, id = %id, "created quiz"),
                    None => tracing::warn!(quiz = %quiz.title, "quiz creation failed"),
                }
                id
            }
        });
        self.pool.run(units).await.into_iter().flatten().collect()
    }

    /// Every user attempts a random number of distinct quizzes from
    /// `quiz_ids`, each with an accuracy drawn from the tier distribution.
    /// Returns the number of accepted submissions.
    pub async fn seed_submissions(
        &self,
        users: &[Actor],
        quiz_ids: &[String],
        attempts: RangeInclusive<usize>,
    ) -> usize {
        if quiz_ids.is_empty() {
            tracing::warn!("no quizzes available, skipping submissions");
            return 0;
        }
        let (lo, hi) = (*attempts.start(), *attempts.end());
        let units = users.iter().cloned().enumerate().map(|(n, user)| {
            let h = self.clone();
            let quiz_ids = quiz_ids.to_vec();
            async move {
                let mut rng = h.rng(0x5EED_0000 + n as u64);
                let count = rng.gen_range(lo.min(hi)..=hi).min(quiz_ids.len());
                let picked: Vec<String> = quiz_ids.choose_multiple(&mut rng, count).cloned().collect();

                let mut submitted = 0;
                for quiz_id in picked {
                    let accuracy = sample_accuracy(&mut rng);
                    if h.take_quiz(&user, &quiz_id, accuracy, &mut rng).await {
                        submitted += 1;
                    }
                }
                tracing::info!(user = %user.username, submitted, "user finished attempts");
                submitted
            }
        });
        self.pool.run(units).await.into_iter().sum()
    }
}
