//! Per-actor action sequences.
//!
//! Each actor runs as one unit on the pool. Its sequence is fixed up front
//! and executed strictly in order, so an actor never has two requests in
//! flight.

use super::Harness;
use crate::api::QuizApi;
use crate::fixtures::{generate_quiz, generate_update, random_category};
use crate::metrics::Op;
use crate::model::{Actor, LeaderboardScope, QuizSpec, Role};
use crate::scoring::build_submission;
use rand::{rngs::StdRng, seq::SliceRandom, Rng};
use std::time::Duration;

/// Probability of a correct answer during stress simulation.
pub const STRESS_ACCURACY: f64 = 0.70;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    BrowseQuizzes,
    BrowseCategory,
    ViewQuiz,
    ViewProfile,
    ViewStats,
    GlobalLeaderboard,
    CategoryLeaderboard,
    QuizLeaderboard,
    TakeQuiz,
    CreateQuiz,
    ListUsers,
    UpdateQuiz,
}

impl Action {
    pub const REGULAR: [Action; 9] = [
        Action::BrowseQuizzes,
        Action::BrowseCategory,
        Action::ViewQuiz,
        Action::ViewProfile,
        Action::ViewStats,
        Action::GlobalLeaderboard,
        Action::CategoryLeaderboard,
        Action::QuizLeaderboard,
        Action::TakeQuiz,
    ];

    pub const PRIVILEGED: [Action; 3] = [Action::CreateQuiz, Action::ListUsers, Action::UpdateQuiz];

    /// Role-gated action set: elevated actors get the privileged ones too.
    pub fn available(role: Role) -> Vec<Action> {
        let mut set = Action::REGULAR.to_vec();
        if role.is_elevated() {
            set.extend(Action::PRIVILEGED);
        }
        set
    }
}

/// How an actor's sequence is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Plan {
    /// Uniform picks from the role-gated action set.
    #[default]
    Random,
    /// Fixed browsing pass: quiz lists, categories, leaderboards.
    Browse,
    /// Nothing but quiz attempts.
    Submit,
}

impl Plan {
    pub fn sequence<R: Rng>(self, rng: &mut R, role: Role, count: usize) -> Vec<Action> {
        match self {
            Plan::Random => {
                let set = Action::available(role);
                (0..count).filter_map(|_| set.choose(rng).copied()).collect()
            }
            Plan::Browse => {
                let mut seq = vec![Action::BrowseQuizzes; 5];
                seq.extend([Action::BrowseCategory; 2]);
                seq.extend((0..3).map(|_| {
                    if rng.gen_bool(0.5) { Action::GlobalLeaderboard } else { Action::CategoryLeaderboard }
                }));
                seq
            }
            Plan::Submit => vec![Action::TakeQuiz; count],
        }
    }
}

#[derive(Clone, Debug)]
pub struct Behaviour {
    pub plan: Plan,
    pub actions: usize,
    /// Pause between consecutive actions, milliseconds.
    pub think_ms: (u64, u64),
}

impl Default for Behaviour {
    fn default() -> Self {
        Self { plan: Plan::Random, actions: 20, think_ms: (50, 200) }
    }
}

impl<A: QuizApi> Harness<A> {
    /// Fetches a quiz with its questions and submits an attempt answered
    /// with the given accuracy. False if either call fails or the quiz has
    /// no questions.
    pub async fn take_quiz(&self, actor: &Actor, quiz_id: &str, accuracy: f64, rng: &mut StdRng) -> bool {
        let Some(detail) = self
            .call(Op::GetQuizWithQuestions, self.api.quiz_with_questions(&actor.token, quiz_id))
            .await
        else {
            return false;
        };
        let Some(submission) = build_submission(rng, quiz_id, &detail, accuracy) else {
            tracing::debug!(quiz = quiz_id, "quiz has no questions, nothing to submit");
            return false;
        };
        self.call(Op::SubmitResult, self.api.submit_result(&actor.token, &submission)).await.is_some()
    }

    /// Creates one quiz and registers its id. `None` on failure.
    pub async fn create_quiz(&self, token: &str, quiz: &QuizSpec) -> Option<String> {
        let id = self.call(Op::CreateQuiz, self.api.create_quiz(token, quiz)).await?;
        self.quizzes.add(id.clone());
        Some(id)
    }

    /// Each elevated actor creates `per_actor` generated quizzes.
    pub async fn create_generated_quizzes(&self, creators: &[Actor], per_actor: usize) -> usize {
        let units = creators
            .iter()
            .flat_map(|a| std::iter::repeat(a.token.clone()).take(per_actor))
            .enumerate()
            .map(|(n, token)| {
                let h = self.clone();
                async move {
                    let quiz = generate_quiz(&mut h.rng(0x51_0000 + n as u64));
                    h.create_quiz(&token, &quiz).await.is_some()
                }
            });
        self.pool.run(units).await.into_iter().filter(|ok| *ok).count()
    }

    /// Runs one action. Returns whether it succeeded; actions that need a
    /// quiz id while none exist are skipped without a request.
    pub async fn perform(&self, actor: &Actor, action: Action, rng: &mut StdRng) -> bool {
        let token = Some(actor.token.as_str());
        let page_size = self.settings.page_size;
        let top = self.settings.leaderboard_top;
        match action {
            Action::BrowseQuizzes => {
                let page = rng.gen_range(1..=3);
                self.call(Op::ListQuizzes, self.api.list_quizzes(token, page, page_size)).await.is_some()
            }
            Action::BrowseCategory => {
                let category = random_category(rng);
                self.call(Op::QuizzesByCategory, self.api.quizzes_by_category(token, category, 1, page_size))
                    .await
                    .is_some()
            }
            Action::ViewQuiz => match self.quizzes.choose(rng) {
                Some(id) => self.call(Op::GetQuiz, self.api.quiz(token, &id)).await.is_some(),
                None => false,
            },
            Action::ViewProfile => self.call(Op::CurrentUser, self.api.current_user(&actor.token)).await.is_some(),
            Action::ViewStats => match &actor.id {
                Some(id) => self.call(Op::UserStats, self.api.user_stats(&actor.token, id)).await.is_some(),
                None => false,
            },
            Action::GlobalLeaderboard => self
                .call(Op::Leaderboard, self.api.leaderboard(None, &LeaderboardScope::Global, top))
                .await
                .is_some(),
            Action::CategoryLeaderboard => {
                let scope = LeaderboardScope::Category(random_category(rng).to_string());
                self.call(Op::Leaderboard, self.api.leaderboard(None, &scope, top)).await.is_some()
            }
            Action::QuizLeaderboard => match self.quizzes.choose(rng) {
                Some(id) => {
                    let scope = LeaderboardScope::Quiz(id);
                    self.call(Op::Leaderboard, self.api.leaderboard(None, &scope, top)).await.is_some()
                }
                None => false,
            },
            Action::TakeQuiz => match self.quizzes.choose(rng) {
                Some(id) => self.take_quiz(actor, &id, STRESS_ACCURACY, rng).await,
                None => false,
            },
            Action::CreateQuiz => {
                let quiz = generate_quiz(rng);
                self.create_quiz(&actor.token, &quiz).await.is_some()
            }
            Action::ListUsers => self.call(Op::ListUsers, self.api.list_users(&actor.token)).await.is_some(),
            Action::UpdateQuiz => match self.quizzes.choose(rng) {
                Some(id) => {
                    let update = generate_update(rng);
                    self.call(Op::UpdateQuiz, self.api.update_quiz(&actor.token, &id, &update)).await.is_some()
                }
                None => false,
            },
        }
    }

    /// One actor's whole session: fresh login, then its sequence in order.
    /// Returns the number of actions that succeeded.
    pub async fn run_actor(&self, mut actor: Actor, behaviour: &Behaviour, stream: u64) -> usize {
        if !self.login(&mut actor).await {
            return 0;
        }
        let mut rng = self.rng(stream);
        let sequence = behaviour.plan.sequence(&mut rng, actor.role, behaviour.actions);
        let (lo, hi) = behaviour.think_ms;

        let mut succeeded = 0;
        for action in sequence {
            succeeded += usize::from(self.perform(&actor, action, &mut rng).await);
            if hi > 0 {
                tokio::time::sleep(Duration::from_millis(rng.gen_range(lo.min(hi)..=hi))).await;
            }
        }
        succeeded
    }

    /// Simulates every actor on the pool and waits for all of them.
    pub async fn simulate(&self, actors: &[Actor], behaviour: &Behaviour) -> usize {
        let units = actors.iter().cloned().enumerate().map(|(n, actor)| {
            let h = self.clone();
            let behaviour = behaviour.clone();
            async move { h.run_actor(actor, &behaviour, n as u64).await }
        });
        self.pool.run(units).await.into_iter().sum()
    }
}
