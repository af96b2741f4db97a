//! Removal of quizzes created by a run.

use super::Harness;
use crate::api::QuizApi;
use crate::metrics::Op;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CleanupStats {
    pub deleted: usize,
    pub failed: usize,
}

impl<A: QuizApi> Harness<A> {
    /// Deletes each id with `token`. Successfully deleted ids leave the
    /// registry; failures are counted and left in place.
    pub async fn delete_quizzes(&self, token: &str, ids: Vec<String>) -> CleanupStats {
        let units = ids.into_iter().map(|id| {
            let h = self.clone();
            let token = token.to_string();
            async move {
                let ok = h.call(Op::DeleteQuiz, h.api.delete_quiz(&token, &id)).await.is_some();
                if ok {
                    h.quizzes.remove(&id);
                }
                ok
            }
        });

        let mut stats = CleanupStats::default();
        for ok in self.pool.run(units).await {
            if ok {
                stats.deleted += 1;
            } else {
                stats.failed += 1;
            }
        }
        tracing::info!(deleted = stats.deleted, failed = stats.failed, "cleanup finished");
        stats
    }

    /// Deletes everything this run registered.
    pub async fn cleanup_registered(&self, token: &str) -> CleanupStats {
        self.delete_quizzes(token, self.quizzes.snapshot()).await
    }

    /// Lists one page of quizzes and deletes leftovers from earlier runs.
    /// Without `all`, only quizzes with no time limit are taken; those are
    /// what aborted stress runs leave behind.
    pub async fn purge_listed(&self, token: &str, page_size: u32, all: bool) -> CleanupStats {
        let Some(rows) = self.call(Op::ListQuizzes, self.api.list_quizzes(Some(token), 1, page_size.max(1))).await
        else {
            tracing::warn!("could not list quizzes, nothing to purge");
            return CleanupStats::default();
        };
        let listed = rows.len();
        let mut targets: Vec<String> =
            rows.into_iter().filter(|q| all || q.time_limit_seconds == 0).filter_map(|q| q.id).collect();
        targets.sort();
        targets.dedup();
        tracing::info!(listed, candidates = targets.len(), all, "purging listed quizzes");
        self.delete_quizzes(token, targets).await
    }
}
