//! The load harness: shared state handed to every work unit plus the
//! phases that drive it.
//!
//! A [`Harness`] is a bundle of `Arc`s and clones cheaply into spawned units.
//! Every remote call goes through [`Harness::call`], which is the single
//! place where outcome and latency are recorded and where failures stop.

use crate::api::{ApiError, QuizApi};
use crate::metrics::{Metrics, Op};
use crate::pool::WorkerPool;
use parking_lot::Mutex;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use std::{future::Future, sync::Arc, time::Instant};

pub mod cleanup;
pub mod provision;
pub mod seed;
pub mod simulate;

pub use cleanup::CleanupStats;
pub use simulate::{Action, Behaviour, Plan};

/// Identifiers of quizzes created during this run, visible to every actor.
#[derive(Debug, Default)]
pub struct QuizRegistry {
    ids: Mutex<Vec<String>>,
}

impl QuizRegistry {
    pub fn add(&self, id: String) {
        let mut ids = self.ids.lock();
        if !id.is_empty() && !ids.contains(&id) {
            ids.push(id);
        }
    }

    pub fn len(&self) -> usize {
        self.ids.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.ids.lock().clone()
    }

    pub fn choose<R: Rng>(&self, rng: &mut R) -> Option<String> {
        self.ids.lock().choose(rng).cloned()
    }

    pub fn remove(&self, id: &str) {
        self.ids.lock().retain(|i| i != id);
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub concurrency: usize,
    /// Fixed seed makes every actor's choices reproducible.
    pub seed: Option<u64>,
    pub page_size: u32,
    pub leaderboard_top: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self { concurrency: 15, seed: None, page_size: 10, leaderboard_top: 10 }
    }
}

pub struct Harness<A> {
    api: Arc<A>,
    metrics: Arc<Metrics>,
    quizzes: Arc<QuizRegistry>,
    pool: WorkerPool,
    settings: Settings,
}

impl<A> Clone for Harness<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            metrics: self.metrics.clone(),
            quizzes: self.quizzes.clone(),
            pool: self.pool.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl<A: QuizApi> Harness<A> {
    pub fn new(api: A, settings: Settings) -> Self {
        Self::with_metrics(api, settings, Arc::new(Metrics::new()))
    }

    pub fn with_metrics(api: A, settings: Settings, metrics: Arc<Metrics>) -> Self {
        Self {
            api: Arc::new(api),
            metrics,
            quizzes: Arc::new(QuizRegistry::default()),
            pool: WorkerPool::new(settings.concurrency),
            settings,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn quizzes(&self) -> &Arc<QuizRegistry> {
        &self.quizzes
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Independent random stream per work unit.
    pub fn rng(&self, stream: u64) -> StdRng {
        match self.settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)),
            None => StdRng::from_entropy(),
        }
    }

    /// Entropy-backed regardless of `seed`, so identities never repeat
    /// across runs against the same backend.
    pub fn identity_rng(&self) -> StdRng {
        StdRng::from_entropy()
    }

    /// Awaits one API call, records its outcome and latency, and swallows
    /// the error. Latency is recorded for failures as well.
    pub async fn call<T, F>(&self, op: Op, fut: F) -> Option<T>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        let started = Instant::now();
        let res = fut.await;
        self.metrics.record(op, res.is_ok(), started.elapsed());
        match res {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(op = op.timing_key(), status = ?e.status(), error = %e, "request failed");
                None
            }
        }
    }
}
