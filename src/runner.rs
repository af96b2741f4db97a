//! Phase orchestration for the three run modes.

use crate::api::QuizApi;
use crate::config::{CleanupArgs, Command, SeedArgs, StressArgs};
use crate::fixtures::{seed_registration, stress_registration, SEED_USERS};
use crate::harness::{CleanupStats, Harness};
use crate::model::{Actor, QuizSpec, Role};
use anyhow::{bail, Result};
use serde::Serialize;
use std::future::Future;
use std::io;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// What a stress run accomplished, next to the metrics report.
#[derive(Clone, Debug, Default, Serialize)]
pub struct StressSummary {
    pub registered: usize,
    pub promoted: usize,
    pub quizzes_created: usize,
    pub actions_succeeded: usize,
    pub cleanup: Option<CleanupStats>,
    pub elapsed_secs: f64,
    pub requests_per_sec: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SeedSummary {
    pub quizzes_created: usize,
    pub users_registered: usize,
    pub submissions: usize,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Summary {
    Stress(StressSummary),
    Seed(SeedSummary),
    Cleanup(CleanupStats),
}

/// Runs the selected mode to completion. Errors are fatal setup failures;
/// individual request failures only show up in the metrics.
pub async fn run<A: QuizApi>(h: &Harness<A>, command: &Command, templates: &[QuizSpec]) -> Result<Summary> {
    match command {
        Command::Stress(args) => run_stress(h, args).await.map(Summary::Stress),
        Command::Seed(args) => run_seed(h, args, templates).await.map(Summary::Seed),
        Command::Cleanup(args) => run_cleanup(h, args).await.map(Summary::Cleanup),
    }
}

pub async fn run_stress<A: QuizApi>(h: &Harness<A>, args: &StressArgs) -> Result<StressSummary> {
    let started = Instant::now();
    let mut summary = StressSummary::default();

    info!(users = args.users, concurrency = h.pool().limit(), "phase 1: registering users");
    let mut rng = h.identity_rng();
    let forms = (0..args.users).map(|_| stress_registration(&mut rng, Role::User)).collect();
    let mut actors = h.register_all(forms).await;
    summary.registered = actors.len();
    if actors.is_empty() {
        bail!("no users could be registered, is the gateway up at the configured URL?");
    }
    info!(registered = actors.len(), requested = args.users, "registration finished");

    info!(count = args.promote.min(actors.len()), "phase 2: promoting users");
    summary.promoted = h.promote_first(&mut actors, args.promote).await;
    let creators: Vec<Actor> = actors.iter().filter(|a| a.role.is_elevated()).cloned().collect();
    info!(promoted = summary.promoted, elevated = creators.len(), "promotion finished");

    if creators.is_empty() {
        warn!("no elevated actors, skipping quiz creation");
    } else {
        info!(per_actor = args.quizzes_per_admin, "phase 3: creating quizzes");
        summary.quizzes_created = h.create_generated_quizzes(&creators, args.quizzes_per_admin).await;
        info!(created = summary.quizzes_created, "quiz creation finished");
    }

    let behaviour = args.behaviour();
    info!(actors = actors.len(), plan = ?behaviour.plan, actions = behaviour.actions, "phase 4: simulating");
    summary.actions_succeeded = h.simulate(&actors, &behaviour).await;

    if args.no_cleanup {
        info!(quizzes = h.quizzes().len(), "cleanup disabled, leaving quizzes in place");
    } else if let Some(admin) = creators.first() {
        info!(quizzes = h.quizzes().len(), "phase 5: cleaning up");
        summary.cleanup = Some(h.cleanup_registered(&admin.token).await);
    } else if !h.quizzes().is_empty() {
        warn!(quizzes = h.quizzes().len(), "no elevated actor left to clean up with");
    }
    warn!(users = summary.registered, "test users are not deleted, remove them from the user store if needed");

    let elapsed = started.elapsed();
    summary.elapsed_secs = elapsed.as_secs_f64();
    summary.requests_per_sec = throughput(h.metrics().report().total_requests(), elapsed);
    info!(elapsed_secs = summary.elapsed_secs, requests_per_sec = summary.requests_per_sec, "stress run finished");
    Ok(summary)
}

pub async fn run_seed<A: QuizApi>(h: &Harness<A>, args: &SeedArgs, templates: &[QuizSpec]) -> Result<SeedSummary> {
    info!(email = %args.admin.admin_email, "step 1: admin login");
    let Some(admin) = h.admin_session(&args.admin.admin_email, &args.admin.admin_password).await else {
        bail!("admin login failed for {}", args.admin.admin_email);
    };

    info!(templates = templates.len(), "step 2: creating template quizzes");
    let quiz_ids = h.create_from_templates(&admin.token, templates).await;
    info!(created = quiz_ids.len(), "quiz creation finished");

    info!(profiles = SEED_USERS.len(), "step 3: registering seed users");
    let forms = SEED_USERS.iter().map(|p| seed_registration(p, &args.user_password)).collect();
    let users = h.register_all(forms).await;
    if users.len() < SEED_USERS.len() {
        warn!(skipped = SEED_USERS.len() - users.len(), "some seed users were not registered (may already exist)");
    }

    info!(users = users.len(), "step 4: submitting quiz attempts");
    let submissions = h.seed_submissions(&users, &quiz_ids, args.min_attempts..=args.max_attempts).await;
    info!(submissions, "seeding finished");

    Ok(SeedSummary { quizzes_created: quiz_ids.len(), users_registered: users.len(), submissions })
}

pub async fn run_cleanup<A: QuizApi>(h: &Harness<A>, args: &CleanupArgs) -> Result<CleanupStats> {
    let Some(admin) = h.admin_session(&args.admin.admin_email, &args.admin.admin_password).await else {
        bail!("admin login failed for {}", args.admin.admin_email);
    };
    Ok(h.purge_listed(&admin.token, args.page_size, args.all).await)
}

/// Resolves when `signal` fires. A signal that could not be installed is
/// logged and never resolves, so the run carries on to completion.
pub async fn wait_for_interrupt<F: Future<Output = io::Result<()>>>(signal: F) {
    if let Err(e) = signal.await {
        warn!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

/// Requests per second over `elapsed`; zero for an empty window.
pub fn throughput(requests: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        requests as f64 / secs
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throughput_handles_empty_window() {
        assert_eq!(throughput(10, Duration::ZERO), 0.0);
        assert_eq!(throughput(50, Duration::from_secs(10)), 5.0);
    }

    #[tokio::test]
    async fn signal_install_failure_is_not_an_interrupt() {
        let failed = wait_for_interrupt(async { Err(io::Error::new(io::ErrorKind::Other, "no handler")) });
        assert!(tokio::time::timeout(Duration::from_millis(50), failed).await.is_err());

        let fired = wait_for_interrupt(async { Ok(()) });
        assert!(tokio::time::timeout(Duration::from_millis(50), fired).await.is_ok());
    }
}
