use crate::harness::{Behaviour, Plan, Settings};
use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

#[derive(Parser, Debug, Clone)]
#[command(name = "quizhub-loadgen", version, about = "Load generation and data seeding for the QuizHub gateway")]
pub struct Config {
    #[arg(long, env = "GATEWAY_URL", default_value = "http://localhost:8888", global = true)]
    pub gateway_url: String,
    /// Hard ceiling on in-flight requests.
    #[arg(long, env = "MAX_WORKERS", default_value_t = 15, global = true)]
    pub concurrency: usize,
    #[arg(long, env, default_value_t = 30, global = true)]
    pub request_timeout_secs: u64,
    /// Fixed RNG seed for reproducible runs.
    #[arg(long, env = "LOADGEN_SEED", global = true)]
    pub seed: Option<u64>,
    /// JSON file replacing the bundled quiz templates.
    #[arg(long, env = "QUIZ_TEMPLATES", global = true)]
    pub templates: Option<PathBuf>,
    /// Serve Prometheus metrics on this address while running.
    #[arg(long, env, global = true)]
    pub prometheus_addr: Option<SocketAddr>,
    /// Print the final report as JSON after the table.
    #[arg(long, global = true)]
    pub json_report: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Register synthetic users and drive concurrent traffic.
    Stress(StressArgs),
    /// Populate the platform with template quizzes and graded attempts.
    Seed(SeedArgs),
    /// Delete leftover quizzes.
    Cleanup(CleanupArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AdminArgs {
    #[arg(long, env = "ADMIN_EMAIL", default_value = "admin@quizhub.com")]
    pub admin_email: String,
    #[arg(long, env = "ADMIN_PASSWORD", default_value = "Admin123Pass!", hide_env_values = true)]
    pub admin_password: String,
}

#[derive(Args, Debug, Clone)]
pub struct StressArgs {
    #[arg(long, env = "NUM_USERS", default_value_t = 40)]
    pub users: usize,
    /// How many of the registered users promote themselves.
    #[arg(long, env = "NUM_ADMINS", default_value_t = 10)]
    pub promote: usize,
    #[arg(long, env = "ACTIONS_PER_USER", default_value_t = 20)]
    pub actions_per_user: usize,
    #[arg(long, env = "QUIZZES_PER_ADMIN", default_value_t = 3)]
    pub quizzes_per_admin: usize,
    #[arg(long, value_enum, default_value_t = Plan::Random)]
    pub plan: Plan,
    #[arg(long, default_value_t = 50)]
    pub think_min_ms: u64,
    #[arg(long, default_value_t = 200)]
    pub think_max_ms: u64,
    /// Leave created quizzes in place.
    #[arg(long)]
    pub no_cleanup: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SeedArgs {
    #[command(flatten)]
    pub admin: AdminArgs,
    #[arg(long, default_value_t = 3)]
    pub min_attempts: usize,
    #[arg(long, default_value_t = 8)]
    pub max_attempts: usize,
    #[arg(long, env = "SEED_USER_PASSWORD", default_value = "User123Pass!", hide_env_values = true)]
    pub user_password: String,
}

#[derive(Args, Debug, Clone)]
pub struct CleanupArgs {
    #[command(flatten)]
    pub admin: AdminArgs,
    #[arg(long, default_value_t = 100)]
    pub page_size: u32,
    /// Delete every listed quiz, not only incomplete ones.
    #[arg(long)]
    pub all: bool,
}

impl Config {
    /// Rejects combinations clap cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            bail!("--concurrency must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            bail!("--request-timeout-secs must be at least 1");
        }
        match &self.command {
            Command::Stress(s) if s.think_min_ms > s.think_max_ms => {
                bail!("--think-min-ms ({}) exceeds --think-max-ms ({})", s.think_min_ms, s.think_max_ms)
            }
            Command::Seed(s) if s.min_attempts > s.max_attempts => {
                bail!("--min-attempts ({}) exceeds --max-attempts ({})", s.min_attempts, s.max_attempts)
            }
            Command::Cleanup(c) if c.page_size == 0 => bail!("--page-size must be at least 1"),
            _ => Ok(()),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn settings(&self) -> Settings {
        Settings { concurrency: self.concurrency, seed: self.seed, ..Settings::default() }
    }
}

impl StressArgs {
    pub fn behaviour(&self) -> Behaviour {
        Behaviour {
            plan: self.plan,
            actions: self.actions_per_user,
            think_ms: (self.think_min_ms, self.think_max_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("quizhub-loadgen").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn stress_defaults() {
        let cfg = parse(&["stress"]);
        assert_eq!(cfg.concurrency, 15);
        let Command::Stress(s) = &cfg.command else { panic!("expected stress") };
        assert_eq!((s.users, s.promote, s.actions_per_user, s.quizzes_per_admin), (40, 10, 20, 3));
        assert_eq!(s.plan, Plan::Random);
        cfg.validate().unwrap();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cfg = parse(&["stress", "--plan", "browse", "--concurrency", "4", "--seed", "7"]);
        assert_eq!(cfg.concurrency, 4);
        assert_eq!(cfg.settings().seed, Some(7));
        let Command::Stress(s) = &cfg.command else { panic!("expected stress") };
        assert_eq!(s.behaviour().plan, Plan::Browse);
    }

    #[test]
    fn rejects_bad_combinations() {
        assert!(parse(&["stress", "--concurrency", "0"]).validate().is_err());
        assert!(parse(&["stress", "--think-min-ms", "300", "--think-max-ms", "100"]).validate().is_err());
        assert!(parse(&["seed", "--min-attempts", "9", "--max-attempts", "2"]).validate().is_err());
        assert!(parse(&["cleanup", "--page-size", "0"]).validate().is_err());
    }
}
