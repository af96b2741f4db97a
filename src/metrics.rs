//! Per-run request accounting.
//!
//! One [`Metrics`] value is owned by the harness and shared with every worker
//! through an `Arc`. All mutation happens under a single lock; recording is
//! O(1) so contention stays negligible next to network latency. Every sample
//! is mirrored into the `metrics` facade so an installed exporter sees it too.

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use serde::{Serialize, Serializer};
use std::{collections::BTreeMap, fmt, time::Duration};

/// Operations the harness issues against the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Register,
    Login,
    Promote,
    ListQuizzes,
    QuizzesByCategory,
    GetQuiz,
    GetQuizWithQuestions,
    CreateQuiz,
    UpdateQuiz,
    DeleteQuiz,
    SubmitResult,
    Leaderboard,
    CurrentUser,
    UserStats,
    ListUsers,
}

impl Op {
    /// Name under which latency samples are grouped.
    pub fn timing_key(self) -> &'static str {
        match self {
            Op::Register => "register",
            Op::Login => "login",
            Op::Promote => "promote",
            Op::ListQuizzes | Op::QuizzesByCategory => "get_quizzes",
            Op::GetQuiz | Op::GetQuizWithQuestions => "get_quiz",
            Op::CreateQuiz => "create_quiz",
            Op::UpdateQuiz => "update_quiz",
            Op::DeleteQuiz => "delete_quiz",
            Op::SubmitResult => "submit_result",
            Op::Leaderboard => "leaderboard",
            Op::CurrentUser | Op::UserStats => "profile",
            Op::ListUsers => "get_users",
        }
    }

    /// Success/failure counter category.
    pub fn counter(self) -> &'static str {
        match self {
            Op::ListQuizzes | Op::QuizzesByCategory | Op::GetQuiz | Op::GetQuizWithQuestions => {
                "quiz_fetch"
            }
            other => other.timing_key(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub success: u64,
    pub failure: u64,
}

#[derive(Default)]
struct Samples {
    tallies: BTreeMap<&'static str, Tally>,
    latencies: BTreeMap<&'static str, Vec<Duration>>,
}

#[derive(Default)]
pub struct Metrics {
    inner: Mutex<Samples>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one finished call. Failures carry a latency sample as well.
    pub fn record(&self, op: Op, ok: bool, elapsed: Duration) {
        {
            let mut s = self.inner.lock();
            let tally = s.tallies.entry(op.counter()).or_default();
            if ok {
                tally.success += 1;
            } else {
                tally.failure += 1;
            }
            s.latencies.entry(op.timing_key()).or_default().push(elapsed);
        }

        let outcome = if ok { "success" } else { "failure" };
        metrics::counter!("quizhub_requests_total", "op" => op.counter(), "outcome" => outcome).increment(1);
        metrics::histogram!("quizhub_request_duration_seconds", "op" => op.timing_key())
            .record(elapsed.as_secs_f64());
    }

    pub fn tally(&self, counter: &str) -> Tally {
        self.inner.lock().tallies.get(counter).copied().unwrap_or_default()
    }

    pub fn samples(&self, timing_key: &str) -> Vec<Duration> {
        self.inner.lock().latencies.get(timing_key).cloned().unwrap_or_default()
    }

    /// Drops everything recorded so far, so the next phase starts from zero.
    pub fn reset(&self) {
        let mut s = self.inner.lock();
        s.tallies.clear();
        s.latencies.clear();
    }

    pub fn report(&self) -> Report {
        let (tallies, latencies) = {
            let s = self.inner.lock();
            (s.tallies.clone(), s.latencies.clone())
        };
        Report::new(
            tallies.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            latencies
                .into_iter()
                .filter_map(|(k, v)| LatencyStats::from_samples(&v).map(|st| (k.to_string(), st)))
                .collect(),
        )
    }
}

fn secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// 95th percentile over ascending samples: `sorted[floor(0.95 * n)]`, or the
/// maximum when there is at most one sample.
pub fn p95(sorted: &[Duration]) -> Option<Duration> {
    match sorted.len() {
        0 => None,
        1 => sorted.last().copied(),
        n => sorted.get(n * 95 / 100).copied(),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LatencyStats {
    pub count: usize,
    #[serde(serialize_with = "secs")]
    pub avg: Duration,
    #[serde(serialize_with = "secs")]
    pub min: Duration,
    #[serde(serialize_with = "secs")]
    pub max: Duration,
    #[serde(serialize_with = "secs")]
    pub p95: Duration,
    /// Histogram-backed, 3 significant digits.
    #[serde(serialize_with = "secs")]
    pub p50: Duration,
    #[serde(serialize_with = "secs")]
    pub p99: Duration,
}

impl LatencyStats {
    pub fn from_samples(samples: &[Duration]) -> Option<Self> {
        let mut sorted = samples.to_vec();
        sorted.sort_unstable();
        let (min, max) = (*sorted.first()?, *sorted.last()?);
        let total: Duration = sorted.iter().sum();
        let avg = total / sorted.len() as u32;
        let p95 = p95(&sorted)?;

        let mut hist = Histogram::<u64>::new(3).ok()?;
        for d in &sorted {
            hist.record(d.as_micros() as u64).ok();
        }
        Some(Self {
            count: sorted.len(),
            avg,
            min,
            max,
            p95,
            p50: Duration::from_micros(hist.value_at_quantile(0.50)),
            p99: Duration::from_micros(hist.value_at_quantile(0.99)),
        })
    }
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub tallies: BTreeMap<String, Tally>,
    pub latencies: BTreeMap<String, LatencyStats>,
    pub total_success: u64,
    pub total_failure: u64,
    /// `None` when nothing was counted.
    pub success_rate: Option<f64>,
}

impl Report {
    pub fn new(tallies: BTreeMap<String, Tally>, latencies: BTreeMap<String, LatencyStats>) -> Self {
        let total_success = tallies.values().map(|t| t.success).sum();
        let total_failure = tallies.values().map(|t| t.failure).sum();
        let total = total_success + total_failure;
        let success_rate = (total > 0).then(|| total_success as f64 / total as f64);
        Self { tallies, latencies, total_success, total_failure, success_rate }
    }

    pub fn total_requests(&self) -> u64 {
        self.total_success + self.total_failure
    }

    pub fn tally(&self, counter: &str) -> Tally {
        self.tallies.get(counter).copied().unwrap_or_default()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(75);
        writeln!(f, "{rule}")?;
        writeln!(f, "{:^75}", "LOAD TEST RESULTS")?;
        writeln!(f, "{rule}")?;

        writeln!(f, "\nOperation metrics:")?;
        for (name, t) in &self.tallies {
            writeln!(f, "  {name:<15} ok {:>5}  fail {:>5}", t.success, t.failure)?;
        }

        writeln!(f, "\nResponse times:")?;
        for (name, st) in &self.latencies {
            writeln!(
                f,
                "  {name:<15}: n={:<5} avg={:6.3}s  min={:.3}s  max={:.3}s  p95={:.3}s  (p50~{:.3}s p99~{:.3}s)",
                st.count,
                st.avg.as_secs_f64(),
                st.min.as_secs_f64(),
                st.max.as_secs_f64(),
                st.p95.as_secs_f64(),
                st.p50.as_secs_f64(),
                st.p99.as_secs_f64(),
            )?;
        }

        if let Some(rate) = self.success_rate {
            writeln!(f, "\nOverall success rate: {:.2}%", rate * 100.0)?;
        }
        writeln!(f, "Total requests: {}", self.total_requests())?;
        write!(f, "{rule}")
    }
}
