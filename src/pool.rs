use std::{future::Future, sync::Arc};
use tokio::{sync::Semaphore, task::JoinSet};


/// Bounded fan-out: at most `limit` units run at once, the rest wait for a
/// permit. A unit that panics is logged and dropped; its siblings keep going.
#[derive(Clone, Debug)]
pub struct WorkerPool {
limit: usize,
}


impl WorkerPool {
pub fn new(limit: usize) -> Self { Self { limit: limit.max(1) } }

pub fn limit(&self) -> usize { self.limit }

/// Runs every unit to completion and returns their outputs in completion order.
pub async fn run<T, F, I>(&self, units: I) -> Vec<T>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
let permits = Arc::new(Semaphore::new(self.limit));
let mut set = JoinSet::new();
for unit in units {
let permits = permits.clone();
set.spawn(async move {
// the semaphore is never closed, so acquisition only fails on shutdown
let _permit = permits.acquire_owned().await.ok();
unit.await
});
}

let mut out = Vec::new();
while let Some(joined) = set.join_next().await {
match joined {
Ok(v) => out.push(v),
Err(e) => tracing::error!(error = %e, "work unit aborted"),
}
}
out
}
}


#[cfg(test)]
mod tests {
use super::*;

#[tokio::test]
async fn panicking_unit_does_not_take_siblings_down() {
let pool = WorkerPool::new(2);
let units = (0..5u32).map(|n| async move {
if n == 3 { panic!("unit {n} blew up"); }
n
});
let mut out = pool.run(units).await;
out.sort_unstable();
assert_eq!(out, vec![0, 1, 2, 4]);
}

#[tokio::test]
async fn zero_limit_still_makes_progress() {
let pool = WorkerPool::new(0);
assert_eq!(pool.limit(), 1);
assert_eq!(pool.run((0..3).map(|n| async move { n })).await.len(), 3);
}
}
