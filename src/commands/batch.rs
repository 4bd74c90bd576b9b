use crate::commands::scoring::ScoringEngine;
use crate::models::metrics::TechMetrics;
use crate::models::snapshot::Snapshot;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const DEFAULT_CONCURRENCY: usize = 8;

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub tech_id: String,
    pub result: Result<Snapshot, String>,
}

impl BatchOutcome {
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.result.as_ref().ok()
    }
}

/// Score every tech with at most `max_concurrency` running at once.
/// Outcomes come back in input order; one failing tech never takes the
/// rest of the batch down with it.
pub async fn score_batch(
    engine: Arc<ScoringEngine>,
    techs: Vec<TechMetrics>,
    max_concurrency: usize,
) -> Vec<BatchOutcome> {
    score_batch_with(techs, max_concurrency, move |tech| engine.score(tech)).await
}

pub async fn score_batch_with<F>(
    techs: Vec<TechMetrics>,
    max_concurrency: usize,
    score: F,
) -> Vec<BatchOutcome>
where
    F: Fn(&TechMetrics) -> Snapshot + Send + Sync + 'static,
{
    let total = techs.len();
    let score = Arc::new(score);
    let permits = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let tech_ids: Vec<String> = techs.iter().map(|t| t.tech_id.clone()).collect();

    for (index, tech) in techs.into_iter().enumerate() {
        let score = score.clone();
        let permits = permits.clone();
        tasks.spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return (index, Err("batch was shut down".to_string())),
            };
            let result = catch_unwind(AssertUnwindSafe(|| (*score)(&tech)))
                .map_err(|panic| format!("scoring panicked: {}", panic_message(panic.as_ref())));
            (index, result)
        });
    }

    let mut slots: Vec<Option<Result<Snapshot, String>>> = vec![None; total];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(e) => log::error!("Scoring task failed to join: {e}"),
        }
    }

    tech_ids
        .into_iter()
        .zip(slots)
        .map(|(tech_id, slot)| {
            let result = slot.unwrap_or_else(|| Err("scoring task did not finish".to_string()));
            if let Err(reason) = &result {
                log::warn!("{tech_id}: {reason}");
            }
            BatchOutcome { tech_id, result }
        })
        .collect()
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
