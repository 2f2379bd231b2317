//! Bounded concurrent calls to the generation service.
//!
//! Every branch resolves to a [`Branch`]; failures and timeouts never escape as
//! errors. Branches that overrun the deadline are dropped, which cancels the
//! outbound request they were awaiting.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::services::generation::GenerationError;

#[derive(Debug, Clone, PartialEq)]
pub enum Branch<T> {
    Ready(T),
    Unavailable { reason: String },
}

impl<T> Branch<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Branch::Ready(value) => Some(value),
            Branch::Unavailable { .. } => None,
        }
    }
}

/// Runs one upstream call, giving up once `deadline` passes.
pub async fn until<T, F>(label: &'static str, deadline: Instant, call: F) -> Branch<T>
where
    F: Future<Output = Result<T, GenerationError>>,
{
    match tokio::time::timeout_at(deadline, call).await {
        Ok(Ok(value)) => Branch::Ready(value),
        Ok(Err(err)) => {
            tracing::warn!(branch = label, error = %err, "generation branch failed");
            Branch::Unavailable { reason: err.to_string() }
        }
        Err(_) => {
            tracing::warn!(branch = label, "generation branch exceeded its deadline");
            Branch::Unavailable {
                reason: "generation service did not answer in time".to_string(),
            }
        }
    }
}

pub async fn bounded<T, F>(label: &'static str, cap: Duration, call: F) -> Branch<T>
where
    F: Future<Output = Result<T, GenerationError>>,
{
    until(label, Instant::now() + cap, call).await
}

/// Runs two independent calls concurrently under one shared deadline.
pub async fn join2<A, B, FA, FB>(
    cap: Duration,
    first: (&'static str, FA),
    second: (&'static str, FB),
) -> (Branch<A>, Branch<B>)
where
    FA: Future<Output = Result<A, GenerationError>>,
    FB: Future<Output = Result<B, GenerationError>>,
{
    let deadline = Instant::now() + cap;
    tokio::join!(
        until(first.0, deadline, first.1),
        until(second.0, deadline, second.1)
    )
}
