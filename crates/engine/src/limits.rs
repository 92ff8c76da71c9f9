use std::sync::Arc;
use std::sync::OnceLock;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

const MAX_VALIDATION_CONCURRENCY: usize = 32;

static VALIDATION_CONCURRENCY_LIMIT: OnceLock<usize> = OnceLock::new();

fn default_validation_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
        .clamp(2, 8)
}

fn parse_validation_concurrency(raw: Option<&str>, default_value: usize) -> usize {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default_value)
        .clamp(1, MAX_VALIDATION_CONCURRENCY)
}

fn validation_concurrency_from_env() -> usize {
    let raw = std::env::var("CODESIFT_VALIDATION_CONCURRENCY").ok();
    parse_validation_concurrency(raw.as_deref(), default_validation_concurrency())
}

/// Effective validation concurrency, resolved once per process
pub fn validation_concurrency_limit() -> usize {
    *VALIDATION_CONCURRENCY_LIMIT.get_or_init(validation_concurrency_from_env)
}

fn semaphore() -> Arc<Semaphore> {
    static SEM: OnceLock<Arc<Semaphore>> = OnceLock::new();
    SEM.get_or_init(|| Arc::new(Semaphore::new(validation_concurrency_limit())))
        .clone()
}

pub(crate) struct ValidationPermit {
    #[allow(dead_code)]
    permit: OwnedSemaphorePermit,
}

pub(crate) async fn acquire_validation_permit() -> ValidationPermit {
    // The semaphore is never closed; acquire failures are not expected.
    let permit = semaphore()
        .acquire_owned()
        .await
        .unwrap_or_else(|_| unreachable!("validation concurrency semaphore closed"));
    ValidationPermit { permit }
}
