//! Minimum-latency wrapper for operations whose duration must not reveal
//! which branch they took.

use std::{future::Future, time::Duration};

use tokio::time::{sleep, Instant};

/// Runs `work` and, if it finished in under `floor`, sleeps out the rest.
pub async fn pad_to_floor<F>(floor: Duration, work: F) -> F::Output
where
    F: Future,
{
    let started = Instant::now();
    let output = work.await;
    let elapsed = started.elapsed();
    if elapsed < floor {
        sleep(floor - elapsed).await;
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fast_work_is_padded() {
        let floor = Duration::from_millis(150);
        let started = std::time::Instant::now();
        let value = pad_to_floor(floor, async { 7 }).await;

        assert_eq!(value, 7);
        assert!(started.elapsed() >= floor);
    }

    #[tokio::test]
    async fn test_slow_work_is_not_padded_further() {
        let floor = Duration::from_millis(20);
        let started = std::time::Instant::now();
        pad_to_floor(floor, sleep(Duration::from_millis(120))).await;

        assert!(started.elapsed() < Duration::from_millis(120) + floor * 10);
    }

    #[tokio::test]
    async fn test_errors_are_padded_too() {
        let floor = Duration::from_millis(100);
        let started = std::time::Instant::now();
        let result: Result<(), &str> = pad_to_floor(floor, async { Err("nope") }).await;

        assert!(result.is_err());
        assert!(started.elapsed() >= floor);
    }
}
