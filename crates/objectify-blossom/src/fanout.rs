//! Run one request against several servers and keep the first success.

use std::fmt;
use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};

/// Every target failed. Failures are listed in completion order.
#[derive(Debug)]
pub struct FanOutError<E> {
    pub failures: Vec<(String, E)>,
}

impl<E: fmt::Display> fmt::Display for FanOutError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return f.write_str("no targets to try");
        }
        write!(f, "all {} targets failed", self.failures.len())?;
        for (target, err) in &self.failures {
            write!(f, "; {}: {}", target, err)?;
        }
        Ok(())
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for FanOutError<E> {}

/// Drive all attempts concurrently. Returns the label and value of the
/// first attempt to succeed; the remaining attempts are dropped.
pub async fn first_success<T, E, F, I>(attempts: I) -> Result<(String, T), FanOutError<E>>
where
    I: IntoIterator<Item = (String, F)>,
    F: Future<Output = Result<T, E>>,
{
    let mut pending: FuturesUnordered<_> = attempts
        .into_iter()
        .map(|(label, attempt)| async move { (label, attempt.await) })
        .collect();

    let mut failures = Vec::new();
    while let Some((label, result)) = pending.next().await {
        match result {
            Ok(value) => return Ok((label, value)),
            Err(err) => {
                tracing::debug!(target_label = %label, "Attempt failed");
                failures.push((label, err));
            }
        }
    }

    Err(FanOutError { failures })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    type Attempt = std::pin::Pin<Box<dyn Future<Output = Result<u32, String>> + Send>>;

    fn attempt(delay_ms: u64, result: Result<u32, String>) -> Attempt {
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            result
        })
    }

    #[tokio::test]
    async fn first_success_wins() {
        let result = first_success(vec![
            ("a".to_string(), attempt(0, Err("down".to_string()))),
            ("b".to_string(), attempt(10, Ok(2))),
            ("c".to_string(), attempt(500, Ok(3))),
        ])
        .await
        .unwrap();

        assert_eq!(result, ("b".to_string(), 2));
    }

    #[tokio::test]
    async fn all_failures_are_aggregated() {
        let err = first_success(vec![
            ("a".to_string(), attempt(20, Err("timeout".to_string()))),
            ("b".to_string(), attempt(0, Err("refused".to_string()))),
        ])
        .await
        .unwrap_err();

        assert_eq!(
            err.failures,
            vec![
                ("b".to_string(), "refused".to_string()),
                ("a".to_string(), "timeout".to_string()),
            ]
        );
        assert_eq!(
            err.to_string(),
            "all 2 targets failed; b: refused; a: timeout"
        );
    }

    #[tokio::test]
    async fn no_targets() {
        let err = first_success(Vec::<(String, Attempt)>::new()).await.unwrap_err();
        assert!(err.failures.is_empty());
        assert_eq!(err.to_string(), "no targets to try");
    }
}
