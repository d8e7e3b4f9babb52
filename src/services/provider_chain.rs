use futures_util::future::{BoxFuture, FutureExt};
use std::future::Future;

use crate::error::{AppError, Result};

/// Values that can come back "successfully empty" and should still fall through.
pub trait Emptiness {
    fn is_empty_result(&self) -> bool;
}

impl<T> Emptiness for Vec<T> {
    fn is_empty_result(&self) -> bool {
        self.is_empty()
    }
}

impl<T> Emptiness for Option<T> {
    fn is_empty_result(&self) -> bool {
        self.is_none()
    }
}

/// Ordered fallback: provider i runs only after provider i-1 failed or came
/// back empty. The first non-empty result wins.
pub struct ProviderChain<'a, T> {
    label: &'static str,
    providers: Vec<(&'static str, BoxFuture<'a, Result<T>>)>,
}

impl<'a, T: Emptiness + Send + 'a> ProviderChain<'a, T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            providers: Vec::new(),
        }
    }

    pub fn then<F>(mut self, name: &'static str, provider: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'a,
    {
        self.providers.push((name, provider.boxed()));
        self
    }

    /// Returns the winning provider's name with its value. All-empty is
    /// `NotFound`; any failure along the way makes exhaustion `UpstreamUnavailable`.
    pub async fn first_success(self) -> Result<(&'static str, T)> {
        let mut failures: Vec<String> = Vec::new();
        for (name, provider) in self.providers {
            match provider.await {
                Ok(value) if !value.is_empty_result() => return Ok((name, value)),
                Ok(_) => tracing::debug!("{}: {} returned nothing", self.label, name),
                Err(e) => {
                    tracing::debug!("{}: {} failed: {}", self.label, name, e);
                    failures.push(format!("{}: {}", name, e));
                }
            }
        }

        if failures.is_empty() {
            Err(AppError::NotFound(format!("{}: no provider had data", self.label)))
        } else {
            Err(AppError::UpstreamUnavailable(format!(
                "{}: all providers failed ({})",
                self.label,
                failures.join("; ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn stops_at_first_non_empty_result() {
        let later_calls = AtomicUsize::new(0);
        let (name, value) = ProviderChain::new("chart")
            .then("first", async { Err(AppError::UpstreamUnavailable("429".into())) })
            .then("second", async { Ok(Vec::<u32>::new()) })
            .then("third", async { Ok(vec![1, 2, 3]) })
            .then("fourth", async {
                later_calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![9])
            })
            .first_success()
            .await
            .unwrap();

        assert_eq!(name, "third");
        assert_eq!(value, vec![1, 2, 3]);
        assert_eq!(later_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn all_empty_is_not_found_and_failures_are_upstream() {
        let empty = ProviderChain::new("price")
            .then("dia", async { Ok(None::<f64>) })
            .first_success()
            .await
            .unwrap_err();
        assert!(empty.is_not_found());

        let failed = ProviderChain::new("price")
            .then("dia", async { Ok(None::<f64>) })
            .then("coingecko", async { Err(AppError::UpstreamUnavailable("down".into())) })
            .first_success()
            .await
            .unwrap_err();
        assert!(matches!(failed, AppError::UpstreamUnavailable(_)));
    }
}
