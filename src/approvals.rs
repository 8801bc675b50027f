use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, warn};

use crate::types::{Forge, PullRequestRef, Review};

/// Dismissal message used when none is configured.
pub const DEFAULT_REASON: &str = "This PR's diff has changed since it was approved";

/// Keeps the approving reviews, preserving upstream order.
pub fn approved_reviews(reviews: Vec<Review>) -> Vec<Review> {
    reviews.into_iter().filter(Review::is_approved).collect()
}

/// Fetches the reviews of `pr` and returns the approving ones.
///
/// Errors from the forge propagate unchanged so callers can inspect the
/// original message.
pub async fn list_approvals<F>(forge: &F, pr: &PullRequestRef) -> Result<Vec<Review>>
where
    F: Forge + Sync,
{
    let reviews = forge.list_reviews(pr).await?;
    let total = reviews.len();
    let approvals = approved_reviews(reviews);

    debug!(
        pr = %pr,
        total,
        approved = approvals.len(),
        "Fetched pull request reviews"
    );

    Ok(approvals)
}

/// Dismisses every review in `approval_ids` with the same `reason`.
///
/// All requests are in flight together and each one runs to completion
/// even when another fails. The result is the first failure to arrive, so
/// on error some reviews may already be dismissed.
pub async fn dismiss_all<F>(
    forge: &F,
    pr: &PullRequestRef,
    approval_ids: &[u64],
    reason: &str,
) -> Result<()>
where
    F: Forge + Sync,
{
    if approval_ids.is_empty() {
        debug!(pr = %pr, "No approvals to dismiss");
        return Ok(());
    }

    let mut in_flight: FuturesUnordered<_> = approval_ids
        .iter()
        .map(|&review_id| async move {
            let result = forge.dismiss_review(pr, review_id, reason).await;
            (review_id, result)
        })
        .collect();

    let mut first_error = None;

    while let Some((review_id, result)) = in_flight.next().await {
        match result {
            Ok(()) => info!(pr = %pr, review_id, "Dismissed approval"),
            Err(e) => {
                warn!(pr = %pr, review_id, error = %e, "Failed to dismiss approval");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;

    use super::*;
    use crate::types::{Repo, ReviewState};

    #[derive(Default)]
    struct CountingForge {
        fail_on: Option<u64>,
        started: AtomicUsize,
        started_at_completion: Mutex<Vec<usize>>,
        dismissed: Mutex<Vec<(u64, String)>>,
    }

    #[async_trait]
    impl Forge for CountingForge {
        async fn list_reviews(&self, _pr: &PullRequestRef) -> Result<Vec<Review>> {
            Ok(Vec::new())
        }

        async fn dismiss_review(
            &self,
            _pr: &PullRequestRef,
            review_id: u64,
            message: &str,
        ) -> Result<()> {
            self.started.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.started_at_completion
                .lock()
                .unwrap()
                .push(self.started.load(Ordering::SeqCst));
            self.dismissed
                .lock()
                .unwrap()
                .push((review_id, message.to_string()));

            if self.fail_on == Some(review_id) {
                anyhow::bail!("Validation Failed: review {}", review_id);
            }
            Ok(())
        }
    }

    fn pr() -> PullRequestRef {
        PullRequestRef::new(Repo::new("octo", "widgets").unwrap(), 42)
    }

    #[test]
    fn test_approved_reviews_keeps_order() {
        let reviews = vec![
            Review::new(10, ReviewState::Approved),
            Review::new(11, ReviewState::Commented),
            Review::new(12, ReviewState::Approved),
            Review::new(13, ReviewState::Dismissed),
        ];

        let ids: Vec<u64> = approved_reviews(reviews).iter().map(|r| r.id).collect();

        assert_eq!(ids, vec![10, 12]);
    }

    #[test]
    fn test_approved_reviews_ignores_other_states() {
        let reviews = vec![
            Review::new(1, ReviewState::ChangesRequested),
            Review::new(2, ReviewState::Pending),
            Review::new(3, ReviewState::Unknown),
        ];

        assert!(approved_reviews(reviews).is_empty());
    }

    #[tokio::test]
    async fn test_dismiss_all_empty_makes_no_calls() {
        let forge = CountingForge::default();

        dismiss_all(&forge, &pr(), &[], DEFAULT_REASON).await.unwrap();

        assert_eq!(forge.started.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dismiss_all_starts_every_request_before_any_finishes() {
        let forge = CountingForge::default();

        dismiss_all(&forge, &pr(), &[1, 2, 3], "stale").await.unwrap();

        let seen = forge.started_at_completion.lock().unwrap();
        assert_eq!(seen.first(), Some(&3));
    }

    #[tokio::test]
    async fn test_dismiss_all_failure_does_not_abort_others() {
        let forge = CountingForge {
            fail_on: Some(2),
            ..Default::default()
        };

        let err = dismiss_all(&forge, &pr(), &[1, 2, 3], "stale")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Validation Failed: review 2");
        let mut ids: Vec<u64> = forge
            .dismissed
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
