// src/monitor/state.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

/// Verdict of the most recent completed check together with when it ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamStatus {
    pub is_live: bool,
    /// `None` until the first check completes.
    pub last_checked: Option<DateTime<Utc>>,
}

/// What a write replaced, needed for edge detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recorded {
    pub previous: bool,
    pub had_prior_check: bool,
    pub checked_at: DateTime<Utc>,
}

/// Shared liveness verdict. Written only by the poll loop, read by anyone.
///
/// Both fields live behind one lock so a reader never sees a timestamp from
/// one tick paired with the verdict of another.
#[derive(Debug)]
pub struct LivenessState {
    status: RwLock<StreamStatus>,
}

impl LivenessState {
    pub fn new() -> Self {
        Self {
            status: RwLock::new(StreamStatus {
                is_live: false,
                last_checked: None,
            }),
        }
    }

    pub async fn snapshot(&self) -> StreamStatus {
        *self.status.read().await
    }

    pub(crate) async fn record(&self, is_live: bool) -> Recorded {
        self.record_at(is_live, Utc::now()).await
    }

    pub(crate) async fn record_at(&self, is_live: bool, checked_at: DateTime<Utc>) -> Recorded {
        let mut status = self.status.write().await;

        let recorded = Recorded {
            previous: status.is_live,
            had_prior_check: status.last_checked.is_some(),
            checked_at,
        };

        *status = StreamStatus {
            is_live,
            last_checked: Some(checked_at),
        };

        recorded
    }
}

impl Default for LivenessState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_initial_snapshot_is_offline_and_unchecked() {
        let state = LivenessState::new();

        let status = state.snapshot().await;

        assert!(!status.is_live);
        assert!(status.last_checked.is_none());
    }

    #[tokio::test]
    async fn test_record_returns_previous_verdict() {
        let state = LivenessState::new();

        let first = state.record(true).await;
        assert!(!first.previous);
        assert!(!first.had_prior_check);

        let second = state.record(false).await;
        assert!(second.previous);
        assert!(second.had_prior_check);

        let status = state.snapshot().await;
        assert!(!status.is_live);
        assert_eq!(status.last_checked, Some(second.checked_at));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_snapshot_never_torn_under_concurrent_writes() {
        let state = Arc::new(LivenessState::new());
        let epoch = Utc.timestamp_opt(0, 0).unwrap();

        // Writer encodes the verdict in the parity of the timestamp, so a
        // reader can tell whether the pair came from the same write.
        let writer = {
            let state = state.clone();
            tokio::spawn(async move {
                for i in 0..5_000i64 {
                    let at = epoch + chrono::Duration::milliseconds(i);
                    state.record_at(i % 2 == 0, at).await;
                    if i % 64 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        };

        let mut readers = Vec::new();
        for _ in 0..4 {
            let state = state.clone();
            readers.push(tokio::spawn(async move {
                for _ in 0..5_000 {
                    let status = state.snapshot().await;
                    if let Some(at) = status.last_checked {
                        let expected = (at - epoch).num_milliseconds() % 2 == 0;
                        assert_eq!(status.is_live, expected, "torn read at {}", at);
                    }
                }
            }));
        }

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
    }

    proptest! {
        #[test]
        fn prop_snapshot_matches_last_record(results in proptest::collection::vec(any::<bool>(), 1..32)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let state = LivenessState::new();
                let mut expected_previous = false;
                for (i, result) in results.iter().enumerate() {
                    let recorded = state.record(*result).await;
                    assert_eq!(recorded.previous, expected_previous);
                    assert_eq!(recorded.had_prior_check, i > 0);
                    expected_previous = *result;
                }
                let status = state.snapshot().await;
                assert_eq!(status.is_live, *results.last().unwrap());
                assert!(status.last_checked.is_some());
            });
        }
    }
}
