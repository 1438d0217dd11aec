use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use backend::QuizBackend;
use quiz_core::counter::{AnimatedCount, RequestSequence};
use quiz_core::model::SelectionCriteria;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::CountError;

/// Default animation step interval.
pub const DEFAULT_TICK: Duration = Duration::from_millis(30);

/// What observers of the live counter see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountDisplay {
    /// Animated value, one step away from the previous one.
    pub display: u32,
    /// Resolved count the display is walking toward.
    pub target: u32,
    /// A count request for the latest criteria is still in flight.
    pub loading: bool,
}

#[derive(Debug, Default)]
struct EstimatorState {
    sequence: RequestSequence,
    criteria: Option<SelectionCriteria>,
    last_known: Option<u32>,
    animation: AnimatedCount,
    ticker_running: bool,
}

impl EstimatorState {
    fn snapshot(&self, loading: bool) -> CountDisplay {
        CountDisplay {
            display: self.animation.display(),
            target: self.animation.target(),
            loading,
        }
    }
}

/// Keeps a "matching questions" count in sync with the selection criteria.
///
/// Requests resolve latest-wins: a slower, older response never overwrites a
/// newer one. The displayed value steps by one per tick toward the resolved
/// count on a background task, published through a `watch` channel.
#[derive(Clone)]
pub struct CountEstimator {
    backend: Arc<dyn QuizBackend>,
    tick: Duration,
    state: Arc<Mutex<EstimatorState>>,
    display_tx: Arc<watch::Sender<CountDisplay>>,
}

impl CountEstimator {
    #[must_use]
    pub fn new(backend: Arc<dyn QuizBackend>) -> Self {
        let (display_tx, _) = watch::channel(CountDisplay::default());
        Self {
            backend,
            tick: DEFAULT_TICK,
            state: Arc::new(Mutex::new(EstimatorState::default())),
            display_tx: Arc::new(display_tx),
        }
    }

    #[must_use]
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    fn lock(&self) -> MutexGuard<'_, EstimatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CountDisplay> {
        self.display_tx.subscribe()
    }

    #[must_use]
    pub fn display(&self) -> CountDisplay {
        *self.display_tx.borrow()
    }

    /// Count applied for the latest criteria, or `None` while it is still loading.
    #[must_use]
    pub fn last_known_count(&self) -> Option<u32> {
        self.lock().last_known
    }

    /// A session may only be started once the latest count resolved above zero.
    #[must_use]
    pub fn can_start(&self) -> bool {
        self.last_known_count().is_some_and(|count| count > 0)
    }

    /// React to a criteria snapshot, fetching only when it differs from the last one.
    ///
    /// Returns the count this call applied, or `None` if it was superseded.
    pub async fn observe(&self, criteria: &SelectionCriteria) -> Option<u32> {
        {
            let state = self.lock();
            if state.criteria.as_ref() == Some(criteria) && !self.display().loading {
                return state.last_known;
            }
        }
        self.update(criteria).await
    }

    /// Resolve the count for `criteria` and retarget the animation.
    ///
    /// Returns the applied count, or `None` when a newer request was issued
    /// while this one was in flight (its result is discarded).
    pub async fn update(&self, criteria: &SelectionCriteria) -> Option<u32> {
        let tag = {
            let mut state = self.lock();
            let tag = state.sequence.issue();
            state.criteria = Some(criteria.clone());
            // The previous count belongs to older criteria.
            state.last_known = None;
            self.display_tx.send_replace(state.snapshot(true));
            tag
        };

        let count = match self.fetch(criteria).await {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!(error = %err, "count request failed; showing 0");
                0
            }
        };

        let mut state = self.lock();
        if !state.sequence.is_latest(tag) {
            tracing::debug!(tag = tag.value(), count, "discarding superseded count");
            return None;
        }

        state.last_known = Some(count);
        state.animation.retarget(count);
        self.display_tx.send_replace(state.snapshot(false));
        if !state.animation.is_settled() && !state.ticker_running {
            state.ticker_running = true;
            self.spawn_ticker();
        }
        Some(count)
    }

    async fn fetch(&self, criteria: &SelectionCriteria) -> Result<u32, CountError> {
        if !criteria.has_pool() {
            return Ok(0);
        }
        Ok(self.backend.count(criteria).await?)
    }

    fn spawn_ticker(&self) {
        let state = Arc::clone(&self.state);
        let display_tx = Arc::clone(&self.display_tx);
        let tick = self.tick;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + tick, tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                state.animation.step();
                let loading = display_tx.borrow().loading;
                display_tx.send_replace(state.snapshot(loading));
                if state.animation.is_settled() {
                    state.ticker_running = false;
                    break;
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use backend::BackendError;
    use quiz_core::model::{
        AnswerSubmission, Question, QuestionId, QuestionSetId, SubmissionResult,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedCount {
        count: u32,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QuizBackend for FixedCount {
        async fn count(&self, _criteria: &SelectionCriteria) -> Result<u32, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.count)
        }

        async fn start(&self, _: &SelectionCriteria) -> Result<Vec<Question>, BackendError> {
            Err(BackendError::Unsupported("start"))
        }

        async fn submit(&self, _: &AnswerSubmission) -> Result<SubmissionResult, BackendError> {
            Err(BackendError::Unsupported("submit"))
        }

        async fn add_bookmark(&self, _: QuestionId) -> Result<(), BackendError> {
            Ok(())
        }

        async fn remove_bookmark(&self, _: QuestionId) -> Result<(), BackendError> {
            Ok(())
        }

        async fn list_bookmarks(&self) -> Result<Vec<QuestionId>, BackendError> {
            Ok(Vec::new())
        }
    }

    fn estimator(count: u32) -> (CountEstimator, Arc<FixedCount>) {
        let backend = Arc::new(FixedCount {
            count,
            calls: AtomicUsize::new(0),
        });
        (CountEstimator::new(backend.clone()), backend)
    }

    #[tokio::test]
    async fn empty_selection_is_zero_without_backend_call() {
        let (estimator, backend) = estimator(9);
        let count = estimator.update(&SelectionCriteria::new()).await;
        assert_eq!(count, Some(0));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert!(!estimator.can_start());
    }

    #[tokio::test]
    async fn unchanged_criteria_are_not_refetched() {
        let (estimator, backend) = estimator(4);
        let criteria = SelectionCriteria::new().with_set(QuestionSetId::new(1));

        assert_eq!(estimator.observe(&criteria).await, Some(4));
        assert_eq!(estimator.observe(&criteria).await, Some(4));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

        let changed = criteria.clone().with_bookmarked_only(true);
        estimator.observe(&changed).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn display_walks_to_target() {
        let (estimator, _) = estimator(3);
        let mut rx = estimator.subscribe();
        estimator
            .update(&SelectionCriteria::new().with_set(QuestionSetId::new(1)))
            .await;
        assert!(estimator.can_start());

        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            let value = *rx.borrow_and_update();
            if !value.loading {
                seen.push(value.display);
            }
            if value.display == 3 {
                break;
            }
        }
        assert_eq!(seen.last(), Some(&3));
        assert!(seen.windows(2).all(|w| w[1] <= w[0] + 1));
    }
}
