use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use tracing::warn;

use super::{settle, settle_later, within};
use crate::error::{Outcome, PropertyError};
use crate::property::{AsyncProperty, Pending, Property, RawProperty};
use crate::random::Random;
use crate::stream::Stream;
use crate::value::Value;

/// Fails asynchronous runs that do not settle within the limit.
///
/// Only the reported outcome is cut short: the timed-out work is handed
/// back by [`AsyncProperty::run_with_pending`], and `run` waits for it.
/// Synchronous runs cannot be preempted and go through untouched.
pub struct TimeoutProperty<P> {
    inner: P,
    limit: Option<Duration>,
}

impl<P> TimeoutProperty<P> {
    pub fn new(inner: P, limit: Option<Duration>) -> Self {
        Self { inner, limit }
    }
}

impl<T, P: RawProperty<T>> RawProperty<T> for TimeoutProperty<P> {
    fn generate(&self, rng: &mut Random, run_id: Option<u32>) -> Value<T> {
        self.inner.generate(rng, run_id)
    }

    fn shrink(&self, value: &Value<T>) -> Stream<'_, Value<T>> {
        self.inner.shrink(value)
    }
}

impl<T, P: Property<T>> Property<T> for TimeoutProperty<P> {
    fn run(&self, input: Rc<T>, skip_hooks: bool) -> Outcome {
        self.inner.run(input, skip_hooks)
    }

    fn run_before_each(&self) {
        self.inner.run_before_each()
    }

    fn run_after_each(&self) {
        self.inner.run_after_each()
    }
}

impl<T: 'static, P: AsyncProperty<T>> AsyncProperty<T> for TimeoutProperty<P> {
    async fn run(&self, input: Rc<T>, skip_hooks: bool) -> Outcome {
        settle(self.run_with_pending(input, skip_hooks)).await
    }

    async fn run_with_pending(&self, input: Rc<T>, skip_hooks: bool) -> (Outcome, Option<Pending<'_>>) {
        let run = self.inner.run_with_pending(input, skip_hooks);
        let Some(limit) = self.limit else {
            return run.await;
        };
        match within(run, limit).await {
            Ok(settled) => settled,
            Err(unfinished) => {
                warn!(limit_ms = limit.as_millis() as u64, "property run timed out");
                (
                    Outcome::failure(PropertyError::Timeout { limit }),
                    Some(settle_later(unfinished)),
                )
            }
        }
    }

    fn run_before_each(&self) -> impl Future<Output = ()> {
        self.inner.run_before_each()
    }

    fn run_after_each(&self) -> impl Future<Output = ()> {
        self.inner.run_after_each()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::async_property;
    use crate::test_support::Naturals;
    use futures_timer::Delay;
    use std::cell::Cell;

    fn sleepy() -> impl AsyncProperty<u64> {
        async_property(Naturals::up_to(1000), |delay_ms: Rc<u64>| async move {
            Delay::new(Duration::from_millis(*delay_ms)).await;
            true
        })
    }

    #[tokio::test]
    async fn test_slow_runs_fail_with_timeout() {
        let prop = TimeoutProperty::new(sleepy(), Some(Duration::from_millis(20)));

        match AsyncProperty::run(&prop, Rc::new(100), false).await {
            Outcome::Failure(failure) => {
                assert!(matches!(failure.error, PropertyError::Timeout { .. }));
                assert_eq!(
                    failure.message,
                    "Property timeout: exceeded limit of 20 milliseconds"
                );
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timed_out_work_is_handed_back() {
        let finished = Rc::new(Cell::new(0));
        let counter = Rc::clone(&finished);
        let prop = TimeoutProperty::new(
            async_property(Naturals::up_to(10), move |_: Rc<u64>| {
                let counter = Rc::clone(&counter);
                async move {
                    Delay::new(Duration::from_millis(40)).await;
                    counter.set(counter.get() + 1);
                    true
                }
            }),
            Some(Duration::from_millis(5)),
        );

        let (outcome, pending) = prop.run_with_pending(Rc::new(1), false).await;
        assert!(outcome.is_failure());
        assert_eq!(finished.get(), 0);
        pending.expect("timed-out work").await;
        assert_eq!(finished.get(), 1);

        // plain runs report the timeout only once the work is done
        assert!(AsyncProperty::run(&prop, Rc::new(1), false).await.is_failure());
        assert_eq!(finished.get(), 2);
    }

    #[tokio::test]
    async fn test_fast_runs_keep_their_outcome() {
        let prop = TimeoutProperty::new(sleepy(), Some(Duration::from_millis(2_000)));
        assert!(AsyncProperty::run(&prop, Rc::new(0), false).await.is_success());

        let unlimited = TimeoutProperty::new(sleepy(), None);
        assert!(AsyncProperty::run(&unlimited, Rc::new(30), false).await.is_success());
    }
}
