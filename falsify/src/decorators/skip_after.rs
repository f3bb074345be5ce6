use std::future::Future;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::warn;

use super::{settle, settle_later, within};
use crate::error::Outcome;
use crate::property::{AsyncProperty, Pending, Property, RawProperty};
use crate::random::Random;
use crate::stream::Stream;
use crate::value::Value;

/// Skips every run once a time budget, counted from construction, is
/// spent.
///
/// In interrupt mode the skips also stop the whole run, and asynchronous
/// runs in flight when the budget expires report an interrupt right away.
/// Their unfinished work is handed back, never dropped.
pub struct SkipAfterProperty<P> {
    inner: P,
    deadline: Option<Instant>,
    interrupt: bool,
}

impl<P> SkipAfterProperty<P> {
    pub fn new(inner: P, time_limit: Option<Duration>, interrupt: bool) -> Self {
        // a limit too far out to represent never expires
        let deadline = time_limit.and_then(|limit| Instant::now().checked_add(limit));
        Self {
            inner,
            deadline,
            interrupt,
        }
    }

    /// Time left before the deadline. `Some(ZERO)` once expired.
    fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    fn expired(&self) -> bool {
        self.remaining() == Some(Duration::ZERO)
    }

    fn skipped(&self) -> Outcome {
        Outcome::Skip {
            interrupt: self.interrupt,
        }
    }
}

impl<T, P: RawProperty<T>> RawProperty<T> for SkipAfterProperty<P> {
    fn generate(&self, rng: &mut Random, run_id: Option<u32>) -> Value<T> {
        self.inner.generate(rng, run_id)
    }

    fn shrink(&self, value: &Value<T>) -> Stream<'_, Value<T>> {
        self.inner.shrink(value)
    }
}

impl<T, P: Property<T>> Property<T> for SkipAfterProperty<P> {
    fn run(&self, input: Rc<T>, skip_hooks: bool) -> Outcome {
        if self.expired() {
            return self.skipped();
        }
        self.inner.run(input, skip_hooks)
    }

    fn run_before_each(&self) {
        self.inner.run_before_each()
    }

    fn run_after_each(&self) {
        self.inner.run_after_each()
    }
}

impl<T: 'static, P: AsyncProperty<T>> AsyncProperty<T> for SkipAfterProperty<P> {
    async fn run(&self, input: Rc<T>, skip_hooks: bool) -> Outcome {
        settle(self.run_with_pending(input, skip_hooks)).await
    }

    async fn run_with_pending(&self, input: Rc<T>, skip_hooks: bool) -> (Outcome, Option<Pending<'_>>) {
        let remaining = match self.remaining() {
            Some(Duration::ZERO) => return (self.skipped(), None),
            Some(remaining) if self.interrupt => remaining,
            _ => return self.inner.run_with_pending(input, skip_hooks).await,
        };
        match within(self.inner.run_with_pending(input, skip_hooks), remaining).await {
            Ok(settled) => settled,
            Err(unfinished) => {
                warn!("time limit reached, interrupting the run in flight");
                (self.skipped(), Some(settle_later(unfinished)))
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
