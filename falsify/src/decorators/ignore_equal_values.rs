use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::rc::Rc;

use tracing::trace;

use crate::error::Outcome;
use crate::property::{AsyncProperty, Pending, Property, RawProperty};
use crate::random::Random;
use crate::stream::Stream;
use crate::value::Value;

/// How an input already seen in this run is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupMode {
    /// Replay the first outcome, turning successes into skips
    Skip,
    /// Replay the first outcome as-is
    Strict,
}

impl DedupMode {
    fn replay(self, cached: &Outcome) -> Outcome {
        match (self, cached) {
            (Self::Skip, Outcome::Success) => Outcome::skip(),
            _ => cached.clone(),
        }
    }
}

/// Runs the predicate at most once per distinct input, comparing inputs
/// by their `Debug` rendering.
///
/// The rendering has to be stable for equal inputs. It is not for
/// `HashMap` and `HashSet`, whose iteration order differs between
/// instances, so equal hashed collections may each be run once. Use
/// ordered collections (`BTreeMap`, `BTreeSet`) in inputs that rely on
/// deduplication.
pub struct IgnoreEqualValuesProperty<P> {
    inner: P,
    mode: Option<DedupMode>,
    covered: RefCell<HashMap<String, Outcome>>,
}

impl<P> IgnoreEqualValuesProperty<P> {
    pub fn new(inner: P, mode: Option<DedupMode>) -> Self {
        Self {
            inner,
            mode,
            covered: RefCell::new(HashMap::new()),
        }
    }

    fn lookup(&self, key: &str) -> Option<Outcome> {
        let mode = self.mode?;
        let cached = self.covered.borrow().get(key).map(|outcome| mode.replay(outcome));
        if cached.is_some() {
            trace!(input = key, "input already covered");
        }
        cached
    }

    fn remember(&self, key: String, outcome: &Outcome) {
        self.covered.borrow_mut().insert(key, outcome.clone());
    }
}

fn stringify<T: Debug>(input: &T) -> String {
    format!("{:?}", input)
}

impl<T, P: RawProperty<T>> RawProperty<T> for IgnoreEqualValuesProperty<P> {
    fn generate(&self, rng: &mut Random, run_id: Option<u32>) -> Value<T> {
        self.inner.generate(rng, run_id)
    }

    fn shrink(&self, value: &Value<T>) -> Stream<'_, Value<T>> {
        self.inner.shrink(value)
    }
}

impl<T: Debug, P: Property<T>> Property<T> for IgnoreEqualValuesProperty<P> {
    fn run(&self, input: Rc<T>, skip_hooks: bool) -> Outcome {
        if self.mode.is_none() {
            return self.inner.run(input, skip_hooks);
        }
        let key = stringify(&*input);
        if let Some(outcome) = self.lookup(&key) {
            return outcome;
        }
        let outcome = self.inner.run(input, skip_hooks);
        self.remember(key, &outcome);
        outcome
    }

    fn run_before_each(&self) {
        self.inner.run_before_each()
    }

    fn run_after_each(&self) {
        self.inner.run_after_each()
    }
}

impl<T: Debug, P: AsyncProperty<T>> AsyncProperty<T> for IgnoreEqualValuesProperty<P> {
    async fn run(&self, input: Rc<T>, skip_hooks: bool) -> Outcome {
        if self.mode.is_none() {
            return self.inner.run(input, skip_hooks).await;
        }
        let key = stringify(&*input);
        if let Some(outcome) = self.lookup(&key) {
            return outcome;
        }
        let outcome = self.inner.run(input, skip_hooks).await;
        self.remember(key, &outcome);
        outcome
    }

    async fn run_with_pending(&self, input: Rc<T>, skip_hooks: bool) -> (Outcome, Option<Pending<'_>>) {
        if self.mode.is_none() {
            return self.inner.run_with_pending(input, skip_hooks).await;
        }
        let key = stringify(&*input);
        if let Some(outcome) = self.lookup(&key) {
            return (outcome, None);
        }
        let (outcome, pending) = self.inner.run_with_pending(input, skip_hooks).await;
        self.remember(key, &outcome);
        (outcome, pending)
    }

    fn run_before_each(&self) -> impl Future<Output = ()> {
        self.inner.run_before_each()
    }

    fn run_after_each(&self) -> impl Future<Output = ()> {
        self.inner.run_after_each()
    }
}
