use std::future::Future;
use std::rc::Rc;

use crate::error::Outcome;
use crate::property::{AsyncProperty, Pending, Property, RawProperty};
use crate::random::Random;
use crate::stream::Stream;
use crate::value::Value;

/// Drops the run id before generation, so arbitraries never bias
pub struct UnbiasedProperty<P> {
    inner: P,
    enabled: bool,
}

impl<P> UnbiasedProperty<P> {
    pub fn new(inner: P, enabled: bool) -> Self {
        Self { inner, enabled }
    }
}

impl<T, P: RawProperty<T>> RawProperty<T> for UnbiasedProperty<P> {
    fn generate(&self, rng: &mut Random, run_id: Option<u32>) -> Value<T> {
        let run_id = if self.enabled { None } else { run_id };
        self.inner.generate(rng, run_id)
    }

    fn shrink(&self, value: &Value<T>) -> Stream<'_, Value<T>> {
        self.inner.shrink(value)
    }
}

impl<T, P: Property<T>> Property<T> for UnbiasedProperty<P> {
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

impl<T, P: AsyncProperty<T>> AsyncProperty<T> for UnbiasedProperty<P> {
    fn run(&self, input: Rc<T>, skip_hooks: bool) -> impl Future<Output = Outcome> {
        self.inner.run(input, skip_hooks)
    }

    fn run_with_pending(
        &self,
        input: Rc<T>,
        skip_hooks: bool,
    ) -> impl Future<Output = (Outcome, Option<Pending<'_>>)> {
        self.inner.run_with_pending(input, skip_hooks)
    }

    fn run_before_each(&self) -> impl Future<Output = ()> {
        self.inner.run_before_each()
    }

    fn run_after_each(&self) -> impl Future<Output = ()> {
        self.inner.run_after_each()
    }
}
