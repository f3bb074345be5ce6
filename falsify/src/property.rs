//! Properties: an arbitrary paired with a predicate.

use std::future::Future;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::arbitrary::Arbitrary;
use crate::error::{Outcome, PropertyError};
use crate::random::Random;
use crate::stream::Stream;
use crate::value::{Context, Value};

/// Generation and shrinking, shared by sync and async properties
pub trait RawProperty<T> {
    /// Produce the input for run `run_id`. `None` requests unbiased
    /// generation.
    fn generate(&self, rng: &mut Random, run_id: Option<u32>) -> Value<T>;

    fn shrink(&self, value: &Value<T>) -> Stream<'_, Value<T>>;
}

/// A property whose predicate runs synchronously
pub trait Property<T>: RawProperty<T> {
    /// Run the predicate. Hooks run around it unless `skip_hooks` is set.
    fn run(&self, input: Rc<T>, skip_hooks: bool) -> Outcome;

    fn run_before_each(&self) {}

    fn run_after_each(&self) {}
}

/// Work a run still had in flight when a time limit settled its outcome
pub type Pending<'a> = LocalBoxFuture<'a, ()>;

/// A property whose predicate returns a future
pub trait AsyncProperty<T>: RawProperty<T> {
    /// Run the predicate to completion, including any work left behind by
    /// a time limit.
    fn run(&self, input: Rc<T>, skip_hooks: bool) -> impl Future<Output = Outcome>;

    /// Like [`AsyncProperty::run`], but returns as soon as the outcome is
    /// known. Work a time limit cut the outcome short of is handed back
    /// instead of being dropped, for the caller to drive to completion.
    fn run_with_pending(
        &self,
        input: Rc<T>,
        skip_hooks: bool,
    ) -> impl Future<Output = (Outcome, Option<Pending<'_>>)> {
        async move { (self.run(input, skip_hooks).await, None) }
    }

    fn run_before_each(&self) -> impl Future<Output = ()> {
        async {}
    }

    fn run_after_each(&self) -> impl Future<Output = ()> {
        async {}
    }
}

/// What a predicate may return
pub trait PredicateOutput {
    fn into_outcome(self) -> Outcome;
}

impl PredicateOutput for bool {
    fn into_outcome(self) -> Outcome {
        if self {
            Outcome::Success
        } else {
            Outcome::failure(PropertyError::property_failed("predicate returned false"))
        }
    }
}

impl PredicateOutput for () {
    fn into_outcome(self) -> Outcome {
        Outcome::Success
    }
}

impl PredicateOutput for Outcome {
    fn into_outcome(self) -> Outcome {
        self
    }
}

impl<O: PredicateOutput> PredicateOutput for Result<O, PropertyError> {
    fn into_outcome(self) -> Outcome {
        match self {
            Ok(output) => output.into_outcome(),
            Err(error) => Outcome::from(Err::<(), _>(error)),
        }
    }
}

/// Upper bound of the bias frequency handed to arbitraries
pub const MAX_BIAS_FREQUENCY: u32 = 10;

/// Bias frequency for a given run: edge cases get rarer as runs go on
pub fn run_id_to_frequency(run_id: u32) -> u32 {
    (2 + (u64::from(run_id) + 1).ilog10()).min(MAX_BIAS_FREQUENCY)
}

/// Stands in for a missing context on generated values, so that only
/// user-supplied examples are recognized as context-free.
struct GeneratedWithoutContext;

fn mark_generated<T>(value: Value<T>) -> Value<T> {
    if value.context().is_some() {
        value
    } else {
        value.with_context(Some(Rc::new(GeneratedWithoutContext)))
    }
}

fn generate_from<T, A: Arbitrary<T>>(
    arbitrary: &A,
    rng: &mut Random,
    run_id: Option<u32>,
) -> Value<T> {
    mark_generated(arbitrary.generate(rng, run_id.map(run_id_to_frequency)))
}

fn shrink_from<'a, T: 'a, A: Arbitrary<T>>(
    arbitrary: &'a A,
    value: &Value<T>,
) -> Stream<'a, Value<T>> {
    let context: Option<&Context> = match value.context() {
        None if !arbitrary.can_shrink_without_context(value.raw()) => return Stream::nil(),
        None => None,
        Some(ctx) if (**ctx).is::<GeneratedWithoutContext>() => None,
        Some(ctx) => Some(ctx),
    };
    arbitrary.shrink(value.raw(), context).map(mark_generated)
}

/// A property checked by a synchronous predicate.
///
/// Panics raised by the predicate are reported as failures.
pub struct PredicateProperty<T, A, F, O> {
    arbitrary: A,
    predicate: F,
    before_each: Option<Box<dyn Fn()>>,
    after_each: Option<Box<dyn Fn()>>,
    _marker: PhantomData<fn(&T) -> O>,
}

/// Build a synchronous property from an arbitrary and a predicate
pub fn property<T, A, F, O>(arbitrary: A, predicate: F) -> PredicateProperty<T, A, F, O>
where
    A: Arbitrary<T>,
    F: Fn(&T) -> O,
    O: PredicateOutput,
{
    PredicateProperty {
        arbitrary,
        predicate,
        before_each: None,
        after_each: None,
        _marker: PhantomData,
    }
}

impl<T, A, F, O> PredicateProperty<T, A, F, O> {
    pub fn before_each(mut self, hook: impl Fn() + 'static) -> Self {
        self.before_each = Some(Box::new(hook));
        self
    }

    pub fn after_each(mut self, hook: impl Fn() + 'static) -> Self {
        self.after_each = Some(Box::new(hook));
        self
    }
}

impl<T: 'static, A, F, O> RawProperty<T> for PredicateProperty<T, A, F, O>
where
    A: Arbitrary<T>,
{
    fn generate(&self, rng: &mut Random, run_id: Option<u32>) -> Value<T> {
        generate_from(&self.arbitrary, rng, run_id)
    }

    fn shrink(&self, value: &Value<T>) -> Stream<'_, Value<T>> {
        shrink_from(&self.arbitrary, value)
    }
}

impl<T: 'static, A, F, O> Property<T> for PredicateProperty<T, A, F, O>
where
    A: Arbitrary<T>,
    F: Fn(&T) -> O,
    O: PredicateOutput,
{
    fn run(&self, input: Rc<T>, skip_hooks: bool) -> Outcome {
        if !skip_hooks {
            self.run_before_each();
        }
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| (self.predicate)(&*input))) {
            Ok(output) => output.into_outcome(),
            Err(payload) => Outcome::failure(PropertyError::panicked(&*payload)),
        };
        if !skip_hooks {
            self.run_after_each();
        }
        outcome
    }

    fn run_before_each(&self) {
        if let Some(hook) = &self.before_each {
            hook();
        }
    }

    fn run_after_each(&self) {
        if let Some(hook) = &self.after_each {
            hook();
        }
    }
}

type AsyncHook = Box<dyn Fn() -> LocalBoxFuture<'static, ()>>;

/// A property checked by an asynchronous predicate.
///
/// The predicate receives its own handle on the input so the returned
/// future does not borrow from the runner.
pub struct AsyncPredicateProperty<T, A, F, Fut> {
    arbitrary: A,
    predicate: F,
    before_each: Option<AsyncHook>,
    after_each: Option<AsyncHook>,
    _marker: PhantomData<fn(Rc<T>) -> Fut>,
}

/// Build an asynchronous property from an arbitrary and a predicate
pub fn async_property<T, A, F, Fut>(arbitrary: A, predicate: F) -> AsyncPredicateProperty<T, A, F, Fut>
where
    A: Arbitrary<T>,
    F: Fn(Rc<T>) -> Fut,
    Fut: Future,
    Fut::Output: PredicateOutput,
{
    AsyncPredicateProperty {
        arbitrary,
        predicate,
        before_each: None,
        after_each: None,
        _marker: PhantomData,
    }
}

impl<T, A, F, Fut> AsyncPredicateProperty<T, A, F, Fut> {
    pub fn before_each<H, HF>(mut self, hook: H) -> Self
    where
        H: Fn() -> HF + 'static,
        HF: Future<Output = ()> + 'static,
    {
        self.before_each = Some(Box::new(move || hook().boxed_local()));
        self
    }

    pub fn after_each<H, HF>(mut self, hook: H) -> Self
    where
        H: Fn() -> HF + 'static,
        HF: Future<Output = ()> + 'static,
    {
        self.after_each = Some(Box::new(move || hook().boxed_local()));
        self
    }
}

impl<T: 'static, A, F, Fut> RawProperty<T> for AsyncPredicateProperty<T, A, F, Fut>
where
    A: Arbitrary<T>,
{
    fn generate(&self, rng: &mut Random, run_id: Option<u32>) -> Value<T> {
        generate_from(&self.arbitrary, rng, run_id)
    }

    fn shrink(&self, value: &Value<T>) -> Stream<'_, Value<T>> {
        shrink_from(&self.arbitrary, value)
    }
}

impl<T: 'static, A, F, Fut> AsyncProperty<T> for AsyncPredicateProperty<T, A, F, Fut>
where
    A: Arbitrary<T>,
    F: Fn(Rc<T>) -> Fut,
    Fut: Future,
    Fut::Output: PredicateOutput,
{
    async fn run(&self, input: Rc<T>, skip_hooks: bool) -> Outcome {
        if !skip_hooks {
            AsyncProperty::run_before_each(self).await;
        }
        let checked = AssertUnwindSafe(async { (self.predicate)(input).await }).catch_unwind();
        let outcome = match checked.await {
            Ok(output) => output.into_outcome(),
            Err(payload) => Outcome::failure(PropertyError::panicked(&*payload)),
        };
        if !skip_hooks {
            AsyncProperty::run_after_each(self).await;
        }
        outcome
    }

    async fn run_before_each(&self) {
        if let Some(hook) = &self.before_each {
            hook().await;
        }
    }

    async fn run_after_each(&self) {
        if let Some(hook) = &self.after_each {
            hook().await;
        }
    }
}
