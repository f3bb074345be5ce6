//! Running properties: candidate sourcing, shrink search and replay.

pub mod driver;
pub mod execution;
pub mod path;
pub mod source;
pub mod tosser;

use std::fmt::Debug;
use std::future::Future;

use futures::future::{self, Either};
use futures::pin_mut;
use futures::stream::{FuturesUnordered, StreamExt as _};
use tracing::debug;

use crate::config::{ConfigError, GlobalConfig, Parameters, QualifiedParameters};
use crate::decorators::{Decorated, decorate};
use crate::details::{RunDetails, default_report};
use crate::property::{AsyncProperty, Pending, Property, RawProperty};
use crate::stream::Stream;
use crate::value::Value;

use self::driver::RunnerIterator;
use self::path::{ReplayPath, path_walk};
use self::source::SourceValuesIterator;
use self::tosser::{LazyValue, toss};

/// Runs properties against the defaults of a [`GlobalConfig`].
///
/// # Example
///
/// ```rust
/// use falsify::{GlobalConfig, Parameters, RunSettings, Runner};
/// # use falsify::{property, Arbitrary, Context, Random, Stream, Value};
/// # struct Bytes;
/// # impl Arbitrary<u8> for Bytes {
/// #     fn generate(&self, rng: &mut Random, _: Option<u32>) -> Value<u8> {
/// #         Value::new(rng.next_int(0, 255) as u8, None)
/// #     }
/// #     fn shrink(&self, _: &u8, _: Option<&Context>) -> Stream<'_, Value<u8>> {
/// #         Stream::nil()
/// #     }
/// # }
///
/// let global = GlobalConfig::new(RunSettings {
///     num_runs: Some(25),
///     ..RunSettings::default()
/// });
/// let runner = Runner::new(&global);
///
/// let details = runner
///     .check(property(Bytes, |b: &u8| b.count_ones() <= 8), Parameters::new().seed(7))
///     .unwrap();
/// assert!(!details.failed);
/// assert_eq!(details.num_runs, 25);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Runner<'g> {
    global: &'g GlobalConfig,
}

/// Everything a run loop needs, resolved from the parameters
struct Prepared<P, T> {
    property: Decorated<P>,
    params: QualifiedParameters<T>,
    base_path: ReplayPath,
}

impl<P, T> Prepared<P, T>
where
    T: Debug + 'static,
    P: RawProperty<T>,
{
    fn new(property: P, params: QualifiedParameters<T>) -> Result<Self, ConfigError> {
        if params.reporter.is_some() && params.async_reporter.is_some() {
            return Err(ConfigError::ConflictingReporters);
        }
        let base_path: ReplayPath = params.path.parse()?;
        debug!(
            seed = params.seed,
            num_runs = params.num_runs,
            path = %params.path,
            "starting property run"
        );
        Ok(Self {
            property: decorate(property, &params),
            params,
            base_path,
        })
    }

    fn runner<'p>(
        &'p self,
    ) -> Result<RunnerIterator<'p, T, impl Fn(&Value<T>) -> Stream<'p, Value<T>> + 'p>, ConfigError>
    {
        let property = &self.property;
        let end_on_failure = self.params.end_on_failure;
        let shrink = move |value: &Value<T>| {
            if end_on_failure {
                Stream::nil()
            } else {
                property.shrink(value)
            }
        };

        let candidates = toss(
            property,
            self.params.seed,
            &self.params.random_type,
            &self.params.examples,
        );
        // replay walks the recorded shrinks even when new failures stop the search
        let initial_values: Stream<'p, LazyValue<'p, T>> =
            path_walk(&self.base_path, candidates, &|value: &Value<T>| property.shrink(value))?;

        let max_initial_iterations = if self.base_path.has_shrinks() {
            -1
        } else {
            i64::try_from(self.params.num_runs).unwrap_or(i64::MAX)
        };
        let max_skips = i64::try_from(self.params.max_skips()).unwrap_or(i64::MAX);
        let source = SourceValuesIterator::new(initial_values, max_initial_iterations, max_skips);

        Ok(RunnerIterator::new(
            source,
            shrink,
            self.params.verbosity,
            self.params.mark_interrupt_as_failure,
        ))
    }

    fn finish(self, execution: execution::RunExecution<T>) -> RunDetails<T> {
        let max_skips = self.params.max_skips();
        let details =
            execution.to_run_details(self.params.seed, &self.base_path, max_skips, self.params);
        debug!(
            failed = details.failed,
            interrupted = details.interrupted,
            num_runs = details.num_runs,
            num_skips = details.num_skips,
            num_shrinks = details.num_shrinks,
            "property run finished"
        );
        details
    }
}

impl<'g> Runner<'g> {
    pub fn new(global: &'g GlobalConfig) -> Self {
        Self { global }
    }

    fn qualify<T>(&self, params: Parameters<T>) -> QualifiedParameters<T> {
        QualifiedParameters::read_with_global(params, self.global)
    }

    /// Run a synchronous property and report what happened.
    ///
    /// Only configuration problems are errors: a falsified property is a
    /// successful check with `failed` set in the details.
    pub fn check<T, P>(&self, property: P, params: Parameters<T>) -> Result<RunDetails<T>, ConfigError>
    where
        T: Debug + 'static,
        P: Property<T>,
    {
        let params = self.qualify(params);
        if params.async_reporter.is_some() && params.reporter.is_none() {
            return Err(ConfigError::AsyncReporterRequiresAsyncProperty);
        }
        let prepared = Prepared::new(property, params)?;

        let execution = {
            let mut runner = prepared.runner()?;
            while let Some(input) = runner.next() {
                Property::run_before_each(&prepared.property);
                let outcome = Property::run(&prepared.property, input, true);
                Property::run_after_each(&prepared.property);
                runner.handle_result(outcome);
            }
            runner.into_execution()
        };
        Ok(prepared.finish(execution))
    }

    /// Run an asynchronous property. Candidates are awaited one at a time.
    ///
    /// Work a time limit settled early keeps running alongside the later
    /// candidates, and the check only returns once all of it is done.
    pub async fn check_async<T, P>(
        &self,
        property: P,
        params: Parameters<T>,
    ) -> Result<RunDetails<T>, ConfigError>
    where
        T: Debug + 'static,
        P: AsyncProperty<T>,
    {
        let prepared = Prepared::new(property, self.qualify(params))?;

        let execution = {
            let mut runner = prepared.runner()?;
            let mut pending = FuturesUnordered::new();
            while let Some(input) = runner.next() {
                alongside(AsyncProperty::run_before_each(&prepared.property), &mut pending).await;
                let (outcome, left) = alongside(
                    AsyncProperty::run_with_pending(&prepared.property, input, true),
                    &mut pending,
                )
                .await;
                pending.extend(left);
                alongside(AsyncProperty::run_after_each(&prepared.property), &mut pending).await;
                runner.handle_result(outcome);
            }
            if !pending.is_empty() {
                debug!(count = pending.len(), "waiting for runs cut short by a time limit");
                while pending.next().await.is_some() {}
            }
            runner.into_execution()
        };
        Ok(prepared.finish(execution))
    }

    /// Like [`Runner::check`], then hand the details to the reporter.
    ///
    /// # Panics
    ///
    /// Without a reporter, panics with the default report when the property
    /// failed. Also panics on configuration errors.
    pub fn assert<T, P>(&self, property: P, params: Parameters<T>)
    where
        T: Debug + 'static,
        P: Property<T>,
    {
        match self.check(property, params) {
            Ok(details) => report(&details),
            Err(error) => panic!("{}", error),
        }
    }

    /// Like [`Runner::check_async`], then hand the details to the
    /// asynchronous reporter, the reporter, or the default panic.
    pub async fn assert_async<T, P>(&self, property: P, params: Parameters<T>)
    where
        T: Debug + 'static,
        P: AsyncProperty<T>,
    {
        match self.check_async(property, params).await {
            Ok(details) => match details.run_configuration.async_reporter.clone() {
                Some(reporter) => reporter(&details).await,
                None => report(&details),
            },
            Err(error) => panic!("{}", error),
        }
    }
}

/// Drive `work` to completion while also polling the leftovers of earlier runs
async fn alongside<F: Future>(work: F, pending: &mut FuturesUnordered<Pending<'_>>) -> F::Output {
    pin_mut!(work);
    loop {
        if pending.is_empty() {
            return work.await;
        }
        match future::select(work, pending.next()).await {
            Either::Left((output, _)) => return output,
            Either::Right((_, unfinished)) => work = unfinished,
        }
    }
}

fn report<T: Debug>(details: &RunDetails<T>) {
    if let Some(reporter) = &details.run_configuration.reporter {
        reporter(details);
        return;
    }
    if let Some(message) = default_report(details) {
        panic!("{}", message);
    }
}

/// [`Runner::check`] against the built-in defaults
pub fn check<T, P>(property: P, params: Parameters<T>) -> Result<RunDetails<T>, ConfigError>
where
    T: Debug + 'static,
    P: Property<T>,
{
    Runner::new(&GlobalConfig::default()).check(property, params)
}

/// [`Runner::check_async`] against the built-in defaults
pub async fn check_async<T, P>(property: P, params: Parameters<T>) -> Result<RunDetails<T>, ConfigError>
where
    T: Debug + 'static,
    P: AsyncProperty<T>,
{
    let global = GlobalConfig::default();
    Runner::new(&global).check_async(property, params).await
}

/// [`Runner::assert`] against the built-in defaults
pub fn assert<T, P>(property: P, params: Parameters<T>)
where
    T: Debug + 'static,
    P: Property<T>,
{
    Runner::new(&GlobalConfig::default()).assert(property, params)
}

/// [`Runner::assert_async`] against the built-in defaults
pub async fn assert_async<T, P>(property: P, params: Parameters<T>)
where
    T: Debug + 'static,
    P: AsyncProperty<T>,
{
    let global = GlobalConfig::default();
    Runner::new(&global).assert_async(property, params).await
}
