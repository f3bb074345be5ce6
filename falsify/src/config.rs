//! Run settings, per-call parameters and the process-wide defaults.

use std::fmt;
use std::future::Future;
use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::FutureExt;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::details::{AsyncReporter, Reporter, RunDetails};
use crate::random::RandomType;

/// Number of runs when nothing else is configured
pub const DEFAULT_NUM_RUNS: usize = 100;

/// Skips tolerated per requested run when nothing else is configured
pub const DEFAULT_MAX_SKIPS_PER_RUN: usize = 100;

/// Error in the configuration of a run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Unable to replay, got invalid path={path}")]
    InvalidPath { path: String },

    #[error("Unable to replay, no value at the head of path={path}")]
    PathHeadMissing { path: String },

    #[error("Invalid parameters encountered: reporter and async_reporter cannot be specified together")]
    ConflictingReporters,

    #[error("Invalid parameters encountered: only asynchronous properties can be used when async_reporter is specified")]
    AsyncReporterRequiresAsyncProperty,

    #[error("Unknown random type: {0}")]
    UnknownRandomType(String),

    #[error("Invalid random bounds: min={min} is greater than max={max}")]
    InvalidRandomBounds { min: i64, max: i64 },
}

/// How much of the run gets recorded into the execution summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Verbosity {
    #[default]
    None,
    /// Failures along the shrink path
    Verbose,
    /// Every success, skip and failure
    VeryVerbose,
}

/// Knobs of a run. Unset fields fall back to the global settings, then to
/// the built-in defaults.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RunSettings {
    pub seed: Option<f64>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub random_type: Option<RandomType>,
    pub num_runs: Option<usize>,
    pub max_skips_per_run: Option<usize>,
    pub timeout: Option<Duration>,
    pub skip_all_after_time_limit: Option<Duration>,
    pub interrupt_after_time_limit: Option<Duration>,
    pub mark_interrupt_as_failure: Option<bool>,
    pub skip_equal_values: Option<bool>,
    pub ignore_equal_values: Option<bool>,
    pub path: Option<String>,
    pub verbosity: Option<Verbosity>,
    pub unbiased: Option<bool>,
    pub end_on_failure: Option<bool>,
}

impl RunSettings {
    /// Fill every unset field of `self` from `fallback`
    pub fn merge(self, fallback: &RunSettings) -> RunSettings {
        RunSettings {
            seed: self.seed.or(fallback.seed),
            random_type: self.random_type.or_else(|| fallback.random_type.clone()),
            num_runs: self.num_runs.or(fallback.num_runs),
            max_skips_per_run: self.max_skips_per_run.or(fallback.max_skips_per_run),
            timeout: self.timeout.or(fallback.timeout),
            skip_all_after_time_limit: self
                .skip_all_after_time_limit
                .or(fallback.skip_all_after_time_limit),
            interrupt_after_time_limit: self
                .interrupt_after_time_limit
                .or(fallback.interrupt_after_time_limit),
            mark_interrupt_as_failure: self
                .mark_interrupt_as_failure
                .or(fallback.mark_interrupt_as_failure),
            skip_equal_values: self.skip_equal_values.or(fallback.skip_equal_values),
            ignore_equal_values: self.ignore_equal_values.or(fallback.ignore_equal_values),
            path: self.path.or_else(|| fallback.path.clone()),
            verbosity: self.verbosity.or(fallback.verbosity),
            unbiased: self.unbiased.or(fallback.unbiased),
            end_on_failure: self.end_on_failure.or(fallback.end_on_failure),
        }
    }
}

/// Defaults shared by every run started from the same [`crate::Runner`].
///
/// There is no hidden global: whoever owns the runner owns this value.
#[derive(Debug, Clone, Default)]
pub struct GlobalConfig {
    settings: RunSettings,
}

impl GlobalConfig {
    pub fn new(settings: RunSettings) -> Self {
        Self { settings }
    }

    /// Replace the global settings
    pub fn configure(&mut self, settings: RunSettings) {
        self.settings = settings;
    }

    pub fn read(&self) -> &RunSettings {
        &self.settings
    }

    /// Back to an empty configuration
    pub fn reset(&mut self) {
        self.settings = RunSettings::default();
    }
}

/// Parameters of a single `check`/`assert` call
pub struct Parameters<T> {
    pub settings: RunSettings,
    /// Inputs tried before any generated one
    pub examples: Vec<T>,
    pub reporter: Option<Reporter<T>>,
    pub async_reporter: Option<AsyncReporter<T>>,
}

impl<T> Default for Parameters<T> {
    fn default() -> Self {
        Self {
            settings: RunSettings::default(),
            examples: Vec::new(),
            reporter: None,
            async_reporter: None,
        }
    }
}

impl<T> Parameters<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: RunSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Seed of the run. Non-integral seeds are folded into 32 bits.
    pub fn seed(mut self, seed: impl Into<f64>) -> Self {
        self.settings.seed = Some(seed.into());
        self
    }

    pub fn random_type(mut self, random_type: RandomType) -> Self {
        self.settings.random_type = Some(random_type);
        self
    }

    pub fn num_runs(mut self, num_runs: usize) -> Self {
        self.settings.num_runs = Some(num_runs);
        self
    }

    pub fn max_skips_per_run(mut self, max_skips_per_run: usize) -> Self {
        self.settings.max_skips_per_run = Some(max_skips_per_run);
        self
    }

    /// Fail asynchronous runs that do not settle within `timeout`
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = Some(timeout);
        self
    }

    pub fn skip_all_after_time_limit(mut self, limit: Duration) -> Self {
        self.settings.skip_all_after_time_limit = Some(limit);
        self
    }

    pub fn interrupt_after_time_limit(mut self, limit: Duration) -> Self {
        self.settings.interrupt_after_time_limit = Some(limit);
        self
    }

    pub fn mark_interrupt_as_failure(mut self, mark: bool) -> Self {
        self.settings.mark_interrupt_as_failure = Some(mark);
        self
    }

    pub fn skip_equal_values(mut self, skip: bool) -> Self {
        self.settings.skip_equal_values = Some(skip);
        self
    }

    pub fn ignore_equal_values(mut self, ignore: bool) -> Self {
        self.settings.ignore_equal_values = Some(ignore);
        self
    }

    /// Replay from a `counterexample_path` of a previous run
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.settings.path = Some(path.into());
        self
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.settings.verbosity = Some(verbosity);
        self
    }

    pub fn unbiased(mut self, unbiased: bool) -> Self {
        self.settings.unbiased = Some(unbiased);
        self
    }

    pub fn end_on_failure(mut self, end_on_failure: bool) -> Self {
        self.settings.end_on_failure = Some(end_on_failure);
        self
    }

    pub fn examples(mut self, examples: Vec<T>) -> Self {
        self.examples = examples;
        self
    }

    /// Called by `assert` with the details of the run instead of the
    /// default panic
    pub fn reporter(mut self, reporter: impl Fn(&RunDetails<T>) + 'static) -> Self {
        self.reporter = Some(Rc::new(reporter));
        self
    }

    pub fn async_reporter<F, Fut>(mut self, reporter: F) -> Self
    where
        F: Fn(&RunDetails<T>) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        self.async_reporter = Some(Rc::new(move |details: &RunDetails<T>| reporter(details).boxed_local()));
        self
    }
}

impl<T: fmt::Debug> fmt::Debug for Parameters<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameters")
            .field("settings", &self.settings)
            .field("examples", &self.examples)
            .field("reporter", &self.reporter.is_some())
            .field("async_reporter", &self.async_reporter.is_some())
            .finish()
    }
}

/// [`Parameters`] with every default resolved
pub struct QualifiedParameters<T> {
    pub seed: i32,
    pub random_type: RandomType,
    pub num_runs: usize,
    pub max_skips_per_run: usize,
    pub timeout: Option<Duration>,
    pub skip_all_after_time_limit: Option<Duration>,
    pub interrupt_after_time_limit: Option<Duration>,
    pub mark_interrupt_as_failure: bool,
    pub skip_equal_values: bool,
    pub ignore_equal_values: bool,
    pub path: String,
    pub verbosity: Verbosity,
    pub unbiased: bool,
    pub end_on_failure: bool,
    pub examples: Vec<Rc<T>>,
    pub reporter: Option<Reporter<T>>,
    pub async_reporter: Option<AsyncReporter<T>>,
}

impl<T> QualifiedParameters<T> {
    /// Resolve `params` against the built-in defaults only
    pub fn read(params: Parameters<T>) -> Self {
        Self::read_with_global(params, &GlobalConfig::default())
    }

    pub fn read_with_global(params: Parameters<T>, global: &GlobalConfig) -> Self {
        let settings = params.settings.merge(global.read());
        Self {
            seed: qualify_seed(settings.seed),
            random_type: settings.random_type.unwrap_or_default(),
            num_runs: settings.num_runs.unwrap_or(DEFAULT_NUM_RUNS),
            max_skips_per_run: settings
                .max_skips_per_run
                .unwrap_or(DEFAULT_MAX_SKIPS_PER_RUN),
            timeout: settings.timeout,
            skip_all_after_time_limit: settings.skip_all_after_time_limit,
            interrupt_after_time_limit: settings.interrupt_after_time_limit,
            mark_interrupt_as_failure: settings.mark_interrupt_as_failure.unwrap_or(false),
            skip_equal_values: settings.skip_equal_values.unwrap_or(false),
            ignore_equal_values: settings.ignore_equal_values.unwrap_or(false),
            path: settings.path.unwrap_or_default(),
            verbosity: settings.verbosity.unwrap_or_default(),
            unbiased: settings.unbiased.unwrap_or(false),
            end_on_failure: settings.end_on_failure.unwrap_or(false),
            examples: params.examples.into_iter().map(Rc::new).collect(),
            reporter: params.reporter,
            async_reporter: params.async_reporter,
        }
    }

    /// Total skips tolerated over the whole run
    pub fn max_skips(&self) -> usize {
        self.num_runs.saturating_mul(self.max_skips_per_run)
    }

    /// The resolved parameters as settings, e.g. to start a similar run
    pub fn to_settings(&self) -> RunSettings {
        RunSettings {
            seed: Some(f64::from(self.seed)),
            random_type: Some(self.random_type.clone()),
            num_runs: Some(self.num_runs),
            max_skips_per_run: Some(self.max_skips_per_run),
            timeout: self.timeout,
            skip_all_after_time_limit: self.skip_all_after_time_limit,
            interrupt_after_time_limit: self.interrupt_after_time_limit,
            mark_interrupt_as_failure: Some(self.mark_interrupt_as_failure),
            skip_equal_values: Some(self.skip_equal_values),
            ignore_equal_values: Some(self.ignore_equal_values),
            path: Some(self.path.clone()),
            verbosity: Some(self.verbosity),
            unbiased: Some(self.unbiased),
            end_on_failure: Some(self.end_on_failure),
        }
    }
}

impl<T> Clone for QualifiedParameters<T> {
    fn clone(&self) -> Self {
        Self {
            seed: self.seed,
            random_type: self.random_type.clone(),
            num_runs: self.num_runs,
            max_skips_per_run: self.max_skips_per_run,
            timeout: self.timeout,
            skip_all_after_time_limit: self.skip_all_after_time_limit,
            interrupt_after_time_limit: self.interrupt_after_time_limit,
            mark_interrupt_as_failure: self.mark_interrupt_as_failure,
            skip_equal_values: self.skip_equal_values,
            ignore_equal_values: self.ignore_equal_values,
            path: self.path.clone(),
            verbosity: self.verbosity,
            unbiased: self.unbiased,
            end_on_failure: self.end_on_failure,
            examples: self.examples.clone(),
            reporter: self.reporter.clone(),
            async_reporter: self.async_reporter.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for QualifiedParameters<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QualifiedParameters")
            .field("seed", &self.seed)
            .field("random_type", &self.random_type)
            .field("num_runs", &self.num_runs)
            .field("max_skips_per_run", &self.max_skips_per_run)
            .field("timeout", &self.timeout)
            .field("skip_all_after_time_limit", &self.skip_all_after_time_limit)
            .field("interrupt_after_time_limit", &self.interrupt_after_time_limit)
            .field("mark_interrupt_as_failure", &self.mark_interrupt_as_failure)
            .field("skip_equal_values", &self.skip_equal_values)
            .field("ignore_equal_values", &self.ignore_equal_values)
            .field("path", &self.path)
            .field("verbosity", &self.verbosity)
            .field("unbiased", &self.unbiased)
            .field("end_on_failure", &self.end_on_failure)
            .field("examples", &self.examples)
            .field("reporter", &self.reporter.is_some())
            .field("async_reporter", &self.async_reporter.is_some())
            .finish()
    }
}

/// ECMAScript `ToInt32`: truncate, then wrap modulo 2^32
fn to_int32(x: f64) -> i32 {
    if !x.is_finite() {
        return 0;
    }
    x.trunc().rem_euclid(4_294_967_296.0) as u32 as i32
}

/// Fold a user seed into 32 bits. Absent seeds are derived from the clock.
pub fn qualify_seed(seed: Option<f64>) -> i32 {
    let Some(seed) = seed else {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0);
        return (now as u32 as i32) ^ rand::random::<i32>();
    };
    let seed32 = to_int32(seed);
    if f64::from(seed32) == seed {
        return seed32;
    }
    let gap = seed - f64::from(seed32);
    seed32 ^ to_int32(gap * 4_294_967_296.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_seeds_are_kept() {
        assert_eq!(qualify_seed(Some(42.0)), 42);
        assert_eq!(qualify_seed(Some(-7.0)), -7);
        assert_eq!(qualify_seed(Some(0.0)), 0);
    }

    #[test]
    fn test_out_of_range_seeds_wrap() {
        assert_eq!(qualify_seed(Some(4_294_967_296.0 + 5.0)), 5);
        assert_eq!(qualify_seed(Some(2_147_483_648.0)), i32::MIN);
    }

    #[test]
    fn test_fractional_seeds_fold_the_fraction() {
        assert_eq!(qualify_seed(Some(0.5)), i32::MIN);
        assert_eq!(qualify_seed(Some(1.25)), 1 ^ 1_073_741_824);
        assert_ne!(qualify_seed(Some(1.25)), qualify_seed(Some(1.5)));
    }

    #[test]
    fn test_non_finite_seeds() {
        assert_eq!(qualify_seed(Some(f64::NAN)), 0);
        assert_eq!(qualify_seed(Some(f64::INFINITY)), 0);
    }

    #[test]
    fn test_defaults() {
        let qparams = QualifiedParameters::<u8>::read(Parameters::new().seed(1));
        assert_eq!(qparams.seed, 1);
        assert_eq!(qparams.num_runs, DEFAULT_NUM_RUNS);
        assert_eq!(qparams.max_skips_per_run, DEFAULT_MAX_SKIPS_PER_RUN);
        assert_eq!(qparams.max_skips(), 10_000);
        assert_eq!(qparams.path, "");
        assert_eq!(qparams.verbosity, Verbosity::None);
        assert_eq!(qparams.random_type.name(), "chacha8");
        assert!(!qparams.end_on_failure);
        assert!(qparams.timeout.is_none());
    }

    #[test]
    fn test_call_parameters_override_global_config() {
        let mut global = GlobalConfig::default();
        global.configure(RunSettings {
            num_runs: Some(5),
            verbosity: Some(Verbosity::Verbose),
            seed: Some(3.0),
            ..RunSettings::default()
        });

        let qparams = QualifiedParameters::<u8>::read_with_global(Parameters::new().num_runs(9), &global);
        assert_eq!(qparams.num_runs, 9);
        assert_eq!(qparams.verbosity, Verbosity::Verbose);
        assert_eq!(qparams.seed, 3);

        global.reset();
        assert!(global.read().num_runs.is_none());
        let qparams = QualifiedParameters::<u8>::read_with_global(Parameters::new(), &global);
        assert_eq!(qparams.num_runs, DEFAULT_NUM_RUNS);
    }

    #[test]
    fn test_to_settings_round_trips_through_read() {
        let qparams = QualifiedParameters::<u8>::read(
            Parameters::new()
                .seed(12)
                .num_runs(7)
                .path("3:1")
                .end_on_failure(true)
                .examples(vec![1, 2]),
        );
        let again = QualifiedParameters::<u8>::read(Parameters::from_settings(qparams.to_settings()));
        assert_eq!(again.seed, 12);
        assert_eq!(again.num_runs, 7);
        assert_eq!(again.path, "3:1");
        assert!(again.end_on_failure);
        assert!(again.examples.is_empty());
        assert_eq!(qparams.examples.len(), 2);
    }

    #[test]
    fn test_verbosity_ordering() {
        assert!(Verbosity::None < Verbosity::Verbose);
        assert!(Verbosity::Verbose < Verbosity::VeryVerbose);
    }
}
