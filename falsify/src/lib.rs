//! # Falsify - Property execution and shrink search
//!
//! Falsify runs a property against many generated inputs and, when one of
//! them falsifies it, walks the shrink tree depth-first toward a simpler
//! counterexample. Every run is reproducible: the reported seed and path
//! lead straight back to the counterexample.
//!
//! ## Quick Start
//!
//! ```rust
//! use falsify::{check, property, Arbitrary, Context, Parameters, Random, Stream, Value};
//!
//! /// Integers in `0..=1000`, shrinking by stepping down
//! struct Small;
//!
//! impl Arbitrary<i64> for Small {
//!     fn generate(&self, rng: &mut Random, _bias: Option<u32>) -> Value<i64> {
//!         Value::new(rng.next_int(0, 1000), None)
//!     }
//!
//!     fn shrink(&self, value: &i64, _context: Option<&Context>) -> Stream<'_, Value<i64>> {
//!         let value = *value;
//!         Stream::new((0..value).rev().map(|n| Value::new(n, None)))
//!     }
//! }
//!
//! let details = check(property(Small, |n: &i64| *n < 10), Parameters::new().seed(42)).unwrap();
//!
//! assert!(details.failed);
//! assert_eq!(details.counterexample.as_deref(), Some(&10));
//!
//! // Replaying the reported path reproduces the counterexample without a search
//! let path = details.counterexample_path.unwrap();
//! let replay = check(
//!     property(Small, |n: &i64| *n < 10),
//!     Parameters::new().seed(details.seed).path(path),
//! )
//! .unwrap();
//! assert_eq!(replay.counterexample.as_deref(), Some(&10));
//! assert_eq!(replay.num_shrinks, 0);
//! ```

pub mod arbitrary;
pub mod config;
pub mod decorators;
pub mod details;
pub mod error;
pub mod property;
pub mod random;
pub mod runner;
pub mod stream;
pub mod value;

#[cfg(test)]
mod test_support;

// Re-export the main public API
pub use arbitrary::Arbitrary;
pub use config::{
    ConfigError, DEFAULT_MAX_SKIPS_PER_RUN, DEFAULT_NUM_RUNS, GlobalConfig, Parameters,
    QualifiedParameters, RunSettings, Verbosity, qualify_seed,
};
pub use details::{
    AsyncReporter, ExecutionStatus, ExecutionTree, Reporter, RunDetails, default_report,
};
pub use error::{Outcome, PropertyError, PropertyFailure, pre};
pub use property::{
    AsyncPredicateProperty, AsyncProperty, PredicateOutput, PredicateProperty, Property,
    Pending, RawProperty, async_property, property, run_id_to_frequency,
};
pub use random::{JumpableRng, Random, RandomGenerator, RandomType, SkipN};
pub use runner::path::ReplayPath;
pub use runner::{Runner, assert, assert_async, check, check_async};
pub use stream::Stream;
pub use value::{Context, Value};
