//! Property wrappers applied from the run parameters.
//!
//! Every wrapper is always present and stays inert when its option is
//! unset, so a decorated property has one fixed type.

mod ignore_equal_values;
mod skip_after;
mod timeout;
mod unbiased;

pub use ignore_equal_values::{DedupMode, IgnoreEqualValuesProperty};
pub use skip_after::SkipAfterProperty;
pub use timeout::TimeoutProperty;
pub use unbiased::UnbiasedProperty;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures::future::{self, Either};
use futures::pin_mut;
use futures_timer::Delay;

use crate::config::QualifiedParameters;
use crate::error::Outcome;
use crate::property::Pending;

/// A property with every run-level wrapper applied, outermost first
pub type Decorated<P> = TimeoutProperty<
    UnbiasedProperty<
        SkipAfterProperty<SkipAfterProperty<IgnoreEqualValuesProperty<IgnoreEqualValuesProperty<P>>>>,
    >,
>;

/// Wrap `property` according to `params`.
///
/// From the outside in: timeout, unbiased generation, skip-all after the
/// time limit, interrupt after the time limit, then value deduplication
/// (skip mode outside strict mode).
pub fn decorate<T, P>(property: P, params: &QualifiedParameters<T>) -> Decorated<P> {
    let strict = IgnoreEqualValuesProperty::new(
        property,
        params.ignore_equal_values.then_some(DedupMode::Strict),
    );
    let skipping =
        IgnoreEqualValuesProperty::new(strict, params.skip_equal_values.then_some(DedupMode::Skip));
    let interrupting = SkipAfterProperty::new(skipping, params.interrupt_after_time_limit, true);
    let skipping_all = SkipAfterProperty::new(interrupting, params.skip_all_after_time_limit, false);
    let unbiased = UnbiasedProperty::new(skipping_all, params.unbiased);
    TimeoutProperty::new(unbiased, params.timeout)
}

/// Drive `run` until it settles or `limit` elapses, whichever comes first.
///
/// On expiry the unfinished run comes back as the error, still alive, so
/// the caller can keep driving it.
pub(crate) async fn within<F: Future>(run: F, limit: Duration) -> Result<F::Output, Pin<Box<F>>> {
    let mut run = Box::pin(run);
    let timer = Delay::new(limit);
    pin_mut!(timer);
    let settled = match future::select(run.as_mut(), timer).await {
        Either::Left((output, _)) => Some(output),
        Either::Right(_) => None,
    };
    settled.ok_or(run)
}

/// Finish an unfinished run, then whatever it left pending in turn
pub(crate) fn settle_later<'a, F>(unfinished: Pin<Box<F>>) -> Pending<'a>
where
    F: Future<Output = (Outcome, Option<Pending<'a>>)> + 'a,
{
    Box::pin(async move {
        let (_, pending) = unfinished.await;
        if let Some(pending) = pending {
            pending.await;
        }
    })
}

/// Await the leftovers of a run before handing back its outcome
pub(crate) async fn settle<'a>(run: impl Future<Output = (Outcome, Option<Pending<'a>>)>) -> Outcome {
    let (outcome, pending) = run.await;
    if let Some(pending) = pending {
        pending.await;
    }
    outcome
}
