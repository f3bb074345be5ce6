use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::config::Verbosity;
use crate::error::Outcome;
use crate::runner::execution::RunExecution;
use crate::runner::source::SourceValuesIterator;
use crate::stream::Stream;
use crate::value::Value;

/// Drives the depth-first shrink search.
///
/// Yields candidates from the source until one fails, then from the shrinks
/// of the last failing value. Only the first failing shrink at each level is
/// pursued. Each yielded input must be answered with
/// [`RunnerIterator::handle_result`] before pulling the next one.
pub struct RunnerIterator<'a, T, S> {
    source_values: SourceValuesIterator<'a, T>,
    shrink: S,
    /// Shrinks of the last failure, once the search has started
    shrinks: Option<Stream<'a, Value<T>>>,
    current: Option<(usize, Value<T>)>,
    next_index: usize,
    run_execution: RunExecution<T>,
}

impl<'a, T: 'a, S> RunnerIterator<'a, T, S>
where
    S: Fn(&Value<T>) -> Stream<'a, Value<T>>,
{
    pub fn new(
        source_values: SourceValuesIterator<'a, T>,
        shrink: S,
        verbosity: Verbosity,
        mark_interrupt_as_failure: bool,
    ) -> Self {
        Self {
            source_values,
            shrink,
            shrinks: None,
            current: None,
            next_index: 0,
            run_execution: RunExecution::new(verbosity, mark_interrupt_as_failure),
        }
    }

    pub fn handle_result(&mut self, outcome: Outcome) {
        let Some((index, value)) = self.current.take() else {
            return;
        };
        match outcome {
            Outcome::Success => {
                trace!(index, "candidate passed");
                self.run_execution.success(Rc::clone(value.raw()));
            }
            Outcome::Skip { interrupt: false } => {
                trace!(index, "candidate skipped");
                self.run_execution.skip(Rc::clone(value.raw()));
                self.source_values.skipped_one();
            }
            Outcome::Skip { interrupt: true } => {
                warn!(index, "run interrupted");
                self.run_execution.interrupt();
            }
            Outcome::Failure(failure) => {
                trace!(index, error = %failure.message, "candidate failed");
                self.run_execution
                    .fail(Rc::clone(value.raw()), index, failure);
                debug!(
                    depth = self.run_execution.depth(),
                    index, "shrinking failing candidate"
                );
                self.shrinks = Some((self.shrink)(&value));
                self.next_index = 0;
            }
        }
    }

    pub fn into_execution(self) -> RunExecution<T> {
        self.run_execution
    }
}

impl<'a, T: 'a, S> Iterator for RunnerIterator<'a, T, S>
where
    S: Fn(&Value<T>) -> Stream<'a, Value<T>>,
{
    type Item = Rc<T>;

    fn next(&mut self) -> Option<Rc<T>> {
        if self.run_execution.is_interrupted() {
            return None;
        }
        let value = match &mut self.shrinks {
            Some(shrinks) => shrinks.next(),
            None => self.source_values.next(),
        }?;
        let index = self.next_index;
        self.next_index += 1;
        // the first read is kept for reporting and shrinking, the predicate
        // gets a fresh copy it is free to mutate
        value.value();
        let input = value.value();
        self.current = Some((index, value));
        Some(input)
    }
}
