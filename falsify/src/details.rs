//! What a run reports back, and how it is rendered.

use std::fmt::{self, Write as _};
use std::rc::Rc;

use futures::future::LocalBoxFuture;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{QualifiedParameters, Verbosity};
use crate::error::PropertyFailure;

/// Custom sink for the details of a run, replacing the default panic of
/// `assert`
pub type Reporter<T> = Rc<dyn Fn(&RunDetails<T>)>;

/// Asynchronous counterpart of [`Reporter`], only usable with async
/// properties
pub type AsyncReporter<T> = Rc<dyn Fn(&RunDetails<T>) -> LocalBoxFuture<'static, ()>>;

/// Status of one predicate execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExecutionStatus {
    Success,
    Skipped,
    Failure,
}

impl ExecutionStatus {
    fn symbol(self) -> char {
        match self {
            Self::Success => '\u{221A}',
            Self::Skipped => '!',
            Self::Failure => '\u{00D7}',
        }
    }
}

/// One recorded execution. Children are the runs made while shrinking
/// this input.
#[derive(Debug, Clone)]
pub struct ExecutionTree<T> {
    pub status: ExecutionStatus,
    pub value: Rc<T>,
    pub children: Vec<ExecutionTree<T>>,
}

impl<T> ExecutionTree<T> {
    pub fn new(status: ExecutionStatus, value: Rc<T>) -> Self {
        Self {
            status,
            value,
            children: Vec::new(),
        }
    }
}

/// Outcome of a whole `check`
#[derive(Debug)]
pub struct RunDetails<T> {
    pub failed: bool,
    /// The run stopped early because of a time limit or an interrupt
    pub interrupted: bool,
    /// Accepted runs before the first failure (or in total when none)
    pub num_runs: usize,
    pub num_skips: usize,
    /// Successful shrink steps from the first failure to the counterexample
    pub num_shrinks: usize,
    pub seed: i32,
    pub counterexample: Option<Rc<T>>,
    /// Colon-separated replay path of the counterexample
    pub counterexample_path: Option<String>,
    pub error: Option<String>,
    pub error_instance: Option<PropertyFailure>,
    /// Every failing value met along the shrink path, when verbose
    pub failures: Vec<Rc<T>>,
    pub execution_summary: Vec<ExecutionTree<T>>,
    pub verbosity: Verbosity,
    pub run_configuration: QualifiedParameters<T>,
}

impl<T> RunDetails<T> {
    pub fn is_success(&self) -> bool {
        !self.failed
    }
}

impl<T: fmt::Debug> RunDetails<T> {
    /// The default failure report, `None` when the run passed
    pub fn report(&self) -> Option<String> {
        default_report(self)
    }
}

/// Render the message `assert` panics with
pub fn default_report<T: fmt::Debug>(details: &RunDetails<T>) -> Option<String> {
    if !details.failed {
        return None;
    }

    let mut report = match (&details.counterexample, &details.counterexample_path) {
        (Some(counterexample), Some(path)) => format!(
            "Property failed after {} tests\n{{ seed: {}, path: \"{}\", end_on_failure: true }}\n\
             Counterexample: {:?}\nShrunk {} time(s)\nGot error: {}",
            details.num_runs,
            details.seed,
            path,
            counterexample,
            details.num_shrinks,
            details.error.as_deref().unwrap_or("unknown error"),
        ),
        _ if details.interrupted => format!(
            "Property interrupted after {} tests\n{{ seed: {} }}",
            details.num_runs, details.seed,
        ),
        _ => format!(
            "Failed to run property, too many pre-condition failures encountered\n\
             {{ seed: {} }}\n\nRan {} time(s)\nSkipped {} time(s)",
            details.seed, details.num_runs, details.num_skips,
        ),
    };

    if details.verbosity >= Verbosity::Verbose && !details.failures.is_empty() {
        report.push_str("\n\nEncountered failures were:");
        for failure in &details.failures {
            let _ = write!(report, "\n- {:?}", failure);
        }
    }

    if details.verbosity >= Verbosity::VeryVerbose && !details.execution_summary.is_empty() {
        report.push_str("\n\nExecution summary:");
        write_summary(&mut report, &details.execution_summary, 0);
    }

    Some(report)
}

fn write_summary<T: fmt::Debug>(out: &mut String, trees: &[ExecutionTree<T>], depth: usize) {
    for tree in trees {
        let _ = write!(
            out,
            "\n{}{} {:?}",
            ". ".repeat(depth),
            tree.status.symbol(),
            tree.value
        );
        write_summary(out, &tree.children, depth + 1);
    }
}
