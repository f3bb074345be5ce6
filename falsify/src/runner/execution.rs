use std::rc::Rc;

use crate::config::{QualifiedParameters, Verbosity};
use crate::details::{ExecutionStatus, ExecutionTree, RunDetails};
use crate::error::PropertyFailure;
use crate::runner::path::ReplayPath;

/// The deepest failure reached so far and how to get back to it
struct FailureState<T> {
    path: Vec<usize>,
    value: Rc<T>,
    failure: PropertyFailure,
}

/// Accumulates the outcomes of a run into [`RunDetails`].
///
/// Successes and skips are only counted until the first failure: after it,
/// every run belongs to the shrink search.
pub struct RunExecution<T> {
    verbosity: Verbosity,
    mark_interrupt_as_failure: bool,
    root_execution_trees: Vec<ExecutionTree<T>>,
    /// Indices leading from the roots to the failure node being shrunk
    current_level: Vec<usize>,
    failure: Option<FailureState<T>>,
    num_skips: usize,
    num_successes: usize,
    interrupted: bool,
}

impl<T> RunExecution<T> {
    pub fn new(verbosity: Verbosity, mark_interrupt_as_failure: bool) -> Self {
        Self {
            verbosity,
            mark_interrupt_as_failure,
            root_execution_trees: Vec::new(),
            current_level: Vec::new(),
            failure: None,
            num_skips: 0,
            num_successes: 0,
            interrupted: false,
        }
    }

    fn current_level_mut(&mut self) -> &mut Vec<ExecutionTree<T>> {
        let mut level = &mut self.root_execution_trees;
        for &index in &self.current_level {
            level = &mut level[index].children;
        }
        level
    }

    fn record(&mut self, status: ExecutionStatus, value: Rc<T>) -> usize {
        let level = self.current_level_mut();
        level.push(ExecutionTree::new(status, value));
        level.len() - 1
    }

    /// Record a failure of the candidate at `index` in the active sequence
    pub fn fail(&mut self, value: Rc<T>, index: usize, failure: PropertyFailure) {
        if self.verbosity >= Verbosity::Verbose {
            let node = self.record(ExecutionStatus::Failure, Rc::clone(&value));
            self.current_level.push(node);
        }
        match &mut self.failure {
            Some(state) => {
                state.path.push(index);
                state.value = value;
                state.failure = failure;
            }
            None => {
                self.failure = Some(FailureState {
                    path: vec![index],
                    value,
                    failure,
                })
            }
        }
    }

    pub fn skip(&mut self, value: Rc<T>) {
        if self.verbosity >= Verbosity::VeryVerbose {
            self.record(ExecutionStatus::Skipped, value);
        }
        if self.failure.is_none() {
            self.num_skips += 1;
        }
    }

    pub fn success(&mut self, value: Rc<T>) {
        if self.verbosity >= Verbosity::VeryVerbose {
            self.record(ExecutionStatus::Success, value);
        }
        if self.failure.is_none() {
            self.num_successes += 1;
        }
    }

    pub fn interrupt(&mut self) {
        self.interrupted = true;
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Depth of the shrink search, 0 before any failure
    pub fn depth(&self) -> usize {
        self.failure.as_ref().map_or(0, |state| state.path.len())
    }

    /// The values of the failure chain, outermost first
    fn extract_failures(&self) -> Vec<Rc<T>> {
        let mut failures = Vec::new();
        let mut cursor = &self.root_execution_trees;
        while let Some(last) = cursor.last() {
            if last.status != ExecutionStatus::Failure {
                break;
            }
            failures.push(Rc::clone(&last.value));
            cursor = &last.children;
        }
        failures
    }

    pub fn to_run_details(
        self,
        seed: i32,
        base_path: &ReplayPath,
        max_skips: usize,
        run_configuration: QualifiedParameters<T>,
    ) -> RunDetails<T> {
        let failures = self.extract_failures();
        let Some(state) = self.failure else {
            let interrupt_fails = self.mark_interrupt_as_failure || self.num_successes == 0;
            return RunDetails {
                failed: self.num_skips > max_skips || (self.interrupted && interrupt_fails),
                interrupted: self.interrupted,
                num_runs: self.num_successes,
                num_skips: self.num_skips,
                num_shrinks: 0,
                seed,
                counterexample: None,
                counterexample_path: None,
                error: None,
                error_instance: None,
                failures,
                execution_summary: self.root_execution_trees,
                verbosity: self.verbosity,
                run_configuration,
            };
        };

        let first = state.path[0];
        RunDetails {
            failed: true,
            interrupted: self.interrupted,
            num_runs: (first + 1).saturating_sub(self.num_skips),
            num_skips: self.num_skips,
            num_shrinks: state.path.len() - 1,
            seed,
            counterexample: Some(state.value),
            counterexample_path: Some(base_path.merge(&state.path).to_string()),
            error: Some(state.failure.message.clone()),
            error_instance: Some(state.failure),
            failures,
            execution_summary: self.root_execution_trees,
            verbosity: self.verbosity,
            run_configuration,
        }
    }
}
