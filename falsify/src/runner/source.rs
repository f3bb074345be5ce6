use crate::runner::tosser::LazyValue;
use crate::stream::Stream;
use crate::value::Value;

/// Pulls candidates under an accept budget and a skip budget.
///
/// Every pull consumes one accept. A skip reported through
/// [`SourceValuesIterator::skipped_one`] gives the accept back and consumes
/// a skip instead. An accept budget of `-1` means unbounded.
pub struct SourceValuesIterator<'a, T> {
    initial_values: Stream<'a, LazyValue<'a, T>>,
    remaining_accepts: i64,
    remaining_skips: i64,
    exhausted: bool,
}

impl<'a, T: 'a> SourceValuesIterator<'a, T> {
    pub fn new(
        initial_values: Stream<'a, LazyValue<'a, T>>,
        max_initial_iterations: i64,
        remaining_skips: i64,
    ) -> Self {
        Self {
            initial_values,
            remaining_accepts: max_initial_iterations,
            remaining_skips,
            exhausted: false,
        }
    }

    pub fn skipped_one(&mut self) {
        self.remaining_skips -= 1;
        self.remaining_accepts += 1;
    }
}

impl<'a, T: 'a> Iterator for SourceValuesIterator<'a, T> {
    type Item = Value<T>;

    fn next(&mut self) -> Option<Value<T>> {
        if self.exhausted {
            return None;
        }
        self.remaining_accepts -= 1;
        if self.remaining_accepts != -1 && self.remaining_skips >= 0 {
            if let Some(lazy) = self.initial_values.next() {
                return Some(lazy.force());
            }
        }
        self.exhausted = true;
        None
    }
}
