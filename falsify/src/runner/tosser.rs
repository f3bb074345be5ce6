use std::fmt;
use std::rc::Rc;

use crate::property::RawProperty;
use crate::random::{Random, RandomType};
use crate::stream::Stream;
use crate::value::Value;

/// A value that is only produced when forced
pub struct LazyValue<'a, T> {
    produce: Box<dyn FnOnce() -> Value<T> + 'a>,
}

impl<'a, T: 'a> LazyValue<'a, T> {
    pub fn new(produce: impl FnOnce() -> Value<T> + 'a) -> Self {
        Self {
            produce: Box::new(produce),
        }
    }

    /// An already produced value
    pub fn ready(value: Value<T>) -> Self {
        Self::new(move || value)
    }

    pub fn force(self) -> Value<T> {
        (self.produce)()
    }
}

impl<T> fmt::Debug for LazyValue<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyValue").finish_non_exhaustive()
    }
}

/// The infinite stream of candidate inputs for a seed.
///
/// User examples come first, unchanged and without context. Then comes one
/// generated value per run id: the base generator is jumped, and the
/// arbitrary draws from a snapshot of it when the value is forced.
pub fn toss<'a, T: 'a, P>(
    property: &'a P,
    seed: i32,
    random_type: &RandomType,
    examples: &[Rc<T>],
) -> Stream<'a, LazyValue<'a, T>>
where
    P: RawProperty<T>,
{
    let provided: Vec<LazyValue<'a, T>> = examples
        .iter()
        .map(|example| LazyValue::ready(Value::from_rc(Rc::clone(example), None)))
        .collect();

    let mut rng = random_type.create(seed);
    let mut run_id: u32 = 0;
    let generated = Stream::from_fn(move || {
        rng.jump();
        let mut snapshot: Random = rng.clone();
        let id = run_id;
        run_id = run_id.wrapping_add(1);
        Some(LazyValue::new(move || property.generate(&mut snapshot, Some(id))))
    });

    Stream::of(provided).join([generated])
}
