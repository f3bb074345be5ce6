//! The contract between the runner and value producers.

use crate::random::Random;
use crate::stream::Stream;
use crate::value::{Context, Value};

/// Produces values of type `T` and knows how to shrink them.
///
/// `bias_frequency` is `None` for unbiased generation. Otherwise an
/// implementation should favor edge cases about once every
/// `bias_frequency` draws.
///
/// # Example
///
/// ```rust
/// use falsify::{Arbitrary, Random, Stream, Value, Context};
///
/// struct Digits;
///
/// impl Arbitrary<u8> for Digits {
///     fn generate(&self, rng: &mut Random, _bias: Option<u32>) -> Value<u8> {
///         Value::new(rng.next_int(0, 9) as u8, None)
///     }
///
///     fn shrink(&self, value: &u8, _context: Option<&Context>) -> Stream<'_, Value<u8>> {
///         Stream::new((0..*value).map(|smaller| Value::new(smaller, None)))
///     }
///
///     fn can_shrink_without_context(&self, value: &u8) -> bool {
///         *value <= 9
///     }
/// }
/// ```
pub trait Arbitrary<T> {
    fn generate(&self, rng: &mut Random, bias_frequency: Option<u32>) -> Value<T>;

    /// Strictly simpler candidates, most promising first
    fn shrink(&self, value: &T, context: Option<&Context>) -> Stream<'_, Value<T>>;

    /// Whether `value`, not produced by this arbitrary, can still be
    /// shrunk by it
    fn can_shrink_without_context(&self, _value: &T) -> bool {
        false
    }
}

impl<T, A: Arbitrary<T> + ?Sized> Arbitrary<T> for &A {
    fn generate(&self, rng: &mut Random, bias_frequency: Option<u32>) -> Value<T> {
        (**self).generate(rng, bias_frequency)
    }

    fn shrink(&self, value: &T, context: Option<&Context>) -> Stream<'_, Value<T>> {
        (**self).shrink(value, context)
    }

    fn can_shrink_without_context(&self, value: &T) -> bool {
        (**self).can_shrink_without_context(value)
    }
}

impl<T, A: Arbitrary<T> + ?Sized> Arbitrary<T> for Box<A> {
    fn generate(&self, rng: &mut Random, bias_frequency: Option<u32>) -> Value<T> {
        (**self).generate(rng, bias_frequency)
    }

    fn shrink(&self, value: &T, context: Option<&Context>) -> Stream<'_, Value<T>> {
        (**self).shrink(value, context)
    }

    fn can_shrink_without_context(&self, value: &T) -> bool {
        (**self).can_shrink_without_context(value)
    }
}
