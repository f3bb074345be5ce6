//! Small arbitraries shared by the unit tests.

use std::rc::Rc;

use crate::arbitrary::Arbitrary;
use crate::random::Random;
use crate::stream::Stream;
use crate::value::{Context, Value};

/// Context attached to every value `Naturals` produces: the value it was
/// shrunk from, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShrunkFrom(pub Option<u64>);

/// Integers in `0..=max`, shrinking toward zero by halving the gap
#[derive(Debug, Clone)]
pub struct Naturals {
    pub max: u64,
    pub context_free: bool,
}

impl Naturals {
    pub fn up_to(max: u64) -> Self {
        Self {
            max,
            context_free: true,
        }
    }

    pub fn context_bound(max: u64) -> Self {
        Self {
            max,
            context_free: false,
        }
    }
}

pub fn shrink_towards_zero(value: u64) -> impl Iterator<Item = u64> {
    let mut gap = value;
    std::iter::from_fn(move || {
        if gap == 0 {
            return None;
        }
        let candidate = value - gap;
        gap /= 2;
        Some(candidate)
    })
}

impl Arbitrary<u64> for Naturals {
    fn generate(&self, rng: &mut Random, _bias_frequency: Option<u32>) -> Value<u64> {
        let value = rng.next_int(0, self.max as i64) as u64;
        Value::new(value, Some(Rc::new(ShrunkFrom(None))))
    }

    fn shrink(&self, value: &u64, _context: Option<&Context>) -> Stream<'_, Value<u64>> {
        let origin = *value;
        Stream::new(
            shrink_towards_zero(origin)
                .map(move |candidate| Value::new(candidate, Some(Rc::new(ShrunkFrom(Some(origin)))))),
        )
    }

    fn can_shrink_without_context(&self, value: &u64) -> bool {
        self.context_free && *value <= self.max
    }
}

#[test]
fn test_shrink_towards_zero_halves_the_gap() {
    let candidates: Vec<_> = shrink_towards_zero(150).collect();
    assert_eq!(candidates, vec![0, 75, 113, 132, 141, 146, 148, 149]);
    assert_eq!(shrink_towards_zero(1).collect::<Vec<_>>(), vec![0]);
    assert_eq!(shrink_towards_zero(0).count(), 0);
}
