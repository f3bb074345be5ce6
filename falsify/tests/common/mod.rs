//! Arbitraries shared by the integration tests

#![allow(dead_code)]

use falsify::{Arbitrary, Context, Random, Stream, Value};
use std::cell::RefCell;

/// Integers in `0..=max`, shrinking toward zero by halving the gap
#[derive(Debug, Clone, Copy)]
pub struct Naturals {
    pub max: u64,
}

pub fn naturals(max: u64) -> Naturals {
    Naturals { max }
}

impl Arbitrary<u64> for Naturals {
    fn generate(&self, rng: &mut Random, _bias: Option<u32>) -> Value<u64> {
        Value::new(rng.next_int(0, self.max as i64) as u64, None)
    }

    fn shrink(&self, value: &u64, _context: Option<&Context>) -> Stream<'_, Value<u64>> {
        shrink_natural(*value)
    }

    fn can_shrink_without_context(&self, value: &u64) -> bool {
        *value <= self.max
    }
}

pub fn shrink_natural(origin: u64) -> Stream<'static, Value<u64>> {
    let mut gap = origin;
    Stream::from_fn(move || {
        if gap == 0 {
            return None;
        }
        let candidate = origin - gap;
        gap /= 2;
        Some(Value::new(candidate, None))
    })
}

/// Pairs of naturals, shrinking the left side first
#[derive(Debug, Clone, Copy)]
pub struct Pairs {
    pub max: u64,
}

impl Arbitrary<(u64, u64)> for Pairs {
    fn generate(&self, rng: &mut Random, bias: Option<u32>) -> Value<(u64, u64)> {
        let left = naturals(self.max).generate(rng, bias);
        let right = naturals(self.max).generate(rng, bias);
        Value::new((**left.raw(), **right.raw()), None)
    }

    fn shrink(
        &self,
        value: &(u64, u64),
        _context: Option<&Context>,
    ) -> Stream<'_, Value<(u64, u64)>> {
        let (left, right) = *value;
        let lefts = shrink_natural(left).map(move |l| Value::new((**l.raw(), right), None));
        let rights = shrink_natural(right).map(move |r| Value::new((left, **r.raw()), None));
        lefts.join([rights])
    }
}

/// Two-element vectors behind a `RefCell`, cloned on every read and shrunk
/// by dropping the last element
#[derive(Debug, Clone, Copy)]
pub struct Cells;

impl Arbitrary<RefCell<Vec<u64>>> for Cells {
    fn generate(&self, rng: &mut Random, _bias: Option<u32>) -> Value<RefCell<Vec<u64>>> {
        let items = vec![rng.next_int(0, 100) as u64, rng.next_int(0, 100) as u64];
        Value::cloneable(RefCell::new(items), None)
    }

    fn shrink(
        &self,
        value: &RefCell<Vec<u64>>,
        _context: Option<&Context>,
    ) -> Stream<'_, Value<RefCell<Vec<u64>>>> {
        let items = value.borrow();
        if items.len() < 2 {
            return Stream::nil();
        }
        let shorter = items[..items.len() - 1].to_vec();
        Stream::of(vec![Value::cloneable(RefCell::new(shorter), None)])
    }
}
