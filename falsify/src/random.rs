//! Seeded, jumpable random sources.
//!
//! A run draws every generated input from its own independent generator:
//! the base generator is jumped once per input and a snapshot of it is
//! handed to the arbitrary. Jumping never draws from the base generator,
//! so replaying a seed reproduces the exact same inputs.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::{ChaCha8Rng, ChaCha12Rng, ChaCha20Rng};

use crate::config::ConfigError;

/// A generator able to move to a new, independent sub-sequence
pub trait JumpableRng: RngCore + Clone {
    fn jump(&mut self);
}

macro_rules! impl_chacha_jump {
    ($($rng:ty),*) => {
        $(
            impl JumpableRng for $rng {
                fn jump(&mut self) {
                    let stream = self.get_stream();
                    self.set_stream(stream.wrapping_add(1));
                }
            }
        )*
    };
}

impl_chacha_jump!(ChaCha8Rng, ChaCha12Rng, ChaCha20Rng);

/// Makes any cloneable generator jumpable by discarding a fixed number of
/// draws per jump.
#[derive(Debug, Clone)]
pub struct SkipN<R> {
    rng: R,
}

impl<R> SkipN<R> {
    pub const SKIPPED_DRAWS: usize = 42;

    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: RngCore> RngCore for SkipN<R> {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

impl<R: RngCore + Clone> JumpableRng for SkipN<R> {
    fn jump(&mut self) {
        for _ in 0..Self::SKIPPED_DRAWS {
            self.rng.next_u32();
        }
    }
}

/// Object-safe view of a [`JumpableRng`]
pub trait RandomGenerator: RngCore {
    fn jump(&mut self);
    fn clone_box(&self) -> Box<dyn RandomGenerator>;
}

impl<R: JumpableRng + 'static> RandomGenerator for R {
    fn jump(&mut self) {
        JumpableRng::jump(self)
    }

    fn clone_box(&self) -> Box<dyn RandomGenerator> {
        Box::new(self.clone())
    }
}

/// The random source handed to arbitraries
pub struct Random {
    generator: Box<dyn RandomGenerator>,
}

impl Random {
    pub fn new<G: RandomGenerator + 'static>(generator: G) -> Self {
        Self::from_boxed(Box::new(generator))
    }

    pub fn from_boxed(generator: Box<dyn RandomGenerator>) -> Self {
        Self { generator }
    }

    /// Move to the next independent sub-sequence
    pub fn jump(&mut self) {
        self.generator.jump()
    }

    /// The `bits` high-order bits of the next draw (`bits` is capped at 32)
    pub fn next_bits(&mut self, bits: u32) -> u32 {
        match bits.min(32) {
            0 => 0,
            bits => self.next_u32() >> (32 - bits),
        }
    }

    pub fn next_boolean(&mut self) -> bool {
        self.next_bits(1) == 1
    }

    /// Uniform integer in `min..=max`.
    ///
    /// # Panics
    ///
    /// Panics if `min > max`. See [`Random::try_next_int`].
    pub fn next_int(&mut self, min: i64, max: i64) -> i64 {
        assert!(min <= max, "next_int called with min={} > max={}", min, max);
        self.gen_range(min..=max)
    }

    pub fn try_next_int(&mut self, min: i64, max: i64) -> Result<i64, ConfigError> {
        if min > max {
            return Err(ConfigError::InvalidRandomBounds { min, max });
        }
        Ok(self.gen_range(min..=max))
    }

    /// Uniform double in `[0, 1)` with 53 bits of precision
    pub fn next_double(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

impl Clone for Random {
    fn clone(&self) -> Self {
        Self {
            generator: self.generator.clone_box(),
        }
    }
}

impl RngCore for Random {
    fn next_u32(&mut self) -> u32 {
        self.generator.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.generator.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.generator.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.generator.try_fill_bytes(dest)
    }
}

impl fmt::Debug for Random {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Random").finish_non_exhaustive()
    }
}

type GeneratorFactory = Arc<dyn Fn(i32) -> Box<dyn RandomGenerator> + Send + Sync>;

/// Which generator family seeds a run
#[derive(Clone, Default)]
pub enum RandomType {
    #[default]
    ChaCha8,
    ChaCha12,
    ChaCha20,
    /// `rand`'s standard generator, jumped by skipping draws
    Std,
    Custom(GeneratorFactory),
}

impl RandomType {
    /// A user-supplied factory from a 32-bit seed
    pub fn custom<F>(factory: F) -> Self
    where
        F: Fn(i32) -> Box<dyn RandomGenerator> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(factory))
    }

    /// Any seedable generator, made jumpable through [`SkipN`]
    pub fn seedable<R>() -> Self
    where
        R: SeedableRng + RngCore + Clone + 'static,
    {
        Self::custom(|seed| Box::new(SkipN::new(R::seed_from_u64(seed_to_u64(seed)))))
    }

    /// A seedable generator with a native jump
    pub fn jumpable<R>() -> Self
    where
        R: SeedableRng + JumpableRng + 'static,
    {
        Self::custom(|seed| Box::new(R::seed_from_u64(seed_to_u64(seed))))
    }

    pub fn create(&self, seed: i32) -> Random {
        let seed64 = seed_to_u64(seed);
        match self {
            Self::ChaCha8 => Random::new(ChaCha8Rng::seed_from_u64(seed64)),
            Self::ChaCha12 => Random::new(ChaCha12Rng::seed_from_u64(seed64)),
            Self::ChaCha20 => Random::new(ChaCha20Rng::seed_from_u64(seed64)),
            Self::Std => Random::new(SkipN::new(StdRng::seed_from_u64(seed64))),
            Self::Custom(factory) => Random::from_boxed(factory(seed)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ChaCha8 => "chacha8",
            Self::ChaCha12 => "chacha12",
            Self::ChaCha20 => "chacha20",
            Self::Std => "std",
            Self::Custom(_) => "custom",
        }
    }
}

fn seed_to_u64(seed: i32) -> u64 {
    u64::from(seed as u32)
}

impl FromStr for RandomType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chacha8" => Ok(Self::ChaCha8),
            "chacha12" => Ok(Self::ChaCha12),
            "chacha20" => Ok(Self::ChaCha20),
            "std" => Ok(Self::Std),
            _ => Err(ConfigError::UnknownRandomType(s.to_string())),
        }
    }
}

impl fmt::Debug for RandomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for RandomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draws(rng: &mut Random, n: usize) -> Vec<u32> {
        (0..n).map(|_| rng.next_u32()).collect()
    }

    #[test]
    fn test_same_seed_same_sequence() {
        for random_type in [RandomType::ChaCha8, RandomType::ChaCha20, RandomType::Std] {
            let mut a = random_type.create(42);
            let mut b = random_type.create(42);
            assert_eq!(draws(&mut a, 16), draws(&mut b, 16), "{}", random_type);
        }
    }

    #[test]
    fn test_negative_seeds_are_distinct() {
        let mut a = RandomType::ChaCha8.create(-1);
        let mut b = RandomType::ChaCha8.create(1);
        assert_ne!(draws(&mut a, 4), draws(&mut b, 4));
    }

    #[test]
    fn test_jump_moves_to_new_sequence() {
        let mut base = RandomType::ChaCha8.create(7);
        let mut snapshot = base.clone();
        base.jump();
        let mut jumped = base.clone();
        let jumped_draws = draws(&mut jumped, 8);

        assert_ne!(draws(&mut snapshot, 8), jumped_draws);
        // drawing from a snapshot leaves the base untouched
        assert_eq!(draws(&mut base.clone(), 8), jumped_draws);
    }

    #[test]
    fn test_skip_n_jump_discards_draws() {
        let mut plain = SkipN::new(StdRng::seed_from_u64(3));
        let mut jumped = plain.clone();
        JumpableRng::jump(&mut jumped);

        for _ in 0..SkipN::<StdRng>::SKIPPED_DRAWS {
            plain.next_u32();
        }
        assert_eq!(plain.next_u32(), jumped.next_u32());
    }

    #[test]
    fn test_next_int_bounds() {
        let mut rng = RandomType::ChaCha8.create(0);
        for _ in 0..1000 {
            let n = rng.next_int(-3, 3);
            assert!((-3..=3).contains(&n));
        }
        assert_eq!(rng.next_int(5, 5), 5);
        assert!(matches!(
            rng.try_next_int(2, 1),
            Err(ConfigError::InvalidRandomBounds { min: 2, max: 1 })
        ));
    }

    #[test]
    #[should_panic(expected = "min=4 > max=1")]
    fn test_next_int_rejects_inverted_bounds() {
        RandomType::ChaCha8.create(0).next_int(4, 1);
    }

    #[test]
    fn test_next_bits_and_double() {
        let mut rng = RandomType::ChaCha12.create(11);
        for _ in 0..1000 {
            assert!(rng.next_bits(3) < 8);
            let d = rng.next_double();
            assert!((0.0..1.0).contains(&d));
        }
        assert_eq!(rng.next_bits(0), 0);
    }

    #[test]
    fn test_custom_random_types() {
        let seedable = RandomType::seedable::<ChaCha8Rng>();
        let mut a = seedable.create(9);
        let mut b = seedable.create(9);
        assert_eq!(draws(&mut a, 4), draws(&mut b, 4));

        let jumpable = RandomType::jumpable::<ChaCha20Rng>();
        let mut c = jumpable.create(9);
        let mut d = RandomType::ChaCha20.create(9);
        assert_eq!(draws(&mut c, 4), draws(&mut d, 4));
        assert_eq!(jumpable.name(), "custom");
    }

    #[test]
    fn test_random_type_from_str() {
        assert_eq!("ChaCha20".parse::<RandomType>().unwrap().name(), "chacha20");
        assert_eq!("std".parse::<RandomType>().unwrap().name(), "std");
        assert!(matches!(
            "mersenne".parse::<RandomType>(),
            Err(ConfigError::UnknownRandomType(name)) if name == "mersenne"
        ));
    }
}
