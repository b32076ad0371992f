/*!
 * Simulated Latency
 * Random pause before each monitor call
 */

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Uniform random delay in `[0, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    max: Duration,
}

impl Latency {
    /// No delay at all (test double)
    pub const fn none() -> Self {
        Self {
            max: Duration::ZERO,
        }
    }

    pub const fn up_to(max: Duration) -> Self {
        Self { max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max.is_zero() {
            return Duration::ZERO;
        }
        let micros = u64::try_from(self.max.as_micros()).unwrap_or(u64::MAX);
        Duration::from_micros(rng.gen_range(0..=micros))
    }

    /// Sleep for one sampled delay
    pub fn pause<R: Rng + ?Sized>(&self, rng: &mut R) {
        let delay = self.sample(rng);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

impl Default for Latency {
    fn default() -> Self {
        Self::up_to(crate::core::limits::DEFAULT_MAX_LATENCY)
    }
}

/// Per-actor generator: deterministic when a run seed is given
pub fn actor_rng(seed: Option<u64>, salt: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(salt)),
        None => StdRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_never_sleeps() {
        let mut rng = actor_rng(Some(1), 0);
        for _ in 0..10 {
            assert_eq!(Latency::none().sample(&mut rng), Duration::ZERO);
        }
    }

    #[test]
    fn test_sample_within_bound() {
        let latency = Latency::up_to(Duration::from_millis(5));
        let mut rng = actor_rng(Some(42), 3);
        for _ in 0..100 {
            assert!(latency.sample(&mut rng) <= Duration::from_millis(5));
        }
    }

    #[test]
    fn test_huge_bound_saturates() {
        let latency = Latency::up_to(Duration::MAX);
        let mut rng = actor_rng(Some(5), 0);
        for _ in 0..10 {
            assert!(latency.sample(&mut rng) <= Duration::from_micros(u64::MAX));
        }
    }

    #[test]
    fn test_seeded_rng_repeats() {
        let latency = Latency::up_to(Duration::from_secs(1));
        let a = latency.sample(&mut actor_rng(Some(7), 1));
        let b = latency.sample(&mut actor_rng(Some(7), 1));
        assert_eq!(a, b);
    }
}
