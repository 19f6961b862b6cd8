use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::time::Duration;

/// Struct that samples the time between events of a Poisson process.
pub struct Poisson<R: Rng + ?Sized> {
    pub rng: Box<R>,
    pub rate: f64,
}

impl Poisson<SmallRng> {
    pub fn new(rate: f64, seed: u64) -> Self {
        Self {
            rng: Box::new(SmallRng::seed_from_u64(seed)),
            rate,
        }
    }

    /// Function that returns an exponentially distributed time, in seconds.
    pub fn time_for_next_event(&mut self) -> f64 {
        (1.0f64 / (1.0 - self.rng.random::<f64>())).ln() / self.rate
    }

    /// Function that samples a duration no longer than `cap`.
    pub fn capped_duration(&mut self, cap: Duration) -> Duration {
        Duration::from_secs_f64(self.time_for_next_event().min(cap.as_secs_f64()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_are_non_negative_and_capped() {
        let mut poisson = Poisson::new(2.0, 42);
        let cap = Duration::from_millis(300);
        for _ in 0..1000 {
            assert!(poisson.time_for_next_event() >= 0.0);
            assert!(poisson.capped_duration(cap) <= cap);
        }
    }

    #[test]
    fn mean_follows_rate() {
        let mut poisson = Poisson::new(4.0, 7);
        let n = 20_000;
        let mean = (0..n).map(|_| poisson.time_for_next_event()).sum::<f64>() / n as f64;
        assert!((mean - 0.25).abs() < 0.02, "mean was {mean}");
    }

    #[test]
    fn same_seed_same_samples() {
        let mut a = Poisson::new(1.0, 3);
        let mut b = Poisson::new(1.0, 3);
        for _ in 0..10 {
            assert_eq!(a.time_for_next_event(), b.time_for_next_event());
        }
    }
}
