//! Real multiplexer.
//!
//! Inputs are reals in `[0, 1)`; each is read as the bit `x > 0.5`. The
//! first `address_bits` inputs address one of the `2^address_bits` register
//! inputs, whose bit is the correct action.

use lcs_core::Xcs;
use lcs_stats::running::WindowedMean;
use rand::Rng;
use tracing::info;

const THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RealMultiplexer {
    address_bits: usize,
}

impl RealMultiplexer {
    pub(crate) fn new(address_bits: usize) -> Self {
        Self { address_bits }
    }

    pub(crate) fn x_dim(self) -> usize {
        self.address_bits + (1 << self.address_bits)
    }

    pub(crate) fn sample<R>(self, rng: &mut R) -> Vec<f64>
    where
        R: Rng + ?Sized,
    {
        (0..self.x_dim()).map(|_| rng.random::<f64>()).collect()
    }

    /// The correct action for `x`.
    pub(crate) fn answer(self, x: &[f64]) -> usize {
        let register = x[..self.address_bits]
            .iter()
            .fold(0, |acc, &v| (acc << 1) | usize::from(v > THRESHOLD));
        usize::from(x[self.address_bits + register] > THRESHOLD)
    }

    pub(crate) fn reward(self, x: &[f64], action: usize) -> f64 {
        if action == self.answer(x) { 1.0 } else { 0.0 }
    }

    /// Alternates explore and exploit trials for `trials` trials.
    ///
    /// Logs the exploit accuracy every `perf_trials` exploit trials and
    /// returns the accuracy over the last full window, if one completed.
    pub(crate) fn train<R>(
        self,
        xcs: &mut Xcs,
        trials: u64,
        perf_trials: u64,
        rng: &mut R,
    ) -> anyhow::Result<Option<f64>>
    where
        R: Rng + ?Sized,
    {
        let window = usize::try_from(perf_trials.max(1)).unwrap_or(usize::MAX);
        let mut accuracy = WindowedMean::new(window);
        let mut last = None;
        for trial in 0..trials {
            let x = self.sample(rng);
            let explore = trial % 2 == 0;
            let action = xcs.decide(&x, explore)?;
            let reward = self.reward(&x, action);
            if explore {
                xcs.reinforce(reward)?;
            } else if let Some(mean) = accuracy.push(reward) {
                info!(
                    trials = xcs.time(),
                    accuracy = mean,
                    size = xcs.population_size(),
                    system_error = xcs.system_error(),
                    "performance"
                );
                last = Some(mean);
            }
            xcs.end_trial()?;
        }
        Ok(last)
    }

    /// Fraction of `n` random inputs answered correctly by exploitation.
    #[expect(clippy::cast_precision_loss)]
    pub(crate) fn evaluate<R>(self, xcs: &mut Xcs, n: usize, rng: &mut R) -> anyhow::Result<f64>
    where
        R: Rng + ?Sized,
    {
        if n == 0 {
            return Ok(0.0);
        }
        let mut correct = 0_u32;
        for _ in 0..n {
            let x = self.sample(rng);
            let action = xcs.decide(&x, false)?;
            xcs.end_trial()?;
            if action == self.answer(&x) {
                correct += 1;
            }
        }
        Ok(f64::from(correct) / n as f64)
    }
}

#[cfg(test)]
mod tests {
    use lcs_core::{LcsSeed, Params};
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::problem::Problem;

    #[test]
    fn test_six_multiplexer_answers() {
        let mux = RealMultiplexer::new(2);
        assert_eq!(mux.x_dim(), 6);
        // address 00 reads register 0
        assert_eq!(mux.answer(&[0.1, 0.2, 0.9, 0.0, 0.0, 0.0]), 1);
        // address 10 reads register 2
        assert_eq!(mux.answer(&[0.7, 0.2, 0.9, 0.9, 0.1, 0.9]), 0);
        // address 11 reads register 3
        assert_eq!(mux.answer(&[0.7, 0.6, 0.0, 0.0, 0.0, 0.8]), 1);
    }

    #[test]
    fn test_reward() {
        let mux = RealMultiplexer::new(1);
        let x = [0.9, 0.1, 0.8];
        assert_eq!(mux.reward(&x, 1), 1.0);
        assert_eq!(mux.reward(&x, 0), 0.0);
    }

    #[test]
    fn test_train_reports_window_accuracy() {
        let mux = RealMultiplexer::new(1);
        let mut params = Params::default();
        params.general.pop_size = 100;
        let dims = Problem::Rmux { address_bits: 1 }.dims();
        let mut xcs = Xcs::new(dims, params, LcsSeed::from_u128(5));
        let mut rng = Pcg32::seed_from_u64(5);

        // 10 exploit trials never fill a window of 50
        assert_eq!(mux.train(&mut xcs, 20, 50, &mut rng).unwrap(), None);

        let accuracy = mux.train(&mut xcs, 200, 50, &mut rng).unwrap().unwrap();
        assert!((0.0..=1.0).contains(&accuracy));
        assert_eq!(xcs.population().kill_set().count(), 0);
    }
}
