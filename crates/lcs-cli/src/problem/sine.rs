use std::f64::consts::TAU;

use lcs_core::Samples;
use rand::Rng;

#[must_use]
pub(crate) fn target(x: f64) -> f64 {
    0.5 + 0.5 * (TAU * x).sin()
}

/// Draws `n` samples with inputs uniform in `[0, 1)`.
pub(crate) fn samples<R>(n: usize, rng: &mut R) -> anyhow::Result<Samples>
where
    R: Rng + ?Sized,
{
    let mut samples = Samples::new(1, 1);
    for _ in 0..n {
        let x = rng.random::<f64>();
        samples.push(&[x], &[target(x)])?;
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_target_range() {
        assert!((target(0.0) - 0.5).abs() < 1e-12);
        assert!((target(0.25) - 1.0).abs() < 1e-12);
        assert!(target(0.75).abs() < 1e-12);
    }

    #[test]
    fn test_samples_follow_target() {
        let mut rng = Pcg32::seed_from_u64(3);
        let samples = samples(50, &mut rng).unwrap();
        assert_eq!(samples.len(), 50);
        for (x, y) in samples.iter() {
            assert!((0.0..1.0).contains(&x[0]));
            assert_eq!(y[0], target(x[0]));
        }
    }
}
