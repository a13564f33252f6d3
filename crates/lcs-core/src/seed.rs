use std::fmt::{self, Write as _};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Seed for the engine's random source.
///
/// Every stochastic decision (covering, action selection, selection,
/// crossover, mutation, deletion) draws from a single [`Pcg32`] initialized
/// from this 128-bit seed, so two runs with the same seed, parameters and
/// samples evolve identical populations.
///
/// Serialized as a 32-character hex string.
///
/// # Example
///
/// ```
/// use lcs_core::LcsSeed;
/// use rand::Rng as _;
///
/// let seed: LcsSeed = rand::rng().random();
/// let same = LcsSeed::from_u128(seed.to_u128());
/// assert_eq!(seed, same);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LcsSeed([u8; 16]);

impl LcsSeed {
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(value.to_be_bytes())
    }

    #[must_use]
    pub const fn to_u128(self) -> u128 {
        u128::from_be_bytes(self.0)
    }

    /// Creates the random number generator for this seed.
    #[must_use]
    pub fn rng(self) -> Pcg32 {
        Pcg32::from_seed(self.0)
    }
}

impl fmt::Display for LcsSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.to_u128())
    }
}

impl Serialize for LcsSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut hex_str = String::with_capacity(2 * self.0.len());
        write!(&mut hex_str, "{self}").map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&hex_str)
    }
}

impl<'de> Deserialize<'de> for LcsSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        if hex_str.len() != 32 {
            return Err(serde::de::Error::custom(format!(
                "invalid hex: expected 32 characters, got {}",
                hex_str.len()
            )));
        }
        let num = u128::from_str_radix(&hex_str, 16)
            .map_err(|e| serde::de::Error::custom(format!("invalid hex: {hex_str} ({e})")))?;
        Ok(Self::from_u128(num))
    }
}

impl Distribution<LcsSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> LcsSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        LcsSeed(seed)
    }
}
