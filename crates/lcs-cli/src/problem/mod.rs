//! Synthetic benchmark problems the CLI can train on.

use lcs_core::Dimensions;
use serde::{Deserialize, Serialize};

pub(crate) mod rmux;
pub(crate) mod sine;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub(crate) enum ProblemKind {
    #[default]
    Sine,
    Rmux,
}

/// A configured problem instance, as recorded in model summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum Problem {
    /// Supervised regression on `0.5 + 0.5 * sin(2πx)`.
    Sine,
    /// Real multiplexer learned by single-step reinforcement.
    Rmux { address_bits: usize },
}

impl Problem {
    pub(crate) fn new(kind: ProblemKind, address_bits: usize) -> Self {
        match kind {
            ProblemKind::Sine => Self::Sine,
            ProblemKind::Rmux => Self::Rmux { address_bits },
        }
    }

    pub(crate) fn dims(self) -> Dimensions {
        match self {
            Self::Sine => Dimensions::regression(1, 1),
            Self::Rmux { address_bits } => Dimensions::reinforcement(
                rmux::RealMultiplexer::new(address_bits).x_dim(),
                2,
            ),
        }
    }
}
