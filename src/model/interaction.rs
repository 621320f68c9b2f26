//! Pairwise ion-ion interaction coefficients
//!
//! When several ions occupy the channel at once, electrostatic coupling
//! scales the elementary rates: a Q-type coefficient multiplies moves that
//! bring two ions closer together, an R-type coefficient multiplies moves
//! that separate them. The exponent of a coefficient is the product of the
//! two ions' charges, so an uncharged co-resident contributes a neutral
//! factor.
//!
//! Adjacency for the single-coefficient modes is derived from the move
//! itself: Q applies when the moving ion lands immediately adjacent to a
//! co-resident ion, R when it leaves immediate adjacency.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChannelsolError;

use super::state::ChannelState;

/// Which interaction coefficients the model carries.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum InteractionMode {
    /// No ion-ion coupling; co-resident ions move independently.
    #[serde(rename = "none")]
    None,
    /// One shared Q applied to moves into immediate adjacency.
    #[serde(rename = "single Q")]
    SingleQ,
    /// One shared Q plus one shared R (moves out of immediate adjacency).
    #[serde(rename = "single QR")]
    SingleQr,
    /// A distinct Q per unordered pair of binding sites.
    #[serde(rename = "full Q")]
    FullQ,
    /// Distinct Q and R per unordered pair of binding sites.
    #[serde(rename = "full QR")]
    FullQr,
}

impl InteractionMode {
    pub fn uses_q(&self) -> bool {
        !matches!(self, InteractionMode::None)
    }

    pub fn uses_r(&self) -> bool {
        matches!(self, InteractionMode::SingleQr | InteractionMode::FullQr)
    }

    pub fn is_full(&self) -> bool {
        matches!(self, InteractionMode::FullQ | InteractionMode::FullQr)
    }
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InteractionMode::None => "none",
            InteractionMode::SingleQ => "single Q",
            InteractionMode::SingleQr => "single QR",
            InteractionMode::FullQ => "full Q",
            InteractionMode::FullQr => "full QR",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for InteractionMode {
    type Err = ChannelsolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "none" => Ok(InteractionMode::None),
            "single Q" => Ok(InteractionMode::SingleQ),
            "single QR" => Ok(InteractionMode::SingleQr),
            "full Q" => Ok(InteractionMode::FullQ),
            "full QR" => Ok(InteractionMode::FullQr),
            other => Err(ChannelsolError::UnknownInteractionMode(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum CoeffKind {
    Q,
    R,
}

/// One multiplicative coefficient attached to a directed move: which slot
/// supplies the value and the charge-product exponent applied to it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct CoeffFactor {
    pub kind: CoeffKind,
    pub slot: usize,
    pub exponent: i32,
}

/// Declared coefficient slots for a topology, and the policy mapping a
/// directed move to its factors.
#[derive(Clone, Debug)]
pub(crate) struct CoefficientLayout {
    mode: InteractionMode,
    /// Unordered site pairs (1-based, i < j), lexicographic; empty for the
    /// single modes, which use a lone slot 0.
    pairs: Vec<(usize, usize)>,
}

impl CoefficientLayout {
    pub fn new(mode: InteractionMode, num_sites: usize) -> Self {
        let pairs = if mode.is_full() {
            let mut pairs = Vec::new();
            for i in 1..num_sites {
                for j in (i + 1)..=num_sites {
                    pairs.push((i, j));
                }
            }
            pairs
        } else {
            Vec::new()
        };
        CoefficientLayout { mode, pairs }
    }

    pub fn q_count(&self) -> usize {
        match self.mode {
            InteractionMode::None => 0,
            InteractionMode::SingleQ | InteractionMode::SingleQr => 1,
            InteractionMode::FullQ | InteractionMode::FullQr => self.pairs.len(),
        }
    }

    pub fn r_count(&self) -> usize {
        match self.mode {
            InteractionMode::SingleQr => 1,
            InteractionMode::FullQr => self.pairs.len(),
            _ => 0,
        }
    }

    pub fn q_name(&self, slot: usize) -> String {
        if self.mode.is_full() {
            let (i, j) = self.pairs[slot];
            format!("Q{}{}", i, j)
        } else {
            "Q".to_string()
        }
    }

    pub fn r_name(&self, slot: usize) -> String {
        if self.mode.is_full() {
            let (i, j) = self.pairs[slot];
            format!("R{}{}", i, j)
        } else {
            "R".to_string()
        }
    }

    fn pair_slot(&self, a: usize, b: usize) -> usize {
        let key = (a.min(b), a.max(b));
        self.pairs
            .iter()
            .position(|&p| p == key)
            .unwrap_or_default()
    }

    /// Coefficient factors for one directed move.
    ///
    /// `source` is the state the move leaves from, with the moving ion still
    /// at `src`. Site coordinates are 1-based with 0 = extracellular and
    /// `n + 1` = intracellular reservoir.
    pub fn factors(
        &self,
        source: &ChannelState,
        charges: &[i32],
        moving_ion: usize,
        src: usize,
        dst: usize,
    ) -> Vec<CoeffFactor> {
        if self.mode == InteractionMode::None {
            return Vec::new();
        }
        let z_moving = charges[moving_ion];
        let mut factors = Vec::new();
        for (site0, other_ion) in source.occupied() {
            let a = site0 + 1;
            if a == src {
                continue;
            }
            let before = (src as i64 - a as i64).abs();
            let after = (dst as i64 - a as i64).abs();
            let exponent = z_moving * charges[other_ion];
            if after < before {
                // approaching: Q territory (every non-None mode carries Q)
                let applies = if self.mode.is_full() {
                    true
                } else {
                    after == 1
                };
                if applies {
                    factors.push(CoeffFactor {
                        kind: CoeffKind::Q,
                        slot: if self.mode.is_full() {
                            self.pair_slot(a, dst)
                        } else {
                            0
                        },
                        exponent,
                    });
                }
            } else if self.mode.uses_r() {
                // separating: R territory
                let applies = if self.mode.is_full() {
                    true
                } else {
                    before == 1
                };
                if applies {
                    factors.push(CoeffFactor {
                        kind: CoeffKind::R,
                        slot: if self.mode.is_full() {
                            self.pair_slot(a, src)
                        } else {
                            0
                        },
                        exponent,
                    });
                }
            }
        }
        factors
    }
}
