//! Arbitrary-precision scalar backend
//!
//! [`Mpf`] wraps `astro-float` big floats behind the [`Real`](super::Real)
//! trait. Working precision is a process-wide setting expressed in decimal
//! digits, mirroring how the reference arbitrary-precision stacks configure a
//! single global `dps` before a computation. The sweep driver sets it from
//! the model's `precision_digits` before the first voltage is evaluated.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use astro_float::{BigFloat, Consts, RoundingMode};

use super::Real;

const RM: RoundingMode = RoundingMode::ToEven;

/// Guard bits on top of the requested decimal precision.
const GUARD_BITS: usize = 32;

static PRECISION_BITS: AtomicUsize = AtomicUsize::new(200);

thread_local! {
    static CONSTS: RefCell<Consts> =
        RefCell::new(Consts::new().expect("allocation of the astro-float constants cache"));
}

/// Set the working precision in decimal digits for all subsequent [`Mpf`]
/// arithmetic in this process.
pub fn set_decimal_digits(digits: u32) {
    let bits = (digits as f64 * std::f64::consts::LOG2_10).ceil() as usize + GUARD_BITS;
    PRECISION_BITS.store(bits, AtomicOrdering::Relaxed);
}

/// Current working precision in bits.
pub fn precision_bits() -> usize {
    PRECISION_BITS.load(AtomicOrdering::Relaxed)
}

/// Arbitrary-precision float at the process-wide working precision.
#[derive(Clone, Debug)]
pub struct Mpf(BigFloat);

impl Mpf {
    fn prec() -> usize {
        precision_bits()
    }
}

impl fmt::Display for Mpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Mpf {
    type Output = Mpf;

    fn add(self, rhs: Mpf) -> Mpf {
        Mpf(self.0.add(&rhs.0, Self::prec(), RM))
    }
}

impl Sub for Mpf {
    type Output = Mpf;

    fn sub(self, rhs: Mpf) -> Mpf {
        Mpf(self.0.sub(&rhs.0, Self::prec(), RM))
    }
}

impl Mul for Mpf {
    type Output = Mpf;

    fn mul(self, rhs: Mpf) -> Mpf {
        Mpf(self.0.mul(&rhs.0, Self::prec(), RM))
    }
}

impl Div for Mpf {
    type Output = Mpf;

    fn div(self, rhs: Mpf) -> Mpf {
        Mpf(self.0.div(&rhs.0, Self::prec(), RM))
    }
}

impl Neg for Mpf {
    type Output = Mpf;

    fn neg(self) -> Mpf {
        Mpf(-self.0)
    }
}

impl PartialEq for Mpf {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl PartialOrd for Mpf {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl Real for Mpf {
    fn zero() -> Self {
        Mpf(BigFloat::from_f64(0.0, Self::prec()))
    }

    fn one() -> Self {
        Mpf(BigFloat::from_f64(1.0, Self::prec()))
    }

    fn from_f64(value: f64) -> Self {
        Mpf(BigFloat::from_f64(value, Self::prec()))
    }

    fn to_f64(&self) -> f64 {
        // Round-trip through the decimal rendering; astro-float's Display is
        // exact to working precision and f64 parsing saturates to ±inf.
        format!("{}", self.0).parse::<f64>().unwrap_or(f64::NAN)
    }

    fn abs(&self) -> Self {
        Mpf(self.0.abs())
    }

    fn sqrt(&self) -> Self {
        Mpf(self.0.sqrt(Self::prec(), RM))
    }

    fn exp(&self) -> Self {
        CONSTS.with(|cc| Mpf(self.0.exp(Self::prec(), RM, &mut cc.borrow_mut())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_round_trips_through_f64() {
        set_decimal_digits(40);
        let a = Mpf::from_f64(1.5);
        let b = Mpf::from_f64(0.25);
        let sum = (a.clone() + b.clone()).to_f64();
        assert_eq!(sum, 1.75);
        let quot = (a / b).to_f64();
        assert_eq!(quot, 6.0);
    }

    #[test]
    fn exp_resolves_beyond_double_range() {
        set_decimal_digits(40);
        // exp(-800) underflows f64 but must stay nonzero here
        let tiny = Mpf::from_f64(-800.0).exp();
        assert!(tiny > Mpf::zero());
        // and its log-magnitude survives a ratio back into range
        let ratio = (tiny.clone() / Mpf::from_f64(-790.0).exp()).to_f64();
        assert!((ratio - (-10.0_f64).exp()).abs() < 1e-10);
    }

    #[test]
    fn powi_handles_signs() {
        set_decimal_digits(30);
        let q = Mpf::from_f64(2.0);
        assert_eq!(q.powi(0).to_f64(), 1.0);
        assert_eq!(q.powi(3).to_f64(), 8.0);
        assert_eq!(q.powi(-2).to_f64(), 0.25);
    }

    #[test]
    fn comparisons_follow_value_order() {
        set_decimal_digits(30);
        let small = Mpf::from_f64(1.0e-3);
        let large = Mpf::from_f64(2.0);
        assert!(small < large);
        assert!(large.clone().neg() < small);
    }
}
