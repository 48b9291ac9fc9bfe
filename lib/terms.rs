//! Individual terms in the equation of motion.
//!
//! Level indices are not checked on construction, since the dimension of the
//! system is not known to the terms themselves. Use [`Coupling::check_levels`]
//! and friends, or [`MasterEqnRhs::validate`][crate::MasterEqnRhs::validate],
//! once it is.

use num_complex::Complex64 as C64;
use crate::error::{ QsysError, QsysResult };

fn check_level(kind: &'static str, level: usize, dim: usize)
    -> QsysResult<()>
{
    (level < dim).then_some(())
        .ok_or(QsysError::LevelOutOfRange { kind, level, dim })
}

/// A coherent drive between two levels.
///
/// Contributes `strength / 2` to `H[a, b]` and its conjugate to `H[b, a]`, so
/// that `strength` is the Rabi frequency of the transition: a system starting
/// in `a` has population `sin²(|strength| t / 2)` in `b` at time `t`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Coupling {
    a: usize,
    b: usize,
    strength: C64,
}

impl Coupling {
    /// Create a new `Coupling`.
    pub fn new<T>(a: usize, b: usize, strength: T) -> Self
    where T: Into<C64>
    {
        Self { a, b, strength: strength.into() }
    }

    /// Create a new `Coupling` with a real strength and a phase, in radians.
    pub fn with_phase(a: usize, b: usize, strength: f64, phase: f64) -> Self {
        Self { a, b, strength: C64::from_polar(strength, phase) }
    }

    /// Get the two coupled levels.
    pub fn levels(&self) -> (usize, usize) { (self.a, self.b) }

    /// Get the (complex) coupling strength.
    pub fn strength(&self) -> C64 { self.strength }

    /// Fail if either level is not less than `dim` or the strength is not
    /// finite.
    pub fn check_levels(&self, dim: usize) -> QsysResult<()> {
        check_level("coupling", self.a, dim)?;
        check_level("coupling", self.b, dim)?;
        if !(self.strength.re.is_finite() && self.strength.im.is_finite()) {
            return Err(QsysError::NonFiniteParameter {
                kind: "coupling",
                value: self.strength.to_string(),
            });
        }
        Ok(())
    }
}

/// An incoherent decay channel with collapse operator `√rate |to⟩⟨from|`.
///
/// Arguments to [`Self::new`] are given in operator order, so
/// `Decay::new(0, 1, rate)` transfers population from level 1 into level 0.
/// With `to == from` the channel is pure dephasing of that level.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Decay {
    to: usize,
    from: usize,
    rate: f64,
}

impl Decay {
    /// Create a new `Decay`.
    ///
    /// Fails if `rate` is negative or not finite.
    pub fn new(to: usize, from: usize, rate: f64) -> QsysResult<Self> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(QsysError::InvalidRate(rate));
        }
        Ok(Self { to, from, rate })
    }

    /// Get the level population is drawn from.
    pub fn from(&self) -> usize { self.from }

    /// Get the level population is transferred into.
    pub fn to(&self) -> usize { self.to }

    /// Get the decay rate.
    pub fn rate(&self) -> f64 { self.rate }

    /// Fail if either level is not less than `dim`.
    pub fn check_levels(&self, dim: usize) -> QsysResult<()> {
        check_level("decay", self.from, dim)?;
        check_level("decay", self.to, dim)
    }
}

/// An energy shift (diagonal Hamiltonian element) of a single level.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Energy {
    level: usize,
    energy: f64,
}

impl Energy {
    /// Create a new `Energy`.
    pub fn new(level: usize, energy: f64) -> Self { Self { level, energy } }

    pub fn level(&self) -> usize { self.level }

    pub fn energy(&self) -> f64 { self.energy }

    /// Fail if the level is not less than `dim` or the energy is not finite.
    pub fn check_levels(&self, dim: usize) -> QsysResult<()> {
        check_level("energy", self.level, dim)?;
        if !self.energy.is_finite() {
            return Err(QsysError::NonFiniteParameter {
                kind: "energy",
                value: self.energy.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_rejects_bad_rates() {
        assert!(matches!(Decay::new(0, 1, -1.0), Err(QsysError::InvalidRate(_))));
        assert!(Decay::new(0, 1, f64::NAN).is_err());
        assert!(Decay::new(0, 1, f64::INFINITY).is_err());
        let d = Decay::new(0, 1, 0.0).unwrap();
        assert_eq!((d.to(), d.from(), d.rate()), (0, 1, 0.0));
    }

    #[test]
    fn level_checks() {
        let c = Coupling::new(1, 0, 1.0);
        assert!(c.check_levels(2).is_ok());
        assert!(matches!(
            c.check_levels(1),
            Err(QsysError::LevelOutOfRange { kind: "coupling", level: 1, dim: 1 })
        ));
        let d = Decay::new(0, 4, 1.0).unwrap();
        assert!(matches!(
            d.check_levels(3),
            Err(QsysError::LevelOutOfRange { kind: "decay", level: 4, dim: 3 })
        ));
        assert!(Energy::new(2, f64::NAN).check_levels(3).is_err());
        assert!(Coupling::new(0, 1, C64::new(f64::INFINITY, 0.0))
            .check_levels(2).is_err());
    }

    #[test]
    fn phased_coupling() {
        let c = Coupling::with_phase(0, 1, 2.0, std::f64::consts::FRAC_PI_2);
        assert!((c.strength() - C64::new(0.0, 2.0)).norm() < 1e-15);
        assert_eq!(c.levels(), (0, 1));
    }
}
