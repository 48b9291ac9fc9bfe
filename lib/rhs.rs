//! The right-hand side of the Lindblad master equation,
//! ```text
//! dρ/dt = -i [H, ρ] + Σ_k γ_k (L_k ρ L_k† - {L_k† L_k, ρ} / 2)
//! ```
//! with `H` assembled from [`Coupling`]s and [`Energy`]s and one collapse
//! operator `L_k = |to⟩⟨from|` per [`Decay`].

use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    density::checked_len,
    error::{ QsysError, QsysResult },
    terms::{ Coupling, Decay, Energy },
};

/// Compute the commutator `[A, B] = A B - B A`.
pub fn commutator<SA, SB>(
    A: &nd::ArrayBase<SA, nd::Ix2>,
    B: &nd::ArrayBase<SB, nd::Ix2>,
) -> nd::Array2<C64>
where
    SA: nd::Data<Elem = C64>,
    SB: nd::Data<Elem = C64>,
{
    A.dot(B) - B.dot(A)
}

/// Compute the anti-commutator `{A, B} = A B + B A`.
pub fn anti_commutator<SA, SB>(
    A: &nd::ArrayBase<SA, nd::Ix2>,
    B: &nd::ArrayBase<SB, nd::Ix2>,
) -> nd::Array2<C64>
where
    SA: nd::Data<Elem = C64>,
    SB: nd::Data<Elem = C64>,
{
    A.dot(B) + B.dot(A)
}

/// Collection of terms making up the equation of motion.
///
/// Terms are additive; insertion order only affects the order in which they
/// are enumerated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MasterEqnRhs {
    couplings: Vec<Coupling>,
    decays: Vec<Decay>,
    energies: Vec<Energy>,
}

impl MasterEqnRhs {
    /// Create a new, empty `MasterEqnRhs`.
    pub fn new() -> Self { Self::default() }

    /// Append a coherent coupling.
    pub fn add_coupling(&mut self, coupling: Coupling) -> &mut Self {
        self.couplings.push(coupling);
        self
    }

    /// Append a decay channel.
    pub fn add_decay(&mut self, decay: Decay) -> &mut Self {
        self.decays.push(decay);
        self
    }

    /// Append a level energy.
    pub fn add_energy(&mut self, energy: Energy) -> &mut Self {
        self.energies.push(energy);
        self
    }

    /// Like [`Self::add_coupling`], but taking and returning `self` by value.
    pub fn with_coupling(mut self, coupling: Coupling) -> Self {
        self.couplings.push(coupling);
        self
    }

    /// Like [`Self::add_decay`], but taking and returning `self` by value.
    pub fn with_decay(mut self, decay: Decay) -> Self {
        self.decays.push(decay);
        self
    }

    /// Like [`Self::add_energy`], but taking and returning `self` by value.
    pub fn with_energy(mut self, energy: Energy) -> Self {
        self.energies.push(energy);
        self
    }

    pub fn couplings(&self) -> &[Coupling] { &self.couplings }

    pub fn decays(&self) -> &[Decay] { &self.decays }

    pub fn energies(&self) -> &[Energy] { &self.energies }

    /// Return `true` if no terms have been added.
    pub fn is_empty(&self) -> bool {
        self.couplings.is_empty()
            && self.decays.is_empty()
            && self.energies.is_empty()
    }

    /// Check every term against a system of `dim` levels.
    pub fn validate(&self, dim: usize) -> QsysResult<()> {
        if dim == 0 { return Err(QsysError::ZeroDimension); }
        self.couplings.iter().try_for_each(|c| c.check_levels(dim))?;
        self.decays.iter().try_for_each(|d| d.check_levels(dim))?;
        self.energies.iter().try_for_each(|e| e.check_levels(dim))?;
        Ok(())
    }

    /// Sum all coherent terms into a single `dim`×`dim` Hermitian matrix.
    pub fn hamiltonian(&self, dim: usize) -> QsysResult<nd::Array2<C64>> {
        self.validate(dim)?;
        Ok(self.build_hamiltonian(dim))
    }

    // assumes `validate(dim)` has passed
    pub(crate) fn build_hamiltonian(&self, dim: usize) -> nd::Array2<C64> {
        let mut H: nd::Array2<C64> = nd::Array2::zeros((dim, dim));
        for e in self.energies.iter() {
            H[[e.level(), e.level()]] += e.energy();
        }
        let mut drive: C64;
        for c in self.couplings.iter() {
            let (a, b) = c.levels();
            drive = 0.5 * c.strength();
            H[[a, b]] += drive;
            H[[b, a]] += drive.conj();
        }
        H
    }

    /// Compute dρ/dt for a `dim`-level density matrix.
    ///
    /// Fails if `rho` is not `dim`×`dim` or any term refers to a level outside
    /// the system.
    pub fn evaluate(&self, rho: &nd::Array2<C64>, dim: usize)
        -> QsysResult<nd::Array2<C64>>
    {
        let expected = checked_len(dim)?;
        if rho.dim() != (dim, dim) {
            return Err(QsysError::DimensionMismatch {
                expected,
                got: rho.len(),
            });
        }
        let H = self.hamiltonian(dim)?;
        Ok(self.evaluate_with(&H, rho))
    }

    // assumes `H`, `rho`, and all terms are consistent with one another
    pub(crate) fn evaluate_with(&self, H: &nd::Array2<C64>, rho: &nd::Array2<C64>)
        -> nd::Array2<C64>
    {
        let mut drho = -C64::i() * commutator(H, rho);
        self.add_lindbladian(rho, &mut drho);
        drho
    }

    // accumulates γ (L ρ L† - {L†L, ρ} / 2) for each L = |to⟩⟨from|; only the
    // `from` row and column and the `to` population are affected
    fn add_lindbladian(&self, rho: &nd::Array2<C64>, drho: &mut nd::Array2<C64>) {
        let n = rho.nrows();
        let mut pop: C64;
        for decay in self.decays.iter() {
            let (f, t, y) = (decay.from(), decay.to(), decay.rate());
            if y == 0.0 { continue; }
            pop = rho[[f, f]];
            drho[[t, t]] += y * pop;
            drho[[f, f]] -= y * pop;
            for k in (0..n).filter(|k| *k != f) {
                drho[[f, k]] -= 0.5 * y * rho[[f, k]];
                drho[[k, f]] -= 0.5 * y * rho[[k, f]];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;
    use rand::{ rngs::StdRng, Rng, SeedableRng };
    use crate::density::DensityMatrix;

    fn random_density(rng: &mut StdRng, n: usize) -> nd::Array2<C64> {
        let amps: nd::Array1<C64>
            = (0..n)
            .map(|_| C64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
            .collect();
        let pure = DensityMatrix::from_pure(&amps).unwrap().into_array();
        let mixed = DensityMatrix::pure_level(n, 0).unwrap().into_array();
        pure * C64::from(0.7) + mixed * C64::from(0.3)
    }

    // γ (L ρ L† - {L†L, ρ} / 2) with explicit matrix products
    fn dense_dissipator(decay: &Decay, rho: &nd::Array2<C64>) -> nd::Array2<C64> {
        let n = rho.nrows();
        let mut L: nd::Array2<C64> = nd::Array2::zeros((n, n));
        L[[decay.to(), decay.from()]] = C64::from(1.0);
        let Ld = L.t().mapv(|a| a.conj());
        let LdL = Ld.dot(&L);
        (L.dot(rho).dot(&Ld) - anti_commutator(&LdL, rho) * C64::from(0.5))
            * C64::from(decay.rate())
    }

    #[test]
    fn empty_rhs_is_stationary() {
        let rhs = MasterEqnRhs::new();
        assert!(rhs.is_empty());
        let rho = DensityMatrix::pure_level(3, 1).unwrap();
        let drho = rhs.evaluate(&rho, 3).unwrap();
        assert!(drho.iter().all(|a| a.is_zero()));
    }

    #[test]
    fn hamiltonian_is_hermitian() {
        let rhs
            = MasterEqnRhs::new()
            .with_coupling(Coupling::new(0, 2, C64::new(1.0, 0.5)))
            .with_coupling(Coupling::new(1, 0, 2.0))
            .with_energy(Energy::new(1, -0.25));
        let H = rhs.hamiltonian(3).unwrap();
        assert_eq!(H[[0, 2]], C64::new(0.5, 0.25));
        assert_eq!(H[[2, 0]], C64::new(0.5, -0.25));
        assert_eq!(H[[0, 1]], C64::from(1.0));
        assert_eq!(H[[1, 1]], C64::from(-0.25));
        assert_eq!(H, H.t().mapv(|a| a.conj()));
    }

    #[test]
    fn out_of_range_terms_fail_at_evaluation() {
        let mut rhs = MasterEqnRhs::new();
        rhs.add_decay(Decay::new(0, 2, 1.0).unwrap());
        let rho = DensityMatrix::pure_level(2, 0).unwrap();
        assert!(matches!(
            rhs.evaluate(&rho, 2),
            Err(QsysError::LevelOutOfRange { kind: "decay", level: 2, dim: 2 })
        ));
        assert!(matches!(
            rhs.evaluate(&rho, 3),
            Err(QsysError::DimensionMismatch { expected: 9, got: 4 })
        ));
        assert!(matches!(
            rhs.evaluate(&rho, usize::MAX),
            Err(QsysError::DimensionTooLarge(_))
        ));
    }

    #[test]
    fn decay_moves_population() {
        let mut rhs = MasterEqnRhs::new();
        rhs.add_decay(Decay::new(0, 1, 2.0).unwrap());
        let rho = DensityMatrix::from_populations(&[0.25, 0.75]).unwrap();
        let drho = rhs.evaluate(&rho, 2).unwrap();
        assert!((drho[[1, 1]].re + 1.5).abs() < 1e-15);
        assert!((drho[[0, 0]].re - 1.5).abs() < 1e-15);
    }

    #[test]
    fn dephasing_damps_coherences_only() {
        let rhs
            = MasterEqnRhs::new()
            .with_decay(Decay::new(1, 1, 0.4).unwrap());
        let amps = nd::array![C64::from(1.0), C64::from(1.0)];
        let rho = DensityMatrix::from_pure(&amps).unwrap();
        let drho = rhs.evaluate(&rho, 2).unwrap();
        assert!(drho[[0, 0]].norm() < 1e-15);
        assert!(drho[[1, 1]].norm() < 1e-15);
        assert!((drho[[0, 1]] - C64::from(-0.2 * 0.5)).norm() < 1e-15);
        assert!((drho[[1, 0]] - C64::from(-0.2 * 0.5)).norm() < 1e-15);
    }

    #[test]
    fn lindbladian_matches_dense_form() {
        let mut rng = StdRng::seed_from_u64(10546);
        let n = 4;
        let decays = [
            Decay::new(0, 3, 1.3).unwrap(),
            Decay::new(2, 1, 0.7).unwrap(),
            Decay::new(2, 2, 0.2).unwrap(),
            Decay::new(3, 0, 0.05).unwrap(),
        ];
        let rhs
            = decays.iter()
            .fold(MasterEqnRhs::new(), |acc, d| acc.with_decay(*d));
        let rho = random_density(&mut rng, n);
        let drho = rhs.evaluate(&rho, n).unwrap();
        let expected
            = decays.iter()
            .fold(nd::Array2::<C64>::zeros((n, n)), |acc, d| {
                acc + dense_dissipator(d, &rho)
            });
        for (a, b) in drho.iter().zip(expected.iter()) {
            assert!((*a - *b).norm() < 1e-12);
        }
    }

    #[test]
    fn derivative_is_traceless_and_hermitian() {
        let mut rng = StdRng::seed_from_u64(8675309);
        let n = 5;
        let mut rhs = MasterEqnRhs::new();
        for _ in 0..6 {
            let a = rng.gen_range(0..n);
            let b = rng.gen_range(0..n);
            rhs.add_coupling(Coupling::new(
                a, b, C64::new(rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0))));
            rhs.add_decay(Decay::new(b, a, rng.gen_range(0.0..3.0)).unwrap());
        }
        let rho = random_density(&mut rng, n);
        let drho = rhs.evaluate(&rho, n).unwrap();
        let tr: C64 = drho.diag().iter().sum();
        assert!(tr.norm() < 1e-12);
        for ((i, j), a) in drho.indexed_iter() {
            assert!((*a - drho[[j, i]].conj()).norm() < 1e-12);
        }
    }
}
