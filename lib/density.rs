//! The N×N density matrix and its flat-buffer exchange format.

use std::ops::Deref;
use itertools::Itertools;
use ndarray as nd;
use num_complex::Complex64 as C64;
use num_traits::{ One, Zero };
use crate::error::{ QsysError, QsysResult };

/// Position of the `(row, col)` element of an `n`×`n` matrix in a flat buffer.
///
/// This is the only place the flat layout is defined; every conversion to or
/// from `&[C64]` goes through it.
#[inline]
pub fn flat_index(row: usize, col: usize, n: usize) -> usize { row + col * n }

/// Number of elements in an `n`×`n` matrix of amplitudes.
///
/// Fails if `n` is zero or the matrix would not fit in the address space.
pub fn checked_len(n: usize) -> QsysResult<usize> {
    if n == 0 { return Err(QsysError::ZeroDimension); }
    n.checked_mul(n)
        .filter(|nn| {
            nn.checked_mul(std::mem::size_of::<C64>())
                .is_some_and(|bytes| bytes <= isize::MAX as usize)
        })
        .ok_or(QsysError::DimensionTooLarge(n))
}

/// Compute the outer product `|a⟩⟨b|` of two state vectors.
pub fn outer_prod(a: &nd::Array1<C64>, b: &nd::Array1<C64>)
    -> nd::Array2<C64>
{
    let nb = b.len();
    nd::Array2::from_shape_fn(
        (a.len(), nb), |(i, j)| a[i] * b[j].conj())
}

/// A density matrix for an N-level system.
///
/// No physical invariants (trace 1, Hermiticity, positivity) are enforced on
/// construction; see [`Self::trace`], [`Self::is_hermitian`] and
/// [`Self::purity`] for checking them. Elements are addressed as
/// `rho[[row, col]]` through [`Deref`] to the underlying array.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityMatrix {
    data: nd::Array2<C64>,
}

impl AsRef<nd::Array2<C64>> for DensityMatrix {
    fn as_ref(&self) -> &nd::Array2<C64> { &self.data }
}

impl Deref for DensityMatrix {
    type Target = nd::Array2<C64>;

    fn deref(&self) -> &Self::Target { &self.data }
}

impl DensityMatrix {
    /// Copy a flat buffer of `n * n` amplitudes laid out by [`flat_index`].
    pub fn from_flat(n: usize, flat: &[C64]) -> QsysResult<Self> {
        let nn = checked_len(n)?;
        if flat.len() != nn {
            return Err(QsysError::DimensionMismatch {
                expected: nn,
                got: flat.len(),
            });
        }
        let data
            = nd::Array2::from_shape_fn((n, n), |(i, j)| {
                flat[flat_index(i, j, n)]
            });
        Ok(Self { data })
    }

    /// Wrap a square array.
    pub fn from_array(data: nd::Array2<C64>) -> QsysResult<Self> {
        let (nr, nc) = data.dim();
        if nr == 0 { return Err(QsysError::ZeroDimension); }
        if nr != nc {
            return Err(QsysError::DimensionMismatch {
                expected: nr * nr,
                got: nr * nc,
            });
        }
        Ok(Self { data })
    }

    // callers guarantee `data` is square and non-empty
    pub(crate) fn from_raw(data: nd::Array2<C64>) -> Self { Self { data } }

    /// All population in a single basis level.
    pub fn pure_level(n: usize, level: usize) -> QsysResult<Self> {
        checked_len(n)?;
        if level >= n {
            return Err(
                QsysError::LevelOutOfRange { kind: "initial state", level, dim: n });
        }
        let mut data: nd::Array2<C64> = nd::Array2::zeros((n, n));
        data[[level, level]] = C64::one();
        Ok(Self { data })
    }

    /// The projector onto a pure state. The amplitudes are renormalized.
    pub fn from_pure(amps: &nd::Array1<C64>) -> QsysResult<Self> {
        checked_len(amps.len())?;
        let norm: f64 = amps.iter().map(|a| a.norm_sqr()).sum::<f64>().sqrt();
        if norm == 0.0 || !norm.is_finite() {
            return Err(QsysError::InvalidState(
                format!("pure state has norm {}", norm)));
        }
        let psi = amps.mapv(|a| a / norm);
        Ok(Self { data: outer_prod(&psi, &psi) })
    }

    /// A classical mixture of basis levels with the given weights, which are
    /// renormalized to sum to 1.
    pub fn from_populations(pops: &[f64]) -> QsysResult<Self> {
        checked_len(pops.len())?;
        if let Some(p) = pops.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(QsysError::InvalidState(
                format!("population {} is negative or non-finite", p)));
        }
        let total: f64 = pops.iter().sum();
        if total == 0.0 {
            return Err(QsysError::InvalidState(
                "populations sum to zero".to_string()));
        }
        if !total.is_finite() {
            return Err(QsysError::InvalidState(
                format!("populations sum to {}", total)));
        }
        let diag: nd::Array1<C64>
            = pops.iter().map(|p| C64::from(p / total)).collect();
        Ok(Self { data: nd::Array2::from_diag(&diag) })
    }

    /// Number of levels N.
    pub fn dim(&self) -> usize { self.data.nrows() }

    /// The `(row, col)` element, if in bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<C64> {
        self.data.get((row, col)).copied()
    }

    /// Get a reference to the underlying array.
    pub fn as_array(&self) -> &nd::Array2<C64> { &self.data }

    /// Unwrap into the underlying array.
    pub fn into_array(self) -> nd::Array2<C64> { self.data }

    /// Copy out into a flat buffer laid out by [`flat_index`].
    pub fn to_flat(&self) -> Vec<C64> {
        let n = self.dim();
        let mut flat = vec![C64::zero(); n * n];
        for ((i, j), a) in self.data.indexed_iter() {
            flat[flat_index(i, j, n)] = *a;
        }
        flat
    }

    /// Sum of the real parts of the main diagonal.
    pub fn trace(&self) -> f64 { self.data.diag().iter().map(|a| a.re).sum() }

    /// Tr(ρ²), equal to 1 for pure states.
    pub fn purity(&self) -> f64 {
        // Tr(ρ²) = Σ_ij ρ_ij ρ_ji
        (0..self.dim()).cartesian_product(0..self.dim())
            .map(|(i, j)| (self.data[[i, j]] * self.data[[j, i]]).re)
            .sum()
    }

    /// Population of a single level.
    ///
    /// *Panics* if `level` is not less than [`Self::dim`].
    pub fn population(&self, level: usize) -> f64 { self.data[[level, level]].re }

    /// Populations of all levels.
    pub fn populations(&self) -> nd::Array1<f64> {
        self.data.diag().mapv(|a| a.re)
    }

    /// Return `true` if `ρ[i, j]` and `conj(ρ[j, i])` agree to within `tol`
    /// for all `i, j`.
    pub fn is_hermitian(&self, tol: f64) -> bool {
        self.data.indexed_iter()
            .all(|((i, j), a)| (*a - self.data[[j, i]].conj()).norm() <= tol)
    }

    /// Return `true` if no element is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|a| a.re.is_finite() && a.im.is_finite())
    }
}
