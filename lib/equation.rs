//! Fixed-step time evolution of a density matrix under a [`MasterEqnRhs`].
//!
//! Integration is via fourth-order Runge-Kutta. The density matrix is never
//! renormalized between steps; trace and Hermiticity are preserved by the
//! scheme itself to within floating-point error.

use ndarray as nd;
use num_complex::Complex64 as C64;
use tracing::{ debug, error, trace };
use crate::{
    density::DensityMatrix,
    error::{ QsysError, QsysResult },
    rhs::MasterEqnRhs,
};

/// Integrator for the Lindblad master equation of an N-level system.
///
/// Owns the current density matrix, the terms of the equation of motion, and
/// the step counter; the current time is always `steps_taken() * step_size()`.
/// Independent trajectories should each get their own `MasterEquation`, e.g.
/// by cloning a shared [`MasterEqnRhs`].
#[derive(Clone, Debug)]
pub struct MasterEquation {
    dim: usize,
    step_size: f64,
    steps: usize,
    rho: DensityMatrix,
    rhs: MasterEqnRhs,
    // fixed for the lifetime of `rhs`
    H: nd::Array2<C64>,
}

impl MasterEquation {
    /// Create a new `MasterEquation` at time 0.
    ///
    /// `initial` holds `dim * dim` amplitudes laid out by
    /// [`flat_index`][crate::density::flat_index] and is copied. It is not
    /// checked for trace 1 or Hermiticity.
    ///
    /// Fails if the buffer has the wrong length, `step_size` is not finite and
    /// positive, or `rhs` refers to levels outside the system.
    pub fn new(
        dim: usize,
        initial: &[C64],
        rhs: MasterEqnRhs,
        step_size: f64,
    ) -> QsysResult<Self>
    {
        let rho = DensityMatrix::from_flat(dim, initial)?;
        Self::from_density(rho, rhs, step_size)
    }

    /// Like [`Self::new`], but taking an already-constructed density matrix.
    pub fn from_density(
        rho: DensityMatrix,
        rhs: MasterEqnRhs,
        step_size: f64,
    ) -> QsysResult<Self>
    {
        if !step_size.is_finite() || step_size <= 0.0 {
            return Err(QsysError::InvalidStepSize(step_size));
        }
        let dim = rho.dim();
        rhs.validate(dim)?;
        let H = rhs.build_hamiltonian(dim);
        debug!(
            dim,
            step_size,
            couplings = rhs.couplings().len(),
            decays = rhs.decays().len(),
            energies = rhs.energies().len(),
            "initialized master equation"
        );
        Ok(Self { dim, step_size, steps: 0, rho, rhs, H })
    }

    /// Get the current time.
    pub fn time(&self) -> f64 { self.steps as f64 * self.step_size }

    /// Get the current density matrix.
    pub fn state(&self) -> &DensityMatrix { &self.rho }

    /// Get the number of levels.
    pub fn dim(&self) -> usize { self.dim }

    pub fn step_size(&self) -> f64 { self.step_size }

    pub fn steps_taken(&self) -> usize { self.steps }

    /// Get a reference to the terms of the equation of motion.
    pub fn rhs(&self) -> &MasterEqnRhs { &self.rhs }

    /// Get the Hamiltonian assembled from the coherent terms.
    pub fn hamiltonian(&self) -> &nd::Array2<C64> { &self.H }

    /// Advance the state by a single step.
    ///
    /// If the step produces a non-finite density matrix, the state and time
    /// are left unchanged and [`QsysError::NumericalInstability`] is returned.
    pub fn take_step(&mut self) -> QsysResult<()> {
        let rho_new = self.rk4_step();
        if !rho_new.iter().all(|a| a.re.is_finite() && a.im.is_finite()) {
            error!(
                time = self.time(),
                step_size = self.step_size,
                "non-finite density matrix; step rejected"
            );
            return Err(QsysError::NumericalInstability { time: self.time() });
        }
        self.rho = DensityMatrix::from_raw(rho_new);
        self.steps += 1;
        trace!(time = self.time(), trace = self.rho.trace(), "step");
        Ok(())
    }

    /// Step until the current time is at least `t_end`, returning the number
    /// of steps taken.
    pub fn run_until(&mut self, t_end: f64) -> QsysResult<usize> {
        if !t_end.is_finite() { return Err(QsysError::InvalidTime(t_end)); }
        let mut n: usize = 0;
        while self.time() < t_end {
            self.take_step()?;
            n += 1;
        }
        Ok(n)
    }

    /// Like [`Self::run_until`], but recording `x(time, state)` at the current
    /// time and after every step.
    pub fn evolve_reduced<X, T>(&mut self, t_end: f64, mut x: X)
        -> QsysResult<Vec<T>>
    where X: FnMut(f64, &DensityMatrix) -> T
    {
        if !t_end.is_finite() { return Err(QsysError::InvalidTime(t_end)); }
        let mut x_t: Vec<T> = Vec::new();
        x_t.push(x(self.time(), &self.rho));
        while self.time() < t_end {
            self.take_step()?;
            x_t.push(x(self.time(), &self.rho));
        }
        Ok(x_t)
    }

    // classical fourth-order Runge-Kutta; the Hamiltonian is time-independent
    fn rk4_step(&self) -> nd::Array2<C64> {
        let z = self.rho.as_array();
        let dt = self.step_size;
        let k1 = self.rhs.evaluate_with(&self.H, z);
        let k2 = self.rhs.evaluate_with(&self.H, &(z + &(&k1 * (dt / 2.0))));
        let k3 = self.rhs.evaluate_with(&self.H, &(z + &(&k2 * (dt / 2.0))));
        let k4 = self.rhs.evaluate_with(&self.H, &(z + &(&k3 * dt)));
        let incr = (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0);
        z + &incr
    }
}
