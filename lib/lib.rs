#![allow(non_snake_case)]

//! Fixed-step integration of the Lindblad master equation for a finite
//! N-level system.
//!
//! A [`MasterEqnRhs`] collects the coherent ([`Coupling`], [`Energy`]) and
//! dissipative ([`Decay`]) terms of the equation of motion; a
//! [`MasterEquation`] owns the density matrix and advances it with
//! fourth-order Runge-Kutta.
//!
//! ```no_run
//! use num_traits::Zero;
//! use qsys::{ Coupling, Decay, MasterEqnRhs, MasterEquation, C64 };
//!
//! # fn main() -> qsys::QsysResult<()> {
//! let mut rhs = MasterEqnRhs::new();
//! rhs.add_coupling(Coupling::new(0, 1, 1.0));
//! rhs.add_decay(Decay::new(0, 1, 0.1)?);
//! let mut rho0 = vec![C64::zero(); 4];
//! rho0[0] = 1.0.into();
//! let mut meqn = MasterEquation::new(2, &rho0, rhs, 1e-3)?;
//! while meqn.time() < 2.0 {
//!     meqn.take_step()?;
//! }
//! println!("{}", meqn.state().population(1));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod density;
pub mod terms;
pub mod rhs;
pub mod equation;
pub mod config;

pub use num_complex::Complex64 as C64;
pub use error::{ QsysError, QsysResult };
pub use density::DensityMatrix;
pub use terms::{ Coupling, Decay, Energy };
pub use rhs::MasterEqnRhs;
pub use equation::MasterEquation;
pub use config::SystemConfig;
