//! Description of a complete system as a TOML document.
//!
//! ```toml
//! dimension = 3
//! step_size = 1e-3                       # optional
//! initial_populations = [1.0, 0.0, 0.0]  # optional; default: all in level 0
//!
//! [[energy]]
//! level = 2
//! energy = -0.5
//!
//! [[coupling]]
//! levels = [0, 1]
//! strength = 1.0
//! phase = 0.0                            # optional, radians
//!
//! [[decay]]
//! from = 1
//! to = 0
//! rate = 0.1
//! ```
//!
//! Reading the document from disk is left to the caller.

use toml::{ Table, Value };
use tracing::debug;
use crate::{
    density::{ DensityMatrix, checked_len },
    equation::MasterEquation,
    error::{ QsysError, QsysResult },
    rhs::MasterEqnRhs,
    terms::{ Coupling, Decay, Energy },
};

/// Step size used when a document does not specify one.
pub const DEFAULT_STEP_SIZE: f64 = 1e-3;

fn missing(key: &str, ctx: &str) -> QsysError {
    QsysError::Config(format!("{}: missing or mistyped key '{}'", ctx, key))
}

fn get_f64(table: &Table, key: &str, ctx: &str) -> QsysResult<f64> {
    table.get(key).and_then(value_f64).ok_or_else(|| missing(key, ctx))
}

fn get_usize(table: &Table, key: &str, ctx: &str) -> QsysResult<usize> {
    table.get(key).and_then(value_usize).ok_or_else(|| missing(key, ctx))
}

// integers are accepted wherever a float is expected
fn value_f64(value: &Value) -> Option<f64> {
    value.as_float().or_else(|| value.as_integer().map(|i| i as f64))
}

fn value_usize(value: &Value) -> Option<usize> {
    value.as_integer().and_then(|i| usize::try_from(i).ok())
}

// an absent array of tables is the same as an empty one
fn get_tables<'a>(table: &'a Table, key: &str) -> QsysResult<Vec<&'a Table>> {
    match table.get(key) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => {
            items.iter()
                .map(|item| {
                    item.as_table().ok_or_else(|| {
                        QsysError::Config(
                            format!("'{}' entries must be tables", key))
                    })
                })
                .collect()
        },
        Some(_) => Err(QsysError::Config(
            format!("'{}' must be an array of tables", key))),
    }
}

fn parse_coupling(table: &Table) -> QsysResult<Coupling> {
    let levels: Vec<usize>
        = table.get("levels")
        .and_then(Value::as_array)
        .and_then(|arr| arr.iter().map(value_usize).collect::<Option<Vec<_>>>())
        .filter(|lv| lv.len() == 2)
        .ok_or_else(|| {
            QsysError::Config(
                "coupling: 'levels' must be a pair of level indices".to_string())
        })?;
    let strength = get_f64(table, "strength", "coupling")?;
    let phase
        = match table.get("phase") {
            None => 0.0,
            Some(v) => value_f64(v).ok_or_else(|| missing("phase", "coupling"))?,
        };
    Ok(Coupling::with_phase(levels[0], levels[1], strength, phase))
}

fn parse_decay(table: &Table) -> QsysResult<Decay> {
    let from = get_usize(table, "from", "decay")?;
    let to = get_usize(table, "to", "decay")?;
    let rate = get_f64(table, "rate", "decay")?;
    Decay::new(to, from, rate)
}

fn parse_energy(table: &Table) -> QsysResult<Energy> {
    let level = get_usize(table, "level", "energy")?;
    let energy = get_f64(table, "energy", "energy")?;
    Ok(Energy::new(level, energy))
}

/// A fully specified system: dimension, step size, initial state, and the
/// terms of the equation of motion.
#[derive(Clone, Debug, PartialEq)]
pub struct SystemConfig {
    pub dimension: usize,
    pub step_size: f64,
    /// Initial (diagonal) populations; normalized when the state is built.
    pub initial_populations: Vec<f64>,
    pub rhs: MasterEqnRhs,
}

impl SystemConfig {
    /// Parse a TOML document.
    ///
    /// All terms are checked against `dimension` before returning.
    pub fn from_toml_str(src: &str) -> QsysResult<Self> {
        let table: Table = src.parse()?;
        let dimension = get_usize(&table, "dimension", "system")?;
        checked_len(dimension)?;
        let step_size
            = match table.get("step_size") {
                None => DEFAULT_STEP_SIZE,
                Some(v) => {
                    value_f64(v).ok_or_else(|| missing("step_size", "system"))?
                },
            };
        let initial_populations: Vec<f64>
            = match table.get("initial_populations") {
                None => {
                    let mut pops = vec![0.0; dimension];
                    pops[0] = 1.0;
                    pops
                },
                Some(v) => {
                    v.as_array()
                        .and_then(|arr| {
                            arr.iter().map(value_f64).collect::<Option<Vec<_>>>()
                        })
                        .ok_or_else(|| missing("initial_populations", "system"))?
                },
            };
        if initial_populations.len() != dimension {
            return Err(QsysError::DimensionMismatch {
                expected: dimension,
                got: initial_populations.len(),
            });
        }

        let mut rhs = MasterEqnRhs::new();
        for t in get_tables(&table, "energy")? {
            rhs.add_energy(parse_energy(t)?);
        }
        for t in get_tables(&table, "coupling")? {
            rhs.add_coupling(parse_coupling(t)?);
        }
        for t in get_tables(&table, "decay")? {
            rhs.add_decay(parse_decay(t)?);
        }
        rhs.validate(dimension)?;
        debug!(
            dimension,
            step_size,
            couplings = rhs.couplings().len(),
            decays = rhs.decays().len(),
            energies = rhs.energies().len(),
            "parsed system config"
        );
        Ok(Self { dimension, step_size, initial_populations, rhs })
    }

    /// Build the initial density matrix.
    pub fn initial_state(&self) -> QsysResult<DensityMatrix> {
        DensityMatrix::from_populations(&self.initial_populations)
    }

    /// Build an integrator at time 0.
    pub fn build(&self) -> QsysResult<MasterEquation> {
        MasterEquation::from_density(
            self.initial_state()?, self.rhs.clone(), self.step_size)
    }
}
