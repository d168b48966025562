//! Solvers attached to rows
//!
//! A row stores a [`CalculatorSpec`]; `run` materialises it into a [`Calculator`] and asks it for the
//! potential energy of the row's structure. Calculators may relax the structure in place.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::structure::Structure;

/// Run an external program that exchanges JSON files in the job directory
pub mod command;

pub use command::CommandCalculator;

#[derive(Debug, Error)]
pub enum CalculatorError {
    #[error("can't run calculator {program}: {source}")]
    Spawn { program: String, source: std::io::Error },
    #[error("calculator {program} exited with {status}")]
    Failed { program: String, status: std::process::ExitStatus },
    #[error("can't exchange files with calculator: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed calculator output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("calculator returned a non-finite energy")]
    NonFiniteEnergy,
    #[error("calculator returned {returned} atoms for a structure of {expected}")]
    AtomCountChanged { expected: usize, returned: usize },
    #[error("{0}")]
    Other(String),
}

pub trait Calculator {
    fn name(&self) -> &str;

    /// Compute the potential energy (eV) of `structure`, updating its geometry if the calculation
    /// relaxes it. Blocks until the solver is done.
    fn potential_energy(&mut self, structure: &mut Structure) -> Result<f64, CalculatorError>;
}

/// Calculator description stored in the `calculator` column
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum CalculatorSpec {
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

impl CalculatorSpec {
    /// Build a calculator that works inside `work_dir`
    pub fn attach(&self, work_dir: &Path) -> Box<dyn Calculator> {
        match self {
            CalculatorSpec::Command { program, args } => {
                Box::new(CommandCalculator::new(program, args.clone(), work_dir))
            }
        }
    }
}
