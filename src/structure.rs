//! Atomic structures as stored in the `structure` column
//!
//! Positions are cartesian, in Ångström. The cell is optional for molecules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculator::CalculatorSpec;

/// Validate raw JSON documents against the bundled schema
pub mod schema;

#[derive(Debug, Error, PartialEq)]
pub enum StructureError {
    #[error("structure has no atoms")]
    Empty,
    #[error("{symbols} symbols but {positions} positions")]
    LengthMismatch { symbols: usize, positions: usize },
    #[error("atom {0} has a non-finite coordinate")]
    NonFinitePosition(usize),
    #[error("cell has a non-finite component")]
    NonFiniteCell,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Structure {
    pub symbols: Vec<String>,
    pub positions: Vec<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell: Option<[[f64; 3]; 3]>,
    #[serde(default)]
    pub pbc: [bool; 3],
}

impl Structure {
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Reduced chemical formula in order of first appearance, e.g. `Pt3O`
    pub fn formula(&self) -> String {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for symbol in &self.symbols {
            match counts.iter_mut().find(|entry| entry.0 == symbol.as_str()) {
                Some(entry) => entry.1 += 1,
                None => counts.push((symbol.as_str(), 1)),
            }
        }
        counts
            .iter()
            .map(|(s, n)| if *n == 1 { s.to_string() } else { format!("{s}{n}") })
            .collect()
    }

    pub fn validate(&self) -> Result<(), StructureError> {
        if self.is_empty() {
            return Err(StructureError::Empty);
        }
        if self.symbols.len() != self.positions.len() {
            return Err(StructureError::LengthMismatch {
                symbols: self.symbols.len(),
                positions: self.positions.len(),
            });
        }
        if let Some(i) = self.positions.iter().position(|p| p.iter().any(|x| !x.is_finite())) {
            return Err(StructureError::NonFinitePosition(i));
        }
        if let Some(cell) = &self.cell {
            if cell.iter().flatten().any(|x| !x.is_finite()) {
                return Err(StructureError::NonFiniteCell);
            }
        }
        Ok(())
    }
}

/// One document accepted by `insert`: a structure with an optional calculator attached
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SystemRecord {
    pub structure: Structure,
    #[serde(default)]
    pub calculator: Option<CalculatorSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water() -> Structure {
        Structure {
            symbols: vec!["O".into(), "H".into(), "H".into()],
            positions: vec![[0.0, 0.0, 0.119], [0.0, 0.763, -0.477], [0.0, -0.763, -0.477]],
            cell: None,
            pbc: [false; 3],
        }
    }

    #[test]
    fn formula_counts_repeated_symbols() {
        assert_eq!(water().formula(), "OH2");
    }

    #[test]
    fn valid_structure_passes() {
        assert_eq!(water().validate(), Ok(()));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let mut s = water();
        s.positions.pop();
        assert_eq!(s.validate(), Err(StructureError::LengthMismatch { symbols: 3, positions: 2 }));
    }

    #[test]
    fn nan_position_is_rejected() {
        let mut s = water();
        s.positions[1][2] = f64::NAN;
        assert_eq!(s.validate(), Err(StructureError::NonFinitePosition(1)));
    }

    #[test]
    fn empty_structure_is_rejected() {
        let s = Structure { symbols: vec![], positions: vec![], cell: None, pbc: [false; 3] };
        assert_eq!(s.validate(), Err(StructureError::Empty));
    }

    #[test]
    fn pbc_defaults_to_false() {
        let s: Structure = serde_json::from_str(r#"{"symbols": ["Cu"], "positions": [[0, 0, 0]]}"#).unwrap();
        assert_eq!(s.pbc, [false; 3]);
        assert!(s.cell.is_none());
    }
}
