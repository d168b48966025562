use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::info;
use serde::Deserialize;

use crate::calculator::{Calculator, CalculatorError};
use crate::structure::Structure;

/// Written to the working directory before the program starts
pub const INPUT_FILE: &str = "calc_input.json";
/// Read back from the working directory after the program exits 0
pub const OUTPUT_FILE: &str = "calc_output.json";

/// Runs `program args...` in a job directory
///
/// The program reads the structure from [`INPUT_FILE`] and must write [`OUTPUT_FILE`]:
///
/// ```json
/// { "energy": -12.3, "structure": { "symbols": [...], "positions": [...] } }
/// ```
///
/// `structure` is optional; when present it is the relaxed geometry and replaces the input.
pub struct CommandCalculator {
    program: String,
    args: Vec<String>,
    work_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CalculationOutput {
    energy: f64,
    #[serde(default)]
    structure: Option<Structure>,
}

impl CommandCalculator {
    pub fn new(program: &str, args: Vec<String>, work_dir: &Path) -> Self {
        CommandCalculator { program: program.to_string(), args, work_dir: work_dir.to_path_buf() }
    }

    fn write_input(&self, structure: &Structure) -> Result<(), CalculatorError> {
        let out_path = self.work_dir.join(INPUT_FILE);
        info!("Writing calculator input to {}", out_path.display());
        fs::write(out_path, serde_json::to_string_pretty(structure)?)?;
        Ok(())
    }

    fn read_output(&self) -> Result<CalculationOutput, CalculatorError> {
        let in_path = self.work_dir.join(OUTPUT_FILE);
        info!("Reading calculator output from {}", in_path.display());
        let json = fs::read_to_string(in_path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl Calculator for CommandCalculator {
    fn name(&self) -> &str {
        &self.program
    }

    fn potential_energy(&mut self, structure: &mut Structure) -> Result<f64, CalculatorError> {
        self.write_input(structure)?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).current_dir(&self.work_dir);
        info!("Running calculator process");
        info!("{:?}", &cmd);
        let status = cmd.status().map_err(|source| CalculatorError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        if !status.success() {
            return Err(CalculatorError::Failed { program: self.program.clone(), status });
        }

        let output = self.read_output()?;
        if !output.energy.is_finite() {
            return Err(CalculatorError::NonFiniteEnergy);
        }
        if let Some(relaxed) = output.structure {
            if relaxed.len() != structure.len() {
                return Err(CalculatorError::AtomCountChanged { expected: structure.len(), returned: relaxed.len() });
            }
            *structure = relaxed;
        }
        Ok(output.energy)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn hydrogen() -> Structure {
        Structure {
            symbols: vec!["H".into(), "H".into()],
            positions: vec![[0.0, 0.0, 0.0], [0.0, 0.0, 0.74]],
            cell: None,
            pbc: [false; 3],
        }
    }

    fn shell(work_dir: &Path, script: &str) -> CommandCalculator {
        CommandCalculator::new("/bin/sh", vec!["-c".into(), script.into()], work_dir)
    }

    #[test]
    fn reads_energy_and_relaxed_structure() {
        let dir = tempfile::tempdir().unwrap();
        let script = r#"printf '{"energy": -6.5, "structure": {"symbols": ["H", "H"], "positions": [[0, 0, 0], [0, 0, 0.75]]}}' > calc_output.json"#;
        let mut calc = shell(dir.path(), script);
        let mut s = hydrogen();

        let energy = calc.potential_energy(&mut s).unwrap();

        assert_eq!(energy, -6.5);
        assert_eq!(s.positions[1], [0.0, 0.0, 0.75]);
        assert!(dir.path().join(INPUT_FILE).exists());
    }

    #[test]
    fn keeps_structure_when_output_has_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut calc = shell(dir.path(), r#"printf '{"energy": -1.0}' > calc_output.json"#);
        let mut s = hydrogen();

        calc.potential_energy(&mut s).unwrap();

        assert_eq!(s, hydrogen());
    }

    #[test]
    fn non_zero_exit_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut calc = shell(dir.path(), "exit 3");
        let result = calc.potential_energy(&mut hydrogen());
        assert!(matches!(result, Err(CalculatorError::Failed { .. })));
    }

    #[test]
    fn missing_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut calc = shell(dir.path(), "true");
        let result = calc.potential_energy(&mut hydrogen());
        assert!(matches!(result, Err(CalculatorError::Io(_))));
    }

    #[test]
    fn changed_atom_count_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let script = r#"printf '{"energy": -1.0, "structure": {"symbols": ["H"], "positions": [[0, 0, 0]]}}' > calc_output.json"#;
        let mut calc = shell(dir.path(), script);
        let result = calc.potential_energy(&mut hydrogen());
        assert!(matches!(result, Err(CalculatorError::AtomCountChanged { expected: 2, returned: 1 })));
    }
}
