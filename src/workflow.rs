//! The procedures exposed on the command line
//!
//! Each one is a one-shot step of a row's lifecycle. Ordering between them is left to the
//! operator and SLURM.

/// Read and write the row id files inside job directories
pub mod marker;
/// Create one job directory per pending row
pub mod provision;
/// Relax the structure of one row
pub mod run;
/// Mark one row as queued
pub mod queue;
/// Load structure files into the store
pub mod insert;
/// Summarise the store by job state
pub mod status;
