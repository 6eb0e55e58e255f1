//! Parameter grid and output-parsing grammar for the convergence
//! sweep harness. Everything here is pure data and text handling; the
//! process plumbing lives in `sweep-runner`.

pub mod grid;
pub mod parse;

pub use grid::{Algorithm, GridError, SweepSpec, Topology, TrialConfig};
pub use parse::{parse_convergence, parse_duration_ms, Convergence};
