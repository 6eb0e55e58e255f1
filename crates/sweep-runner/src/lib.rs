//! Execution engine for the convergence sweep: the simulator
//! subprocess boundary, trial aggregation, the grid driver, and the
//! append-only CSV ledger.

pub mod aggregate;
pub mod ledger;
pub mod runner;
pub mod sim;
pub mod sweep;

pub use aggregate::{run_trials, SweepRecord};
pub use ledger::{append_records, LedgerWrite};
pub use runner::{run_trial, TrialOutcome};
pub use sim::{ProcessSimulator, SimOutput, Simulator};
pub use sweep::{run_sweep, SweepOutcome};
