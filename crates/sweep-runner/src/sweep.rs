use crate::aggregate::{run_trials, SweepRecord};
use crate::sim::Simulator;
use sweep_core::SweepSpec;
use tracing::info;

/// What a full sweep produced: complete records in enumeration order,
/// plus the attempted/dropped tally the ledger itself never records.
#[derive(Debug)]
pub struct SweepOutcome {
    pub records: Vec<SweepRecord>,
    pub attempted: usize,
    pub dropped: usize,
}

/// Drive the whole grid, one configuration at a time.
///
/// The enumeration is exhaustive and stateless: every grid point is
/// attempted exactly once, in `SweepSpec::configurations()` order, and
/// no prior result influences a later configuration. Configurations
/// with any failed trial simply yield no record.
pub fn run_sweep<S: Simulator + ?Sized>(sim: &S, spec: &SweepSpec) -> SweepOutcome {
    let configs = spec.configurations();
    let attempted = configs.len();
    let mut records = Vec::new();
    for (index, config) in configs.iter().enumerate() {
        info!(
            config = %config,
            position = index + 1,
            total = attempted,
            trials = spec.trials,
            "running configuration"
        );
        if let Some(record) = run_trials(sim, config, spec.trials) {
            records.push(record);
        }
    }
    let dropped = attempted - records.len();
    SweepOutcome {
        records,
        attempted,
        dropped,
    }
}
