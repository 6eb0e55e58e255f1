use crate::sim::Simulator;
use sweep_core::{parse_convergence, parse_duration_ms, Convergence, TrialConfig};
use tracing::warn;

/// Parsed measurements from one successful simulator run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome {
    pub elapsed_ms: f64,
    pub convergence: Convergence,
}

/// Execute one trial and absorb every failure mode at this boundary.
///
/// Launch errors, timeouts, signal death and nonzero exits all become
/// `None` after a logged diagnostic carrying the argument vector;
/// nothing propagates to the driver. On success, stderr feeds the
/// duration parser and stdout the convergence parser, per the
/// simulator's logging convention.
pub fn run_trial<S: Simulator + ?Sized>(sim: &S, config: &TrialConfig) -> Option<TrialOutcome> {
    let output = match sim.run(config) {
        Ok(output) => output,
        Err(err) => {
            warn!(args = ?config.args(), error = %format!("{err:#}"), "trial failed to execute");
            return None;
        }
    };
    if !output.success() {
        warn!(
            args = ?config.args(),
            exit_code = output.exit_code,
            stderr_tail = %tail(&output.stderr, 200),
            "simulator exited with failure"
        );
        return None;
    }
    Some(TrialOutcome {
        elapsed_ms: parse_duration_ms(&output.stderr),
        convergence: parse_convergence(config.algorithm, &output.stdout),
    })
}

fn tail(text: &str, max: usize) -> &str {
    let trimmed = text.trim_end();
    match trimmed.char_indices().nth_back(max.saturating_sub(1)) {
        Some((idx, _)) => &trimmed[idx..],
        None => trimmed,
    }
}
