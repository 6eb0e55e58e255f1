use crate::runner::run_trial;
use crate::sim::Simulator;
use sweep_core::{Convergence, TrialConfig};
use tracing::{info, warn};

/// Aggregated measurements for one fully successful configuration:
/// every per-trial sequence has exactly `trials` entries, positionally
/// aligned, and `average_ms` is their arithmetic mean.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRecord {
    pub config: TrialConfig,
    pub elapsed_ms: Vec<f64>,
    pub average_ms: f64,
    pub convergence: Vec<Convergence>,
}

/// Run `trials` sequential trials for one configuration.
///
/// Failed trials are not retried and contribute nothing. A record is
/// produced iff every trial succeeded; partial data is dropped whole
/// rather than averaged over fewer samples, so ledger columns stay
/// positionally meaningful.
pub fn run_trials<S: Simulator + ?Sized>(
    sim: &S,
    config: &TrialConfig,
    trials: usize,
) -> Option<SweepRecord> {
    let mut elapsed_ms = Vec::with_capacity(trials);
    let mut convergence = Vec::with_capacity(trials);
    for trial in 1..=trials {
        if let Some(outcome) = run_trial(sim, config) {
            info!(
                config = %config,
                trial,
                elapsed_ms = outcome.elapsed_ms,
                "trial complete"
            );
            elapsed_ms.push(outcome.elapsed_ms);
            convergence.push(outcome.convergence);
        } else {
            info!(config = %config, trial, "trial discarded");
        }
    }
    if elapsed_ms.len() != trials {
        warn!(
            config = %config,
            collected = elapsed_ms.len(),
            trials,
            "dropping configuration with failed trials"
        );
        return None;
    }
    let average_ms = elapsed_ms.iter().sum::<f64>() / trials as f64;
    Some(SweepRecord {
        config: config.clone(),
        elapsed_ms,
        average_ms,
        convergence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimOutput;
    use anyhow::anyhow;
    use std::sync::Mutex;
    use sweep_core::{Algorithm, Topology};

    /// Replays a scripted sequence of outcomes, one per invocation.
    pub(crate) struct ScriptedSim {
        script: Mutex<Vec<anyhow::Result<SimOutput>>>,
    }

    impl ScriptedSim {
        pub(crate) fn new(mut script: Vec<anyhow::Result<SimOutput>>) -> Self {
            script.reverse();
            ScriptedSim {
                script: Mutex::new(script),
            }
        }

        pub(crate) fn ok(stdout: &str, stderr: &str) -> anyhow::Result<SimOutput> {
            Ok(SimOutput {
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
                exit_code: Some(0),
            })
        }
    }

    impl Simulator for ScriptedSim {
        fn run(&self, _config: &TrialConfig) -> anyhow::Result<SimOutput> {
            self.script
                .lock()
                .expect("script lock")
                .pop()
                .unwrap_or_else(|| Err(anyhow!("script exhausted")))
        }
    }

    fn config() -> TrialConfig {
        TrialConfig {
            num_nodes: 27,
            topology: Topology::Grid3d,
            algorithm: Algorithm::PushSum,
            kill_percent: 0,
        }
    }

    fn timed(ms: u64) -> anyhow::Result<SimOutput> {
        ScriptedSim::ok("ratio: 1.0", &format!("#({ms}, MilliSecond)"))
    }

    #[test]
    fn all_success_yields_mean_and_ordered_sequences() {
        let sim = ScriptedSim::new(vec![timed(10), timed(20), timed(30)]);
        let record = run_trials(&sim, &config(), 3).expect("all trials pass");
        assert_eq!(record.elapsed_ms, vec![10.0, 20.0, 30.0]);
        assert_eq!(record.average_ms, 20.0);
        assert_eq!(record.convergence.len(), 3);
        assert_eq!(record.config, config());
    }

    #[test]
    fn one_failed_trial_drops_the_whole_configuration() {
        let sim = ScriptedSim::new(vec![timed(10), Err(anyhow!("boom")), timed(30)]);
        assert!(run_trials(&sim, &config(), 3).is_none());
    }

    #[test]
    fn nonzero_exit_counts_as_a_failed_trial() {
        let failed = Ok(SimOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: Some(2),
        });
        let sim = ScriptedSim::new(vec![timed(10), timed(20), failed]);
        assert!(run_trials(&sim, &config(), 3).is_none());
    }

    #[test]
    fn failed_trials_are_not_retried() {
        // Three trials consume exactly three script entries even when
        // the first one fails; a fourth entry would remain untouched.
        let sim = ScriptedSim::new(vec![Err(anyhow!("boom")), timed(20), timed(30), timed(99)]);
        assert!(run_trials(&sim, &config(), 3).is_none());
        assert_eq!(sim.script.lock().expect("script lock").len(), 1);
    }

    #[test]
    fn trial_count_other_than_three_is_respected() {
        let sim = ScriptedSim::new(vec![timed(5), timed(15)]);
        let record = run_trials(&sim, &config(), 2).expect("both trials pass");
        assert_eq!(record.elapsed_ms.len(), 2);
        assert_eq!(record.average_ms, 10.0);
    }
}
