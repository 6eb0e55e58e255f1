use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("unknown topology '{0}' (expected line, 3d, imp3d or full)")]
    UnknownTopology(String),
    #[error("unknown algorithm '{0}' (expected gossip or push-sum)")]
    UnknownAlgorithm(String),
    #[error("kill percent {0} is out of range (0..=100)")]
    KillPercentOutOfRange(u32),
    #[error("network size must be at least 1")]
    ZeroNetworkSize,
    #[error("trial count must be at least 1")]
    ZeroTrials,
    #[error("sweep axis '{0}' is empty")]
    EmptyAxis(&'static str),
    #[error("simulator command is empty")]
    EmptyCommand,
    #[error("failed to read sweep spec {path}")]
    SpecRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse sweep spec {path}")]
    SpecParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Network shape handed to the simulator. Wire spellings match the
/// simulator's positional argument vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topology {
    #[serde(rename = "line")]
    Line,
    #[serde(rename = "3d")]
    Grid3d,
    #[serde(rename = "imp3d")]
    ImperfectGrid3d,
    #[serde(rename = "full")]
    FullMesh,
}

impl Topology {
    pub fn all() -> Vec<Topology> {
        vec![
            Topology::Line,
            Topology::Grid3d,
            Topology::ImperfectGrid3d,
            Topology::FullMesh,
        ]
    }

    pub fn as_arg(self) -> &'static str {
        match self {
            Topology::Line => "line",
            Topology::Grid3d => "3d",
            Topology::ImperfectGrid3d => "imp3d",
            Topology::FullMesh => "full",
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}

impl FromStr for Topology {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "line" => Ok(Topology::Line),
            "3d" => Ok(Topology::Grid3d),
            "imp3d" => Ok(Topology::ImperfectGrid3d),
            "full" => Ok(Topology::FullMesh),
            other => Err(GridError::UnknownTopology(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    #[serde(rename = "gossip")]
    Gossip,
    #[serde(rename = "push-sum")]
    PushSum,
}

impl Algorithm {
    pub fn all() -> Vec<Algorithm> {
        vec![Algorithm::Gossip, Algorithm::PushSum]
    }

    pub fn as_arg(self) -> &'static str {
        match self {
            Algorithm::Gossip => "gossip",
            Algorithm::PushSum => "push-sum",
        }
    }

    /// Whether the algorithm reports a fixed-point ratio on stdout.
    /// Gossip terminates on rumor counts and has no such value.
    pub fn is_ratio_converging(self) -> bool {
        matches!(self, Algorithm::PushSum)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}

impl FromStr for Algorithm {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gossip" => Ok(Algorithm::Gossip),
            "push-sum" => Ok(Algorithm::PushSum),
            other => Err(GridError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// One point in the sweep grid. Immutable once enumerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialConfig {
    pub num_nodes: u32,
    pub topology: Topology,
    pub algorithm: Algorithm,
    pub kill_percent: u32,
}

impl TrialConfig {
    /// Positional argument tail for the simulator:
    /// `<size> <topology> <algorithm> <kill_percent>`.
    pub fn args(&self) -> Vec<String> {
        vec![
            self.num_nodes.to_string(),
            self.topology.as_arg().to_string(),
            self.algorithm.as_arg().to_string(),
            self.kill_percent.to_string(),
        ]
    }
}

impl fmt::Display for TrialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "N={} topology={} algorithm={} kill={}",
            self.num_nodes, self.topology, self.algorithm, self.kill_percent
        )
    }
}

fn default_sizes() -> Vec<u32> {
    // Perfect cubes so the 3d topologies always tile exactly.
    (2u32..7).map(|i| i * i * i).collect()
}

fn default_kill_percents() -> Vec<u32> {
    vec![0]
}

fn default_trials() -> usize {
    3
}

fn default_ledger() -> PathBuf {
    PathBuf::from("convergence_times.csv")
}

/// The full sweep described as one immutable value: simulator command,
/// grid axes, trial count, optional per-process timeout, and ledger
/// path. Loadable from YAML; the CLI overlays flag overrides on top.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepSpec {
    /// Program plus fixed leading arguments; the grid arguments are
    /// appended positionally per configuration.
    #[serde(default)]
    pub simulator: Vec<String>,
    #[serde(default = "default_sizes")]
    pub sizes: Vec<u32>,
    #[serde(default = "Topology::all")]
    pub topologies: Vec<Topology>,
    #[serde(default = "Algorithm::all")]
    pub algorithms: Vec<Algorithm>,
    #[serde(default = "default_kill_percents")]
    pub kill_percents: Vec<u32>,
    #[serde(default = "default_trials")]
    pub trials: usize,
    /// Upper bound on one simulator invocation, in seconds. `None`
    /// waits indefinitely, matching the original harness.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_ledger")]
    pub ledger: PathBuf,
}

impl Default for SweepSpec {
    fn default() -> Self {
        SweepSpec {
            simulator: Vec::new(),
            sizes: default_sizes(),
            topologies: Topology::all(),
            algorithms: Algorithm::all(),
            kill_percents: default_kill_percents(),
            trials: default_trials(),
            timeout_secs: None,
            ledger: default_ledger(),
        }
    }
}

impl SweepSpec {
    pub fn from_yaml_file(path: &Path) -> Result<SweepSpec, GridError> {
        let text = std::fs::read_to_string(path).map_err(|source| GridError::SpecRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| GridError::SpecParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), GridError> {
        if self.simulator.is_empty() {
            return Err(GridError::EmptyCommand);
        }
        if self.sizes.is_empty() {
            return Err(GridError::EmptyAxis("sizes"));
        }
        if self.topologies.is_empty() {
            return Err(GridError::EmptyAxis("topologies"));
        }
        if self.algorithms.is_empty() {
            return Err(GridError::EmptyAxis("algorithms"));
        }
        if self.kill_percents.is_empty() {
            return Err(GridError::EmptyAxis("kill_percents"));
        }
        if self.trials == 0 {
            return Err(GridError::ZeroTrials);
        }
        if self.sizes.contains(&0) {
            return Err(GridError::ZeroNetworkSize);
        }
        if let Some(&bad) = self.kill_percents.iter().find(|&&k| k > 100) {
            return Err(GridError::KillPercentOutOfRange(bad));
        }
        Ok(())
    }

    /// Enumerate the full Cartesian product. Nesting order (algorithm
    /// outermost, then size, topology, kill percent) is a visible
    /// contract: it fixes the order rows land in the ledger.
    pub fn configurations(&self) -> Vec<TrialConfig> {
        let mut configs =
            Vec::with_capacity(self.total_configurations());
        for &algorithm in &self.algorithms {
            for &num_nodes in &self.sizes {
                for &topology in &self.topologies {
                    for &kill_percent in &self.kill_percents {
                        configs.push(TrialConfig {
                            num_nodes,
                            topology,
                            algorithm,
                            kill_percent,
                        });
                    }
                }
            }
        }
        configs
    }

    pub fn total_configurations(&self) -> usize {
        self.sizes.len()
            * self.topologies.len()
            * self.algorithms.len()
            * self.kill_percents.len()
    }
}
