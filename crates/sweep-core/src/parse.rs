use crate::grid::Algorithm;
use regex::Regex;
use std::sync::OnceLock;

/// Convergence metric extracted from simulator stdout.
///
/// Push-sum prints a mass ratio at its fixed point; gossip has no
/// comparable value. The two "no value" cases stay distinct in memory
/// even though both render as `N/A` in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Convergence {
    /// Literal token as printed by the simulator, precision untouched.
    Value(String),
    /// The algorithm has no ratio outcome at all.
    NotApplicable,
    /// A ratio was expected but never appeared in the output.
    Missing,
}

impl Convergence {
    pub fn as_csv_field(&self) -> &str {
        match self {
            Convergence::Value(v) => v,
            Convergence::NotApplicable | Convergence::Missing => "N/A",
        }
    }
}

fn duration_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#\((\d+), (\w+)\)").expect("duration pattern is valid"))
}

fn ratio_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"ratio:\s*([0-9.eE+-]+)").expect("ratio pattern is valid"))
}

/// Total up duration tokens of the shape `#(<count>, <Unit>)` into
/// milliseconds.
///
/// Units match case-insensitively on prefix (Second / MilliSecond /
/// MicroSecond). The simulator prints one breakdown per family, so a
/// repeated family overwrites rather than sums. Absent families count
/// as zero; input with no tokens at all yields `0.0`, never an error.
pub fn parse_duration_ms(text: &str) -> f64 {
    let mut seconds = 0u64;
    let mut millis = 0u64;
    let mut micros = 0u64;
    for caps in duration_pattern().captures_iter(text) {
        let Ok(count) = caps[1].parse::<u64>() else {
            continue;
        };
        let unit = caps[2].to_ascii_lowercase();
        if unit.starts_with("second") {
            seconds = count;
        } else if unit.starts_with("milli") {
            millis = count;
        } else if unit.starts_with("micro") {
            micros = count;
        }
    }
    seconds as f64 * 1000.0 + millis as f64 + micros as f64 / 1000.0
}

/// Extract the `ratio: <number>` token from simulator stdout.
///
/// Only ratio-converging algorithms carry one; for anything else the
/// input is ignored entirely. The captured number is kept as the
/// printed string so scientific notation and trailing digits survive
/// the trip into the ledger.
pub fn parse_convergence(algorithm: Algorithm, text: &str) -> Convergence {
    if !algorithm.is_ratio_converging() {
        return Convergence::NotApplicable;
    }
    match ratio_pattern().captures(text) {
        Some(caps) => Convergence::Value(caps[1].to_string()),
        None => Convergence::Missing,
    }
}
