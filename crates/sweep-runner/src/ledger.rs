use crate::aggregate::SweepRecord;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Outcome of one ledger append: row count plus whether the file (and
/// so the header) was created by this call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerWrite {
    pub rows: usize,
    pub created: bool,
}

/// Append records to the CSV ledger at `path`.
///
/// A missing file is created and gets the header first; an existing
/// file is appended to with rows only, never a second header. That
/// makes repeated harness runs against one path cumulative. Column
/// count depends on `trials`, so the caller must keep the trial count
/// stable per ledger file; no schema tag is persisted or checked.
pub fn append_records(path: &Path, records: &[SweepRecord], trials: usize) -> Result<LedgerWrite> {
    let created = !path.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open ledger {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    if created {
        writeln!(writer, "{}", header(trials))?;
    }
    for record in records {
        writeln!(writer, "{}", row(record))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush ledger {}", path.display()))?;
    Ok(LedgerWrite {
        rows: records.len(),
        created,
    })
}

fn header(trials: usize) -> String {
    let mut cols = vec![
        "numNodes".to_string(),
        "topology".to_string(),
        "algorithm".to_string(),
    ];
    for i in 1..=trials {
        cols.push(format!("run{i}_ms"));
    }
    cols.push("average_ms".to_string());
    for i in 1..=trials {
        cols.push(format!("convergence_value_{i}"));
    }
    cols.push("kill_percent".to_string());
    cols.join(",")
}

fn row(record: &SweepRecord) -> String {
    let mut cols = vec![
        record.config.num_nodes.to_string(),
        record.config.topology.to_string(),
        record.config.algorithm.to_string(),
    ];
    for elapsed in &record.elapsed_ms {
        cols.push(elapsed.to_string());
    }
    cols.push(record.average_ms.to_string());
    for convergence in &record.convergence {
        cols.push(convergence.as_csv_field().to_string());
    }
    cols.push(record.config.kill_percent.to_string());
    cols.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweep_core::{Algorithm, Convergence, Topology, TrialConfig};

    fn record(num_nodes: u32) -> SweepRecord {
        SweepRecord {
            config: TrialConfig {
                num_nodes,
                topology: Topology::Grid3d,
                algorithm: Algorithm::PushSum,
                kill_percent: 10,
            },
            elapsed_ms: vec![10.0, 20.5, 30.0],
            average_ms: 20.166666666666668,
            convergence: vec![
                Convergence::Value("500.5".to_string()),
                Convergence::Missing,
                Convergence::Value("1.0e-3".to_string()),
            ],
        }
    }

    #[test]
    fn header_matches_published_schema_for_three_trials() {
        assert_eq!(
            header(3),
            "numNodes,topology,algorithm,run1_ms,run2_ms,run3_ms,average_ms,\
             convergence_value_1,convergence_value_2,convergence_value_3,kill_percent"
        );
    }

    #[test]
    fn fresh_path_gets_header_then_rows() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ledger.csv");
        let write = append_records(&path, &[record(8), record(27)], 3).expect("write");
        assert_eq!(write, LedgerWrite { rows: 2, created: true });

        let text = std::fs::read_to_string(&path).expect("read ledger");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("numNodes,topology,algorithm,run1_ms"));
        assert_eq!(
            lines[1],
            "8,3d,push-sum,10,20.5,30,20.166666666666668,500.5,N/A,1.0e-3,10"
        );
        assert!(lines[2].starts_with("27,3d,push-sum,"));
    }

    #[test]
    fn append_to_existing_path_writes_no_second_header() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ledger.csv");
        append_records(&path, &[record(8)], 3).expect("first write");
        let write = append_records(&path, &[record(27), record(64)], 3).expect("second write");
        assert_eq!(write, LedgerWrite { rows: 2, created: false });

        let text = std::fs::read_to_string(&path).expect("read ledger");
        let headers = text
            .lines()
            .filter(|l| l.starts_with("numNodes"))
            .count();
        assert_eq!(headers, 1);
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn empty_record_set_still_creates_header() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ledger.csv");
        let write = append_records(&path, &[], 3).expect("write");
        assert_eq!(write, LedgerWrite { rows: 0, created: true });
        let text = std::fs::read_to_string(&path).expect("read ledger");
        assert_eq!(text.lines().count(), 1);

        // A second empty write appends nothing and keeps one header.
        let write = append_records(&path, &[], 3).expect("rewrite");
        assert_eq!(write, LedgerWrite { rows: 0, created: false });
        let text = std::fs::read_to_string(&path).expect("read ledger");
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn column_count_follows_trial_count() {
        assert_eq!(header(1).split(',').count(), 3 + 1 + 1 + 1 + 1);
        assert_eq!(header(3).split(',').count(), 11);
        let rendered = row(&record(8));
        assert_eq!(rendered.split(',').count(), 11);
    }

    #[test]
    fn unwritable_path_is_a_real_error() {
        let err = append_records(Path::new("/nonexistent-dir/ledger.csv"), &[record(8)], 3)
            .expect_err("open must fail");
        assert!(err.to_string().contains("failed to open ledger"));
    }
}
