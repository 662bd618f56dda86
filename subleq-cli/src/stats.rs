//! Statistics table (stderr) and hot-spot profiler report
//! (`profiler_report.txt`).

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::time::Duration;

use subleq::Opcode;

/// Writes the fixed-column substitution/execution table to `out`.
pub fn write_table<W: Write>(
    out: &mut W,
    substitutions: &[u64; 21],
    executions: &[u64; 21],
    elapsed: Duration,
    max_addr: u16,
) -> io::Result<()> {
    let total_substitutions: u64 = substitutions.iter().sum();
    let total_executions: u64 = executions.iter().sum();

    writeln!(
        out,
        "{:<8}{:>12}{:>8}{:>14}{:>8}",
        "opcode", "substituted", "%", "executed", "%"
    )?;

    for opcode in Opcode::ALL.iter() {
        let subs = substitutions[*opcode as usize];
        let execs = executions[*opcode as usize];
        let sub_pct = percentage(subs, total_substitutions);
        let exec_pct = percentage(execs, total_executions);
        writeln!(
            out,
            "{:<8}{:>12}{:>7.2}%{:>14}{:>7.2}%",
            opcode, subs, sub_pct, execs, exec_pct
        )?;
    }

    writeln!(out, "total{:>11}{:>14}", total_substitutions, total_executions)?;
    writeln!(out, "elapsed: {:.3}s", elapsed.as_secs_f64())?;
    writeln!(out, "highest address written: {}", max_addr)?;
    Ok(())
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64) * 100.0 / (total as f64)
    }
}

/// Writes a human-readable instruction mix and top-k hot-spot list to
/// `profiler_report.txt`, flushing and surfacing any close failure
/// distinctly from the rest of the run.
pub fn write_profile_report(
    path: &std::path::Path,
    substitutions: &[u64; 21],
    address_counts: &[u64],
) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "instruction mix:")?;
    let total_substitutions: u64 = substitutions.iter().sum();
    for opcode in Opcode::ALL.iter() {
        let subs = substitutions[*opcode as usize];
        if subs == 0 {
            continue;
        }
        writeln!(
            writer,
            "  {:<8}{:>10}{:>8.2}%",
            opcode,
            subs,
            percentage(subs, total_substitutions)
        )?;
    }

    writeln!(writer)?;
    writeln!(writer, "top hot spots:")?;

    let mut hot_spots: Vec<(usize, u64)> = address_counts
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count > 0)
        .map(|(addr, &count)| (addr, count))
        .collect();
    hot_spots.sort_unstable_by(|a, b| b.1.cmp(&a.1));
    hot_spots.truncate(subleq::constants::MAX_HOT_SPOTS);

    for (addr, count) in &hot_spots {
        writeln!(writer, "  {:>6}: {}", addr, count)?;
    }

    writer.flush()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn table_reports_totals_and_max_addr() {
        let mut subs = [0u64; 21];
        let mut execs = [0u64; 21];
        subs[Opcode::Zero as usize] = 2;
        execs[Opcode::Zero as usize] = 5;

        let mut out = Vec::new();
        write_table(&mut out, &subs, &execs, Duration::from_millis(250), 1234).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("total          2             5"));
        assert!(text.contains("elapsed: 0.250s"));
        assert!(text.contains("highest address written: 1234"));
    }

    #[test]
    fn percentage_of_zero_total_is_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 0), 0.0);
    }
}
