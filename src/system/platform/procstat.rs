use std::io::BufRead;

use crate::system::error::SampleError;
use crate::system::snapshot::TickSnapshot;

/// Parses per-core `cpuN` lines of a `/proc/stat` style source, in file order.
///
/// The aggregate `cpu` line and every non-CPU line are skipped.
pub fn parse_proc_stat<R: BufRead>(reader: R) -> Result<Vec<TickSnapshot>, SampleError> {
    let mut ticks = Vec::new();
    for line in reader.lines() {
        let line =
            line.map_err(|e| SampleError::io(e.raw_os_error().unwrap_or(1), e.to_string()))?;
        let mut fields = line.split_whitespace();
        let Some(label) = fields.next() else {
            continue;
        };
        if !is_core_label(label) {
            continue;
        }

        // user nice system idle
        let counters: Vec<u64> = fields.take(4).map_while(|f| f.parse().ok()).collect();
        match counters[..] {
            [user, nice, system, idle] => ticks.push(TickSnapshot::new(user, nice, system, idle)),
            _ => tracing::debug!(line = %line, "skipping malformed core counter line"),
        }
    }
    Ok(ticks)
}

fn is_core_label(label: &str) -> bool {
    label
        .strip_prefix("cpu")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
cpu  2255 34 2290 22625563 6290 127 456 0 0 0
cpu0 1132 34 1441 11311718 3675 127 438 0 0 0
cpu1 1123 0 849 11313845 2614 0 18 0 0 0
intr 114930548 113199788 3 0 5 263 0 4 [...]
ctxt 1990473
btime 1062191376
processes 2915
procs_running 1
";

    #[test]
    fn skips_aggregate_and_non_cpu_lines() {
        let ticks = parse_proc_stat(SAMPLE.as_bytes()).unwrap();
        assert_eq!(
            ticks,
            vec![
                TickSnapshot::new(1132, 34, 1441, 11311718),
                TickSnapshot::new(1123, 0, 849, 11313845),
            ]
        );
    }

    #[test]
    fn short_core_lines_are_skipped() {
        let ticks = parse_proc_stat("cpu0 1 2 3\ncpu1 4 5 6 7\n".as_bytes()).unwrap();
        assert_eq!(ticks, vec![TickSnapshot::new(4, 5, 6, 7)]);
    }

    #[test]
    fn core_label_requires_digits() {
        assert!(is_core_label("cpu12"));
        assert!(!is_core_label("cpu"));
        assert!(!is_core_label("cpufreq"));
        assert!(!is_core_label("intr"));
    }

    #[test]
    fn empty_source_yields_no_cores() {
        assert!(parse_proc_stat("".as_bytes()).unwrap().is_empty());
    }
}
