use std::mem;
use std::thread;
use std::time::Duration;

use super::error::SampleError;
use super::platform::Sampler;
use super::snapshot::TickSnapshot;

/// Pause between the warm-up sample and the retained sample of one load.
pub const LOAD_INTERVAL: Duration = Duration::from_secs(1);

/// Utilization of one core over the interval between two generations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoreUsage {
    pub core: usize,
    pub total_percent: f64,
    pub user_percent: f64,
    pub system_percent: f64,
}

/// Derives percentages for `core` from two time-ordered snapshots.
///
/// All three percentages share the elapsed total ticks as denominator. When no
/// ticks elapsed the pair carries no information and `DivideByZero` is
/// returned instead of a NaN.
pub fn usage_between(
    core: usize,
    current: &TickSnapshot,
    previous: &TickSnapshot,
) -> Result<CoreUsage, SampleError> {
    let elapsed = current.total().saturating_sub(previous.total());
    if elapsed == 0 {
        return Err(SampleError::DivideByZero { core });
    }
    let elapsed = elapsed as f64;
    let percent = |now: u64, before: u64| now.saturating_sub(before) as f64 / elapsed * 100.0;

    Ok(CoreUsage {
        core,
        total_percent: percent(current.used(), previous.used()),
        user_percent: percent(current.user, previous.user),
        system_percent: percent(current.system, previous.system),
    })
}

/// Two generations of per-core tick snapshots.
#[derive(Debug)]
pub struct CpuLoad {
    current: Vec<TickSnapshot>,
    previous: Vec<TickSnapshot>,
    interval: Duration,
}

impl Default for CpuLoad {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuLoad {
    pub fn new() -> Self {
        Self::with_interval(LOAD_INTERVAL)
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            current: Vec::new(),
            previous: Vec::new(),
            interval,
        }
    }

    /// Builds a loaded pair directly, mainly for callers that sampled elsewhere.
    pub fn from_generations(previous: Vec<TickSnapshot>, current: Vec<TickSnapshot>) -> Self {
        Self {
            current,
            previous,
            interval: LOAD_INTERVAL,
        }
    }

    /// Takes a warm-up sample, waits the load interval, then takes the
    /// retained sample. Always samples twice, even when a generation is held.
    pub fn load(&mut self, sampler: &dyn Sampler) -> Result<(), SampleError> {
        let _span = tracing::debug_span!("cpu.load").entered();
        self.advance(sampler)?;
        self.advance(sampler)
    }

    fn advance(&mut self, sampler: &dyn Sampler) -> Result<(), SampleError> {
        if !self.current.is_empty() {
            self.previous = mem::take(&mut self.current);
            thread::sleep(self.interval);
        }
        let fresh = sampler.sample_cpu()?;
        if fresh.is_empty() {
            return Err(SampleError::NoCores);
        }
        self.current = fresh;
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        !self.current.is_empty() && !self.previous.is_empty()
    }

    pub fn current(&self) -> &[TickSnapshot] {
        &self.current
    }

    pub fn previous(&self) -> &[TickSnapshot] {
        &self.previous
    }

    /// Per-core usage in core-index order.
    pub fn usage(&self) -> Result<Vec<CoreUsage>, SampleError> {
        if !self.is_loaded() {
            return Err(SampleError::NotLoaded);
        }
        if self.current.len() != self.previous.len() {
            return Err(SampleError::CoreCountMismatch {
                current: self.current.len(),
                previous: self.previous.len(),
            });
        }
        self.current
            .iter()
            .zip(&self.previous)
            .enumerate()
            .map(|(core, (current, previous))| usage_between(core, current, previous))
            .collect()
    }
}

/// Mean utilization across cores.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CpuSummary {
    pub total_percent: f64,
    pub user_percent: f64,
    pub system_percent: f64,
}

impl CpuSummary {
    pub fn from_usages(usages: &[CoreUsage]) -> Option<Self> {
        if usages.is_empty() {
            return None;
        }
        let n = usages.len() as f64;
        let mean = |f: fn(&CoreUsage) -> f64| usages.iter().map(f).sum::<f64>() / n;
        Some(Self {
            total_percent: mean(|u| u.total_percent),
            user_percent: mean(|u| u.user_percent),
            system_percent: mean(|u| u.system_percent),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::system::snapshot::InterfaceSnapshot;

    struct Scripted {
        samples: Mutex<Vec<Result<Vec<TickSnapshot>, SampleError>>>,
    }

    impl Scripted {
        fn new(mut samples: Vec<Result<Vec<TickSnapshot>, SampleError>>) -> Self {
            samples.reverse();
            Self {
                samples: Mutex::new(samples),
            }
        }
    }

    impl Sampler for Scripted {
        fn sample_cpu(&self) -> Result<Vec<TickSnapshot>, SampleError> {
            self.samples
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(SampleError::UnsupportedPlatform))
        }

        fn sample_network(&self) -> Result<Vec<InterfaceSnapshot>, SampleError> {
            Ok(Vec::new())
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn single_core_pair_matches_hand_computed_percentages() {
        // Totals 100 -> 200: 15 used, 10 user, 5 system ticks out of 100.
        let previous = TickSnapshot::new(10, 0, 5, 85);
        let current = TickSnapshot::new(20, 0, 10, 170);
        let usage = usage_between(0, &current, &previous).unwrap();
        assert!(close(usage.total_percent, 15.0), "{usage:?}");
        assert!(close(usage.user_percent, 10.0), "{usage:?}");
        assert!(close(usage.system_percent, 5.0), "{usage:?}");
    }

    #[test]
    fn denominator_is_elapsed_total_ticks() {
        // Totals 100 -> 205: 15 used ticks out of 105.
        let previous = TickSnapshot::new(10, 0, 5, 85);
        let current = TickSnapshot::new(20, 0, 10, 175);
        let usage = usage_between(0, &current, &previous).unwrap();
        assert!(close(usage.total_percent, 14.29), "{usage:?}");
        assert!(close(usage.user_percent, 9.52), "{usage:?}");
        assert!(close(usage.system_percent, 4.76), "{usage:?}");
    }

    #[test]
    fn frozen_counters_report_divide_by_zero() {
        let ticks = TickSnapshot::new(10, 1, 5, 85);
        assert_eq!(
            usage_between(2, &ticks, &ticks),
            Err(SampleError::DivideByZero { core: 2 })
        );
    }

    #[test]
    fn empty_load_is_not_loaded() {
        let load = CpuLoad::with_interval(Duration::ZERO);
        assert!(!load.is_loaded());
        assert_eq!(load.usage(), Err(SampleError::NotLoaded));
    }

    #[test]
    fn load_takes_two_samples_and_keeps_both_generations() {
        let sampler = Scripted::new(vec![
            Ok(vec![TickSnapshot::new(10, 0, 5, 85)]),
            Ok(vec![TickSnapshot::new(20, 0, 10, 170)]),
        ]);
        let mut load = CpuLoad::with_interval(Duration::ZERO);
        load.load(&sampler).unwrap();

        assert!(load.is_loaded());
        assert_eq!(load.previous(), &[TickSnapshot::new(10, 0, 5, 85)]);
        assert_eq!(load.current(), &[TickSnapshot::new(20, 0, 10, 170)]);
        assert_eq!(load.usage().unwrap().len(), 1);
    }

    #[test]
    fn failed_second_sample_leaves_load_unloaded() {
        let sampler = Scripted::new(vec![
            Ok(vec![TickSnapshot::new(10, 0, 5, 85)]),
            Err(SampleError::io(7, "query failed")),
        ]);
        let mut load = CpuLoad::with_interval(Duration::ZERO);
        assert_eq!(load.load(&sampler), Err(SampleError::io(7, "query failed")));
        assert!(!load.is_loaded());
        assert_eq!(load.usage(), Err(SampleError::NotLoaded));
    }

    #[test]
    fn source_without_core_lines_reports_no_cores() {
        let sampler = Scripted::new(vec![Ok(Vec::new()), Ok(Vec::new())]);
        let mut load = CpuLoad::with_interval(Duration::ZERO);
        assert_eq!(load.load(&sampler), Err(SampleError::NoCores));
        assert!(!load.is_loaded());
    }

    #[test]
    fn mismatched_generations_are_rejected() {
        let load = CpuLoad::from_generations(
            vec![TickSnapshot::new(1, 0, 1, 1); 2],
            vec![TickSnapshot::new(2, 0, 2, 2); 3],
        );
        assert_eq!(
            load.usage(),
            Err(SampleError::CoreCountMismatch {
                current: 3,
                previous: 2
            })
        );
    }

    #[test]
    fn summary_averages_cores() {
        let usages = [
            CoreUsage {
                core: 0,
                total_percent: 10.0,
                user_percent: 6.0,
                system_percent: 4.0,
            },
            CoreUsage {
                core: 1,
                total_percent: 30.0,
                user_percent: 20.0,
                system_percent: 8.0,
            },
        ];
        let summary = CpuSummary::from_usages(&usages).unwrap();
        assert!(close(summary.total_percent, 20.0));
        assert!(close(summary.user_percent, 13.0));
        assert!(close(summary.system_percent, 6.0));
        assert!(CpuSummary::from_usages(&[]).is_none());
    }
}
