//! # Profiler Module
//!
//! Name-keyed timing table for instrumentation outside the fused hot loop.
//!
//! Executors record one sample per run (and one per parallel worker) when a
//! profiler is attached; callers can record their own samples with
//! `record` or the `scope` guard. Nothing here is consulted for correctness.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Accumulated timing for one named stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageProfile {
    /// Sum of all recorded samples
    pub total_time: Duration,
    /// Number of samples recorded
    pub call_count: u64,
}

impl StageProfile {
    /// Mean sample length
    pub fn average(&self) -> Option<Duration> {
        if self.call_count == 0 {
            return None;
        }
        let nanos = self.total_time.as_nanos() / u128::from(self.call_count);
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }
}

/// Thread-safe stage timing table
#[derive(Debug, Default)]
pub struct Profiler {
    profiles: Mutex<BTreeMap<String, StageProfile>>,
}

impl Profiler {
    /// Create an empty profiler
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave a profile half-updated,
    // so poisoning is ignored.
    fn profiles(&self) -> MutexGuard<'_, BTreeMap<String, StageProfile>> {
        self.profiles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add one duration sample for `stage`
    pub fn record(&self, stage: &str, duration: Duration) {
        let mut profiles = self.profiles();
        let profile = profiles.entry(stage.to_string()).or_default();
        profile.total_time += duration;
        profile.call_count += 1;
    }

    /// Time the enclosing block; the sample is recorded when the guard drops.
    ///
    /// ```rust,ignore
    /// let profiler = Profiler::new();
    /// {
    ///     let _timer = profiler.scope("parse");
    ///     parse_input();
    /// }
    /// assert_eq!(profiler.get("parse").unwrap().call_count, 1);
    /// ```
    pub fn scope<'a>(&'a self, stage: &str) -> ProfileScope<'a> {
        ProfileScope {
            profiler: self,
            stage: stage.to_string(),
            started: Instant::now(),
        }
    }

    /// Profile for one stage, if any sample was recorded
    pub fn get(&self, stage: &str) -> Option<StageProfile> {
        self.profiles().get(stage).copied()
    }

    /// All profiles, ordered by stage name
    pub fn snapshot(&self) -> Vec<(String, StageProfile)> {
        self.profiles()
            .iter()
            .map(|(name, profile)| (name.clone(), *profile))
            .collect()
    }

    /// Sum of recorded time across all stages
    pub fn total_time(&self) -> Duration {
        self.profiles().values().map(|p| p.total_time).sum()
    }

    /// Drop every recorded profile
    pub fn reset(&self) {
        self.profiles().clear();
    }
}

impl fmt::Display for Profiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Pipeline Profile ===")?;
        writeln!(
            f,
            "{:>20}{:>15}{:>15}{:>15}",
            "Stage", "Total (ms)", "Avg (ns)", "Calls"
        )?;
        writeln!(f, "{}", "-".repeat(65))?;

        for (name, profile) in self.snapshot() {
            let average_ns = profile.average().map(|d| d.as_nanos()).unwrap_or(0);
            writeln!(
                f,
                "{:>20}{:>15.3}{:>15}{:>15}",
                name,
                profile.total_time.as_secs_f64() * 1000.0,
                average_ns,
                profile.call_count
            )?;
        }

        Ok(())
    }
}

/// Guard returned by `Profiler::scope`
pub struct ProfileScope<'a> {
    profiler: &'a Profiler,
    stage: String,
    started: Instant,
}

impl Drop for ProfileScope<'_> {
    fn drop(&mut self) {
        self.profiler.record(&self.stage, self.started.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accumulates_per_stage() {
        let profiler = Profiler::new();

        profiler.record("filter", Duration::from_micros(10));
        profiler.record("filter", Duration::from_micros(30));
        profiler.record("transform", Duration::from_micros(5));

        let filter = profiler.get("filter").unwrap();
        assert_eq!(filter.call_count, 2);
        assert_eq!(filter.total_time, Duration::from_micros(40));
        assert_eq!(filter.average(), Some(Duration::from_micros(20)));

        assert_eq!(profiler.total_time(), Duration::from_micros(45));
    }

    #[test]
    fn scope_records_on_drop() {
        let profiler = Profiler::new();

        {
            let _timer = profiler.scope("block");
            assert!(profiler.get("block").is_none());
        }

        assert_eq!(profiler.get("block").unwrap().call_count, 1);
    }

    #[test]
    fn reset_clears_profiles() {
        let profiler = Profiler::new();
        profiler.record("stage", Duration::from_millis(1));

        profiler.reset();

        assert!(profiler.snapshot().is_empty());
        assert_eq!(profiler.total_time(), Duration::ZERO);
    }

    #[test]
    fn report_is_ordered_by_name() {
        let profiler = Profiler::new();
        profiler.record("zeta", Duration::from_millis(1));
        profiler.record("alpha", Duration::from_millis(2));

        let report = profiler.to_string();
        let alpha = report.find("alpha").unwrap();
        let zeta = report.find("zeta").unwrap();

        assert!(report.starts_with("=== Pipeline Profile ==="));
        assert!(alpha < zeta);
    }
}
