//! Bounded per-target record of recent statuses.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::reporter::Reporter;
use super::types::{CheckResult, Status, Target};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    pub status: Status,
    pub checked_at: DateTime<Utc>,
}

/// Totals for one target over the retained window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetSummary {
    pub up: usize,
    pub down: usize,
    pub error: usize,
    pub last: Option<Status>,
}

/// Last `capacity` statuses per target. Shared by reference (`Arc`), never
/// global.
#[derive(Debug)]
pub struct StatusHistory {
    capacity: usize,
    entries: RwLock<HashMap<Target, VecDeque<HistoryEntry>>>,
}

impl StatusHistory {
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), entries: RwLock::new(HashMap::new()) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(&self, result: &CheckResult) {
        let mut entries = self.entries.write();
        let window = entries.entry(result.target.clone()).or_default();

        if window.len() == self.capacity {
            window.pop_front();
        }
        window.push_back(HistoryEntry { status: result.status, checked_at: result.checked_at });
    }

    /// Statuses for `target`, oldest first
    pub fn recent(&self, target: &Target) -> Vec<Status> {
        self.entries
            .read()
            .get(target)
            .map(|window| window.iter().map(|entry| entry.status).collect())
            .unwrap_or_default()
    }

    pub fn last(&self, target: &Target) -> Option<Status> {
        self.entries.read().get(target).and_then(|window| window.back()).map(|entry| entry.status)
    }

    /// Number of trailing `Error` entries for `target`
    pub fn consecutive_errors(&self, target: &Target) -> usize {
        self.entries
            .read()
            .get(target)
            .map(|window| {
                window.iter().rev().take_while(|entry| entry.status == Status::Error).count()
            })
            .unwrap_or(0)
    }

    pub fn summary(&self) -> Vec<(Target, TargetSummary)> {
        let entries = self.entries.read();
        let mut summary: Vec<_> = entries
            .iter()
            .map(|(target, window)| {
                let mut totals = TargetSummary::default();
                for entry in window {
                    match entry.status {
                        Status::Up => totals.up += 1,
                        Status::Down => totals.down += 1,
                        Status::Error => totals.error += 1,
                    }
                }
                totals.last = window.back().map(|entry| entry.status);
                (target.clone(), totals)
            })
            .collect();

        summary.sort_by(|a, b| a.0.cmp(&b.0));
        summary
    }
}

impl Reporter for StatusHistory {
    fn report(&self, result: &CheckResult) {
        self.record(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(target: &str, status: Status) -> CheckResult {
        CheckResult::new(Target::from(target), status)
    }

    #[test]
    fn test_window_is_bounded() {
        let history = StatusHistory::new(3);
        for status in [Status::Up, Status::Down, Status::Error, Status::Up] {
            history.record(&result("a", status));
        }

        assert_eq!(history.recent(&Target::from("a")), vec![Status::Down, Status::Error, Status::Up]);
        assert_eq!(history.last(&Target::from("a")), Some(Status::Up));
    }

    #[test]
    fn test_unknown_target_is_empty() {
        let history = StatusHistory::new(5);
        assert!(history.recent(&Target::from("missing")).is_empty());
        assert_eq!(history.last(&Target::from("missing")), None);
        assert_eq!(history.consecutive_errors(&Target::from("missing")), 0);
    }

    #[test]
    fn test_consecutive_errors_counts_tail_only() {
        let history = StatusHistory::new(10);
        for status in [Status::Error, Status::Up, Status::Error, Status::Error] {
            history.record(&result("b", status));
        }

        assert_eq!(history.consecutive_errors(&Target::from("b")), 2);
    }

    #[test]
    fn test_summary_is_sorted_and_totalled() {
        let history = StatusHistory::new(10);
        history.record(&result("b", Status::Error));
        history.record(&result("a", Status::Up));
        history.record(&result("a", Status::Down));

        let summary = history.summary();
        assert_eq!(summary[0].0, Target::from("a"));
        assert_eq!(summary[0].1, TargetSummary { up: 1, down: 1, error: 0, last: Some(Status::Down) });
        assert_eq!(summary[1].1.error, 1);
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let history = StatusHistory::new(0);
        history.record(&result("a", Status::Up));
        history.record(&result("a", Status::Down));
        assert_eq!(history.recent(&Target::from("a")), vec![Status::Down]);
    }
}
