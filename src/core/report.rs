use std::time::Duration;

use chrono::{DateTime, Local};

use crate::core::models::{StageResult, StageStatus};

#[derive(Debug, Clone)]
pub struct StageRecord {
    pub stage: &'static str,
    pub tool: String,
    pub status: StageStatus,
    pub elapsed: Duration,
    pub detail: Option<String>,
}

/// End-of-run summary derived from scheduler state. Always produced, even
/// when most of the run failed; marked partial on cancellation.
#[derive(Debug)]
pub struct RunReport {
    pub target: String,
    pub started: DateTime<Local>,
    pub records: Vec<StageRecord>,
    pub partial: bool,
    pub total_elapsed: Duration,
}

impl RunReport {
    pub fn new(target: String) -> Self {
        Self {
            target,
            started: Local::now(),
            records: Vec::new(),
            partial: false,
            total_elapsed: Duration::ZERO,
        }
    }

    pub fn record(&mut self, stage: &'static str, result: StageResult) {
        self.records.push(StageRecord {
            stage,
            tool: result.tool,
            status: result.status,
            elapsed: result.elapsed,
            detail: result.detail,
        });
    }

    pub fn record_skip(&mut self, stage: &'static str, tool: &str, reason: impl Into<String>) {
        self.record(stage, StageResult::skipped(tool, reason));
    }

    pub fn status_of(&self, tool: &str) -> Option<StageStatus> {
        self.records.iter().find(|r| r.tool == tool).map(|r| r.status)
    }

    pub fn counts(&self) -> (usize, usize, usize, usize) {
        let mut completed = 0;
        let mut skipped = 0;
        let mut failed = 0;
        let mut cancelled = 0;
        for record in &self.records {
            match record.status {
                StageStatus::Completed => completed += 1,
                StageStatus::Skipped => skipped += 1,
                StageStatus::Failed => failed += 1,
                StageStatus::Cancelled => cancelled += 1,
            }
        }
        (completed, skipped, failed, cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn counts_partition_by_status() {
        let mut report = RunReport::new("example.com".to_string());
        report.record("Subdomain Discovery", StageResult::completed("subfinder", PathBuf::from("a")));
        report.record("Subdomain Discovery", StageResult::failed("amass", "exit 1"));
        report.record_skip("Liveness Filter", "httpx", "disabled in configuration");
        report.record("Content Discovery", StageResult::cancelled("katana"));

        assert_eq!(report.counts(), (1, 1, 1, 1));
        assert_eq!(report.status_of("amass"), Some(StageStatus::Failed));
        assert_eq!(report.status_of("nuclei"), None);
    }
}
