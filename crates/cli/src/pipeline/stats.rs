//! Run summary printed after the pipeline finishes.

use std::time::Duration;

use contracts::RunOutcome;
use stage_engine::{RunReport, StageRecord};

/// Per-stage timings and the final outcome
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stages: Vec<StageRecord>,
    pub outcome: RunOutcome,
    pub certificate: Option<std::path::PathBuf>,
    pub duration: Duration,
}

impl RunSummary {
    pub fn new(report: &RunReport, duration: Duration) -> Self {
        Self {
            stages: report.stages.clone(),
            outcome: report.outcome.clone(),
            certificate: report.certificate.clone(),
            duration,
        }
    }

    /// Time spent inside tools
    pub fn tool_time(&self) -> Duration {
        self.stages.iter().map(|record| record.elapsed).sum()
    }

    pub fn render(&self) -> String {
        let mut lines = vec![String::new(), "=== Run Summary ===".to_string()];
        for record in &self.stages {
            let exit = record
                .exit
                .map(|exit| exit.to_string())
                .unwrap_or_else(|| "not run".to_string());
            lines.push(format!(
                "  [{}] {:<17} {:>9.3}s  {:<17} ({exit})",
                record.stage.ordinal(),
                record.stage.name(),
                record.elapsed.as_secs_f64(),
                record.decision.label(),
            ));
        }
        lines.push(format!(
            "Outcome: {} (exit status {})",
            self.outcome.label(),
            self.outcome.exit_code()
        ));
        if let Some(certificate) = &self.certificate {
            lines.push(format!("Certificate: {}", certificate.display()));
        }
        lines.push(format!(
            "Duration: {:.3}s total, {:.3}s in tools",
            self.duration.as_secs_f64(),
            self.tool_time().as_secs_f64()
        ));
        lines.join("\n")
    }

    pub fn print_summary(&self) {
        println!("{}", self.render());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{StageDecision, StageId, ToolExit};

    #[test]
    fn test_render_lists_stages_and_outcome() {
        let report = RunReport {
            outcome: RunOutcome::ProvedTrue,
            stages: vec![StageRecord {
                stage: StageId::Solve,
                decision: StageDecision::ProvedTrue,
                exit: Some(ToolExit::Code(10)),
                elapsed: Duration::from_millis(1500),
            }],
            certificate: None,
        };
        let summary = RunSummary::new(&report, Duration::from_secs(2));
        let text = summary.render();

        assert!(text.contains("[1] solve"));
        assert!(text.contains("proved_true"));
        assert!(text.contains("(exit code 10)"));
        assert!(text.contains("Outcome: proved_true (exit status 1)"));
        assert_eq!(summary.tool_time(), Duration::from_millis(1500));
    }
}
