//! Pure success predicates
//!
//! Nothing here touches processes, so every stage contract is testable from
//! a synthetic [`ToolRun`].

use contracts::{FailureCause, StageDecision, ToolExit, Verdict};
use toolchain::ToolRun;

/// Whitespace-trimmed exact equality against the raw stdout bytes.
///
/// Invalid UTF-8 never matches.
pub fn stdout_matches(expected: &str, raw: &[u8]) -> bool {
    std::str::from_utf8(raw)
        .map(|text| text.trim() == expected)
        .unwrap_or(false)
}

/// Decide what a finished tool run means for the pipeline
pub fn judge(verdict: &Verdict, run: &ToolRun) -> StageDecision {
    let code = match run.exit {
        ToolExit::Code(code) => code,
        ToolExit::TimedOut => return StageDecision::Fail(FailureCause::TimedOut),
        ToolExit::Terminated => return StageDecision::Fail(FailureCause::ToolError),
    };

    match verdict {
        Verdict::ExitCodes(table) => table.decide(code),
        Verdict::StdoutEquals(_) if code != 0 => StageDecision::Fail(FailureCause::ToolError),
        Verdict::StdoutEquals(expected) if stdout_matches(expected, &run.stdout) => {
            StageDecision::Continue
        }
        Verdict::StdoutEquals(_) => StageDecision::Fail(FailureCause::UnexpectedOutput),
    }
}
