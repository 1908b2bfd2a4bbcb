//! Steps shared by more than one task kind. Each step returns what it
//! changed plus the outcome the transition table consumes; the engines own
//! the loop and the state.

use crate::collaborator::{HarnessCollaborator, ReviewCollaborator, TaskKind};
use crate::sandbox::language::Language;
use crate::sandbox::{CodeExecutor, FailureKind};
use crate::workflow::machine::StepOutcome;
use crate::workflow::state::{excerpt, RunStatus, StepDelta};

/// Transcript excerpt lengths, matching what a human scans comfortably.
pub const OUTPUT_EXCERPT: usize = 100;
pub const ERROR_EXCERPT: usize = 500;

/// Obtain the harness once, before the first proposal. Synthesis failure
/// downgrades to a warning: the run continues with an empty harness.
pub async fn harness_step(
    collaborator: &dyn HarnessCollaborator,
    code: &str,
    raw_input: &str,
    language: Language,
) -> (StepDelta, StepOutcome) {
    let mut delta = StepDelta::default();

    if raw_input.is_empty() {
        delta
            .log
            .push("System: no test input provided; synthesizing one.".to_string());
    }

    match collaborator.synthesize_harness(code, raw_input, language).await {
        Ok(harness) => {
            delta
                .log
                .push(format!("System: generated test harness for {language}."));
            delta.harness = Some(harness.code);
        }
        Err(e) => {
            delta
                .log
                .push(format!("System warning: failed to synthesize harness: {e}"));
        }
    }

    (delta, StepOutcome::HarnessReady)
}

pub async fn review_step(
    collaborator: &dyn ReviewCollaborator,
    code: &str,
    kind: TaskKind,
) -> (StepDelta, StepOutcome) {
    match collaborator.review(code, kind).await {
        Ok(review) => {
            let (word, status, outcome) = if review.approved {
                ("APPROVED", RunStatus::Approved, StepOutcome::Approved)
            } else {
                ("REJECTED", RunStatus::Rejected, StepOutcome::Rejected)
            };

            let mut delta = StepDelta::default();
            delta.log.push(format!("Reviewer: {word}. {}", review.feedback));
            delta.status = Some(status);
            delta.feedback = Some(review.feedback);
            (delta, outcome)
        }
        Err(e) => fault(format!("Reviewer error: {e}")),
    }
}

/// Run the current candidate against the harness and report pass/fail.
/// A missing toolchain halts the run instead of counting as a failed test.
pub async fn test_step(
    executor: &dyn CodeExecutor,
    code: &str,
    harness: &str,
    language: Language,
) -> (StepDelta, StepOutcome) {
    let result = executor.run(code, harness, language).await;
    let mut delta = StepDelta::default();

    if result.failure == Some(FailureKind::ToolMissing) {
        delta
            .log
            .push(format!("Tester: toolchain unavailable: {}", result.stderr));
        delta.status = Some(RunStatus::Failed);
        return (delta, StepOutcome::Halted);
    }

    let output = if result.success {
        result.stdout
    } else if result.stderr.trim().is_empty() {
        result.stdout
    } else {
        result.stderr
    };

    let (word, status, outcome) = if result.success {
        ("PASSED", RunStatus::Passed, StepOutcome::Passed)
    } else {
        ("FAILED", RunStatus::Failed, StepOutcome::Failed)
    };

    delta.log.push(format!(
        "Tester: {word}. Output: {}",
        excerpt(&output, OUTPUT_EXCERPT)
    ));
    delta.feedback = Some(format!("Test output:\n{output}"));
    delta.status = Some(status);

    (delta, outcome)
}

/// A terminal step failure: one transcript entry, status `Error`.
pub fn fault(entry: String) -> (StepDelta, StepOutcome) {
    let mut delta = StepDelta::default();
    delta.log.push(entry);
    delta.status = Some(RunStatus::Error);
    (delta, StepOutcome::Fault)
}

/// Transcript entry for a rejection that the review cap pushed through.
pub fn force_advance_note() -> StepDelta {
    StepDelta::note("System: review cap reached; proceeding without approval.")
}

/// Transcript entry for a run stopped by the total-iteration ceiling.
pub fn iteration_cap_note() -> StepDelta {
    StepDelta::note("System: iteration cap reached; stopping.")
}
