//! Optimization: synthesize a harness once, propose/review in a bounded
//! loop, then verify exactly once by timing the original and the candidate.
//! A failed verification is reported as-is; it never re-enters the loop.

use crate::collaborator::{
    HarnessCollaborator, ProposalCollaborator, ReviewCollaborator, TaskKind,
};
use crate::sandbox::language::Language;
use crate::sandbox::{CodeExecutor, FailureKind};
use crate::workflow::machine::{self, Caps, Next, Phase, StepOutcome};
use crate::workflow::state::{excerpt, RunState, RunStatus, StepDelta};
use crate::workflow::steps;

pub async fn run(
    proposer: &dyn ProposalCollaborator,
    reviewer: &dyn ReviewCollaborator,
    harness: &dyn HarnessCollaborator,
    executor: &dyn CodeExecutor,
    caps: Caps,
    source_code: &str,
    raw_test_input: &str,
    language: Language,
) -> RunState {
    let mut state = RunState::new(source_code, language.name(), None);
    let mut phase = Phase::Init;

    loop {
        let (delta, outcome) = match phase {
            Phase::Init => {
                steps::harness_step(harness, &state.original_code, raw_test_input, language).await
            }
            Phase::HarnessReady | Phase::ReviewRejected | Phase::TestedFail => {
                propose_step(proposer, &state, language).await
            }
            Phase::Proposed => {
                steps::review_step(reviewer, &state.current_code, TaskKind::Optimize).await
            }
            Phase::ReviewApproved => verify_step(executor, &state, language).await,
        };

        state = state.apply(delta);

        match machine::advance(TaskKind::Optimize, phase, outcome, state.iterations, caps) {
            Next::Step(next) => {
                if outcome == StepOutcome::Rejected && next == Phase::ReviewApproved {
                    state = state.apply(steps::force_advance_note());
                }
                phase = next;
            }
            Next::Done(verdict) => return state.finish(verdict),
        }
    }
}

async fn propose_step(
    proposer: &dyn ProposalCollaborator,
    state: &RunState,
    language: Language,
) -> (StepDelta, StepOutcome) {
    let proposal = match proposer
        .propose_optimization(&state.original_code, language, &state.feedback)
        .await
    {
        Ok(p) => p,
        Err(e) => return propose_fault(format!("Developer error: {e}")),
    };

    if let Some(error) = proposal.error {
        return propose_fault(format!("Developer error: {error}"));
    }

    let mut delta = StepDelta::default();
    delta.log.push(format!(
        "Developer: optimization proposed. Rationale: {}",
        proposal.rationale
    ));
    delta.current_code = Some(proposal.code);
    delta.complexity = Some(proposal.complexity);
    delta.bump_iteration = true;
    (delta, StepOutcome::Proposed)
}

fn propose_fault(entry: String) -> (StepDelta, StepOutcome) {
    let (mut delta, outcome) = steps::fault(entry);
    delta.bump_iteration = true;
    (delta, outcome)
}

/// One-shot verification: time the original once for a baseline, then the
/// candidate. Both timings land in the state even when the candidate fails.
async fn verify_step(
    executor: &dyn CodeExecutor,
    state: &RunState,
    language: Language,
) -> (StepDelta, StepOutcome) {
    let mut delta = StepDelta::default();

    if state.timings.baseline.is_none() {
        let baseline = executor
            .run(&state.original_code, &state.harness, language)
            .await;
        if baseline.failure == Some(FailureKind::ToolMissing) {
            delta
                .log
                .push(format!("Tester: toolchain unavailable: {}", baseline.stderr));
            delta.status = Some(RunStatus::Failed);
            return (delta, StepOutcome::Halted);
        }
        delta.baseline = Some(baseline.elapsed);
    }

    let candidate = executor
        .run(&state.current_code, &state.harness, language)
        .await;
    if candidate.failure == Some(FailureKind::ToolMissing) {
        delta
            .log
            .push(format!("Tester: toolchain unavailable: {}", candidate.stderr));
        delta.status = Some(RunStatus::Failed);
        return (delta, StepOutcome::Halted);
    }
    delta.candidate = Some(candidate.elapsed);

    let (word, status, outcome) = if candidate.success {
        ("PASSED", RunStatus::Passed, StepOutcome::Passed)
    } else {
        ("FAILED", RunStatus::Failed, StepOutcome::Failed)
    };
    delta.log.push(format!("Tester: test case {word}."));

    if !candidate.success {
        let detail = if candidate.stderr.trim().is_empty() {
            candidate.stdout
        } else {
            candidate.stderr
        };
        if !detail.trim().is_empty() {
            delta.log.push(format!(
                "Error details: {}",
                excerpt(detail.trim(), steps::ERROR_EXCERPT)
            ));
        }
    }

    delta.status = Some(status);
    (delta, outcome)
}
