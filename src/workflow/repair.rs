//! Defect repair: synthesize a harness once, then propose/review/test in a
//! bounded loop, folding test output back into the next proposal's
//! feedback.

use crate::collaborator::{
    HarnessCollaborator, ProposalCollaborator, ReviewCollaborator, TaskKind,
};
use crate::sandbox::language::Language;
use crate::sandbox::CodeExecutor;
use crate::workflow::machine::{self, Caps, Next, Phase, StepOutcome, Verdict};
use crate::workflow::state::{RunState, StepDelta};
use crate::workflow::steps;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    proposer: &dyn ProposalCollaborator,
    reviewer: &dyn ReviewCollaborator,
    harness: &dyn HarnessCollaborator,
    executor: &dyn CodeExecutor,
    caps: Caps,
    source_code: &str,
    defect_description: &str,
    raw_test_input: &str,
    language: Language,
) -> RunState {
    let mut state = RunState::new(source_code, language.name(), Some(defect_description));
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
                steps::review_step(reviewer, &state.current_code, TaskKind::Repair).await
            }
            Phase::ReviewApproved => {
                steps::test_step(executor, &state.current_code, &state.harness, language).await
            }
        };

        state = state.apply(delta);

        match machine::advance(TaskKind::Repair, phase, outcome, state.iterations, caps) {
            Next::Step(next) => {
                if outcome == StepOutcome::Rejected && next == Phase::ReviewApproved {
                    state = state.apply(steps::force_advance_note());
                }
                phase = next;
            }
            Next::Done(verdict) => {
                if verdict == Verdict::Failed
                    && outcome == StepOutcome::Failed
                    && state.iterations >= caps.total
                {
                    state = state.apply(steps::iteration_cap_note());
                }
                return state.finish(verdict);
            }
        }
    }
}

async fn propose_step(
    proposer: &dyn ProposalCollaborator,
    state: &RunState,
    language: Language,
) -> (StepDelta, StepOutcome) {
    let issue = state.issue.as_deref().unwrap_or_default();

    let proposal = match proposer
        .propose_fix(&state.original_code, issue, language, &state.feedback)
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
        "Developer: fix proposed. Rationale: {}",
        proposal.rationale
    ));
    delta.current_code = Some(proposal.code);
    delta.bump_iteration = true;
    (delta, StepOutcome::Proposed)
}

/// A proposal step that faulted still counts against `iterations`: the
/// step ran, it just produced nothing usable.
fn propose_fault(entry: String) -> (StepDelta, StepOutcome) {
    let (mut delta, outcome) = steps::fault(entry);
    delta.bump_iteration = true;
    (delta, outcome)
}
