//! Injection remediation: propose/review in a bounded loop, then validate
//! the declared target language against the query-dialect allow-list. A
//! bare query fragment has no safe general way to execute, so the final
//! check is a policy decision on the declaration, not a runtime check; this
//! engine never holds an executor.

use crate::collaborator::{ProposalCollaborator, ReviewCollaborator, TaskKind};
use crate::sandbox::language;
use crate::workflow::machine::{self, Caps, Next, Phase, StepOutcome};
use crate::workflow::state::{RunState, RunStatus, StepDelta};
use crate::workflow::steps;

pub async fn run(
    proposer: &dyn ProposalCollaborator,
    reviewer: &dyn ReviewCollaborator,
    caps: Caps,
    source_code: &str,
    target_language: &str,
) -> RunState {
    let mut state = RunState::new(source_code, target_language, None);
    let mut phase = Phase::Init;

    loop {
        let (delta, outcome) = match phase {
            // No harness to obtain: proposing starts immediately.
            Phase::Init | Phase::HarnessReady | Phase::ReviewRejected | Phase::TestedFail => {
                propose_step(proposer, &state).await
            }
            Phase::Proposed => {
                steps::review_step(reviewer, &state.current_code, TaskKind::Harden).await
            }
            Phase::ReviewApproved => gate_step(&state.declared_language),
        };

        state = state.apply(delta);

        match machine::advance(TaskKind::Harden, phase, outcome, state.iterations, caps) {
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
) -> (StepDelta, StepOutcome) {
    let proposal = match proposer
        .propose_security_patch(&state.original_code, &state.feedback)
        .await
    {
        Ok(p) => p,
        Err(e) => {
            let (mut delta, outcome) = steps::fault(format!("Developer error: {e}"));
            delta.bump_iteration = true;
            return (delta, outcome);
        }
    };

    let mut delta = StepDelta::default();
    delta.log.push(format!(
        "Developer: security patch proposed. Rationale: {}",
        proposal.rationale
    ));
    delta.current_code = Some(proposal.code);
    delta.bump_iteration = true;
    (delta, StepOutcome::Proposed)
}

/// The allow-list gate. Inside the list passes without execution; outside
/// fails deterministically, and no sandbox is ever involved either way.
fn gate_step(declared_language: &str) -> (StepDelta, StepOutcome) {
    let mut delta = StepDelta::default();

    if language::is_query_dialect(declared_language) {
        delta.log.push(format!(
            "Checker: `{declared_language}` is a supported query dialect; patch accepted without execution."
        ));
        delta.status = Some(RunStatus::Passed);
        (delta, StepOutcome::Passed)
    } else {
        delta.log.push(format!(
            "Checker: unsupported target language `{declared_language}`; injection remediation only covers query dialects."
        ));
        delta.status = Some(RunStatus::Failed);
        (delta, StepOutcome::Failed)
    }
}
