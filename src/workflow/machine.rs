use crate::collaborator::TaskKind;
use crate::config::WorkflowConfig;

/// A state of the per-run machine. Each phase determines the next step the
/// engine runs; the pairing of phase and step outcome determines where the
/// run goes from there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing has run yet. Repair/optimization synthesize a harness from
    /// here; hardening proposes directly.
    Init,
    /// Harness obtained (or knowingly absent); proposing comes next.
    HarnessReady,
    /// A candidate exists and awaits review.
    Proposed,
    /// Review approved the candidate (or the review cap forced it through);
    /// verification comes next.
    ReviewApproved,
    /// Review rejected the candidate; proposing comes next.
    ReviewRejected,
    /// Verification failed with retries remaining; proposing comes next.
    TestedFail,
}

/// What a single step reported back to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    HarnessReady,
    Proposed,
    /// Domain mismatch or a collaborator fault. Never retried.
    Fault,
    Approved,
    Rejected,
    Passed,
    Failed,
    /// Verification cannot run at all (missing toolchain). Never retried.
    Halted,
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed,
    Error,
}

/// Either the run continues into another phase, or it is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Step(Phase),
    Done(Verdict),
}

/// Iteration caps shared by every task kind.
#[derive(Debug, Clone, Copy)]
pub struct Caps {
    /// Rejections past this force the run through review unchanged.
    pub review: u32,
    /// Hard ceiling on proposal steps for the whole run.
    pub total: u32,
}

impl Caps {
    pub fn new(review: u32, total: u32) -> Self {
        Self { review, total }
    }
}

impl Default for Caps {
    fn default() -> Self {
        Self {
            review: 3,
            total: 5,
        }
    }
}

impl From<&WorkflowConfig> for Caps {
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            review: config.max_review_iterations,
            total: config.max_total_iterations,
        }
    }
}

/// The transition table: `(phase, outcome) -> next`, with the iteration
/// caps folded in. Pure, so the loop behavior of every task kind is
/// testable without running any steps.
///
/// `iterations` is the number of proposal steps executed so far, which is
/// also how rejections are bounded: the review cap forces a run through
/// once more rejections have occurred than the cap allows.
pub fn advance(
    kind: TaskKind,
    phase: Phase,
    outcome: StepOutcome,
    iterations: u32,
    caps: Caps,
) -> Next {
    use Next::{Done, Step};

    match (phase, outcome) {
        // Harness synthesis never blocks a run; proposing is always next.
        (Phase::Init, StepOutcome::HarnessReady) => Step(Phase::HarnessReady),

        // A proposal from any proposing phase goes to review.
        (
            Phase::Init | Phase::HarnessReady | Phase::ReviewRejected | Phase::TestedFail,
            StepOutcome::Proposed,
        ) => Step(Phase::Proposed),

        // Collaborator faults and domain mismatches are terminal wherever
        // they surface.
        (_, StepOutcome::Fault) => Done(Verdict::Error),

        (Phase::Proposed, StepOutcome::Approved) => Step(Phase::ReviewApproved),
        (Phase::Proposed, StepOutcome::Rejected) if iterations > caps.review => {
            Step(Phase::ReviewApproved)
        }
        (Phase::Proposed, StepOutcome::Rejected) => Step(Phase::ReviewRejected),

        (Phase::ReviewApproved, StepOutcome::Passed) => Done(Verdict::Passed),
        (Phase::ReviewApproved, StepOutcome::Halted) => Done(Verdict::Failed),
        (Phase::ReviewApproved, StepOutcome::Failed) => match kind {
            // Only defect repair retries a failed verification, and never
            // once another proposal would break the total cap.
            TaskKind::Repair if iterations < caps.total => Step(Phase::TestedFail),
            _ => Done(Verdict::Failed),
        },

        // Pairings the engines never produce.
        _ => Done(Verdict::Error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPS: Caps = Caps { review: 3, total: 5 };

    #[test]
    fn test_repair_happy_path() {
        assert_eq!(
            advance(TaskKind::Repair, Phase::Init, StepOutcome::HarnessReady, 0, CAPS),
            Next::Step(Phase::HarnessReady)
        );
        assert_eq!(
            advance(TaskKind::Repair, Phase::HarnessReady, StepOutcome::Proposed, 1, CAPS),
            Next::Step(Phase::Proposed)
        );
        assert_eq!(
            advance(TaskKind::Repair, Phase::Proposed, StepOutcome::Approved, 1, CAPS),
            Next::Step(Phase::ReviewApproved)
        );
        assert_eq!(
            advance(TaskKind::Repair, Phase::ReviewApproved, StepOutcome::Passed, 1, CAPS),
            Next::Done(Verdict::Passed)
        );
    }

    #[test]
    fn test_rejection_loops_until_review_cap() {
        for iterations in 1..=3 {
            assert_eq!(
                advance(TaskKind::Repair, Phase::Proposed, StepOutcome::Rejected, iterations, CAPS),
                Next::Step(Phase::ReviewRejected),
                "iteration {iterations} should loop back to proposing"
            );
        }
        // The fourth rejection forces the run through review.
        assert_eq!(
            advance(TaskKind::Repair, Phase::Proposed, StepOutcome::Rejected, 4, CAPS),
            Next::Step(Phase::ReviewApproved)
        );
    }

    #[test]
    fn test_force_advance_applies_to_every_kind() {
        for kind in [TaskKind::Repair, TaskKind::Optimize, TaskKind::Harden] {
            assert_eq!(
                advance(kind, Phase::Proposed, StepOutcome::Rejected, 4, CAPS),
                Next::Step(Phase::ReviewApproved)
            );
        }
    }

    #[test]
    fn test_mismatch_is_terminal_from_every_proposing_phase() {
        for phase in [Phase::Init, Phase::HarnessReady, Phase::ReviewRejected, Phase::TestedFail] {
            assert_eq!(
                advance(TaskKind::Repair, phase, StepOutcome::Fault, 1, CAPS),
                Next::Done(Verdict::Error)
            );
        }
    }

    #[test]
    fn test_repair_retries_failed_test_under_total_cap() {
        assert_eq!(
            advance(TaskKind::Repair, Phase::ReviewApproved, StepOutcome::Failed, 4, CAPS),
            Next::Step(Phase::TestedFail)
        );
        // A fifth proposal exists; a sixth would exceed the ceiling.
        assert_eq!(
            advance(TaskKind::Repair, Phase::ReviewApproved, StepOutcome::Failed, 5, CAPS),
            Next::Done(Verdict::Failed)
        );
    }

    #[test]
    fn test_optimization_verification_is_one_shot() {
        assert_eq!(
            advance(TaskKind::Optimize, Phase::ReviewApproved, StepOutcome::Failed, 1, CAPS),
            Next::Done(Verdict::Failed)
        );
        assert_eq!(
            advance(TaskKind::Optimize, Phase::ReviewApproved, StepOutcome::Passed, 1, CAPS),
            Next::Done(Verdict::Passed)
        );
    }

    #[test]
    fn test_harden_gate_is_terminal_both_ways() {
        assert_eq!(
            advance(TaskKind::Harden, Phase::ReviewApproved, StepOutcome::Failed, 1, CAPS),
            Next::Done(Verdict::Failed)
        );
        assert_eq!(
            advance(TaskKind::Harden, Phase::ReviewApproved, StepOutcome::Passed, 1, CAPS),
            Next::Done(Verdict::Passed)
        );
    }

    #[test]
    fn test_missing_toolchain_never_retries() {
        assert_eq!(
            advance(TaskKind::Repair, Phase::ReviewApproved, StepOutcome::Halted, 1, CAPS),
            Next::Done(Verdict::Failed)
        );
    }

    #[test]
    fn test_harden_proposes_straight_from_init() {
        assert_eq!(
            advance(TaskKind::Harden, Phase::Init, StepOutcome::Proposed, 1, CAPS),
            Next::Step(Phase::Proposed)
        );
    }
}
