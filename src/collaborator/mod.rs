pub mod claude;
pub mod prompt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sandbox::language::Language;

/// Which improvement task a run performs. Reviews are scoped by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Repair,
    Optimize,
    Harden,
}

impl TaskKind {
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::Repair => "defect repair",
            TaskKind::Optimize => "optimization",
            TaskKind::Harden => "injection remediation",
        }
    }
}

/// A candidate defect fix. `error` is set when the collaborator reports the
/// submitted code does not match the declared language (or cannot be
/// processed at all); such a proposal carries no usable code.
#[derive(Debug, Clone, Deserialize)]
pub struct FixProposal {
    pub rationale: String,
    pub code: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Big-O estimates for the original and optimized versions of a unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Complexity {
    #[serde(default)]
    pub orig_time: String,
    #[serde(default)]
    pub orig_space: String,
    #[serde(default)]
    pub opt_time: String,
    #[serde(default)]
    pub opt_space: String,
}

/// A candidate optimization plus complexity estimates for both versions.
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizationProposal {
    pub rationale: String,
    pub code: String,
    #[serde(flatten)]
    pub complexity: Complexity,
    #[serde(default)]
    pub error: Option<String>,
}

/// A candidate injection-remediation patch.
#[derive(Debug, Clone, Deserialize)]
pub struct PatchProposal {
    pub rationale: String,
    pub code: String,
}

/// Approve/reject verdict on the current candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    pub approved: bool,
    pub feedback: String,
}

/// Executable scaffolding appended after the primary code to exercise it.
#[derive(Debug, Clone, Deserialize)]
pub struct Harness {
    pub rationale: String,
    pub code: String,
}

#[async_trait]
pub trait ProposalCollaborator: Send + Sync {
    async fn propose_fix(
        &self,
        code: &str,
        issue: &str,
        language: Language,
        feedback: &str,
    ) -> Result<FixProposal>;

    async fn propose_optimization(
        &self,
        code: &str,
        language: Language,
        feedback: &str,
    ) -> Result<OptimizationProposal>;

    async fn propose_security_patch(&self, code: &str, feedback: &str) -> Result<PatchProposal>;
}

#[async_trait]
pub trait ReviewCollaborator: Send + Sync {
    async fn review(&self, code: &str, kind: TaskKind) -> Result<Review>;
}

#[async_trait]
pub trait HarnessCollaborator: Send + Sync {
    /// Synthesize scaffolding that exercises `code`. When `raw_input` is
    /// empty the collaborator invents a self-contained (stress-sized) input
    /// rather than failing.
    async fn synthesize_harness(
        &self,
        code: &str,
        raw_input: &str,
        language: Language,
    ) -> Result<Harness>;
}
