use std::time::Duration;

use crate::collaborator::Complexity;
use crate::workflow::machine::Verdict;

/// Where a run currently stands. Terminal runs end in `Passed`, `Failed`,
/// or `Error`; the rest are observed mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Pending,
    Approved,
    Rejected,
    Passed,
    Failed,
    Error,
}

impl RunStatus {
    pub fn name(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Approved => "approved",
            RunStatus::Rejected => "rejected",
            RunStatus::Passed => "passed",
            RunStatus::Failed => "failed",
            RunStatus::Error => "error",
        }
    }
}

/// Wall-clock samples from the verification pass (optimization runs).
#[derive(Debug, Clone, Default)]
pub struct Timings {
    pub baseline: Option<Duration>,
    pub candidate: Option<Duration>,
}

/// Per-run state, owned by one engine invocation and mutated only between
/// steps by folding a `StepDelta` into it.
#[derive(Debug, Clone)]
pub struct RunState {
    pub original_code: String,
    pub current_code: String,
    pub declared_language: String,
    pub issue: Option<String>,
    pub feedback: String,
    pub harness: String,
    pub iterations: u32,
    pub status: RunStatus,
    pub log: Vec<String>,
    pub complexity: Option<Complexity>,
    pub timings: Timings,
}

/// What one step changed. Steps never touch `RunState` directly; they
/// return a delta and the engine merges it, so a half-applied step cannot
/// be observed.
#[derive(Debug, Default)]
pub struct StepDelta {
    pub current_code: Option<String>,
    pub feedback: Option<String>,
    pub harness: Option<String>,
    pub status: Option<RunStatus>,
    pub log: Vec<String>,
    pub bump_iteration: bool,
    pub complexity: Option<Complexity>,
    pub baseline: Option<Duration>,
    pub candidate: Option<Duration>,
}

impl StepDelta {
    /// A delta that only appends one transcript entry.
    pub fn note(entry: impl Into<String>) -> Self {
        Self {
            log: vec![entry.into()],
            ..Self::default()
        }
    }
}

impl RunState {
    pub fn new(original_code: &str, declared_language: &str, issue: Option<&str>) -> Self {
        Self {
            original_code: original_code.to_string(),
            current_code: original_code.to_string(),
            declared_language: declared_language.to_string(),
            issue: issue.map(str::to_string),
            feedback: String::new(),
            harness: String::new(),
            iterations: 0,
            status: RunStatus::Pending,
            log: Vec::new(),
            complexity: None,
            timings: Timings::default(),
        }
    }

    /// Fold a step's delta into the state. The log only ever grows and
    /// `iterations` only ever increases, by exactly one per proposal step.
    pub fn apply(mut self, delta: StepDelta) -> Self {
        if let Some(code) = delta.current_code {
            self.current_code = code;
        }
        if let Some(feedback) = delta.feedback {
            self.feedback = feedback;
        }
        if let Some(harness) = delta.harness {
            self.harness = harness;
        }
        if let Some(status) = delta.status {
            self.status = status;
        }
        if let Some(complexity) = delta.complexity {
            self.complexity = Some(complexity);
        }
        if let Some(baseline) = delta.baseline {
            self.timings.baseline = Some(baseline);
        }
        if let Some(candidate) = delta.candidate {
            self.timings.candidate = Some(candidate);
        }
        self.log.extend(delta.log);
        if delta.bump_iteration {
            self.iterations += 1;
        }
        self
    }

    /// Seal the run with its terminal verdict.
    pub fn finish(mut self, verdict: Verdict) -> Self {
        self.status = match verdict {
            Verdict::Passed => RunStatus::Passed,
            Verdict::Failed => RunStatus::Failed,
            Verdict::Error => RunStatus::Error,
        };
        self
    }
}

/// Clamp a transcript excerpt to `max` characters on a char boundary.
pub fn excerpt(text: &str, max: usize) -> String {
    let mut out = String::new();
    for (count, ch) in text.chars().enumerate() {
        if count >= max {
            out.push_str("...");
            break;
        }
        out.push(ch);
    }
    out
}
