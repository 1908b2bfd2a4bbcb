pub mod harden;
pub mod machine;
pub mod optimize;
pub mod repair;
pub mod state;
pub mod steps;

/// Scripted collaborator and executor doubles for engine tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::collaborator::{
        Complexity, FixProposal, Harness, HarnessCollaborator, OptimizationProposal,
        PatchProposal, ProposalCollaborator, Review, ReviewCollaborator, TaskKind,
    };
    use crate::error::{AppError, Result};
    use crate::sandbox::language::Language;
    use crate::sandbox::{CodeExecutor, ExecutionResult, FailureKind};

    pub fn mismatch_fix() -> FixProposal {
        FixProposal {
            rationale: String::new(),
            code: String::new(),
            error: Some("Language mismatch: expected python".to_string()),
        }
    }

    pub fn success_result(stdout: &str) -> ExecutionResult {
        ExecutionResult {
            success: true,
            stdout: stdout.to_string(),
            stderr: String::new(),
            elapsed: Duration::from_millis(10),
            failure: None,
        }
    }

    pub fn failure_result(kind: FailureKind, stderr: &str) -> ExecutionResult {
        ExecutionResult {
            success: false,
            stdout: String::new(),
            stderr: stderr.to_string(),
            elapsed: Duration::from_millis(10),
            failure: Some(kind),
        }
    }

    #[derive(Default)]
    pub struct StubProposer {
        pub calls: AtomicU32,
        pub last_feedback: Mutex<String>,
        fixes: Mutex<VecDeque<FixProposal>>,
        optimizations: Mutex<VecDeque<OptimizationProposal>>,
        fail: bool,
    }

    impl StubProposer {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every propose call fails at the transport level.
        pub fn erroring() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn push_fix(&self, proposal: FixProposal) {
            self.fixes.lock().unwrap().push_back(proposal);
        }

        pub fn push_optimization_error(&self, error: &str) {
            self.optimizations
                .lock()
                .unwrap()
                .push_back(OptimizationProposal {
                    rationale: String::new(),
                    code: String::new(),
                    complexity: Complexity::default(),
                    error: Some(error.to_string()),
                });
        }
    }

    #[async_trait]
    impl ProposalCollaborator for StubProposer {
        async fn propose_fix(
            &self,
            _code: &str,
            _issue: &str,
            _language: Language,
            feedback: &str,
        ) -> Result<FixProposal> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            *self.last_feedback.lock().unwrap() = feedback.to_string();
            if self.fail {
                return Err(AppError::Collaborator("collaborator unreachable".to_string()));
            }
            Ok(self.fixes.lock().unwrap().pop_front().unwrap_or(FixProposal {
                rationale: "swap the comparison".to_string(),
                code: "fixed-code".to_string(),
                error: None,
            }))
        }

        async fn propose_optimization(
            &self,
            _code: &str,
            _language: Language,
            feedback: &str,
        ) -> Result<OptimizationProposal> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            *self.last_feedback.lock().unwrap() = feedback.to_string();
            if self.fail {
                return Err(AppError::Collaborator("collaborator unreachable".to_string()));
            }
            if let Some(queued) = self.optimizations.lock().unwrap().pop_front() {
                return Ok(queued);
            }
            Ok(OptimizationProposal {
                rationale: "memoize the recursion".to_string(),
                code: "optimized-code".to_string(),
                complexity: Complexity {
                    orig_time: "O(2^n)".to_string(),
                    orig_space: "O(n)".to_string(),
                    opt_time: "O(n)".to_string(),
                    opt_space: "O(n)".to_string(),
                },
                error: None,
            })
        }

        async fn propose_security_patch(
            &self,
            _code: &str,
            feedback: &str,
        ) -> Result<PatchProposal> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            *self.last_feedback.lock().unwrap() = feedback.to_string();
            if self.fail {
                return Err(AppError::Collaborator("collaborator unreachable".to_string()));
            }
            Ok(PatchProposal {
                rationale: "parameterize the query".to_string(),
                code: "patched-code".to_string(),
            })
        }
    }

    pub struct StubReviewer {
        pub calls: AtomicU32,
        verdicts: Mutex<VecDeque<bool>>,
        fallback: bool,
    }

    impl StubReviewer {
        pub fn approving() -> Self {
            Self::sequence(&[], true)
        }

        pub fn rejecting() -> Self {
            Self::sequence(&[], false)
        }

        /// Scripted verdicts, then `fallback` forever.
        pub fn sequence(verdicts: &[bool], fallback: bool) -> Self {
            Self {
                calls: AtomicU32::new(0),
                verdicts: Mutex::new(verdicts.iter().copied().collect()),
                fallback,
            }
        }
    }

    #[async_trait]
    impl ReviewCollaborator for StubReviewer {
        async fn review(&self, _code: &str, _kind: TaskKind) -> Result<Review> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let approved = self
                .verdicts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(self.fallback);
            Ok(Review {
                approved,
                feedback: if approved {
                    "Looks good".to_string()
                } else {
                    "needs work".to_string()
                },
            })
        }
    }

    pub struct StubHarness {
        pub calls: AtomicU32,
        pub fail: bool,
    }

    impl StubHarness {
        pub fn ok() -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail: false,
            }
        }

        pub fn failing() -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl HarnessCollaborator for StubHarness {
        async fn synthesize_harness(
            &self,
            _code: &str,
            _raw_input: &str,
            _language: Language,
        ) -> Result<Harness> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if self.fail {
                return Err(AppError::Collaborator("harness synthesis failed".to_string()));
            }
            Ok(Harness {
                rationale: "call the entry point".to_string(),
                code: "harness-code".to_string(),
            })
        }
    }

    pub struct StubExecutor {
        pub calls: AtomicU32,
        results: Mutex<VecDeque<ExecutionResult>>,
        fallback_success: bool,
    }

    impl StubExecutor {
        pub fn passing() -> Self {
            Self::sequence(vec![], true)
        }

        pub fn failing() -> Self {
            Self::sequence(vec![], false)
        }

        /// Scripted results, then fallbacks forever.
        pub fn sequence(results: Vec<ExecutionResult>, fallback_success: bool) -> Self {
            Self {
                calls: AtomicU32::new(0),
                results: Mutex::new(results.into_iter().collect()),
                fallback_success,
            }
        }
    }

    #[async_trait]
    impl CodeExecutor for StubExecutor {
        async fn run(
            &self,
            _primary: &str,
            _harness: &str,
            _language: Language,
        ) -> ExecutionResult {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.results.lock().unwrap().pop_front().unwrap_or_else(|| {
                if self.fallback_success {
                    success_result("ok\n")
                } else {
                    failure_result(FailureKind::Runtime, "assertion failed")
                }
            })
        }
    }
}
