use serde::{Deserialize, Serialize};

use crate::collaborator::Complexity;
use crate::workflow::state::RunState;

#[derive(Debug, Deserialize)]
pub struct RepairRequest {
    pub source_code: String,
    pub defect_description: String,
    #[serde(default)]
    pub raw_test_input: String,
    pub target_language: String,
}

#[derive(Debug, Deserialize)]
pub struct OptimizeRequest {
    pub source_code: String,
    #[serde(default)]
    pub raw_test_input: String,
    pub target_language: String,
}

#[derive(Debug, Deserialize)]
pub struct HardenRequest {
    pub source_code: String,
    pub target_language: String,
}

#[derive(Debug, Serialize)]
pub struct RepairResponse {
    pub final_code: String,
    pub log: Vec<String>,
    pub status: &'static str,
}

impl From<RunState> for RepairResponse {
    fn from(state: RunState) -> Self {
        Self {
            final_code: state.current_code,
            log: state.log,
            status: state.status.name(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    pub final_code: String,
    pub log: Vec<String>,
    /// Baseline and candidate wall-clock timings in seconds; zero when the
    /// corresponding pass never ran.
    pub initial_time: f64,
    pub final_time: f64,
    pub complexity: Complexity,
}

impl From<RunState> for OptimizeResponse {
    fn from(state: RunState) -> Self {
        Self {
            final_code: state.current_code,
            log: state.log,
            initial_time: state
                .timings
                .baseline
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0),
            final_time: state
                .timings
                .candidate
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0),
            complexity: state.complexity.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HardenResponse {
    pub final_code: String,
    pub log: Vec<String>,
    pub status: &'static str,
}

impl From<RunState> for HardenResponse {
    fn from(state: RunState) -> Self {
        Self {
            final_code: state.current_code,
            log: state.log,
            status: state.status.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::workflow::machine::Verdict;
    use crate::workflow::state::StepDelta;

    #[test]
    fn test_repair_request_defaults_test_input() {
        let request: RepairRequest = serde_json::from_str(
            r#"{"source_code": "def f(): pass", "defect_description": "bug",
                "target_language": "python"}"#,
        )
        .unwrap();
        assert!(request.raw_test_input.is_empty());
    }

    #[test]
    fn test_optimize_response_projection() {
        let state = RunState::new("orig", "python", None)
            .apply(StepDelta {
                current_code: Some("opt".to_string()),
                baseline: Some(Duration::from_millis(1500)),
                candidate: Some(Duration::from_millis(500)),
                complexity: Some(Complexity {
                    orig_time: "O(n^2)".to_string(),
                    orig_space: "O(1)".to_string(),
                    opt_time: "O(n)".to_string(),
                    opt_space: "O(1)".to_string(),
                }),
                ..StepDelta::default()
            })
            .finish(Verdict::Passed);

        let response = OptimizeResponse::from(state);
        assert_eq!(response.final_code, "opt");
        assert_eq!(response.initial_time, 1.5);
        assert_eq!(response.final_time, 0.5);
        assert_eq!(response.complexity.opt_time, "O(n)");
    }

    #[test]
    fn test_optimize_response_zeroes_missing_timings() {
        let state = RunState::new("orig", "python", None).finish(Verdict::Error);
        let response = OptimizeResponse::from(state);
        assert_eq!(response.initial_time, 0.0);
        assert_eq!(response.final_time, 0.0);
    }

    #[test]
    fn test_repair_response_carries_status_name() {
        let state = RunState::new("orig", "python", None).finish(Verdict::Failed);
        let response = RepairResponse::from(state);
        assert_eq!(response.status, "failed");
        assert_eq!(response.final_code, "orig");
    }
}
