use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::api::types::{
    HardenRequest, HardenResponse, OptimizeRequest, OptimizeResponse, RepairRequest,
    RepairResponse,
};
use crate::sandbox::language::Language;
use crate::server::AppState;
use crate::workflow::machine::Caps;
use crate::workflow::{harden, optimize, repair};

type Rejection = (StatusCode, String);

/// Parse the caller-declared language or reject the request before any
/// engine work happens.
fn parse_language(declared: &str) -> Result<Language, Rejection> {
    Language::parse(declared).ok_or_else(|| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("unsupported target language: {declared}"),
        )
    })
}

pub async fn repair(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RepairRequest>,
) -> Result<Json<RepairResponse>, Rejection> {
    let language = parse_language(&request.target_language)?;
    let caps = Caps::from(&state.config.workflow);

    tracing::info!(
        language = %language,
        code_bytes = request.source_code.len(),
        "Repair run started"
    );

    let result = repair::run(
        &state.claude,
        &state.claude,
        &state.claude,
        &state.sandbox,
        caps,
        &request.source_code,
        &request.defect_description,
        &request.raw_test_input,
        language,
    )
    .await;

    tracing::info!(
        status = result.status.name(),
        iterations = result.iterations,
        "Repair run finished"
    );

    Ok(Json(RepairResponse::from(result)))
}

pub async fn optimize(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, Rejection> {
    let language = parse_language(&request.target_language)?;
    let caps = Caps::from(&state.config.workflow);

    tracing::info!(
        language = %language,
        code_bytes = request.source_code.len(),
        "Optimization run started"
    );

    let result = optimize::run(
        &state.claude,
        &state.claude,
        &state.claude,
        &state.sandbox,
        caps,
        &request.source_code,
        &request.raw_test_input,
        language,
    )
    .await;

    tracing::info!(
        status = result.status.name(),
        iterations = result.iterations,
        "Optimization run finished"
    );

    Ok(Json(OptimizeResponse::from(result)))
}

/// The hardening engine validates the declared language itself (the gate is
/// a policy check on the raw declaration), so no parsing happens here.
pub async fn harden(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HardenRequest>,
) -> Json<HardenResponse> {
    let caps = Caps::from(&state.config.workflow);

    tracing::info!(
        language = %request.target_language,
        code_bytes = request.source_code.len(),
        "Hardening run started"
    );

    let result = harden::run(
        &state.claude,
        &state.claude,
        caps,
        &request.source_code,
        &request.target_language,
    )
    .await;

    tracing::info!(
        status = result.status.name(),
        iterations = result.iterations,
        "Hardening run finished"
    );

    Json(HardenResponse::from(result))
}
