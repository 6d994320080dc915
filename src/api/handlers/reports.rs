//! Report and collection-task endpoints.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    PaginationMeta, PaginationParams, ReportDto, ReportListResponse, SubmitReportRequest,
    UpdateStatusRequest, VerifyResponse,
};
use crate::app_state::AppState;
use crate::domain::ReportId;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /reports` — Submit a waste report (earns the report reward).
///
/// # Errors
///
/// Returns [`GatewayError`] on validation failure or storage failure.
#[utoipa::path(
    post,
    path = "/api/v1/reports",
    tag = "Reports",
    summary = "Submit a waste report",
    description = "Persists the report, opens a pending collection task, and awards the reporter the configured points.",
    request_body = SubmitReportRequest,
    responses(
        (status = 201, description = "Report created", body = ReportDto),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    )
)]
pub async fn submit_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SubmitReportRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let caller = state.identity.resolve(&headers).await?;
    let report = state
        .collection
        .submit_report(
            caller.id,
            &req.location,
            &req.waste_type,
            &req.amount,
            req.image_url.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ReportDto::from(report))))
}

/// `GET /reports` — List reports, newest first.
///
/// # Errors
///
/// Returns [`GatewayError`] when the caller cannot be resolved or on
/// storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/reports",
    tag = "Reports",
    summary = "List reports",
    description = "Returns a paginated list of all waste reports, newest first.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated report list", body = ReportListResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    )
)]
pub async fn list_reports(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let _caller = state.identity.resolve(&headers).await?;
    paged_reports(&state, &params).await
}

/// `GET /tasks` — List collection tasks, newest first.
///
/// Tasks are the collection-side view of reports; the payload shape is
/// identical to `GET /reports`.
///
/// # Errors
///
/// Returns [`GatewayError`] when the caller cannot be resolved or on
/// storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    tag = "Tasks",
    summary = "List collection tasks",
    description = "Returns a paginated list of collection tasks (reports with their lifecycle state), newest first.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated task list", body = ReportListResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    )
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let _caller = state.identity.resolve(&headers).await?;
    paged_reports(&state, &params).await
}

async fn paged_reports(
    state: &AppState,
    params: &PaginationParams,
) -> Result<Json<ReportListResponse>, GatewayError> {
    let clamped = params.clamped();
    let (limit, offset) = clamped.limit_offset();
    let (reports, total) = state.collection.reports_page(limit, offset).await?;

    let total_pages = if total == 0 {
        0
    } else {
        total.div_ceil(clamped.per_page)
    };

    Ok(Json(ReportListResponse {
        data: reports.into_iter().map(ReportDto::from).collect(),
        pagination: PaginationMeta {
            page: clamped.page,
            per_page: clamped.per_page,
            total,
            total_pages,
        },
    }))
}

/// `POST /tasks/{id}/status` — Claim or advance a collection task.
///
/// # Errors
///
/// Returns [`GatewayError`] on unknown task, disallowed transition, or
/// storage failure.
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{id}/status",
    tag = "Tasks",
    summary = "Update task status",
    description = "Claims a pending task or advances a claimed one. Verification is a separate endpoint.",
    params(
        ("id" = i64, Path, description = "Task (report) id"),
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated task", body = ReportDto),
        (status = 400, description = "Disallowed transition", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
    )
)]
pub async fn update_task_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let caller = state.identity.resolve(&headers).await?;
    let report = state
        .collection
        .update_status(ReportId::new(id), req.status, caller.id)
        .await?;
    Ok(Json(ReportDto::from(report)))
}

/// `POST /tasks/{id}/verify` — Verify a collection (earns the collect
/// reward).
///
/// # Errors
///
/// Returns [`GatewayError`] on unknown task, unverifiable state, or
/// storage failure.
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{id}/verify",
    tag = "Tasks",
    summary = "Verify a collection",
    description = "Marks the claimed task verified and awards the collector the configured points.",
    params(
        ("id" = i64, Path, description = "Task (report) id"),
    ),
    responses(
        (status = 200, description = "Verified task with granted points", body = VerifyResponse),
        (status = 400, description = "Task not verifiable", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
    )
)]
pub async fn verify_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, GatewayError> {
    let caller = state.identity.resolve(&headers).await?;
    let (report, tx) = state
        .collection
        .verify_collection(ReportId::new(id), caller.id)
        .await?;
    Ok(Json(VerifyResponse {
        report: ReportDto::from(report),
        reward_points: tx.amount,
    }))
}

/// Report and task routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports", post(submit_report).get(list_reports))
        .route("/tasks", get(list_tasks))
        .route("/tasks/{id}/status", post(update_task_status))
        .route("/tasks/{id}/verify", post(verify_task))
}
