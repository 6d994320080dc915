//! Report and collection-task DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::ReportStatus;
use crate::persistence::StoredReport;

/// Request body for `POST /reports`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitReportRequest {
    /// Free-form location description.
    pub location: String,
    /// Waste category (e.g. `"plastic"`).
    pub waste_type: String,
    /// Estimated quantity, free-form (e.g. `"5 kg"`).
    pub amount: String,
    /// Optional image URL (storage is external).
    #[serde(default)]
    pub image_url: Option<String>,
}

/// One waste report.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReportDto {
    /// Report id.
    #[schema(value_type = i64)]
    pub id: crate::domain::ReportId,
    /// Reporting user.
    #[schema(value_type = i64)]
    pub user_id: crate::domain::UserId,
    /// Free-form location description.
    pub location: String,
    /// Waste category.
    pub waste_type: String,
    /// Estimated quantity.
    pub amount: String,
    /// Optional image URL.
    pub image_url: Option<String>,
    /// Collection lifecycle state.
    #[schema(value_type = String, example = "pending")]
    pub status: ReportStatus,
    /// Collector holding the claim, if any.
    #[schema(value_type = Option<i64>)]
    pub collector_id: Option<crate::domain::UserId>,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
    /// Last status change timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<StoredReport> for ReportDto {
    fn from(report: StoredReport) -> Self {
        Self {
            id: report.id,
            user_id: report.user_id,
            location: report.location,
            waste_type: report.waste_type,
            amount: report.amount,
            image_url: report.image_url,
            status: report.status,
            collector_id: report.collector_id,
            created_at: report.created_at,
            updated_at: report.updated_at,
        }
    }
}

/// Paginated list response for `GET /reports` and `GET /tasks`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReportListResponse {
    /// Reports, newest first.
    pub data: Vec<ReportDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Request body for `POST /tasks/{id}/status`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// Target lifecycle state (`verified` is rejected here; use the
    /// verify endpoint).
    #[schema(value_type = String, example = "in_progress")]
    pub status: ReportStatus,
}

/// Response body for `POST /tasks/{id}/verify`.
#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyResponse {
    /// The verified report.
    pub report: ReportDto,
    /// Points granted to the collector.
    pub reward_points: i64,
}
