//! Waste report endpoints.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post, put},
};
use serde::{Deserialize, Serialize};
use wastewatch_common::{AppError, AppResult};
use wastewatch_core::{
    EditReportInput, GeoPoint, Identity, ReportDetail, ReportWithOwner, SubmitReportInput,
    UploadedImage, UserSummary,
};
use wastewatch_db::entities::waste_report::{self, ReportStatus, WasteType};

use crate::{extractors::AuthUser, middleware::AppState};

/// Report wire representation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: String,
    pub description: String,
    pub waste_type: WasteType,
    pub location: GeoPoint,
    pub image_url: String,
    pub status: ReportStatus,
    pub points_awarded: i32,
    pub reviewed_by: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
    /// Owner summary, populated on admin listings and the detail view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    /// Reviewer summary, populated on the detail view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<UserSummary>,
}

impl From<waste_report::Model> for ReportResponse {
    fn from(r: waste_report::Model) -> Self {
        Self {
            id: r.id,
            description: r.description,
            waste_type: r.waste_type,
            location: GeoPoint { lat: r.lat, lng: r.lng },
            image_url: r.image_url,
            status: r.status,
            points_awarded: r.points_awarded,
            reviewed_by: r.reviewed_by,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.map(|t| t.to_rfc3339()),
            user: None,
            approved_by: None,
        }
    }
}

impl From<ReportWithOwner> for ReportResponse {
    fn from(r: ReportWithOwner) -> Self {
        Self {
            user: r.owner,
            ..Self::from(r.report)
        }
    }
}

impl From<ReportDetail> for ReportResponse {
    fn from(r: ReportDetail) -> Self {
        Self {
            user: r.owner,
            approved_by: r.reviewer,
            ..Self::from(r.report)
        }
    }
}

/// Mutation response: a message plus the affected report.
#[derive(Debug, Serialize)]
pub struct MessageReportResponse {
    pub message: String,
    pub report: ReportResponse,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub points: Option<i64>,
}

/// Fields accepted by the multipart submit/edit forms.
#[derive(Debug, Default)]
struct ReportForm {
    description: Option<String>,
    waste_type: Option<WasteType>,
    location: Option<GeoPoint>,
    image: Option<UploadedImage>,
}

/// Read the multipart form shared by submit and edit.
async fn read_report_form(mut multipart: Multipart) -> AppResult<ReportForm> {
    let mut form = ReportForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart request: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "description" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid description: {e}")))?;
                form.description = Some(text);
            }
            "wasteType" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid waste type: {e}")))?;
                let waste_type = WasteType::parse(&text).ok_or_else(|| {
                    AppError::Validation(format!("Unknown waste type: {text}"))
                })?;
                form.waste_type = Some(waste_type);
            }
            "location" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid location: {e}")))?;
                let location: GeoPoint = serde_json::from_str(&text).map_err(|e| {
                    AppError::Validation(format!("Location must be JSON with lat and lng: {e}"))
                })?;
                form.location = Some(location);
            }
            "image" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read image: {e}")))?;
                form.image = Some(UploadedImage {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Submit a new report.
async fn submit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<MessageReportResponse>)> {
    let form = read_report_form(multipart).await?;

    let input = SubmitReportInput {
        description: form
            .description
            .ok_or_else(|| AppError::Validation("Description is required".to_string()))?,
        waste_type: form
            .waste_type
            .ok_or_else(|| AppError::Validation("Waste type is required".to_string()))?,
        location: form
            .location
            .ok_or_else(|| AppError::Validation("Location is required".to_string()))?,
        image: form
            .image
            .ok_or_else(|| AppError::Validation("An image is required".to_string()))?,
    };

    let report = state
        .report_service
        .submit(&Identity::of(&user), input)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageReportResponse {
            message: "Report submitted successfully".to_string(),
            report: report.into(),
        }),
    ))
}

/// List every report with owner summaries. Admin only.
async fn list_all(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<ReportResponse>>> {
    let reports = state.report_service.list_all(&Identity::of(&user)).await?;
    Ok(Json(reports.into_iter().map(Into::into).collect()))
}

/// List the caller's reports.
async fn list_own(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<ReportResponse>>> {
    let reports = state.report_service.list_own(&Identity::of(&user)).await?;
    Ok(Json(reports.into_iter().map(Into::into).collect()))
}

/// Fetch one report with owner and reviewer populated.
async fn detail(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ReportResponse>> {
    let detail = state.report_service.get_detail(&id).await?;
    Ok(Json(detail.into()))
}

/// Approve a pending report, crediting the owner. Admin only.
async fn approve(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    body: Option<Json<ApproveRequest>>,
) -> AppResult<Json<MessageReportResponse>> {
    let points = body.and_then(|Json(req)| req.points);
    let report = state
        .report_service
        .approve(&Identity::of(&user), &id, points)
        .await?;

    Ok(Json(MessageReportResponse {
        message: "Report approved".to_string(),
        report: report.into(),
    }))
}

/// Reject a pending report. Admin only.
async fn reject(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageReportResponse>> {
    let report = state
        .report_service
        .reject(&Identity::of(&user), &id)
        .await?;

    Ok(Json(MessageReportResponse {
        message: "Report rejected".to_string(),
        report: report.into(),
    }))
}

/// Edit a report's fields. Owner only.
async fn edit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<MessageReportResponse>> {
    let form = read_report_form(multipart).await?;

    let input = EditReportInput {
        description: form.description,
        waste_type: form.waste_type,
        location: form.location,
        image: form.image,
    };

    let report = state
        .report_service
        .edit(&Identity::of(&user), &id, input)
        .await?;

    Ok(Json(MessageReportResponse {
        message: "Report updated".to_string(),
        report: report.into(),
    }))
}

/// Delete a report. Owner only.
async fn remove(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state
        .report_service
        .delete(&Identity::of(&user), &id)
        .await?;

    Ok(Json(MessageResponse {
        message: "Report deleted".to_string(),
    }))
}

/// Create the reports router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit).get(list_all))
        .route("/user", get(list_own))
        .route("/detail/{id}", get(detail))
        .route("/{id}/approve", patch(approve))
        .route("/{id}/reject", patch(reject))
        .route("/{id}/edit", put(edit))
        .route("/{id}/delete", delete(remove))
}
