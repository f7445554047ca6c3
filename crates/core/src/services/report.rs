//! Report lifecycle engine.
//!
//! Enforces the report state machine (pending → approved | rejected, both
//! terminal), the authorization gate in front of every mutating operation,
//! and the coupling between approval and the owner's point balance. Edit and
//! delete are ownership-gated but not status-gated.

use std::collections::HashSet;

use serde::Serialize;
use validator::Validate;

use crate::services::authorization::{Identity, require_admin, require_owner};
use crate::services::media::{MediaService, UploadedImage};
use sea_orm::Set;
use wastewatch_common::{AppError, AppResult, IdGenerator};
use wastewatch_db::entities::{
    user,
    waste_report::{self, ReportStatus, WasteType},
};
use wastewatch_db::repositories::{UserRepository, WasteReportRepository};

/// A geographic coordinate pair.
#[derive(Debug, Clone, Copy, Serialize, serde::Deserialize, Validate)]
pub struct GeoPoint {
    /// Latitude in degrees.
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    /// Longitude in degrees.
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
}

/// Input for submitting a new report.
#[derive(Debug, Validate)]
pub struct SubmitReportInput {
    /// Free-text description of the waste.
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    /// Waste category.
    pub waste_type: WasteType,
    /// Where the waste was found.
    #[validate(nested)]
    pub location: GeoPoint,
    /// Photo of the waste.
    pub image: UploadedImage,
}

/// Patch applied to an existing report; absent fields are left untouched.
#[derive(Debug, Default, Validate)]
pub struct EditReportInput {
    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: Option<String>,
    pub waste_type: Option<WasteType>,
    #[validate(nested)]
    pub location: Option<GeoPoint>,
    pub image: Option<UploadedImage>,
}

/// Owner or reviewer summary inlined into report responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&user::Model> for UserSummary {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// A report paired with its owner's summary, for admin listings.
#[derive(Debug, Clone)]
pub struct ReportWithOwner {
    pub report: waste_report::Model,
    pub owner: Option<UserSummary>,
}

/// A report with both owner and reviewer summaries, for the detail view.
#[derive(Debug, Clone)]
pub struct ReportDetail {
    pub report: waste_report::Model,
    pub owner: Option<UserSummary>,
    pub reviewer: Option<UserSummary>,
}

/// Report lifecycle service.
#[derive(Clone)]
pub struct ReportService {
    report_repo: WasteReportRepository,
    user_repo: UserRepository,
    media: MediaService,
    id_gen: IdGenerator,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub const fn new(
        report_repo: WasteReportRepository,
        user_repo: UserRepository,
        media: MediaService,
        id_gen: IdGenerator,
    ) -> Self {
        Self {
            report_repo,
            user_repo,
            media,
            id_gen,
        }
    }

    /// Submit a new report. The photo is stored first; a failed insert
    /// releases it again.
    pub async fn submit(
        &self,
        owner: &Identity,
        input: SubmitReportInput,
    ) -> AppResult<waste_report::Model> {
        input.validate()?;

        let stored = self
            .media
            .store(
                &owner.id,
                &input.image.file_name,
                &input.image.content_type,
                &input.image.bytes,
            )
            .await?;

        let model = waste_report::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(owner.id.clone()),
            description: Set(input.description),
            waste_type: Set(input.waste_type),
            lat: Set(input.location.lat),
            lng: Set(input.location.lng),
            image_key: Set(stored.key.clone()),
            image_url: Set(stored.url),
            status: Set(ReportStatus::Pending),
            points_awarded: Set(0),
            reviewed_by: Set(None),
            reviewed_at: Set(None),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        match self.report_repo.create(model).await {
            Ok(report) => Ok(report),
            Err(e) => {
                self.media.remove_best_effort(&stored.key).await;
                Err(e)
            }
        }
    }

    /// List all reports with owner summaries. Admin only.
    pub async fn list_all(&self, requester: &Identity) -> AppResult<Vec<ReportWithOwner>> {
        require_admin(requester)?;

        let reports = self.report_repo.find_all().await?;
        let owners = self
            .load_summaries(reports.iter().map(|r| r.user_id.as_str()))
            .await?;

        Ok(reports
            .into_iter()
            .map(|report| {
                let owner = owners
                    .iter()
                    .find(|u| u.id == report.user_id)
                    .map(UserSummary::from);
                ReportWithOwner { report, owner }
            })
            .collect())
    }

    /// List the requester's own reports.
    pub async fn list_own(&self, requester: &Identity) -> AppResult<Vec<waste_report::Model>> {
        self.report_repo.find_by_user(&requester.id).await
    }

    /// Fetch one report with owner and reviewer summaries.
    pub async fn get_detail(&self, report_id: &str) -> AppResult<ReportDetail> {
        let report = self.report_repo.get_by_id(report_id).await?;

        let mut ids = vec![report.user_id.as_str()];
        if let Some(reviewer_id) = report.reviewed_by.as_deref() {
            ids.push(reviewer_id);
        }
        let users = self.load_summaries(ids.into_iter()).await?;

        let owner = users
            .iter()
            .find(|u| u.id == report.user_id)
            .map(UserSummary::from);
        let reviewer = report
            .reviewed_by
            .as_deref()
            .and_then(|id| users.iter().find(|u| u.id == id))
            .map(UserSummary::from);

        Ok(ReportDetail {
            report,
            owner,
            reviewer,
        })
    }

    /// Approve a pending report and credit its owner. Admin only.
    ///
    /// Absent points default to 0; negative points are rejected.
    pub async fn approve(
        &self,
        requester: &Identity,
        report_id: &str,
        points: Option<i64>,
    ) -> AppResult<waste_report::Model> {
        require_admin(requester)?;

        let points = points.unwrap_or(0);
        let points = i32::try_from(points)
            .ok()
            .filter(|p| *p >= 0)
            .ok_or_else(|| {
                AppError::Validation("Points must be a non-negative integer".to_string())
            })?;

        let report = self.report_repo.get_by_id(report_id).await?;

        self.report_repo
            .approve(&report.id, &report.user_id, &requester.id, points)
            .await
    }

    /// Reject a pending report. Admin only, no balance effect.
    pub async fn reject(
        &self,
        requester: &Identity,
        report_id: &str,
    ) -> AppResult<waste_report::Model> {
        require_admin(requester)?;

        let report = self.report_repo.get_by_id(report_id).await?;
        self.report_repo.reject(&report.id, &requester.id).await
    }

    /// Apply a patch to a report. Owner only; status, points and reviewer
    /// are never touched. A replaced photo is released after the new one
    /// is persisted.
    pub async fn edit(
        &self,
        requester: &Identity,
        report_id: &str,
        input: EditReportInput,
    ) -> AppResult<waste_report::Model> {
        let report = self.report_repo.get_by_id(report_id).await?;
        require_owner(requester, &report)?;

        // Ownership is settled first so a non-owner never learns whether
        // their patch would have validated.
        input.validate()?;

        let stale_key = input.image.as_ref().map(|_| report.image_key.clone());

        let new_image = match input.image {
            Some(image) => {
                let stored = self
                    .media
                    .store(&requester.id, &image.file_name, &image.content_type, &image.bytes)
                    .await?;
                Some((stored.key, stored.url))
            }
            None => None,
        };
        let new_key = new_image.as_ref().map(|(key, _)| key.clone());

        let location = input.location.map(|loc| (loc.lat, loc.lng));
        let updated = match self
            .report_repo
            .save_edit(report, input.description, input.waste_type, location, new_image)
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                // The report kept its old image; the fresh file is orphaned.
                if let Some(key) = new_key {
                    self.media.remove_best_effort(&key).await;
                }
                return Err(e);
            }
        };

        if let Some(key) = stale_key {
            self.media.remove_best_effort(&key).await;
        }

        Ok(updated)
    }

    /// Delete a report and release its photo. Owner only.
    pub async fn delete(&self, requester: &Identity, report_id: &str) -> AppResult<()> {
        let report = self.report_repo.get_by_id(report_id).await?;
        require_owner(requester, &report)?;

        self.report_repo.delete(&report.id).await?;
        self.media.remove_best_effort(&report.image_key).await;

        Ok(())
    }

    async fn load_summaries<'a>(
        &self,
        ids: impl Iterator<Item = &'a str>,
    ) -> AppResult<Vec<user::Model>> {
        let unique: HashSet<&str> = ids.collect();
        if unique.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = unique.into_iter().map(str::to_string).collect();
        self.user_repo.find_by_ids(&ids).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;
    use wastewatch_common::LocalStorage;
    use wastewatch_common::config::StorageConfig;
    use wastewatch_db::entities::user::UserRole;

    fn service(db: DatabaseConnection) -> (ReportService, std::path::PathBuf) {
        let db = Arc::new(db);
        let dir = std::env::temp_dir().join(format!("ww-report-{}", uuid::Uuid::new_v4()));
        let storage = Arc::new(LocalStorage::new(dir.clone(), "/files".to_string()));
        let media = MediaService::new(storage, &StorageConfig::default());
        (
            ReportService::new(
                WasteReportRepository::new(Arc::clone(&db)),
                UserRepository::new(db),
                media,
                IdGenerator::new(),
            ),
            dir,
        )
    }

    fn citizen(id: &str) -> Identity {
        Identity {
            id: id.to_string(),
            role: UserRole::User,
        }
    }

    fn admin(id: &str) -> Identity {
        Identity {
            id: id.to_string(),
            role: UserRole::Admin,
        }
    }

    fn test_report(id: &str, owner: &str, status: ReportStatus) -> waste_report::Model {
        waste_report::Model {
            id: id.to_string(),
            user_id: owner.to_string(),
            description: "Pile of cans by the river".to_string(),
            waste_type: WasteType::Metal,
            lat: 27.7,
            lng: 85.3,
            image_key: "2026/03/01/owner1/a.jpg".to_string(),
            image_url: "/files/2026/03/01/owner1/a.jpg".to_string(),
            status,
            points_awarded: 0,
            reviewed_by: None,
            reviewed_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            name: "Test User".to_string(),
            email: format!("{id}@example.com"),
            password_hash: None,
            token: None,
            role: UserRole::User,
            points: 0,
            avatar_url: None,
            reset_token: None,
            reset_token_expires_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn jpeg_upload() -> UploadedImage {
        UploadedImage {
            file_name: "photo.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: b"jpegdata".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_submit_rejects_empty_description() {
        let (svc, _dir) = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = svc
            .submit(
                &citizen("u1"),
                SubmitReportInput {
                    description: String::new(),
                    waste_type: WasteType::Organic,
                    location: GeoPoint { lat: 27.7, lng: 85.3 },
                    image: jpeg_upload(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_submit_rejects_out_of_range_coordinates() {
        let (svc, _dir) = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = svc
            .submit(
                &citizen("u1"),
                SubmitReportInput {
                    description: "broken pipe".to_string(),
                    waste_type: WasteType::Metal,
                    location: GeoPoint { lat: 91.0, lng: 85.3 },
                    image: jpeg_upload(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_submit_creates_pending_report() {
        let created = test_report("r1", "u1", ReportStatus::Pending);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([[created]])
            .into_connection();
        let (svc, dir) = service(db);

        let report = svc
            .submit(
                &citizen("u1"),
                SubmitReportInput {
                    description: "broken pipe".to_string(),
                    waste_type: WasteType::Metal,
                    location: GeoPoint { lat: 27.7, lng: 85.3 },
                    image: jpeg_upload(),
                },
            )
            .await
            .unwrap();
        assert_eq!(report.status, ReportStatus::Pending);
        assert_eq!(report.points_awarded, 0);

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn test_list_all_requires_admin() {
        let (svc, _dir) = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = svc.list_all(&citizen("u1")).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_list_all_attaches_owner_summaries() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                test_report("r1", "u1", ReportStatus::Pending),
                test_report("r2", "u2", ReportStatus::Approved),
            ]])
            .append_query_results([vec![test_user("u1"), test_user("u2")]])
            .into_connection();
        let (svc, _dir) = service(db);

        let listed = svc.list_all(&admin("a1")).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(
            listed[0].owner.as_ref().map(|o| o.id.as_str()),
            Some("u1")
        );
        assert_eq!(
            listed[1].owner.as_ref().map(|o| o.email.as_str()),
            Some("u2@example.com")
        );
    }

    #[tokio::test]
    async fn test_get_detail_includes_reviewer() {
        let report = waste_report::Model {
            status: ReportStatus::Approved,
            points_awarded: 50,
            reviewed_by: Some("a1".to_string()),
            reviewed_at: Some(Utc::now().into()),
            ..test_report("r1", "u1", ReportStatus::Pending)
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![report]])
            .append_query_results([vec![test_user("u1"), test_user("a1")]])
            .into_connection();
        let (svc, _dir) = service(db);

        let detail = svc.get_detail("r1").await.unwrap();
        assert_eq!(detail.owner.as_ref().map(|o| o.id.as_str()), Some("u1"));
        assert_eq!(detail.reviewer.as_ref().map(|r| r.id.as_str()), Some("a1"));
    }

    #[tokio::test]
    async fn test_get_detail_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<waste_report::Model>::new()])
            .into_connection();
        let (svc, _dir) = service(db);

        let result = svc.get_detail("missing").await;
        assert!(matches!(result, Err(AppError::ReportNotFound(_))));
    }

    #[tokio::test]
    async fn test_approve_requires_admin() {
        let (svc, _dir) = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = svc.approve(&citizen("u1"), "r1", Some(50)).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_approve_rejects_negative_points() {
        let (svc, _dir) = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = svc.approve(&admin("a1"), "r1", Some(-5)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_approve_defaults_points_to_zero() {
        let pending = test_report("r1", "u1", ReportStatus::Pending);
        let approved = waste_report::Model {
            status: ReportStatus::Approved,
            reviewed_by: Some("a1".to_string()),
            reviewed_at: Some(Utc::now().into()),
            ..pending.clone()
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![pending]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .append_query_results([vec![approved]])
            .into_connection();
        let (svc, _dir) = service(db);

        let report = svc.approve(&admin("a1"), "r1", None).await.unwrap();
        assert_eq!(report.status, ReportStatus::Approved);
        assert_eq!(report.points_awarded, 0);
    }

    #[tokio::test]
    async fn test_reject_requires_admin() {
        let (svc, _dir) = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = svc.reject(&citizen("u1"), "r1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_edit_by_non_owner_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_report("r1", "u1", ReportStatus::Pending)]])
            .into_connection();
        let (svc, _dir) = service(db);

        let result = svc
            .edit(
                &citizen("u2"),
                "r1",
                EditReportInput {
                    description: Some("new text".to_string()),
                    ..EditReportInput::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_edit_by_non_owner_with_invalid_patch_still_forbidden() {
        // Ownership is checked before the patch is validated, so a
        // non-owner sees 403 even for a patch that would fail validation.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_report("r1", "u1", ReportStatus::Pending)]])
            .into_connection();
        let (svc, _dir) = service(db);

        let result = svc
            .edit(
                &citizen("u2"),
                "r1",
                EditReportInput {
                    description: Some(String::new()),
                    ..EditReportInput::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    fn count_files(dir: &std::path::Path) -> usize {
        let mut count = 0;
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    count += count_files(&path);
                } else {
                    count += 1;
                }
            }
        }
        count
    }

    #[tokio::test]
    async fn test_edit_releases_new_image_when_persist_fails() {
        // The report row is found but the update fails; the freshly stored
        // replacement photo must not be left orphaned on disk.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_report("r1", "u1", ReportStatus::Pending)]])
            .into_connection();
        let (svc, dir) = service(db);

        let result = svc
            .edit(
                &citizen("u1"),
                "r1",
                EditReportInput {
                    image: Some(jpeg_upload()),
                    ..EditReportInput::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Database(_))));
        assert_eq!(count_files(&dir), 0);

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn test_edit_updates_description() {
        let before = test_report("r1", "u1", ReportStatus::Pending);
        let after = waste_report::Model {
            description: "new text".to_string(),
            updated_at: Some(Utc::now().into()),
            ..before.clone()
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![before]])
            .append_query_results([vec![after]])
            .into_connection();
        let (svc, _dir) = service(db);

        let report = svc
            .edit(
                &citizen("u1"),
                "r1",
                EditReportInput {
                    description: Some("new text".to_string()),
                    ..EditReportInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(report.description, "new text");
        assert_eq!(report.status, ReportStatus::Pending);
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_report("r1", "u1", ReportStatus::Pending)]])
            .into_connection();
        let (svc, _dir) = service(db);

        let result = svc.delete(&citizen("u2"), "r1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_report_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<waste_report::Model>::new()])
            .into_connection();
        let (svc, _dir) = service(db);

        let result = svc.delete(&citizen("u1"), "missing").await;
        assert!(matches!(result, Err(AppError::ReportNotFound(_))));
    }
}
