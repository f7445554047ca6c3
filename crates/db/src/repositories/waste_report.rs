//! Waste report repository.
//!
//! Review transitions are issued as conditional updates gated on
//! `status = 'pending'` so that two concurrent reviews of the same report
//! cannot both succeed, and the approval credit runs in the same database
//! transaction as the status flip.

use std::sync::Arc;

use crate::entities::{
    WasteReport, user,
    waste_report::{self, ReportStatus},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use wastewatch_common::{AppError, AppResult};

/// Waste report repository for database operations.
#[derive(Clone)]
pub struct WasteReportRepository {
    db: Arc<DatabaseConnection>,
}

impl WasteReportRepository {
    /// Create a new waste report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a report by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<waste_report::Model>> {
        WasteReport::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a report by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<waste_report::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ReportNotFound(id.to_string()))
    }

    /// Get all reports, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<waste_report::Model>> {
        WasteReport::find()
            .order_by_desc(waste_report::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get reports owned by a user, newest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<waste_report::Model>> {
        WasteReport::find()
            .filter(waste_report::Column::UserId.eq(user_id))
            .order_by_desc(waste_report::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new report.
    pub async fn create(&self, model: waste_report::ActiveModel) -> AppResult<waste_report::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a report.
    pub async fn update(&self, model: waste_report::ActiveModel) -> AppResult<waste_report::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a report permanently.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let report = self.find_by_id(id).await?;
        if let Some(r) = report {
            r.delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Approve a pending report and credit the owner's point balance.
    ///
    /// The status flip is a conditional update on `status = 'pending'`; zero
    /// affected rows means the report was already processed by another
    /// reviewer. The flip and the balance credit commit in one transaction.
    /// A missing owner row skips the credit but keeps the approval.
    pub async fn approve(
        &self,
        report_id: &str,
        owner_id: &str,
        reviewer_id: &str,
        points: i32,
    ) -> AppResult<waste_report::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let now = chrono::Utc::now();
        let flipped = WasteReport::update_many()
            .col_expr(
                waste_report::Column::Status,
                Expr::value(ReportStatus::Approved),
            )
            .col_expr(waste_report::Column::PointsAwarded, Expr::value(points))
            .col_expr(waste_report::Column::ReviewedBy, Expr::value(reviewer_id))
            .col_expr(waste_report::Column::ReviewedAt, Expr::value(now))
            .filter(waste_report::Column::Id.eq(report_id))
            .filter(waste_report::Column::Status.eq(ReportStatus::Pending))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if flipped.rows_affected == 0 {
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Err(AppError::InvalidTransition(
                "Report already processed".to_string(),
            ));
        }

        let credited = user::Entity::update_many()
            .col_expr(
                user::Column::Points,
                Expr::col(user::Column::Points).add(points),
            )
            .filter(user::Column::Id.eq(owner_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if credited.rows_affected == 0 {
            // Data-integrity anomaly: report approved without an owner to pay.
            tracing::warn!(
                report_id = report_id,
                owner_id = owner_id,
                "Owner not found while crediting points; approving without credit"
            );
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.get_by_id(report_id).await
    }

    /// Reject a pending report.
    ///
    /// Same conditional-update guard as [`Self::approve`]; no balance effect.
    pub async fn reject(
        &self,
        report_id: &str,
        reviewer_id: &str,
    ) -> AppResult<waste_report::Model> {
        let now = chrono::Utc::now();
        let flipped = WasteReport::update_many()
            .col_expr(
                waste_report::Column::Status,
                Expr::value(ReportStatus::Rejected),
            )
            .col_expr(waste_report::Column::PointsAwarded, Expr::value(0))
            .col_expr(waste_report::Column::ReviewedBy, Expr::value(reviewer_id))
            .col_expr(waste_report::Column::ReviewedAt, Expr::value(now))
            .filter(waste_report::Column::Id.eq(report_id))
            .filter(waste_report::Column::Status.eq(ReportStatus::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if flipped.rows_affected == 0 {
            return Err(AppError::InvalidTransition(
                "Report already processed".to_string(),
            ));
        }

        self.get_by_id(report_id).await
    }

    /// Persist edited fields on a report.
    pub async fn save_edit(
        &self,
        report: waste_report::Model,
        description: Option<String>,
        waste_type: Option<waste_report::WasteType>,
        location: Option<(f64, f64)>,
        image: Option<(String, String)>,
    ) -> AppResult<waste_report::Model> {
        let mut model: waste_report::ActiveModel = report.into();

        if let Some(description) = description {
            model.description = Set(description);
        }
        if let Some(waste_type) = waste_type {
            model.waste_type = Set(waste_type);
        }
        if let Some((lat, lng)) = location {
            model.lat = Set(lat);
            model.lng = Set(lng);
        }
        if let Some((key, url)) = image {
            model.image_key = Set(key);
            model.image_url = Set(url);
        }
        model.updated_at = Set(Some(chrono::Utc::now().into()));

        self.update(model).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::waste_report::WasteType;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_report(id: &str, status: ReportStatus) -> waste_report::Model {
        waste_report::Model {
            id: id.to_string(),
            user_id: "owner1".to_string(),
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

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<waste_report::Model>::new()])
                .into_connection(),
        );
        let repo = WasteReportRepository::new(db);

        let result = repo.get_by_id("missing").await;
        assert!(matches!(result, Err(AppError::ReportNotFound(_))));
    }

    #[tokio::test]
    async fn test_approve_already_processed() {
        // Conditional update touches no rows: the report has left pending.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );
        let repo = WasteReportRepository::new(db);

        let result = repo.approve("r1", "owner1", "admin1", 50).await;
        assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_approve_flips_status_and_credits_owner() {
        let approved = waste_report::Model {
            status: ReportStatus::Approved,
            points_awarded: 50,
            reviewed_by: Some("admin1".to_string()),
            reviewed_at: Some(Utc::now().into()),
            ..test_report("r1", ReportStatus::Pending)
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    // report status flip
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    // owner balance credit
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .append_query_results([[approved]])
                .into_connection(),
        );
        let repo = WasteReportRepository::new(db);

        let report = repo.approve("r1", "owner1", "admin1", 50).await.unwrap();
        assert_eq!(report.status, ReportStatus::Approved);
        assert_eq!(report.points_awarded, 50);
        assert_eq!(report.reviewed_by.as_deref(), Some("admin1"));
    }

    #[tokio::test]
    async fn test_approve_tolerates_missing_owner() {
        let approved = waste_report::Model {
            status: ReportStatus::Approved,
            points_awarded: 25,
            reviewed_by: Some("admin1".to_string()),
            ..test_report("r1", ReportStatus::Pending)
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    // owner row missing; credit skipped
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .append_query_results([[approved]])
                .into_connection(),
        );
        let repo = WasteReportRepository::new(db);

        let report = repo.approve("r1", "ghost", "admin1", 25).await.unwrap();
        assert_eq!(report.status, ReportStatus::Approved);
    }

    #[tokio::test]
    async fn test_reject_already_processed() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );
        let repo = WasteReportRepository::new(db);

        let result = repo.reject("r1", "admin1").await;
        assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_reject_zeroes_points() {
        let rejected = waste_report::Model {
            status: ReportStatus::Rejected,
            points_awarded: 0,
            reviewed_by: Some("admin1".to_string()),
            reviewed_at: Some(Utc::now().into()),
            ..test_report("r1", ReportStatus::Pending)
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[rejected]])
                .into_connection(),
        );
        let repo = WasteReportRepository::new(db);

        let report = repo.reject("r1", "admin1").await.unwrap();
        assert_eq!(report.status, ReportStatus::Rejected);
        assert_eq!(report.points_awarded, 0);
    }
}
