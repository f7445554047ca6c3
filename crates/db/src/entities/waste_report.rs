//! Waste report entity and its review state machine types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Review status of a waste report.
///
/// `Pending` is the only state that accepts an approve or reject transition;
/// `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum ReportStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Category tag classifying the reported waste.
///
/// The string values are the wire/database representation and match the
/// labels the submission form offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum WasteType {
    #[sea_orm(string_value = "E-waste")]
    #[serde(rename = "E-waste")]
    EWaste,
    #[sea_orm(string_value = "Paper waste")]
    #[serde(rename = "Paper waste")]
    Paper,
    #[sea_orm(string_value = "Metal waste")]
    #[serde(rename = "Metal waste")]
    Metal,
    #[sea_orm(string_value = "Plastic waste")]
    #[serde(rename = "Plastic waste")]
    Plastic,
    #[sea_orm(string_value = "Stationary waste")]
    #[serde(rename = "Stationary waste")]
    Stationary,
    #[sea_orm(string_value = "Organic waste")]
    #[serde(rename = "Organic waste")]
    Organic,
    #[sea_orm(string_value = "Others")]
    #[serde(rename = "Others")]
    Others,
}

impl WasteType {
    /// Parse the wire representation of a waste category.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "E-waste" => Some(Self::EWaste),
            "Paper waste" => Some(Self::Paper),
            "Metal waste" => Some(Self::Metal),
            "Plastic waste" => Some(Self::Plastic),
            "Stationary waste" => Some(Self::Stationary),
            "Organic waste" => Some(Self::Organic),
            "Others" => Some(Self::Others),
            _ => None,
        }
    }

    /// The wire representation of this category.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EWaste => "E-waste",
            Self::Paper => "Paper waste",
            Self::Metal => "Metal waste",
            Self::Plastic => "Plastic waste",
            Self::Stationary => "Stationary waste",
            Self::Organic => "Organic waste",
            Self::Others => "Others",
        }
    }
}

/// Geotagged waste report submitted by a citizen.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "waste_report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owner of the report
    pub user_id: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub waste_type: WasteType,

    /// Latitude of the reported location
    pub lat: f64,

    /// Longitude of the reported location
    pub lng: f64,

    /// Storage key of the uploaded photo
    pub image_key: String,

    /// Public URL of the uploaded photo
    pub image_url: String,

    pub status: ReportStatus,

    /// Points granted on approval; 0 while pending and after rejection
    #[sea_orm(default_value = 0)]
    pub points_awarded: i32,

    /// Admin who approved or rejected the report
    #[sea_orm(nullable)]
    pub reviewed_by: Option<String>,

    /// When the report was reviewed
    #[sea_orm(nullable)]
    pub reviewed_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    Owner,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReviewedBy",
        to = "super::user::Column::Id"
    )]
    Reviewer,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
