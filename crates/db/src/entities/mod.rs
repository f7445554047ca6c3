//! Database entities.

pub mod user;
pub mod waste_report;

pub use user::Entity as User;
pub use waste_report::Entity as WasteReport;
