//! Database repositories.

mod user;
mod waste_report;

pub use user::UserRepository;
pub use waste_report::WasteReportRepository;
