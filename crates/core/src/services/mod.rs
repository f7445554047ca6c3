//! Business services.

pub mod authorization;
pub mod email;
pub mod media;
pub mod report;
pub mod user;

pub use authorization::{Identity, require_admin, require_owner};
pub use email::EmailService;
pub use media::{MediaService, StoredImage, UploadedImage};
pub use report::{
    EditReportInput, GeoPoint, ReportDetail, ReportService, ReportWithOwner, SubmitReportInput,
    UserSummary,
};
pub use user::{RegisterInput, UpdateProfileInput, UserService};
