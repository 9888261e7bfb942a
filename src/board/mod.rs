// src/board/mod.rs
//! Job-board rules that run in the service rather than in the backend:
//! listing filters, requirement parsing, application status moves and the
//! view models behind each screen.

pub mod dashboard;
pub mod filter;
pub mod landing;
pub mod requirements;
pub mod status;

pub use dashboard::{
    applications_for_job, ApplicationReview, EmployerDashboard, GraduateDashboard, HomeView,
    JobCard, JobSummary, StatusCounts,
};
pub use filter::JobFilter;
pub use landing::LandingPage;
pub use requirements::parse_requirements;
