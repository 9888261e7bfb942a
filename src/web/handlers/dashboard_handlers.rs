// src/web/handlers/dashboard_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use tracing::debug;
use uuid::Uuid;

use crate::auth::{EmployerUser, GraduateUser, OptionalAuth};
use crate::backend::SharedBackend;
use crate::board::{EmployerDashboard, GraduateDashboard, HomeView, LandingPage};
use crate::web::types::*;

pub async fn landing_handler(auth: OptionalAuth) -> Json<DataResponse<LandingPage>> {
    let home_view = HomeView::for_profile(auth.user.as_ref().map(|u| u.profile()));
    Json(DataResponse::success(
        "Connecting local talent with opportunity",
        LandingPage::new(home_view),
    ))
}

pub async fn graduate_dashboard_handler(
    user: GraduateUser,
    backend: &State<SharedBackend>,
) -> ApiResult<DataResponse<GraduateDashboard>> {
    let applications = backend
        .list_applications_for_graduate(user.profile().id)
        .await?;
    let dashboard = GraduateDashboard::build(applications);
    debug!("{} has {} applications", user.email(), dashboard.counts.total);

    Ok(Json(DataResponse::success(
        format!("Welcome back, {}", user.profile().full_name),
        dashboard,
    )))
}

pub async fn employer_dashboard_handler(
    user: EmployerUser,
    backend: &State<SharedBackend>,
) -> ApiResult<DataResponse<EmployerDashboard>> {
    let jobs = backend.list_jobs_by_employer(user.profile().id).await?;
    let job_ids: Vec<Uuid> = jobs.iter().map(|job| job.id).collect();
    let applications = backend.list_applications_for_jobs(&job_ids).await?;

    let dashboard = EmployerDashboard::build(jobs, &applications);
    debug!(
        "{}: {} jobs, {} applications",
        user.email(),
        dashboard.total_jobs,
        dashboard.total_applications
    );

    Ok(Json(DataResponse::success(
        format!("{} dashboard", user.profile().display_company()),
        dashboard,
    )))
}
