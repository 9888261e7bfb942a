// src/web/handlers/application_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use tracing::info;
use uuid::Uuid;

use super::job_handlers::owned_job;
use crate::auth::EmployerUser;
use crate::backend::SharedBackend;
use crate::board::ApplicationReview;
use crate::models::ApplicationStatus;
use crate::web::types::*;

pub async fn update_application_status_handler(
    id: Uuid,
    request: Json<StatusUpdateRequest<ApplicationStatus>>,
    user: EmployerUser,
    backend: &State<SharedBackend>,
) -> ApiResult<DataResponse<ApplicationReview>> {
    let application = backend
        .get_application(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Application"))?;

    owned_job(backend.inner(), user.profile(), application.job_id).await?;

    let next = application
        .status
        .transition(request.into_inner().status)?;
    let mut updated = backend
        .update_application_status(id, application.status, next)
        .await?;
    if updated.job.is_none() {
        updated.job = application.job;
    }

    info!(
        "{} moved application {} from {} to {}",
        user.email(),
        id,
        application.status,
        next
    );

    Ok(Json(DataResponse::success(
        format!("Application marked {}", next),
        ApplicationReview::from(updated),
    )))
}
