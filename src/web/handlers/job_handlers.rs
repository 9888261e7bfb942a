// src/web/handlers/job_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, EmployerUser, GraduateUser};
use crate::backend::SharedBackend;
use crate::board::{
    applications_for_job, parse_requirements, ApplicationReview, JobCard, JobFilter, StatusCounts,
};
use crate::error::BackendError;
use crate::models::{Application, Job, JobStatus, NewApplication, NewJob, Profile};
use crate::web::types::*;

/// Loads a job and checks that `employer` posted it.
pub(crate) async fn owned_job(
    backend: &SharedBackend,
    employer: &Profile,
    job_id: Uuid,
) -> Result<Job, ApiError> {
    let job = backend
        .get_job(job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job"))?;

    if !job.is_owned_by(employer) {
        warn!("{} tried to manage job {} of another employer", employer.email, job.id);
        return Err(ApiError::forbidden("You can only manage your own job postings"));
    }
    Ok(job)
}

async fn has_applied(
    backend: &SharedBackend,
    graduate_id: Uuid,
    job_id: Uuid,
) -> Result<bool, ApiError> {
    Ok(backend
        .list_applications_for_graduate(graduate_id)
        .await?
        .iter()
        .any(|a| a.job_id == job_id))
}

pub(crate) fn validate_new_job(request: PostJobRequest) -> Result<NewJob, ApiError> {
    let title = request.title.trim().to_string();
    let description = request.description.trim().to_string();
    let location = request.location.trim().to_string();

    if title.is_empty() {
        return Err(ApiError::validation("Job title is required"));
    }
    if description.is_empty() {
        return Err(ApiError::validation("Job description is required"));
    }
    if location.is_empty() {
        return Err(ApiError::validation("Job location is required"));
    }

    Ok(NewJob {
        title,
        description,
        requirements: parse_requirements(&request.requirements),
        location,
        salary_range: request
            .salary_range
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        job_type: request.job_type.unwrap_or_default(),
        experience_level: request.experience_level.unwrap_or_default(),
    })
}

pub async fn list_jobs_handler(
    search: Option<String>,
    location: Option<String>,
    auth: AuthenticatedUser,
    backend: &State<SharedBackend>,
) -> ApiResult<DataResponse<JobListing>> {
    let filter = JobFilter::from_query(search.as_deref(), location.as_deref());
    let jobs = filter.apply(backend.list_open_jobs().await?);

    debug!(
        "{} listed jobs (search='{}', location='{}'): {} match",
        auth.email(),
        filter.search(),
        filter.location(),
        jobs.len()
    );

    let listing = JobListing {
        total: jobs.len(),
        search: filter.search().to_string(),
        location: filter.location().to_string(),
        jobs: jobs.iter().map(JobCard::from).collect(),
    };
    Ok(Json(DataResponse::success(
        format!("{} jobs found", listing.total),
        listing,
    )))
}

pub async fn job_detail_handler(
    id: Uuid,
    auth: AuthenticatedUser,
    backend: &State<SharedBackend>,
) -> ApiResult<DataResponse<JobDetailView>> {
    let job = backend
        .get_job(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job"))?;

    // Closed postings stay visible to their owner only.
    if !job.is_open() && !job.is_owned_by(auth.profile()) {
        return Err(ApiError::not_found("Job"));
    }

    let already_applied = if auth.profile().is_graduate() {
        has_applied(backend.inner(), auth.profile().id, job.id).await?
    } else {
        false
    };
    let can_apply = auth.profile().is_graduate() && job.is_open() && !already_applied;

    Ok(Json(DataResponse::success(
        job.title.clone(),
        JobDetailView {
            card: JobCard::from(&job),
            job,
            can_apply,
            already_applied,
        },
    )))
}

pub async fn apply_handler(
    id: Uuid,
    request: Json<ApplyRequest>,
    user: GraduateUser,
    backend: &State<SharedBackend>,
) -> ApiResult<DataResponse<Application>> {
    let job = backend
        .get_job(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job"))?;

    if !job.is_open() {
        return Err(BackendError::Conflict(
            "This job is no longer accepting applications".to_string(),
        )
        .into());
    }

    // One application per graduate and job, whatever the store enforces.
    if has_applied(backend.inner(), user.profile().id, job.id).await? {
        return Err(
            BackendError::Conflict("You have already applied to this job".to_string()).into(),
        );
    }

    let application = NewApplication {
        job_id: job.id,
        cover_letter: request
            .into_inner()
            .cover_letter
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
    };

    let created = backend
        .insert_application(user.profile().id, &application)
        .await?;
    info!("{} applied to '{}' ({})", user.email(), job.title, job.id);

    Ok(Json(DataResponse::success(
        format!("Application submitted for {}", job.title),
        created,
    )))
}

pub async fn post_job_handler(
    request: Json<PostJobRequest>,
    user: EmployerUser,
    backend: &State<SharedBackend>,
) -> ApiResult<DataResponse<Job>> {
    let new_job = validate_new_job(request.into_inner())?;
    let job = backend.insert_job(user.profile().id, &new_job).await?;
    info!("{} posted '{}' ({})", user.email(), job.title, job.id);

    Ok(Json(DataResponse::success("Job posted", job)))
}

pub async fn update_job_status_handler(
    id: Uuid,
    request: Json<StatusUpdateRequest<JobStatus>>,
    user: EmployerUser,
    backend: &State<SharedBackend>,
) -> ApiResult<DataResponse<Job>> {
    let job = owned_job(backend.inner(), user.profile(), id).await?;
    let status = request.into_inner().status;

    let updated = if job.status == status {
        job
    } else {
        backend.update_job_status(id, status).await?
    };
    info!("{} set job {} to {}", user.email(), id, status);

    Ok(Json(DataResponse::success(
        format!("Job is now {}", status),
        updated,
    )))
}

pub async fn job_applications_handler(
    id: Uuid,
    user: EmployerUser,
    backend: &State<SharedBackend>,
) -> ApiResult<DataResponse<JobApplicationsView>> {
    let job = owned_job(backend.inner(), user.profile(), id).await?;
    let received = backend.list_applications_for_jobs(&[job.id]).await?;

    let matching: Vec<Application> = applications_for_job(&received, job.id)
        .into_iter()
        .cloned()
        .collect();
    let view = JobApplicationsView {
        counts: StatusCounts::from_applications(&matching),
        applications: matching.into_iter().map(ApplicationReview::from).collect(),
        job,
    };

    Ok(Json(DataResponse::success(
        format!("{} applications", view.counts.total),
        view,
    )))
}
