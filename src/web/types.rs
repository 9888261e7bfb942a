// src/web/types.rs
use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::Request;
use tracing::{error, warn};
use uuid::Uuid;

use crate::backend::Session;
use crate::board::{ApplicationReview, HomeView, JobCard, StatusCounts};
use crate::error::BackendError;
use crate::models::{ExperienceLevel, Job, JobType, Profile, UserType};

// ===== Envelopes =====

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum ResponseType {
    Data,
    Action,
    Error,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DataResponse<T> {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub data: T,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActionResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub action: String,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub suggestions: Vec<String>,
}

impl<T> DataResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            response_type: ResponseType::Data,
            success: true,
            message: message.into(),
            data,
        }
    }
}

impl ActionResponse {
    pub fn success(message: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Action,
            success: true,
            message: message.into(),
            action: action.into(),
        }
    }
}

impl StandardErrorResponse {
    pub fn new(error: String, error_code: String, suggestions: Vec<String>) -> Self {
        Self {
            response_type: ResponseType::Error,
            success: false,
            error,
            error_code,
            suggestions,
        }
    }
}

// ===== Errors =====

/// Error body plus the HTTP status it is sent with.
#[derive(Debug)]
pub struct ApiError {
    pub status: Status,
    pub body: StandardErrorResponse,
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

impl ApiError {
    pub fn new(status: Status, error: impl Into<String>, code: &str, suggestions: &[&str]) -> Self {
        Self {
            status,
            body: StandardErrorResponse::new(
                error.into(),
                code.to_string(),
                suggestions.iter().map(|s| s.to_string()).collect(),
            ),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(
            Status::UnprocessableEntity,
            message,
            "VALIDATION_ERROR",
            &["Check the highlighted fields and try again"],
        )
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(Status::Forbidden, message, "FORBIDDEN", &[])
    }

    pub fn not_found(entity: &str) -> Self {
        Self::new(
            Status::NotFound,
            format!("{} not found", entity),
            "NOT_FOUND",
            &["It may have been removed"],
        )
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        let code = err.code();
        match &err {
            BackendError::NotFound { entity } => ApiError::not_found(entity),
            BackendError::Validation(message) => ApiError::validation(message.clone()),
            BackendError::Conflict(message) => {
                ApiError::new(Status::Conflict, message.clone(), code, &[])
            }
            BackendError::Unauthorized(message) => ApiError::new(
                Status::Unauthorized,
                message.clone(),
                code,
                &["Sign in again"],
            ),
            BackendError::Forbidden(message) => ApiError::forbidden(message.clone()),
            BackendError::Remote { .. } => {
                error!("Backend call failed: {}", err);
                ApiError::new(
                    Status::BadGateway,
                    "The data service returned an error",
                    code,
                    &["Try again in a few moments"],
                )
            }
            BackendError::Transport(_) => {
                error!("Backend unreachable: {}", err);
                ApiError::new(
                    Status::ServiceUnavailable,
                    "The data service is unreachable",
                    code,
                    &["Try again in a few moments"],
                )
            }
            BackendError::Internal(_) => {
                error!("Internal error: {}", err);
                ApiError::new(
                    Status::InternalServerError,
                    "Internal server error",
                    code,
                    &["Try again in a few moments", "Contact support if the problem persists"],
                )
            }
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        if self.status.code < 500 {
            warn!("{} {} -> {}: {}", req.method(), req.uri(), self.status, self.body.error);
        }
        (self.status, Json(self.body)).respond_to(req)
    }
}

// ===== Requests =====

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub user_type: UserType,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct PostJobRequest {
    pub title: String,
    pub description: String,
    /// Free text, one requirement per line.
    #[serde(default)]
    pub requirements: String,
    pub location: String,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub job_type: Option<JobType>,
    #[serde(default)]
    pub experience_level: Option<ExperienceLevel>,
}

#[derive(Default, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ApplyRequest {
    #[serde(default)]
    pub cover_letter: Option<String>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct StatusUpdateRequest<T> {
    pub status: T,
}

// ===== Views =====

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct SessionView {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user_id: Uuid,
    pub profile: Profile,
    pub home_view: HomeView,
}

impl From<Session> for SessionView {
    fn from(session: Session) -> Self {
        let home_view = HomeView::for_profile(Some(&session.profile));
        Self {
            access_token: session.access_token,
            token_type: session.token_type,
            expires_in: session.expires_in,
            user_id: session.user_id,
            profile: session.profile,
            home_view,
        }
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct CurrentUserView {
    pub profile: Profile,
    pub home_view: HomeView,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct JobListing {
    pub total: usize,
    pub search: String,
    pub location: String,
    pub jobs: Vec<JobCard>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct JobDetailView {
    pub job: Job,
    pub card: JobCard,
    pub can_apply: bool,
    pub already_applied: bool,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct JobApplicationsView {
    pub job: Job,
    pub counts: StatusCounts,
    pub applications: Vec<ApplicationReview>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct HealthView {
    pub status: &'static str,
    pub backend: &'static str,
    pub version: &'static str,
}
