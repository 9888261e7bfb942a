// src/web/mod.rs

pub mod handlers;
pub mod types;

pub use handlers::*;
pub use types::*;

use crate::auth::{
    AuthFailure, AuthenticatedUser, EmployerUser, GraduateUser, OptionalAuth, TokenVerifier,
};
use crate::backend::{self, Credentials, SharedBackend};
use crate::board::{EmployerDashboard, GraduateDashboard, LandingPage};
use crate::config::AppConfig;
use crate::models::{Application, ApplicationStatus, Job, JobStatus, Profile, ProfileUpdate};
use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::figment::Figment;
use rocket::http::{CookieJar, Header, Status};
use rocket::serde::json::Json;
use rocket::{
    catch, catchers, get, options, patch, post, routes, Build, Request, Response, Rocket, State,
};
use tracing::{info, warn};
use uuid::Uuid;

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PATCH, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

// Landing and session

#[get("/landing")]
pub async fn landing(auth: OptionalAuth) -> Json<DataResponse<LandingPage>> {
    handlers::landing_handler(auth).await
}

#[post("/auth/signup", data = "<request>")]
pub async fn sign_up(
    request: Json<SignUpRequest>,
    backend: &State<SharedBackend>,
    cookies: &CookieJar<'_>,
) -> ApiResult<DataResponse<SessionView>> {
    handlers::sign_up_handler(request, backend, cookies).await
}

#[post("/auth/signin", data = "<request>")]
pub async fn sign_in(
    request: Json<Credentials>,
    backend: &State<SharedBackend>,
    cookies: &CookieJar<'_>,
) -> ApiResult<DataResponse<SessionView>> {
    handlers::sign_in_handler(request, backend, cookies).await
}

#[post("/auth/signout")]
pub async fn sign_out(
    auth: OptionalAuth,
    backend: &State<SharedBackend>,
    cookies: &CookieJar<'_>,
) -> Json<ActionResponse> {
    handlers::sign_out_handler(auth, backend, cookies).await
}

#[get("/me")]
pub async fn current_user(auth: AuthenticatedUser) -> Json<DataResponse<CurrentUserView>> {
    handlers::current_user_handler(auth).await
}

// Jobs

#[get("/jobs?<search>&<location>")]
pub async fn list_jobs(
    search: Option<String>,
    location: Option<String>,
    auth: AuthenticatedUser,
    backend: &State<SharedBackend>,
) -> ApiResult<DataResponse<JobListing>> {
    handlers::list_jobs_handler(search, location, auth, backend).await
}

#[get("/jobs/<id>")]
pub async fn job_detail(
    id: Uuid,
    auth: AuthenticatedUser,
    backend: &State<SharedBackend>,
) -> ApiResult<DataResponse<JobDetailView>> {
    handlers::job_detail_handler(id, auth, backend).await
}

#[post("/jobs/<id>/apply", data = "<request>")]
pub async fn apply(
    id: Uuid,
    request: Json<ApplyRequest>,
    user: GraduateUser,
    backend: &State<SharedBackend>,
) -> ApiResult<DataResponse<Application>> {
    handlers::apply_handler(id, request, user, backend).await
}

#[post("/jobs", data = "<request>")]
pub async fn post_job(
    request: Json<PostJobRequest>,
    user: EmployerUser,
    backend: &State<SharedBackend>,
) -> ApiResult<DataResponse<Job>> {
    handlers::post_job_handler(request, user, backend).await
}

#[patch("/jobs/<id>/status", data = "<request>")]
pub async fn update_job_status(
    id: Uuid,
    request: Json<StatusUpdateRequest<JobStatus>>,
    user: EmployerUser,
    backend: &State<SharedBackend>,
) -> ApiResult<DataResponse<Job>> {
    handlers::update_job_status_handler(id, request, user, backend).await
}

#[get("/jobs/<id>/applications")]
pub async fn job_applications(
    id: Uuid,
    user: EmployerUser,
    backend: &State<SharedBackend>,
) -> ApiResult<DataResponse<JobApplicationsView>> {
    handlers::job_applications_handler(id, user, backend).await
}

// Applications

#[patch("/applications/<id>/status", data = "<request>")]
pub async fn update_application_status(
    id: Uuid,
    request: Json<StatusUpdateRequest<ApplicationStatus>>,
    user: EmployerUser,
    backend: &State<SharedBackend>,
) -> ApiResult<DataResponse<crate::board::ApplicationReview>> {
    handlers::update_application_status_handler(id, request, user, backend).await
}

// Dashboards

#[get("/dashboard/graduate")]
pub async fn graduate_dashboard(
    user: GraduateUser,
    backend: &State<SharedBackend>,
) -> ApiResult<DataResponse<GraduateDashboard>> {
    handlers::graduate_dashboard_handler(user, backend).await
}

#[get("/dashboard/employer")]
pub async fn employer_dashboard(
    user: EmployerUser,
    backend: &State<SharedBackend>,
) -> ApiResult<DataResponse<EmployerDashboard>> {
    handlers::employer_dashboard_handler(user, backend).await
}

// Profile

#[get("/profile")]
pub async fn get_profile(auth: AuthenticatedUser) -> Json<DataResponse<Profile>> {
    handlers::get_profile_handler(auth).await
}

#[patch("/profile", data = "<request>")]
pub async fn update_profile(
    request: Json<ProfileUpdate>,
    auth: AuthenticatedUser,
    backend: &State<SharedBackend>,
) -> ApiResult<DataResponse<Profile>> {
    handlers::update_profile_handler(request, auth, backend).await
}

#[get("/health")]
pub async fn health(
    auth: OptionalAuth,
    backend: &State<SharedBackend>,
) -> Json<DataResponse<HealthView>> {
    handlers::health_handler(auth, backend).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers

fn error_body(error: &str, code: &str, suggestions: &[&str]) -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        error.to_string(),
        code.to_string(),
        suggestions.iter().map(|s| s.to_string()).collect(),
    ))
}

#[catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    error_body(
        "Invalid request format",
        "BAD_REQUEST",
        &[
            "Check your request JSON format",
            "Verify all required fields are present",
        ],
    )
}

#[catch(401)]
pub fn unauthorized(req: &Request) -> Json<StandardErrorResponse> {
    match req.local_cache(|| AuthFailure(None)).0 {
        Some(failure) => error_body(failure.message(), failure.code(), &["Sign in to continue"]),
        None => error_body(
            "Authentication required",
            "UNAUTHORIZED",
            &["Sign in to continue"],
        ),
    }
}

#[catch(403)]
pub fn forbidden(req: &Request) -> Json<StandardErrorResponse> {
    match req.local_cache(|| AuthFailure(None)).0 {
        Some(failure) => error_body(failure.message(), failure.code(), &[]),
        None => error_body("Access denied", "FORBIDDEN", &[]),
    }
}

#[catch(404)]
pub fn not_found(req: &Request) -> Json<StandardErrorResponse> {
    error_body(
        &format!("No resource at {}", req.uri().path()),
        "NOT_FOUND",
        &["Check the URL"],
    )
}

#[catch(422)]
pub fn unprocessable(req: &Request) -> Json<StandardErrorResponse> {
    warn!("Unprocessable request body for {}", req.uri());
    error_body(
        "Request body could not be understood",
        "UNPROCESSABLE_ENTITY",
        &[
            "Verify all required fields are present",
            "Check enum values such as user_type and status",
        ],
    )
}

#[catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    error_body(
        "Internal server error",
        "INTERNAL_ERROR",
        &[
            "Try again in a few moments",
            "Contact support if the problem persists",
        ],
    )
}

#[catch(503)]
pub fn service_unavailable(req: &Request) -> Json<StandardErrorResponse> {
    let message = req
        .local_cache(|| AuthFailure(None))
        .0
        .map(|failure| failure.message())
        .unwrap_or("Service unavailable");
    error_body(message, "BACKEND_UNAVAILABLE", &["Try again in a few moments"])
}

/// Assembles the application around an already connected backend.
pub fn build_rocket(
    figment: Figment,
    backend: SharedBackend,
    verifier: TokenVerifier,
) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(Cors)
        .manage(backend)
        .manage(verifier)
        .register(
            "/api",
            catchers![
                bad_request,
                unauthorized,
                forbidden,
                not_found,
                unprocessable,
                internal_error,
                service_unavailable,
            ],
        )
        .mount(
            "/api",
            routes![
                landing,
                sign_up,
                sign_in,
                sign_out,
                current_user,
                list_jobs,
                job_detail,
                apply,
                post_job,
                update_job_status,
                job_applications,
                update_application_status,
                graduate_dashboard,
                employer_dashboard,
                get_profile,
                update_profile,
                health,
                options,
            ],
        )
}

// Main server start function
pub async fn start_web_server(config: AppConfig) -> Result<()> {
    let verifier = config.token_verifier();
    let backend = backend::connect(&config, &verifier).await?;

    if let Err(e) = backend.ping().await {
        warn!("{} backend did not answer at startup: {}", backend.name(), e);
    }

    let mut figment = rocket::Config::figment().merge(("port", config.port));
    if let Some(secret) = &config.cookie_secret {
        figment = figment.merge(("secret_key", secret.clone()));
    }

    info!("Starting Siraaj API server on port {}", config.port);

    build_rocket(figment, backend, verifier)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Server stopped with an error: {}", e))?;

    Ok(())
}
