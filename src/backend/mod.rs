// src/backend/mod.rs
//! The remote data service every screen reads from and writes to.
//!
//! [`RestBackend`] talks to the hosted table/credential API over HTTP;
//! [`LocalBackend`] keeps the same tables in SQLite for development and tests.

pub mod local;
pub mod query;
pub mod rest;

pub use local::LocalBackend;
pub use rest::RestBackend;

use crate::auth::TokenVerifier;
use crate::config::{AppConfig, BackendConfig};
use crate::error::BackendResult;
use crate::models::{
    Application, ApplicationStatus, Job, JobStatus, NewApplication, NewJob, NewProfile, Profile,
    ProfileUpdate,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub type SharedBackend = Arc<dyn Backend>;

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// A signed-in user: the access token plus the profile it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user_id: Uuid,
    pub profile: Profile,
}

#[rocket::async_trait]
pub trait Backend: Send + Sync {
    /// Short name for logs and the health probe.
    fn name(&self) -> &'static str;

    async fn ping(&self) -> BackendResult<()>;

    // Credentials

    /// Registers the credential and writes the profile row.
    async fn sign_up(&self, credentials: &Credentials, profile: &NewProfile)
        -> BackendResult<Session>;

    async fn sign_in(&self, credentials: &Credentials) -> BackendResult<Session>;

    async fn sign_out(&self, access_token: &str) -> BackendResult<()>;

    // Profiles

    async fn get_profile(&self, id: Uuid) -> BackendResult<Option<Profile>>;

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> BackendResult<Profile>;

    // Jobs

    /// Open jobs, newest first, with the employer embedded.
    async fn list_open_jobs(&self) -> BackendResult<Vec<Job>>;

    /// Every job of one employer, newest first.
    async fn list_jobs_by_employer(&self, employer_id: Uuid) -> BackendResult<Vec<Job>>;

    async fn get_job(&self, id: Uuid) -> BackendResult<Option<Job>>;

    async fn insert_job(&self, employer_id: Uuid, job: &NewJob) -> BackendResult<Job>;

    async fn update_job_status(&self, id: Uuid, status: JobStatus) -> BackendResult<Job>;

    // Applications

    async fn insert_application(
        &self,
        graduate_id: Uuid,
        application: &NewApplication,
    ) -> BackendResult<Application>;

    /// A graduate's applications, newest first, each with its job and the
    /// job's employer.
    async fn list_applications_for_graduate(
        &self,
        graduate_id: Uuid,
    ) -> BackendResult<Vec<Application>>;

    /// Applications to any of `job_ids`, newest first, with job and graduate.
    async fn list_applications_for_jobs(&self, job_ids: &[Uuid])
        -> BackendResult<Vec<Application>>;

    async fn get_application(&self, id: Uuid) -> BackendResult<Option<Application>>;

    /// Moves an application from `current` to `next`. Fails with a conflict
    /// when the stored status is no longer `current`.
    async fn update_application_status(
        &self,
        id: Uuid,
        current: ApplicationStatus,
        next: ApplicationStatus,
    ) -> BackendResult<Application>;
}

/// Builds the backend selected by the configuration.
pub async fn connect(config: &AppConfig, verifier: &TokenVerifier) -> Result<SharedBackend> {
    let backend: SharedBackend = match &config.backend {
        BackendConfig::Local { database_path } => {
            Arc::new(LocalBackend::open(database_path, verifier.clone()).await?)
        }
        BackendConfig::Rest {
            url,
            anon_key,
            service_key,
            timeout_seconds,
        } => Arc::new(RestBackend::new(
            url.clone(),
            anon_key.clone(),
            service_key.clone(),
            *timeout_seconds,
        )?),
    };

    info!("Using {} backend", backend.name());
    Ok(backend)
}
