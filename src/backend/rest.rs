// src/backend/rest.rs
//! Client for the hosted backend: a PostgREST table API under `/rest/v1` and
//! a GoTrue credential API under `/auth/v1`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, trace};
use uuid::Uuid;

use super::query::{
    TableQuery, APPLICATION_WITH_GRADUATE, APPLICATION_WITH_JOB, JOB_WITH_EMPLOYER,
};
use super::{Backend, Credentials, Session};
use crate::error::{BackendError, BackendResult};
use crate::models::{
    Application, ApplicationStatus, Job, JobStatus, NewApplication, NewJob, NewProfile, Profile,
    ProfileUpdate,
};

const SIGNUP_ENDPOINT: &str = "/auth/v1/signup";
const TOKEN_ENDPOINT: &str = "/auth/v1/token?grant_type=password";
const LOGOUT_ENDPOINT: &str = "/auth/v1/logout";
const HEALTH_ENDPOINT: &str = "/auth/v1/health";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
}

#[derive(Debug, Deserialize)]
struct AuthSession {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: i64,
    user: AuthUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl AuthSession {
    fn into_session(self, profile: Profile) -> Session {
        Session {
            access_token: self.access_token,
            token_type: self.token_type,
            expires_in: self.expires_in,
            user_id: self.user.id,
            profile,
        }
    }
}

/// Sign-up answers with a session, or with the bare user when the project
/// requires email confirmation first.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpReply {
    Session(AuthSession),
    User(AuthUser),
}

#[derive(Serialize)]
struct ProfileInsert<'a> {
    id: Uuid,
    #[serde(flatten)]
    profile: &'a NewProfile,
}

#[derive(Serialize)]
struct JobInsert<'a> {
    employer_id: Uuid,
    #[serde(flatten)]
    job: &'a NewJob,
    status: JobStatus,
}

#[derive(Serialize)]
struct ApplicationInsert<'a> {
    graduate_id: Uuid,
    #[serde(flatten)]
    application: &'a NewApplication,
    status: ApplicationStatus,
}

#[derive(Serialize)]
struct Touched<T: Serialize> {
    #[serde(flatten)]
    changes: T,
    updated_at: DateTime<Utc>,
}

impl<T: Serialize> Touched<T> {
    fn now(changes: T) -> Self {
        Self {
            changes,
            updated_at: Utc::now(),
        }
    }
}

pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_key: String,
}

impl RestBackend {
    /// `anon_key` is used for the credential endpoints, `service_key` for
    /// table access; ownership rules are checked by this service.
    pub fn new(
        base_url: String,
        anon_key: String,
        service_key: String,
        timeout_seconds: Option<u64>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(
                timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            service_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header("apikey", &self.anon_key)
    }

    fn table_request(&self, method: Method, query: &TableQuery) -> RequestBuilder {
        self.client
            .request(method, self.url(&query.path()))
            .query(query.params())
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn select<T: DeserializeOwned>(&self, query: TableQuery) -> BackendResult<Vec<T>> {
        trace!("GET {} {:?}", query.path(), query.params());
        let response = self.table_request(Method::GET, &query).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn select_one<T: DeserializeOwned>(&self, query: TableQuery) -> BackendResult<Option<T>> {
        Ok(self.select(query.limit(1)).await?.into_iter().next())
    }

    async fn insert<B, T>(&self, query: TableQuery, body: &B) -> BackendResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        trace!("POST {}", query.path());
        let response = self
            .table_request(Method::POST, &query)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;

        let rows: Vec<T> = check(response).await?.json().await?;
        rows.into_iter().next().ok_or_else(|| {
            BackendError::Internal(format!("Insert into {} returned no row", query.table()))
        })
    }

    /// PATCHes the rows matched by `query`; `None` when nothing matched.
    async fn update<B, T>(&self, query: TableQuery, body: &B) -> BackendResult<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        trace!("PATCH {} {:?}", query.path(), query.params());
        let response = self
            .table_request(Method::PATCH, &query)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;

        let rows: Vec<T> = check(response).await?.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn password_grant(&self, credentials: &Credentials) -> BackendResult<AuthSession> {
        let response = self
            .auth_request(Method::POST, TOKEN_ENDPOINT)
            .json(&json!({
                "email": credentials.email,
                "password": credentials.password,
            }))
            .send()
            .await?;

        let response = check(response).await.map_err(|e| match e {
            BackendError::Validation(message) => BackendError::Unauthorized(message),
            other => other,
        })?;
        Ok(response.json().await?)
    }
}

fn stale_status(expected: ApplicationStatus) -> BackendError {
    BackendError::Conflict(format!(
        "Application is no longer {}; reload and try again",
        expected
    ))
}

/// Passes 2xx responses through and turns the rest into a [`BackendError`].
async fn check(response: Response) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    error!("Backend error response {}: {}", status, body);
    Err(error_for_status(status, &body))
}

pub(crate) fn error_for_status(status: StatusCode, body: &str) -> BackendError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            BackendError::Validation(message)
        }
        StatusCode::UNAUTHORIZED => BackendError::Unauthorized(message),
        StatusCode::FORBIDDEN => BackendError::Forbidden(message),
        StatusCode::NOT_FOUND => BackendError::not_found("Resource"),
        StatusCode::CONFLICT => BackendError::Conflict(message),
        other => BackendError::Remote {
            status: other.as_u16(),
            message,
        },
    }
}

#[rocket::async_trait]
impl Backend for RestBackend {
    fn name(&self) -> &'static str {
        "hosted"
    }

    async fn ping(&self) -> BackendResult<()> {
        let response = self.auth_request(Method::GET, HEALTH_ENDPOINT).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn sign_up(
        &self,
        credentials: &Credentials,
        profile: &NewProfile,
    ) -> BackendResult<Session> {
        let response = self
            .auth_request(Method::POST, SIGNUP_ENDPOINT)
            .json(&json!({
                "email": credentials.email,
                "password": credentials.password,
                "data": {
                    "full_name": profile.full_name,
                    "user_type": profile.user_type,
                },
            }))
            .send()
            .await?;

        let reply: SignUpReply = check(response)
            .await
            .map_err(|e| match e {
                BackendError::Validation(message) if message.contains("already registered") => {
                    BackendError::Conflict(message)
                }
                other => other,
            })?
            .json()
            .await?;

        let user_id = match &reply {
            SignUpReply::Session(session) => session.user.id,
            SignUpReply::User(user) => user.id,
        };

        let stored: Profile = self
            .insert(
                TableQuery::from("profiles"),
                &ProfileInsert {
                    id: user_id,
                    profile,
                },
            )
            .await?;

        info!("Registered {} as {}", stored.email, stored.user_type);

        let session = match reply {
            SignUpReply::Session(session) => session,
            SignUpReply::User(_) => self.password_grant(credentials).await?,
        };
        Ok(session.into_session(stored))
    }

    async fn sign_in(&self, credentials: &Credentials) -> BackendResult<Session> {
        let session = self.password_grant(credentials).await?;
        let profile = self
            .get_profile(session.user.id)
            .await?
            .ok_or_else(|| BackendError::Forbidden("No profile exists for this account".into()))?;
        Ok(session.into_session(profile))
    }

    async fn sign_out(&self, access_token: &str) -> BackendResult<()> {
        let response = self
            .auth_request(Method::POST, LOGOUT_ENDPOINT)
            .bearer_auth(access_token)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn get_profile(&self, id: Uuid) -> BackendResult<Option<Profile>> {
        self.select_one(TableQuery::from("profiles").select("*").eq("id", id))
            .await
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> BackendResult<Profile> {
        if update.is_empty() {
            return self
                .get_profile(id)
                .await?
                .ok_or_else(|| BackendError::not_found("Profile"));
        }
        self.update(TableQuery::from("profiles").eq("id", id), &Touched::now(update))
            .await?
            .ok_or_else(|| BackendError::not_found("Profile"))
    }

    async fn list_open_jobs(&self) -> BackendResult<Vec<Job>> {
        self.select(
            TableQuery::from("jobs")
                .select(JOB_WITH_EMPLOYER)
                .eq("status", JobStatus::Open)
                .order("created_at", false),
        )
        .await
    }

    async fn list_jobs_by_employer(&self, employer_id: Uuid) -> BackendResult<Vec<Job>> {
        self.select(
            TableQuery::from("jobs")
                .select("*")
                .eq("employer_id", employer_id)
                .order("created_at", false),
        )
        .await
    }

    async fn get_job(&self, id: Uuid) -> BackendResult<Option<Job>> {
        self.select_one(
            TableQuery::from("jobs")
                .select(JOB_WITH_EMPLOYER)
                .eq("id", id),
        )
        .await
    }

    async fn insert_job(&self, employer_id: Uuid, job: &NewJob) -> BackendResult<Job> {
        self.insert(
            TableQuery::from("jobs"),
            &JobInsert {
                employer_id,
                job,
                status: JobStatus::Open,
            },
        )
        .await
    }

    async fn update_job_status(&self, id: Uuid, status: JobStatus) -> BackendResult<Job> {
        self.update(
            TableQuery::from("jobs").eq("id", id),
            &Touched::now(json!({ "status": status })),
        )
        .await?
        .ok_or_else(|| BackendError::not_found("Job"))
    }

    async fn insert_application(
        &self,
        graduate_id: Uuid,
        application: &NewApplication,
    ) -> BackendResult<Application> {
        self.insert(
            TableQuery::from("applications"),
            &ApplicationInsert {
                graduate_id,
                application,
                status: ApplicationStatus::Pending,
            },
        )
        .await
    }

    async fn list_applications_for_graduate(
        &self,
        graduate_id: Uuid,
    ) -> BackendResult<Vec<Application>> {
        self.select(
            TableQuery::from("applications")
                .select(APPLICATION_WITH_JOB)
                .eq("graduate_id", graduate_id)
                .order("created_at", false),
        )
        .await
    }

    async fn list_applications_for_jobs(
        &self,
        job_ids: &[Uuid],
    ) -> BackendResult<Vec<Application>> {
        if job_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.select(
            TableQuery::from("applications")
                .select(APPLICATION_WITH_GRADUATE)
                .in_list("job_id", job_ids)
                .order("created_at", false),
        )
        .await
    }

    async fn get_application(&self, id: Uuid) -> BackendResult<Option<Application>> {
        self.select_one(
            TableQuery::from("applications")
                .select("*,job:jobs(*)")
                .eq("id", id),
        )
        .await
    }

    async fn update_application_status(
        &self,
        id: Uuid,
        current: ApplicationStatus,
        next: ApplicationStatus,
    ) -> BackendResult<Application> {
        self.update(
            TableQuery::from("applications")
                .eq("id", id)
                .eq("status", current),
            &Touched::now(json!({ "status": next })),
        )
        .await?
        .ok_or_else(|| stale_status(current))
    }
}
