// src/backend/local.rs
//! SQLite rendition of the hosted tables, used for development and tests.
//! Credentials live in a `users` table and tokens are signed locally with the
//! same secret and claims the hosted service uses.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

use super::{Backend, Credentials, Session};
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::auth::TokenVerifier;
use crate::error::{BackendError, BackendResult};
use crate::models::{
    Application, ApplicationStatus, Job, JobStatus, NewApplication, NewJob, NewProfile, Profile,
    ProfileUpdate,
};

const SELECT_PROFILE: &str = "SELECT id, email, full_name, user_type, company_name, phone, \
     location, bio, skills, avatar_url, created_at, updated_at FROM profiles";

const SELECT_JOB: &str = "SELECT id, employer_id, title, description, requirements, location, \
     salary_range, job_type, experience_level, status, created_at, updated_at FROM jobs";

const SELECT_APPLICATION: &str = "SELECT id, job_id, graduate_id, cover_letter, status, \
     created_at, updated_at FROM applications";

const NEWEST_FIRST: &str = "ORDER BY created_at DESC, rowid DESC";

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BLOB PRIMARY KEY,
        email TEXT NOT NULL UNIQUE COLLATE NOCASE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS profiles (
        id BLOB PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
        email TEXT NOT NULL,
        full_name TEXT NOT NULL,
        user_type TEXT NOT NULL CHECK (user_type IN ('graduate', 'employer')),
        company_name TEXT,
        phone TEXT,
        location TEXT,
        bio TEXT,
        skills TEXT,
        avatar_url TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS jobs (
        id BLOB PRIMARY KEY,
        employer_id BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        requirements TEXT NOT NULL DEFAULT '[]',
        location TEXT NOT NULL,
        salary_range TEXT,
        job_type TEXT NOT NULL
            CHECK (job_type IN ('full-time', 'part-time', 'contract', 'internship')),
        experience_level TEXT NOT NULL DEFAULT 'entry-level'
            CHECK (experience_level IN ('entry-level', 'junior')),
        status TEXT NOT NULL DEFAULT 'open' CHECK (status IN ('open', 'closed')),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS applications (
        id BLOB PRIMARY KEY,
        job_id BLOB NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
        graduate_id BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
        cover_letter TEXT,
        status TEXT NOT NULL DEFAULT 'pending'
            CHECK (status IN ('pending', 'reviewed', 'accepted', 'rejected')),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (job_id, graduate_id)
    );
    "#,
    "CREATE INDEX IF NOT EXISTS idx_jobs_status_created ON jobs(status, created_at);",
    "CREATE INDEX IF NOT EXISTS idx_jobs_employer ON jobs(employer_id);",
    "CREATE INDEX IF NOT EXISTS idx_applications_graduate ON applications(graduate_id);",
    "CREATE INDEX IF NOT EXISTS idx_applications_job ON applications(job_id);",
];

// ===== Row mapping =====

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    email: String,
    full_name: String,
    user_type: String,
    company_name: Option<String>,
    phone: Option<String>,
    location: Option<String>,
    bio: Option<String>,
    skills: Option<String>,
    avatar_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = BackendError;

    fn try_from(row: ProfileRow) -> BackendResult<Self> {
        Ok(Profile {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            user_type: row.user_type.parse()?,
            company_name: row.company_name,
            phone: row.phone,
            location: row.location,
            bio: row.bio,
            skills: row
                .skills
                .map(|s| serde_json::from_str(&s))
                .transpose()?,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    employer_id: Uuid,
    title: String,
    description: String,
    requirements: String,
    location: String,
    salary_range: Option<String>,
    job_type: String,
    experience_level: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = BackendError;

    fn try_from(row: JobRow) -> BackendResult<Self> {
        Ok(Job {
            id: row.id,
            employer_id: row.employer_id,
            title: row.title,
            description: row.description,
            requirements: serde_json::from_str(&row.requirements)?,
            location: row.location,
            salary_range: row.salary_range,
            job_type: row.job_type.parse()?,
            experience_level: row.experience_level.parse()?,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            employer: None,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ApplicationRow {
    id: Uuid,
    job_id: Uuid,
    graduate_id: Uuid,
    cover_letter: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = BackendError;

    fn try_from(row: ApplicationRow) -> BackendResult<Self> {
        Ok(Application {
            id: row.id,
            job_id: row.job_id,
            graduate_id: row.graduate_id,
            cover_letter: row.cover_letter,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            job: None,
            graduate: None,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> BackendResult<Vec<T>>
where
    T: TryFrom<R, Error = BackendError>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn unique_ids(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort();
    ids.dedup();
    ids
}

async fn blocking<T, F>(task: F) -> BackendResult<T>
where
    F: FnOnce() -> BackendResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| BackendError::Internal(format!("Background task failed: {}", e)))?
}

// ===== Backend =====

pub struct LocalBackend {
    pool: SqlitePool,
    tokens: TokenVerifier,
}

impl LocalBackend {
    /// Opens (creating if needed) the database file and applies migrations.
    pub async fn open(database_path: &Path, tokens: TokenVerifier) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| {
                format!("Failed to connect to database: {}", database_path.display())
            })?;

        info!(
            "Database connection established: {}",
            database_path.display()
        );

        let backend = Self { pool, tokens };
        backend.migrate().await?;
        Ok(backend)
    }

    /// Private in-memory database; a single connection keeps it alive.
    pub async fn in_memory(tokens: TokenVerifier) -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory database")?;

        let backend = Self { pool, tokens };
        backend.migrate().await?;
        Ok(backend)
    }

    pub async fn migrate(&self) -> Result<()> {
        for statement in MIGRATIONS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to apply migration")?;
        }
        debug!("Database migrations completed");
        Ok(())
    }

    async fn fetch_job(&self, id: Uuid) -> BackendResult<Option<Job>> {
        sqlx::query_as::<_, JobRow>(&format!("{} WHERE id = ?", SELECT_JOB))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Job::try_from)
            .transpose()
    }

    async fn fetch_application(&self, id: Uuid) -> BackendResult<Option<Application>> {
        sqlx::query_as::<_, ApplicationRow>(&format!("{} WHERE id = ?", SELECT_APPLICATION))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Application::try_from)
            .transpose()
    }

    async fn profiles_by_id(&self, ids: &[Uuid]) -> BackendResult<HashMap<Uuid, Profile>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(format!("{} WHERE id IN (", SELECT_PROFILE));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows: Vec<ProfileRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        convert_all::<_, Profile>(rows)
            .map(|profiles| profiles.into_iter().map(|p| (p.id, p)).collect())
    }

    async fn jobs_by_id(
        &self,
        ids: &[Uuid],
        with_employer: bool,
    ) -> BackendResult<HashMap<Uuid, Job>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(format!("{} WHERE id IN (", SELECT_JOB));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows: Vec<JobRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        let mut jobs = convert_all::<_, Job>(rows)?;
        if with_employer {
            jobs = self.attach_employers(jobs).await?;
        }
        Ok(jobs.into_iter().map(|job| (job.id, job)).collect())
    }

    async fn attach_employers(&self, mut jobs: Vec<Job>) -> BackendResult<Vec<Job>> {
        let ids = unique_ids(jobs.iter().map(|job| job.employer_id));
        let employers = self.profiles_by_id(&ids).await?;
        for job in &mut jobs {
            job.employer = employers.get(&job.employer_id).cloned();
        }
        Ok(jobs)
    }

    async fn attach_jobs(
        &self,
        mut applications: Vec<Application>,
        with_employer: bool,
    ) -> BackendResult<Vec<Application>> {
        let ids = unique_ids(applications.iter().map(|a| a.job_id));
        let jobs = self.jobs_by_id(&ids, with_employer).await?;
        for application in &mut applications {
            application.job = jobs.get(&application.job_id).cloned();
        }
        Ok(applications)
    }

    async fn attach_graduates(
        &self,
        mut applications: Vec<Application>,
    ) -> BackendResult<Vec<Application>> {
        let ids = unique_ids(applications.iter().map(|a| a.graduate_id));
        let graduates = self.profiles_by_id(&ids).await?;
        for application in &mut applications {
            application.graduate = graduates.get(&application.graduate_id).cloned();
        }
        Ok(applications)
    }

    fn session_for(&self, profile: Profile) -> BackendResult<Session> {
        let access_token = self.tokens.issue(profile.id, &profile.email)?;
        Ok(Session {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: self.tokens.ttl_seconds(),
            user_id: profile.id,
            profile,
        })
    }
}

#[rocket::async_trait]
impl Backend for LocalBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn ping(&self) -> BackendResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn sign_up(
        &self,
        credentials: &Credentials,
        profile: &NewProfile,
    ) -> BackendResult<Session> {
        validate_password_strength(&credentials.password)?;

        let password = credentials.password.clone();
        let password_hash = blocking(move || hash_password(&password)).await?;

        let id = Uuid::new_v4();
        let now = Utc::now();
        let email = credentials.email.trim().to_string();

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO users (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(&email)
            .bind(&password_hash)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| match BackendError::from(e) {
                BackendError::Conflict(_) => {
                    BackendError::Conflict("User already registered".to_string())
                }
                other => other,
            })?;

        sqlx::query(
            r#"
            INSERT INTO profiles (id, email, full_name, user_type, company_name, location,
                                  created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(&email)
        .bind(&profile.full_name)
        .bind(profile.user_type.as_str())
        .bind(&profile.company_name)
        .bind(&profile.location)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let stored = self
            .get_profile(id)
            .await?
            .ok_or_else(|| BackendError::not_found("Profile"))?;

        info!("Registered {} as {}", stored.email, stored.user_type);
        self.session_for(stored)
    }

    async fn sign_in(&self, credentials: &Credentials) -> BackendResult<Session> {
        let invalid = || BackendError::Unauthorized("Invalid login credentials".to_string());

        let row: Option<(Uuid, String)> =
            sqlx::query_as("SELECT id, password_hash FROM users WHERE email = ?")
                .bind(credentials.email.trim())
                .fetch_optional(&self.pool)
                .await?;
        let (id, password_hash) = row.ok_or_else(invalid)?;

        let password = credentials.password.clone();
        if !blocking(move || verify_password(&password, &password_hash)).await? {
            return Err(invalid());
        }

        let profile = self
            .get_profile(id)
            .await?
            .ok_or_else(|| BackendError::Forbidden("No profile exists for this account".into()))?;
        self.session_for(profile)
    }

    async fn sign_out(&self, access_token: &str) -> BackendResult<()> {
        // Tokens are stateless here; there is nothing to revoke.
        let claims = self.tokens.verify(access_token)?;
        debug!("Signed out {}", claims.sub);
        Ok(())
    }

    async fn get_profile(&self, id: Uuid) -> BackendResult<Option<Profile>> {
        sqlx::query_as::<_, ProfileRow>(&format!("{} WHERE id = ?", SELECT_PROFILE))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Profile::try_from)
            .transpose()
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> BackendResult<Profile> {
        let mut profile = self
            .get_profile(id)
            .await?
            .ok_or_else(|| BackendError::not_found("Profile"))?;
        if update.is_empty() {
            return Ok(profile);
        }

        update.apply_to(&mut profile);
        profile.updated_at = Utc::now();
        let skills = profile
            .skills
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"
            UPDATE profiles
            SET full_name = ?, company_name = ?, phone = ?, location = ?, bio = ?,
                skills = ?, avatar_url = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&profile.full_name)
        .bind(&profile.company_name)
        .bind(&profile.phone)
        .bind(&profile.location)
        .bind(&profile.bio)
        .bind(skills)
        .bind(&profile.avatar_url)
        .bind(profile.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn list_open_jobs(&self) -> BackendResult<Vec<Job>> {
        let rows: Vec<JobRow> =
            sqlx::query_as(&format!("{} WHERE status = ? {}", SELECT_JOB, NEWEST_FIRST))
                .bind(JobStatus::Open.as_str())
                .fetch_all(&self.pool)
                .await?;
        self.attach_employers(convert_all(rows)?).await
    }

    async fn list_jobs_by_employer(&self, employer_id: Uuid) -> BackendResult<Vec<Job>> {
        let rows: Vec<JobRow> =
            sqlx::query_as(&format!("{} WHERE employer_id = ? {}", SELECT_JOB, NEWEST_FIRST))
                .bind(employer_id)
                .fetch_all(&self.pool)
                .await?;
        convert_all(rows)
    }

    async fn get_job(&self, id: Uuid) -> BackendResult<Option<Job>> {
        match self.fetch_job(id).await? {
            Some(job) => Ok(self.attach_employers(vec![job]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn insert_job(&self, employer_id: Uuid, job: &NewJob) -> BackendResult<Job> {
        let now = Utc::now();
        let created = Job {
            id: Uuid::new_v4(),
            employer_id,
            title: job.title.clone(),
            description: job.description.clone(),
            requirements: job.requirements.clone(),
            location: job.location.clone(),
            salary_range: job.salary_range.clone(),
            job_type: job.job_type,
            experience_level: job.experience_level,
            status: JobStatus::Open,
            created_at: now,
            updated_at: now,
            employer: None,
        };

        sqlx::query(
            r#"
            INSERT INTO jobs (id, employer_id, title, description, requirements, location,
                              salary_range, job_type, experience_level, status,
                              created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(created.id)
        .bind(created.employer_id)
        .bind(&created.title)
        .bind(&created.description)
        .bind(serde_json::to_string(&created.requirements)?)
        .bind(&created.location)
        .bind(&created.salary_range)
        .bind(created.job_type.as_str())
        .bind(created.experience_level.as_str())
        .bind(created.status.as_str())
        .bind(created.created_at)
        .bind(created.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update_job_status(&self, id: Uuid, status: JobStatus) -> BackendResult<Job> {
        let result = sqlx::query("UPDATE jobs SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(BackendError::not_found("Job"));
        }
        self.fetch_job(id)
            .await?
            .ok_or_else(|| BackendError::not_found("Job"))
    }

    async fn insert_application(
        &self,
        graduate_id: Uuid,
        application: &NewApplication,
    ) -> BackendResult<Application> {
        let now = Utc::now();
        let created = Application {
            id: Uuid::new_v4(),
            job_id: application.job_id,
            graduate_id,
            cover_letter: application.cover_letter.clone(),
            status: ApplicationStatus::Pending,
            created_at: now,
            updated_at: now,
            job: None,
            graduate: None,
        };

        sqlx::query(
            r#"
            INSERT INTO applications (id, job_id, graduate_id, cover_letter, status,
                                      created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(created.id)
        .bind(created.job_id)
        .bind(created.graduate_id)
        .bind(&created.cover_letter)
        .bind(created.status.as_str())
        .bind(created.created_at)
        .bind(created.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match BackendError::from(e) {
            BackendError::Conflict(_) => {
                BackendError::Conflict("You have already applied to this job".to_string())
            }
            other => other,
        })?;

        Ok(created)
    }

    async fn list_applications_for_graduate(
        &self,
        graduate_id: Uuid,
    ) -> BackendResult<Vec<Application>> {
        let rows: Vec<ApplicationRow> = sqlx::query_as(&format!(
            "{} WHERE graduate_id = ? {}",
            SELECT_APPLICATION, NEWEST_FIRST
        ))
        .bind(graduate_id)
        .fetch_all(&self.pool)
        .await?;
        self.attach_jobs(convert_all(rows)?, true).await
    }

    async fn list_applications_for_jobs(
        &self,
        job_ids: &[Uuid],
    ) -> BackendResult<Vec<Application>> {
        if job_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("{} WHERE job_id IN (", SELECT_APPLICATION));
        let mut separated = builder.separated(", ");
        for id in job_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ");
        builder.push(NEWEST_FIRST);

        let rows: Vec<ApplicationRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        let applications = self.attach_jobs(convert_all(rows)?, false).await?;
        self.attach_graduates(applications).await
    }

    async fn get_application(&self, id: Uuid) -> BackendResult<Option<Application>> {
        match self.fetch_application(id).await? {
            Some(application) => Ok(self.attach_jobs(vec![application], false).await?.pop()),
            None => Ok(None),
        }
    }

    async fn update_application_status(
        &self,
        id: Uuid,
        current: ApplicationStatus,
        next: ApplicationStatus,
    ) -> BackendResult<Application> {
        let result = sqlx::query(
            "UPDATE applications SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(next.as_str())
        .bind(Utc::now())
        .bind(id)
        .bind(current.as_str())
        .execute(&self.pool)
        .await?;

        let stored = self
            .fetch_application(id)
            .await?
            .ok_or_else(|| BackendError::not_found("Application"))?;
        if result.rows_affected() == 0 {
            return Err(BackendError::Conflict(format!(
                "Application is no longer {}; reload and try again",
                current
            )));
        }
        Ok(stored)
    }
}
