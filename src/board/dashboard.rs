// src/board/dashboard.rs
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Application, ApplicationStatus, Job, JobStatus, Profile, UserType};

/// Number of requirement chips shown on a listing card.
const CARD_REQUIREMENTS: usize = 3;

/// Screen a signed-in user starts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeView {
    Landing,
    Jobs,
    EmployerDashboard,
}

impl HomeView {
    pub fn for_profile(profile: Option<&Profile>) -> Self {
        match profile.map(|p| p.user_type) {
            None => HomeView::Landing,
            Some(UserType::Graduate) => HomeView::Jobs,
            Some(UserType::Employer) => HomeView::EmployerDashboard,
        }
    }
}

pub fn applications_for_job(applications: &[Application], job_id: Uuid) -> Vec<&Application> {
    applications.iter().filter(|a| a.job_id == job_id).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub reviewed: usize,
    pub accepted: usize,
    pub rejected: usize,
}

impl StatusCounts {
    pub fn from_applications<'a, I>(applications: I) -> Self
    where
        I: IntoIterator<Item = &'a Application>,
    {
        let mut counts = StatusCounts::default();
        for application in applications {
            counts.total += 1;
            match application.status {
                ApplicationStatus::Pending => counts.pending += 1,
                ApplicationStatus::Reviewed => counts.reviewed += 1,
                ApplicationStatus::Accepted => counts.accepted += 1,
                ApplicationStatus::Rejected => counts.rejected += 1,
            }
        }
        counts
    }
}

/// One row of the listing: the parts of a job the card shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobCard {
    pub id: Uuid,
    pub title: String,
    pub company_name: Option<String>,
    pub location: String,
    pub job_type: String,
    pub salary_range: Option<String>,
    pub description: String,
    pub requirements: Vec<String>,
    pub more_requirements: usize,
    pub posted_on: String,
}

impl From<&Job> for JobCard {
    fn from(job: &Job) -> Self {
        let shown = job.requirements.len().min(CARD_REQUIREMENTS);
        Self {
            id: job.id,
            title: job.title.clone(),
            company_name: job.employer.as_ref().map(|e| e.display_company().to_string()),
            location: job.location.clone(),
            job_type: job.job_type.to_string(),
            salary_range: job.salary_range.clone(),
            description: job.description.clone(),
            requirements: job.requirements[..shown].to_vec(),
            more_requirements: job.requirements.len() - shown,
            posted_on: job.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GraduateDashboard {
    pub counts: StatusCounts,
    pub applications: Vec<Application>,
}

impl GraduateDashboard {
    pub fn build(mut applications: Vec<Application>) -> Self {
        applications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self {
            counts: StatusCounts::from_applications(&applications),
            applications,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub job: Job,
    pub application_count: usize,
    pub pending_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployerDashboard {
    pub total_jobs: usize,
    pub open_jobs: usize,
    pub total_applications: usize,
    pub pending_applications: usize,
    pub jobs: Vec<JobSummary>,
}

impl EmployerDashboard {
    pub fn build(jobs: Vec<Job>, applications: &[Application]) -> Self {
        let counts = StatusCounts::from_applications(applications);
        let open_jobs = jobs.iter().filter(|j| j.status == JobStatus::Open).count();

        let jobs: Vec<JobSummary> = jobs
            .into_iter()
            .map(|job| {
                let for_job = applications_for_job(applications, job.id);
                let job_counts = StatusCounts::from_applications(for_job.iter().copied());
                JobSummary {
                    job,
                    application_count: job_counts.total,
                    pending_count: job_counts.pending,
                }
            })
            .collect();

        Self {
            total_jobs: jobs.len(),
            open_jobs,
            total_applications: counts.total,
            pending_applications: counts.pending,
            jobs,
        }
    }
}

/// Application as the employer reviews it, with the status buttons that are
/// still enabled.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationReview {
    pub application: Application,
    pub allowed_actions: Vec<ApplicationStatus>,
}

impl From<Application> for ApplicationReview {
    fn from(application: Application) -> Self {
        let allowed_actions = application.status.allowed_next().to_vec();
        Self {
            application,
            allowed_actions,
        }
    }
}
