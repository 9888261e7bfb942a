// src/models/job.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Profile;

wire_enum! {
    #[derive(Default)]
    pub enum JobType {
        #[default]
        FullTime => "full-time",
        PartTime => "part-time",
        Contract => "contract",
        Internship => "internship",
    }
}

wire_enum! {
    /// Listings are aimed at fresh graduates, so only the two lowest levels exist.
    #[derive(Default)]
    pub enum ExperienceLevel {
        #[default]
        EntryLevel => "entry-level",
        Junior => "junior",
    }
}

wire_enum! {
    #[derive(Default)]
    pub enum JobStatus {
        #[default]
        Open => "open",
        Closed => "closed",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,
    pub job_type: JobType,
    #[serde(default)]
    pub experience_level: ExperienceLevel,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Posting employer, present when the read asked for the join.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employer: Option<Profile>,
}

impl Job {
    pub fn is_open(&self) -> bool {
        self.status == JobStatus::Open
    }

    pub fn is_owned_by(&self, profile: &Profile) -> bool {
        self.employer_id == profile.id
    }
}

/// Fields an employer fills in when posting a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub location: String,
    pub salary_range: Option<String>,
    #[serde(default)]
    pub job_type: JobType,
    #[serde(default)]
    pub experience_level: ExperienceLevel,
}
