// src/models/fixtures.rs
//! Record builders shared by unit tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use super::*;

pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes)
}

pub fn graduate(name: &str) -> Profile {
    Profile {
        id: Uuid::new_v4(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        full_name: name.to_string(),
        user_type: UserType::Graduate,
        company_name: None,
        phone: None,
        location: Some("Beirut".to_string()),
        bio: None,
        skills: None,
        avatar_url: None,
        created_at: at(0),
        updated_at: at(0),
    }
}

pub fn employer(name: &str, company: Option<&str>) -> Profile {
    Profile {
        user_type: UserType::Employer,
        company_name: company.map(str::to_string),
        ..graduate(name)
    }
}

pub fn job(employer: &Profile, title: &str, description: &str, location: &str) -> Job {
    Job {
        id: Uuid::new_v4(),
        employer_id: employer.id,
        title: title.to_string(),
        description: description.to_string(),
        requirements: Vec::new(),
        location: location.to_string(),
        salary_range: None,
        job_type: JobType::FullTime,
        experience_level: ExperienceLevel::EntryLevel,
        status: JobStatus::Open,
        created_at: at(0),
        updated_at: at(0),
        employer: Some(employer.clone()),
    }
}

pub fn application(job: &Job, graduate: &Profile, status: ApplicationStatus) -> Application {
    Application {
        id: Uuid::new_v4(),
        job_id: job.id,
        graduate_id: graduate.id,
        cover_letter: None,
        status,
        created_at: at(0),
        updated_at: at(0),
        job: Some(job.clone()),
        graduate: Some(graduate.clone()),
    }
}
