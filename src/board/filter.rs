// src/board/filter.rs
use serde::{Deserialize, Serialize};

use crate::models::Job;

/// Search box and location box of the job listing.
///
/// Terms are stored trimmed and lowercased; an empty term matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFilter {
    search: String,
    location: String,
}

impl JobFilter {
    pub fn new(search: &str, location: &str) -> Self {
        Self {
            search: search.trim().to_lowercase(),
            location: location.trim().to_lowercase(),
        }
    }

    pub fn from_query(search: Option<&str>, location: Option<&str>) -> Self {
        Self::new(search.unwrap_or_default(), location.unwrap_or_default())
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.location.is_empty()
    }

    pub fn matches(&self, job: &Job) -> bool {
        let matches_search = job.title.to_lowercase().contains(&self.search)
            || job.description.to_lowercase().contains(&self.search);
        let matches_location =
            self.location.is_empty() || job.location.to_lowercase().contains(&self.location);

        matches_search && matches_location
    }

    /// Keeps matching jobs in their original order.
    pub fn apply(&self, jobs: Vec<Job>) -> Vec<Job> {
        if self.is_empty() {
            return jobs;
        }
        jobs.into_iter().filter(|job| self.matches(job)).collect()
    }
}
