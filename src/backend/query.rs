// src/backend/query.rs
//! Query-string grammar of the hosted table API (`column=eq.value`,
//! `order=column.desc`, `select=*,alias:table(*)`).

use std::fmt::Display;

/// Job row with its posting employer.
pub const JOB_WITH_EMPLOYER: &str = "*,employer:profiles!jobs_employer_id_fkey(*)";

/// Application row with its job and the job's employer, for graduates.
pub const APPLICATION_WITH_JOB: &str =
    "*,job:jobs(*,employer:profiles!jobs_employer_id_fkey(*))";

/// Application row with its job and the applicant, for employers.
pub const APPLICATION_WITH_GRADUATE: &str =
    "*,job:jobs(*),graduate:profiles!applications_graduate_id_fkey(*)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    table: &'static str,
    params: Vec<(String, String)>,
}

impl TableQuery {
    pub fn from(table: &'static str) -> Self {
        Self {
            table,
            params: Vec::new(),
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.params.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    pub fn in_list<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Display,
    {
        let joined = values
            .into_iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.params.push((column.to_string(), format!("in.({})", joined)));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.params.push(("order".to_string(), format!("{}.{}", column, direction)));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.params.push(("limit".to_string(), limit.to_string()));
        self
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn path(&self) -> String {
        format!("/rest/v1/{}", self.table)
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}
