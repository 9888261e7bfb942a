// src/board/landing.rs
use serde::Serialize;

use super::HomeView;
use crate::models::UserType;

#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Step {
    pub step: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallToAction {
    pub label: &'static str,
    pub user_type: UserType,
}

/// Content of the public landing page, plus where a signed-in visitor
/// should be sent instead.
#[derive(Debug, Clone, Serialize)]
pub struct LandingPage {
    pub product: &'static str,
    pub headline: &'static str,
    pub features: Vec<Feature>,
    pub steps: Vec<Step>,
    pub calls_to_action: Vec<CallToAction>,
    pub home_view: HomeView,
}

impl LandingPage {
    pub fn new(home_view: HomeView) -> Self {
        Self {
            product: "Siraaj",
            headline: "Launch Your Career. Find Your Dream Job",
            features: vec![
                Feature {
                    title: "Smart Job Matching",
                    description: "Graduates are matched with relevant opportunities based on skills and preferences.",
                },
                Feature {
                    title: "Local Focus",
                    description: "Find opportunities in your area and connect with local businesses looking for fresh talent.",
                },
                Feature {
                    title: "Entry-Level Friendly",
                    description: "All listings are curated for fresh graduates and entry-level positions.",
                },
            ],
            steps: vec![
                Step {
                    step: "01",
                    title: "Create Your Profile",
                    description: "Sign up and build your professional profile in minutes",
                },
                Step {
                    step: "02",
                    title: "Browse or Post Jobs",
                    description: "Graduates browse opportunities, employers post openings",
                },
                Step {
                    step: "03",
                    title: "Connect & Hire",
                    description: "Apply to jobs or review applications and start working together",
                },
            ],
            calls_to_action: vec![
                CallToAction {
                    label: "Sign Up as Graduate",
                    user_type: UserType::Graduate,
                },
                CallToAction {
                    label: "Sign Up as Employer",
                    user_type: UserType::Employer,
                },
            ],
            home_view,
        }
    }
}
