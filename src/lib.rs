// src/lib.rs
//! Siraaj: a job board where fresh graduates find entry-level work and local
//! employers post openings and review applications.

pub mod auth;
pub mod backend;
pub mod board;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod web;

pub use config::AppConfig;
pub use error::{BackendError, BackendResult};
pub use web::{build_rocket, start_web_server};
