// src/models/mod.rs
//! Record shapes stored by the data backend: profiles, jobs and applications.

/// Declares an enum whose variants travel as fixed strings on the wire and in
/// the database (`"full-time"`, `"pending"`, ...).
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::BackendError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(crate::error::BackendError::Validation(format!(
                        "Unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

pub mod application;
pub mod job;
pub mod profile;

#[cfg(test)]
pub(crate) mod fixtures;

pub use application::{Application, ApplicationStatus, NewApplication};
pub use job::{ExperienceLevel, Job, JobStatus, JobType, NewJob};
pub use profile::{NewProfile, Profile, ProfileUpdate, UserType};
