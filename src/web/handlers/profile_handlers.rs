// src/web/handlers/profile_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use tracing::info;

use crate::auth::AuthenticatedUser;
use crate::backend::SharedBackend;
use crate::models::{Profile, ProfileUpdate, UserType};
use crate::web::types::*;

/// Trims the submitted fields and rejects blanks where a value is mandatory.
pub(crate) fn normalize_update(
    update: ProfileUpdate,
    user_type: UserType,
) -> Result<ProfileUpdate, ApiError> {
    let trim = |value: Option<String>| value.map(|v| v.trim().to_string());

    let full_name = trim(update.full_name);
    if matches!(full_name.as_deref(), Some("")) {
        return Err(ApiError::validation("Full name cannot be empty"));
    }

    let company_name = match user_type {
        UserType::Employer => {
            let company_name = trim(update.company_name);
            if matches!(company_name.as_deref(), Some("")) {
                return Err(ApiError::validation("Company name cannot be empty"));
            }
            company_name
        }
        UserType::Graduate => None,
    };

    let skills = update.skills.map(|skills| {
        skills
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    });

    Ok(ProfileUpdate {
        full_name,
        company_name,
        phone: trim(update.phone),
        location: trim(update.location),
        bio: trim(update.bio),
        skills,
        avatar_url: trim(update.avatar_url),
    })
}

pub async fn get_profile_handler(auth: AuthenticatedUser) -> Json<DataResponse<Profile>> {
    Json(DataResponse::success("Profile loaded", auth.profile))
}

pub async fn update_profile_handler(
    request: Json<ProfileUpdate>,
    auth: AuthenticatedUser,
    backend: &State<SharedBackend>,
) -> ApiResult<DataResponse<Profile>> {
    let update = normalize_update(request.into_inner(), auth.user_type())?;
    let profile = backend.update_profile(auth.profile().id, &update).await?;
    info!("{} updated their profile", auth.email());

    Ok(Json(DataResponse::success("Profile updated", profile)))
}
