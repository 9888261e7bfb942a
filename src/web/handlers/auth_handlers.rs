// src/web/handlers/auth_handlers.rs
use rocket::http::{Cookie, CookieJar, SameSite};
use rocket::serde::json::Json;
use rocket::State;
use tracing::{info, warn};

use crate::auth::password::validate_password_strength;
use crate::auth::{AuthenticatedUser, OptionalAuth, SESSION_COOKIE};
use crate::backend::{Credentials, Session, SharedBackend};
use crate::board::HomeView;
use crate::models::{NewProfile, UserType};
use crate::web::types::*;

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Checks the sign-up form and splits it into credentials and profile data.
pub(crate) fn validate_sign_up(
    request: SignUpRequest,
) -> Result<(Credentials, NewProfile), ApiError> {
    let email = request.email.trim().to_string();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::validation("A valid email address is required"));
    }

    let full_name = request.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(ApiError::validation("Full name is required"));
    }

    validate_password_strength(&request.password)?;

    let company_name = match request.user_type {
        UserType::Employer => Some(
            non_empty(request.company_name)
                .ok_or_else(|| ApiError::validation("Company name is required for employers"))?,
        ),
        UserType::Graduate => None,
    };

    Ok((
        Credentials {
            email: email.clone(),
            password: request.password,
        },
        NewProfile {
            email,
            full_name,
            user_type: request.user_type,
            company_name,
            location: non_empty(request.location),
        },
    ))
}

fn set_session_cookie(cookies: &CookieJar<'_>, session: &Session) {
    let cookie = Cookie::build((SESSION_COOKIE, session.access_token.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(rocket::time::Duration::seconds(session.expires_in));
    cookies.add_private(cookie);
}

pub async fn sign_up_handler(
    request: Json<SignUpRequest>,
    backend: &State<SharedBackend>,
    cookies: &CookieJar<'_>,
) -> ApiResult<DataResponse<SessionView>> {
    let (credentials, profile) = validate_sign_up(request.into_inner())?;
    info!("Sign-up for {} as {}", profile.email, profile.user_type);

    let session = backend.sign_up(&credentials, &profile).await?;
    set_session_cookie(cookies, &session);

    Ok(Json(DataResponse::success(
        format!("Welcome to Siraaj, {}", session.profile.full_name),
        SessionView::from(session),
    )))
}

pub async fn sign_in_handler(
    request: Json<Credentials>,
    backend: &State<SharedBackend>,
    cookies: &CookieJar<'_>,
) -> ApiResult<DataResponse<SessionView>> {
    let credentials = Credentials {
        email: request.email.trim().to_string(),
        password: request.password.clone(),
    };
    if credentials.email.is_empty() || credentials.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let session = backend.sign_in(&credentials).await?;
    info!("Signed in {} ({})", session.profile.email, session.profile.user_type);
    set_session_cookie(cookies, &session);

    Ok(Json(DataResponse::success(
        "Signed in",
        SessionView::from(session),
    )))
}

pub async fn sign_out_handler(
    auth: OptionalAuth,
    backend: &State<SharedBackend>,
    cookies: &CookieJar<'_>,
) -> Json<ActionResponse> {
    if let Some(user) = auth.user {
        // The local session ends regardless of what the backend says.
        if let Err(e) = backend.sign_out(&user.access_token).await {
            warn!("Backend sign-out failed for {}: {}", user.email(), e);
        }
        info!("Signed out {}", user.email());
    }
    cookies.remove_private(SESSION_COOKIE);

    Json(ActionResponse::success("Signed out", "signed_out"))
}

pub async fn current_user_handler(auth: AuthenticatedUser) -> Json<DataResponse<CurrentUserView>> {
    let home_view = HomeView::for_profile(Some(auth.profile()));
    Json(DataResponse::success(
        format!("Signed in as {}", auth.email()),
        CurrentUserView {
            profile: auth.profile,
            home_view,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::http::Status;

    fn request(user_type: UserType, company: Option<&str>) -> SignUpRequest {
        SignUpRequest {
            email: "  rana@cedar.example ".to_string(),
            password: "secret1".to_string(),
            full_name: " Rana Aziz ".to_string(),
            user_type,
            company_name: company.map(str::to_string),
            location: Some("  ".to_string()),
        }
    }

    #[test]
    fn test_employer_needs_company_name() {
        let err = validate_sign_up(request(UserType::Employer, Some("   "))).unwrap_err();
        assert_eq!(err.status, Status::UnprocessableEntity);
        assert!(err.body.error.contains("Company name"));

        let (credentials, profile) =
            validate_sign_up(request(UserType::Employer, Some("Cedar Analytics"))).unwrap();
        assert_eq!(credentials.email, "rana@cedar.example");
        assert_eq!(profile.full_name, "Rana Aziz");
        assert_eq!(profile.company_name.as_deref(), Some("Cedar Analytics"));
        assert_eq!(profile.location, None);
    }

    #[test]
    fn test_graduate_company_name_is_ignored() {
        let (_, profile) =
            validate_sign_up(request(UserType::Graduate, Some("Should vanish"))).unwrap();
        assert_eq!(profile.company_name, None);
    }

    #[test]
    fn test_required_fields() {
        let mut missing_name = request(UserType::Graduate, None);
        missing_name.full_name = " ".to_string();
        assert!(validate_sign_up(missing_name).is_err());

        let mut bad_email = request(UserType::Graduate, None);
        bad_email.email = "not-an-email".to_string();
        assert!(validate_sign_up(bad_email).is_err());

        let mut short_password = request(UserType::Graduate, None);
        short_password.password = "12345".to_string();
        let err = validate_sign_up(short_password).unwrap_err();
        assert_eq!(err.body.error_code, "VALIDATION_ERROR");
    }
}
