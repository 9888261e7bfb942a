// src/auth/mod.rs
pub mod password;
pub mod token;

pub use token::{Claims, TokenVerifier};

use crate::backend::SharedBackend;
use crate::models::{Profile, UserType};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::{Request, State};
use std::ops::Deref;
use tracing::{debug, error, warn};

/// Private cookie holding the access token of a browser session.
pub const SESSION_COOKIE: &str = "session";

/// Signed-in user, with the profile loaded from the backend.
pub struct AuthenticatedUser {
    pub profile: Profile,
    pub access_token: String,
}

impl AuthenticatedUser {
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn email(&self) -> &str {
        &self.profile.email
    }

    pub fn user_type(&self) -> UserType {
        self.profile.user_type
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    TokenVerificationFailed,
    ProfileMissing,
    WrongRole,
    BackendUnavailable,
}

impl AuthError {
    pub fn message(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "Authorization token required",
            AuthError::InvalidToken => "Invalid authorization token format",
            AuthError::TokenVerificationFailed => "Token verification failed",
            AuthError::ProfileMissing => "No profile exists for this account",
            AuthError::WrongRole => "This action is not available for your account type",
            AuthError::BackendUnavailable => "Account service unavailable",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::TokenVerificationFailed => "TOKEN_VERIFICATION_FAILED",
            AuthError::ProfileMissing => "PROFILE_MISSING",
            AuthError::WrongRole => "WRONG_ROLE",
            AuthError::BackendUnavailable => "BACKEND_UNAVAILABLE",
        }
    }
}

/// First authentication failure of a request, read back by the catchers.
pub struct AuthFailure(pub Option<AuthError>);

fn fail<T>(req: &Request<'_>, status: Status, error: AuthError) -> Outcome<T, AuthError> {
    req.local_cache(|| AuthFailure(Some(error)));
    Outcome::Error((status, error))
}

/// Bearer header first, then the session cookie.
fn request_token(req: &Request<'_>) -> Result<Option<String>, AuthError> {
    if let Some(header) = req.headers().get_one("Authorization") {
        return match header.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
            _ => Err(AuthError::InvalidToken),
        };
    }

    Ok(req
        .cookies()
        .get_private(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string()))
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let verifier = match req.guard::<&State<TokenVerifier>>().await {
            Outcome::Success(verifier) => verifier,
            Outcome::Error((status, _)) => {
                return fail(req, status, AuthError::BackendUnavailable)
            }
            Outcome::Forward(f) => return Outcome::Forward(f),
        };

        let backend = match req.guard::<&State<SharedBackend>>().await {
            Outcome::Success(backend) => backend,
            Outcome::Error((status, _)) => {
                return fail(req, status, AuthError::BackendUnavailable)
            }
            Outcome::Forward(f) => return Outcome::Forward(f),
        };

        let token = match request_token(req) {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("Request without credentials: {}", req.uri());
                return fail(req, Status::Unauthorized, AuthError::MissingToken);
            }
            Err(e) => {
                warn!("Invalid Authorization header format");
                return fail(req, Status::Unauthorized, e);
            }
        };

        let claims = match verifier.verify(&token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!("Token verification failed: {}", e);
                return fail(req, Status::Unauthorized, AuthError::TokenVerificationFailed);
            }
        };

        let profile = match backend.get_profile(claims.sub).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                warn!("Valid token for {} but no profile row", claims.sub);
                return fail(req, Status::Forbidden, AuthError::ProfileMissing);
            }
            Err(e) => {
                error!("Failed to load profile {}: {}", claims.sub, e);
                return fail(
                    req,
                    Status::ServiceUnavailable,
                    AuthError::BackendUnavailable,
                );
            }
        };

        debug!("Authenticated {} ({})", profile.email, profile.user_type);

        Outcome::Success(AuthenticatedUser {
            profile,
            access_token: token,
        })
    }
}

async fn with_role<'r>(
    req: &'r Request<'_>,
    role: UserType,
) -> Outcome<AuthenticatedUser, AuthError> {
    match AuthenticatedUser::from_request(req).await {
        Outcome::Success(user) if user.user_type() == role => Outcome::Success(user),
        Outcome::Success(user) => {
            warn!(
                "{} ({}) attempted a {}-only action",
                user.email(),
                user.user_type(),
                role
            );
            fail(req, Status::Forbidden, AuthError::WrongRole)
        }
        other => other,
    }
}

/// Signed-in user whose profile is a graduate.
pub struct GraduateUser(pub AuthenticatedUser);

impl Deref for GraduateUser {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for GraduateUser {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        with_role(req, UserType::Graduate).await.map(GraduateUser)
    }
}

/// Signed-in user whose profile is an employer.
pub struct EmployerUser(pub AuthenticatedUser);

impl Deref for EmployerUser {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for EmployerUser {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        with_role(req, UserType::Employer).await.map(EmployerUser)
    }
}

// Optional auth guard that doesn't fail if no auth is provided
pub struct OptionalAuth {
    pub user: Option<AuthenticatedUser>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for OptionalAuth {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match AuthenticatedUser::from_request(req).await {
            Outcome::Success(auth) => Outcome::Success(OptionalAuth { user: Some(auth) }),
            _ => Outcome::Success(OptionalAuth { user: None }),
        }
    }
}
