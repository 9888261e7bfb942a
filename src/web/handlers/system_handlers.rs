// src/web/handlers/system_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use tracing::{info, warn};

use crate::auth::OptionalAuth;
use crate::backend::SharedBackend;
use crate::web::types::*;

pub async fn health_handler(
    auth: OptionalAuth,
    backend: &State<SharedBackend>,
) -> Json<DataResponse<HealthView>> {
    if let Some(user) = auth.user {
        info!("Health check by authenticated user: {}", user.email());
    } else {
        info!("Health check by anonymous user");
    }

    let status = match backend.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            warn!("{} backend is not answering: {}", backend.name(), e);
            "degraded"
        }
    };

    Json(DataResponse::success(
        format!("Service is {}", status),
        HealthView {
            status,
            backend: backend.name(),
            version: env!("CARGO_PKG_VERSION"),
        },
    ))
}
