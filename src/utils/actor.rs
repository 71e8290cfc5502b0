use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use std::collections::HashSet;
use std::future::{ready, Ready};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::utils::jwt;

/// The authenticated user issuing the request, with the permissions granted to them.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: String,
    pub permissions: HashSet<String>,
}

impl Actor {
    pub fn can(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

fn authenticate(req: &HttpRequest) -> Result<Actor, AppError> {
    let config = req.app_data::<web::Data<AppConfig>>().ok_or_else(|| {
        log::error!("AppConfig is not registered as app data");
        AppError::Application {
            message: "Server misconfigured".to_string(),
            old: None,
        }
    })?;

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|auth| auth.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing token".to_string()))?;

    let claims = jwt::validate_token(token.trim(), &config.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

    Ok(Actor {
        id: claims.sub,
        permissions: claims.permissions.into_iter().collect(),
    })
}

impl FromRequest for Actor {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
