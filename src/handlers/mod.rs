pub mod company;
pub mod employee;
pub mod internal;

use actix_web::{http::header, HttpResponse};
use serde::Serialize;

use crate::errors::AppError;
use crate::resources::{Collection, Flash};
use crate::utils::validation::parse_id;

#[derive(Serialize)]
struct FlashResponse {
    flash: Flash,
}

/// Answers a successful mutation: back to the list route with a success message.
pub fn see_other(location: &str, message: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .json(FlashResponse {
            flash: Flash::success(message),
        })
}

/// A list page together with the filters it was produced from.
#[derive(Serialize)]
pub struct IndexResponse<T, F> {
    #[serde(flatten)]
    pub collection: Collection<T>,
    pub filters: F,
}

/// Unwraps a body or query extractor. Handlers take these as `Result` and call this after
/// the permission gate, so a malformed request never hides a missing permission.
pub fn extracted<T>(result: Result<T, actix_web::Error>) -> Result<T, AppError> {
    result.map_err(|err| match err.as_error::<AppError>() {
        Some(AppError::BadRequest(message)) => AppError::BadRequest(message.clone()),
        _ => AppError::BadRequest(format!("Malformed request: {}", err)),
    })
}

/// Resolves a path id, answering 404 for anything that is not a positive integer.
pub fn path_id(raw: &str, entity: &str) -> Result<i64, AppError> {
    parse_id(raw).ok_or_else(|| AppError::NotFound(format!("{} not found", entity)))
}
