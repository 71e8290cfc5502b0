use actix_web::{error, web, HttpRequest};

use crate::errors::AppError;
use crate::handlers;

pub const COMPANIES_PATH: &str = "/companies";
pub const EMPLOYEES_PATH: &str = "/employees";

fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> error::Error {
    AppError::BadRequest(format!("Malformed request body: {}", err)).into()
}

fn query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> error::Error {
    AppError::BadRequest(format!("Malformed query string: {}", err)).into()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .service(
            web::resource(COMPANIES_PATH)
                .route(web::get().to(handlers::company::index))
                .route(web::post().to(handlers::company::store)),
        )
        .service(
            web::resource("/companies/{id}")
                .route(web::patch().to(handlers::company::update))
                .route(web::put().to(handlers::company::update))
                .route(web::delete().to(handlers::company::destroy)),
        )
        .service(
            web::resource(EMPLOYEES_PATH)
                .route(web::get().to(handlers::employee::index))
                .route(web::post().to(handlers::employee::store)),
        )
        .service(
            web::resource("/employees/{id}")
                .route(web::patch().to(handlers::employee::update))
                .route(web::put().to(handlers::employee::update))
                .route(web::delete().to(handlers::employee::destroy)),
        )
        .service(
            web::resource("/internal/companies/options")
                .route(web::get().to(handlers::internal::company_options)),
        );
}
