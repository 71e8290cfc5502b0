use actix_web::{web, HttpRequest, HttpResponse};

use crate::db::{CompanyRepository, CompanySort};
use crate::errors::{fail_with, AppError, UNEXPECTED_MESSAGE};
use crate::handlers::extracted;
use crate::requests::index::IndexParams;
use crate::resources::{Collection, CompanyResource};
use crate::utils::actor::Actor;

const DEFAULT_PER_PAGE: u32 = 20;

/// Company lookup for select controls. Any signed-in user may call it.
pub async fn company_options(
    req: HttpRequest,
    actor: Actor,
    companies: web::Data<dyn CompanyRepository>,
    params: Result<web::Query<IndexParams>, actix_web::Error>,
) -> Result<HttpResponse, AppError> {
    let params = extracted(params)?.into_inner().normalized();
    let query = params.to_query::<CompanySort>(DEFAULT_PER_PAGE)?;
    log::debug!("User {} looking up company options", actor.id);

    let page = companies
        .options(query.search.as_deref(), query.page, query.per_page)
        .await
        .map_err(fail_with(UNEXPECTED_MESSAGE))?;

    Ok(HttpResponse::Ok().json(Collection::from_page(page, req.path(), CompanyResource::new)))
}
