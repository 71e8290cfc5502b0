use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use log::{info, warn};

use crate::db::{CompanyRepository, CompanySort, EmployeeRepository};
use crate::errors::{fail_with, AppError, MediaError, StoreError, UNEXPECTED_MESSAGE};
use crate::handlers::{extracted, path_id, see_other, IndexResponse};
use crate::models::media::{NewMedia, LOGO_COLLECTION};
use crate::requests::company::{read_company_form, validate_company};
use crate::requests::index::IndexParams;
use crate::resources::{Collection, CompanyResource};
use crate::routes::COMPANIES_PATH;
use crate::utils::actor::Actor;
use crate::utils::media::{directory, discard, object_key, ImageUpload, MediaStore};
use crate::utils::permissions::{authorize, Action, Resource};

const DEFAULT_PER_PAGE: u32 = 10;

const CREATE_FAILED: &str = "Failed to create company. Please try again.";
const UPDATE_FAILED: &str = "Failed to update company. Please try again.";
const DELETE_FAILED: &str = "Failed to delete company. Please try again.";

fn not_found() -> AppError {
    AppError::NotFound("Company not found".to_string())
}

/// Stores the validated logo and returns the record to attach in the write transaction.
async fn upload_logo(store: &dyn MediaStore, upload: Option<ImageUpload>) -> Result<Option<NewMedia>, MediaError> {
    let Some(upload) = upload else {
        return Ok(None);
    };
    let record = upload.to_new_media(LOGO_COLLECTION);
    store
        .put(&object_key(record.id, &record.file_name), upload.bytes, upload.mime_type)
        .await?;
    Ok(Some(record))
}

/// Removes a logo uploaded for a write that did not commit.
async fn abandon_upload(store: &dyn MediaStore, record: Option<NewMedia>) {
    if let Some(record) = record {
        if let Err(err) = store.delete_prefix(&directory(record.id)).await {
            warn!("Failed to remove uncommitted upload {}: {}", record.id, err);
        }
    }
}

pub async fn index(
    req: HttpRequest,
    actor: Actor,
    companies: web::Data<dyn CompanyRepository>,
    media: web::Data<dyn MediaStore>,
    params: Result<web::Query<IndexParams>, actix_web::Error>,
) -> Result<HttpResponse, AppError> {
    authorize(&actor, Action::Read, Resource::Companies)?;

    let filters = extracted(params)?.into_inner().normalized();
    let query = filters.to_query::<CompanySort>(DEFAULT_PER_PAGE)?;

    let page = companies.list(&query).await.map_err(fail_with(UNEXPECTED_MESSAGE))?;
    let collection = Collection::from_page(page, req.path(), |record| {
        CompanyResource::with_logo(record, media.get_ref())
    });

    Ok(HttpResponse::Ok().json(IndexResponse { collection, filters }))
}

pub async fn store(
    actor: Actor,
    companies: web::Data<dyn CompanyRepository>,
    media: web::Data<dyn MediaStore>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    authorize(&actor, Action::Create, Resource::Companies)?;

    let (form, logo) = read_company_form(payload).await?;
    let valid = validate_company(&form, logo, companies.get_ref(), None).await?;

    let logo = upload_logo(media.get_ref(), valid.logo)
        .await
        .map_err(|err| AppError::application(CREATE_FAILED, err).with_input(&form))?;

    match companies.create(valid.input, logo.clone()).await {
        Ok(company) => {
            info!("User {} created company {}", actor.id, company.id);
            Ok(see_other(COMPANIES_PATH, "Company created successfully."))
        }
        Err(err) => {
            abandon_upload(media.get_ref(), logo).await;
            Err(AppError::application(CREATE_FAILED, err).with_input(&form))
        }
    }
}

pub async fn update(
    actor: Actor,
    companies: web::Data<dyn CompanyRepository>,
    media: web::Data<dyn MediaStore>,
    path: web::Path<String>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    authorize(&actor, Action::Update, Resource::Companies)?;

    let id = path_id(&path, "Company")?;
    companies
        .find(id)
        .await
        .map_err(fail_with(UNEXPECTED_MESSAGE))?
        .ok_or_else(not_found)?;

    let (form, logo) = read_company_form(payload).await?;
    let valid = validate_company(&form, logo, companies.get_ref(), Some(id)).await?;

    let logo = upload_logo(media.get_ref(), valid.logo)
        .await
        .map_err(|err| AppError::application(UPDATE_FAILED, err).with_input(&form))?;

    match companies.update(id, valid.input, logo.clone()).await {
        Ok(replaced) => {
            discard(media.get_ref(), &replaced).await;
            info!("User {} updated company {}", actor.id, id);
            Ok(see_other(COMPANIES_PATH, "Company updated successfully."))
        }
        Err(StoreError::NotFound { .. }) => {
            abandon_upload(media.get_ref(), logo).await;
            Err(not_found())
        }
        Err(err) => {
            abandon_upload(media.get_ref(), logo).await;
            Err(AppError::application(UPDATE_FAILED, err).with_input(&form))
        }
    }
}

pub async fn destroy(
    actor: Actor,
    companies: web::Data<dyn CompanyRepository>,
    employees: web::Data<dyn EmployeeRepository>,
    media: web::Data<dyn MediaStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    authorize(&actor, Action::Delete, Resource::Companies)?;

    let id = path_id(&path, "Company")?;
    companies
        .find(id)
        .await
        .map_err(fail_with(UNEXPECTED_MESSAGE))?
        .ok_or_else(not_found)?;

    if employees
        .exists_for_company(id)
        .await
        .map_err(fail_with(DELETE_FAILED))?
    {
        return Err(AppError::Conflict("Company still has employees.".to_string()));
    }

    match companies.delete(id).await {
        Ok(detached) => {
            discard(media.get_ref(), &detached).await;
            info!("User {} deleted company {}", actor.id, id);
            Ok(see_other(COMPANIES_PATH, "Company deleted successfully."))
        }
        Err(StoreError::NotFound { .. }) => Err(not_found()),
        Err(err) => Err(AppError::application(DELETE_FAILED, err)),
    }
}
