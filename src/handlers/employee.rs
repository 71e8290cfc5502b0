use actix_web::{web, HttpRequest, HttpResponse};
use log::{error, info};
use serde::Serialize;

use crate::db::{CompanyRepository, EmployeeRepository};
use crate::errors::{fail_with, AppError, StoreError, UNEXPECTED_MESSAGE};
use crate::handlers::{extracted, path_id, see_other, IndexResponse};
use crate::notifications::{EmployeeAdded, Notifier};
use crate::requests::employee::{validate_employee, EmployeeForm};
use crate::requests::index::EmployeeIndexParams;
use crate::resources::{Collection, CompanyResource, EmployeeResource};
use crate::routes::EMPLOYEES_PATH;
use crate::utils::actor::Actor;
use crate::utils::media::MediaStore;
use crate::utils::permissions::{authorize, Action, Resource};

const DEFAULT_PER_PAGE: u32 = 10;

const CREATE_FAILED: &str = "Failed to add employee. Please try again.";
const UPDATE_FAILED: &str = "Failed to update employee. Please try again.";
const DELETE_FAILED: &str = "Failed to delete employee. Please try again.";

fn not_found() -> AppError {
    AppError::NotFound("Employee not found".to_string())
}

#[derive(Serialize)]
struct EmployeeIndexResponse {
    #[serde(flatten)]
    index: IndexResponse<EmployeeResource, EmployeeIndexParams>,
    /// Company opened for viewing next to the table, with its logo.
    selected_company: Option<CompanyResource>,
}

pub async fn index(
    req: HttpRequest,
    actor: Actor,
    companies: web::Data<dyn CompanyRepository>,
    employees: web::Data<dyn EmployeeRepository>,
    media: web::Data<dyn MediaStore>,
    params: Result<web::Query<EmployeeIndexParams>, actix_web::Error>,
) -> Result<HttpResponse, AppError> {
    authorize(&actor, Action::Read, Resource::Employees)?;

    let filters = extracted(params)?.into_inner().normalized();
    let query = filters.to_query(DEFAULT_PER_PAGE)?;

    let page = employees.list(&query).await.map_err(fail_with(UNEXPECTED_MESSAGE))?;
    let collection = Collection::from_page(page, req.path(), EmployeeResource::with_company);

    let selected_company = match filters.view_company() {
        Some(id) => companies
            .find_with_logo(id)
            .await
            .map_err(fail_with(UNEXPECTED_MESSAGE))?
            .map(|record| CompanyResource::with_logo(record, media.get_ref())),
        None => None,
    };

    Ok(HttpResponse::Ok().json(EmployeeIndexResponse {
        index: IndexResponse { collection, filters },
        selected_company,
    }))
}

pub async fn store(
    actor: Actor,
    companies: web::Data<dyn CompanyRepository>,
    employees: web::Data<dyn EmployeeRepository>,
    notifier: web::Data<dyn Notifier>,
    form: Result<web::Json<EmployeeForm>, actix_web::Error>,
) -> Result<HttpResponse, AppError> {
    authorize(&actor, Action::Create, Resource::Employees)?;

    let form = extracted(form)?.into_inner().normalized();
    let valid = validate_employee(&form, companies.get_ref(), employees.get_ref(), None).await?;

    let employee = employees
        .create(valid.input)
        .await
        .map_err(|err| AppError::application(CREATE_FAILED, err).with_input(&form))?;
    info!("User {} added employee {} to company {}", actor.id, employee.id, valid.company.id);

    let (employee_id, company_id) = (employee.id, valid.company.id);
    if let Err(err) = notifier.notify(EmployeeAdded {
        employee,
        company: valid.company,
    }) {
        error!(
            "Employee {} was saved but the notification for company {} was not queued: {}",
            employee_id, company_id, err
        );
    }

    Ok(see_other(EMPLOYEES_PATH, "Employee created successfully."))
}

pub async fn update(
    actor: Actor,
    companies: web::Data<dyn CompanyRepository>,
    employees: web::Data<dyn EmployeeRepository>,
    path: web::Path<String>,
    form: Result<web::Json<EmployeeForm>, actix_web::Error>,
) -> Result<HttpResponse, AppError> {
    authorize(&actor, Action::Update, Resource::Employees)?;

    let id = path_id(&path, "Employee")?;
    let form = extracted(form)?.into_inner().normalized();
    employees
        .find(id)
        .await
        .map_err(fail_with(UNEXPECTED_MESSAGE))?
        .ok_or_else(not_found)?;

    let valid = validate_employee(&form, companies.get_ref(), employees.get_ref(), Some(id)).await?;

    match employees.update(id, valid.input).await {
        Ok(employee) => {
            info!("User {} updated employee {}", actor.id, employee.id);
            Ok(see_other(EMPLOYEES_PATH, "Employee updated successfully."))
        }
        Err(StoreError::NotFound { .. }) => Err(not_found()),
        Err(err) => Err(AppError::application(UPDATE_FAILED, err).with_input(&form)),
    }
}

pub async fn destroy(
    actor: Actor,
    employees: web::Data<dyn EmployeeRepository>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    authorize(&actor, Action::Delete, Resource::Employees)?;

    let id = path_id(&path, "Employee")?;
    employees
        .find(id)
        .await
        .map_err(fail_with(UNEXPECTED_MESSAGE))?
        .ok_or_else(not_found)?;

    match employees.delete(id).await {
        Ok(()) => {
            info!("User {} deleted employee {}", actor.id, id);
            Ok(see_other(EMPLOYEES_PATH, "Employee deleted successfully."))
        }
        Err(StoreError::NotFound { .. }) => Err(not_found()),
        Err(err) => Err(AppError::application(DELETE_FAILED, err)),
    }
}
