use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::{CompanyRepository, EmployeeRepository};
use crate::errors::{fail_with, AppError, UNEXPECTED_MESSAGE};
use crate::models::company::Company;
use crate::models::employee::EmployeeInput;
use crate::utils::validation::{clean, loose_string, parse_id, validate_id, validate_payload, FieldErrors};

#[derive(Debug, Default, Clone, Deserialize, Serialize, Validate)]
pub struct EmployeeForm {
    #[serde(default, deserialize_with = "loose_string")]
    #[validate(required(message = "Please select a company."), custom = "validate_id")]
    pub company_id: Option<String>,
    #[serde(default)]
    #[validate(
        required(message = "The first name is required."),
        length(max = 255, message = "The first name may not be greater than 255 characters.")
    )]
    pub first_name: Option<String>,
    #[serde(default)]
    #[validate(
        required(message = "The last name is required."),
        length(max = 255, message = "The last name may not be greater than 255 characters.")
    )]
    pub last_name: Option<String>,
    #[serde(default)]
    #[validate(
        email(message = "Please enter a valid email address."),
        length(max = 255, message = "The email may not be greater than 255 characters.")
    )]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255, message = "The phone may not be greater than 255 characters."))]
    pub phone: Option<String>,
}

impl EmployeeForm {
    pub fn normalized(self) -> Self {
        EmployeeForm {
            company_id: clean(self.company_id),
            first_name: clean(self.first_name),
            last_name: clean(self.last_name),
            email: clean(self.email),
            phone: clean(self.phone),
        }
    }
}

/// An employee form that passed every rule, with the company it will belong to.
#[derive(Debug)]
pub struct ValidEmployee {
    pub input: EmployeeInput,
    pub company: Company,
}

/// Rules shared by create and update. `ignore` is the employee being updated, which may
/// keep its own email.
pub async fn validate_employee(
    form: &EmployeeForm,
    companies: &dyn CompanyRepository,
    employees: &dyn EmployeeRepository,
    ignore: Option<i64>,
) -> Result<ValidEmployee, AppError> {
    let mut errors = validate_payload(form);

    let mut company = None;
    if let Some(id) = form.company_id.as_deref().and_then(parse_id) {
        company = companies.find(id).await.map_err(fail_with(UNEXPECTED_MESSAGE))?;
        if company.is_none() {
            errors.add("company_id", "The selected company does not exist.");
        }
    }

    if let (Some(email), false) = (&form.email, errors.has("email")) {
        if employees
            .email_taken(email, ignore)
            .await
            .map_err(fail_with(UNEXPECTED_MESSAGE))?
        {
            errors.add("email", "An employee with this email already exists.");
        }
    }

    match company {
        Some(company) if errors.is_empty() => Ok(ValidEmployee {
            input: EmployeeInput {
                company_id: company.id,
                first_name: form.first_name.clone().unwrap_or_default(),
                last_name: form.last_name.clone().unwrap_or_default(),
                email: form.email.clone(),
                phone: form.phone.clone(),
            },
            company,
        }),
        _ => Err(AppError::validation(errors, form)),
    }
}
