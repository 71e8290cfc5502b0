use actix_multipart::{Multipart, MultipartError};
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::CompanyRepository;
use crate::errors::{fail_with, AppError, UNEXPECTED_MESSAGE};
use crate::models::company::CompanyInput;
use crate::utils::media::{inspect_image, ImageUpload, MAX_LOGO_BYTES};
use crate::utils::validation::{clean, validate_payload, FieldErrors};

/// Submitted company fields. The logo travels next to it as a separate file part.
#[derive(Debug, Default, Clone, Deserialize, Serialize, Validate)]
pub struct CompanyForm {
    #[validate(
        required(message = "The company name is required."),
        length(max = 255, message = "The name may not be greater than 255 characters.")
    )]
    pub name: Option<String>,
    #[validate(
        email(message = "Please enter a valid email address."),
        length(max = 255, message = "The email may not be greater than 255 characters.")
    )]
    pub email: Option<String>,
    #[validate(
        url(message = "Please enter a valid URL for the website."),
        length(max = 255, message = "The website may not be greater than 255 characters.")
    )]
    pub website: Option<String>,
}

impl CompanyForm {
    pub fn normalized(self) -> Self {
        CompanyForm {
            name: clean(self.name),
            email: clean(self.email),
            website: clean(self.website),
        }
    }
}

/// A company form that passed every rule.
#[derive(Debug)]
pub struct ValidCompany {
    pub input: CompanyInput,
    pub logo: Option<ImageUpload>,
}

fn malformed(err: MultipartError) -> AppError {
    AppError::BadRequest(format!("Malformed form data: {}", err))
}

/// Reads a multipart company submission. Logo bytes beyond the size limit are not buffered.
pub async fn read_company_form(mut payload: Multipart) -> Result<(CompanyForm, Option<Vec<u8>>), AppError> {
    let mut form = CompanyForm::default();
    let mut logo = None;

    while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
        let name = field
            .content_disposition()
            .get_name()
            .unwrap_or_default()
            .to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(malformed)? {
            if bytes.len() <= MAX_LOGO_BYTES {
                bytes.extend_from_slice(&chunk);
            }
        }

        if name == "logo" {
            if !bytes.is_empty() {
                logo = Some(bytes);
            }
            continue;
        }

        let text = Some(String::from_utf8_lossy(&bytes).into_owned());
        match name.as_str() {
            "name" => form.name = text,
            "email" => form.email = text,
            "website" => form.website = text,
            _ => {}
        }
    }

    Ok((form.normalized(), logo))
}

/// Rules shared by create and update. `ignore` is the company being updated, which may
/// keep its own name and email.
pub async fn validate_company(
    form: &CompanyForm,
    logo: Option<Vec<u8>>,
    companies: &dyn CompanyRepository,
    ignore: Option<i64>,
) -> Result<ValidCompany, AppError> {
    let mut errors = validate_payload(form);
    errors.merge(unique_rules(form, companies, ignore, &errors).await?);

    let logo = match logo.map(inspect_image) {
        Some(Ok(upload)) => Some(upload),
        Some(Err(failures)) => {
            for failure in failures {
                errors.add("logo", failure);
            }
            None
        }
        None => None,
    };

    if !errors.is_empty() {
        return Err(AppError::validation(errors, form));
    }

    Ok(ValidCompany {
        input: CompanyInput {
            name: form.name.clone().unwrap_or_default(),
            email: form.email.clone(),
            website: form.website.clone(),
        },
        logo,
    })
}

async fn unique_rules(
    form: &CompanyForm,
    companies: &dyn CompanyRepository,
    ignore: Option<i64>,
    errors: &FieldErrors,
) -> Result<FieldErrors, AppError> {
    let mut unique = FieldErrors::new();

    if let (Some(name), false) = (&form.name, errors.has("name")) {
        if companies
            .name_taken(name, ignore)
            .await
            .map_err(fail_with(UNEXPECTED_MESSAGE))?
        {
            unique.add("name", "A company with this name already exists.");
        }
    }

    if let (Some(email), false) = (&form.email, errors.has("email")) {
        if companies
            .email_taken(email, ignore)
            .await
            .map_err(fail_with(UNEXPECTED_MESSAGE))?
        {
            unique.add("email", "A company with this email already exists.");
        }
    }

    Ok(unique)
}
