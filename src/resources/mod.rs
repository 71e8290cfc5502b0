//! Response payloads built from persisted records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::Page;
use crate::models::company::{Company, CompanyWithLogo};
use crate::models::employee::{Employee, EmployeeWithCompany};
use crate::models::media::Media;
use crate::utils::media::{conversion_key, object_key, MediaStore, LOGO_CONVERSIONS};
use crate::utils::pagination::{paginate, PageLinks, PageMeta};

/// One-time status message attached to a response.
#[derive(Debug, Default, Serialize)]
pub struct Flash {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Flash {
            success: Some(message.into()),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Flash {
            success: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogoResource {
    pub url: String,
    #[serde(rename = "50x50")]
    pub thumb: String,
    pub autox140: String,
}

impl LogoResource {
    pub fn from_media(media: &Media, store: &dyn MediaStore) -> Self {
        let [thumb, autox140] = LOGO_CONVERSIONS.map(|conversion| store.url(&conversion_key(media, conversion)));
        LogoResource {
            url: store.url(&object_key(media.id, &media.file_name)),
            thumb,
            autox140,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CompanyResource {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub website: Option<String>,
    /// Absent unless media was loaded; `null` when loaded and the company has no logo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<Option<LogoResource>>,
}

impl CompanyResource {
    pub fn new(company: Company) -> Self {
        CompanyResource {
            id: company.id,
            name: company.name,
            email: company.email,
            website: company.website,
            logo: None,
        }
    }

    pub fn with_logo(record: CompanyWithLogo, store: &dyn MediaStore) -> Self {
        let logo = record.logo.as_ref().map(|media| LogoResource::from_media(media, store));
        CompanyResource {
            logo: Some(logo),
            ..CompanyResource::new(record.company)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EmployeeResource {
    pub id: i64,
    pub company_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanyResource>,
}

impl EmployeeResource {
    pub fn new(employee: Employee) -> Self {
        EmployeeResource {
            id: employee.id,
            company_id: employee.company_id,
            first_name: employee.first_name,
            last_name: employee.last_name,
            email: employee.email,
            phone: employee.phone,
            created_at: employee.created_at,
            updated_at: employee.updated_at,
            company: None,
        }
    }

    pub fn with_company(record: EmployeeWithCompany) -> Self {
        EmployeeResource {
            company: record.company.map(CompanyResource::new),
            ..EmployeeResource::new(record.employee)
        }
    }
}

/// Paginated list envelope: `{ data, meta, links }`.
#[derive(Debug, Serialize)]
pub struct Collection<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
    pub links: PageLinks,
}

impl<T> Collection<T> {
    pub fn from_page<R>(page: Page<R>, path: &str, to_resource: impl FnMut(R) -> T) -> Self {
        let (meta, links) = paginate(path, page.page, page.per_page, page.total, page.items.len());
        Collection {
            data: page.items.into_iter().map(to_resource).collect(),
            meta,
            links,
        }
    }
}
