pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::errors::StoreError;
use crate::models::company::{Company, CompanyInput, CompanyWithLogo};
use crate::models::employee::{Employee, EmployeeInput, EmployeeWithCompany};
use crate::models::media::{Media, NewMedia};

pub use postgres::PgStore;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A column a listing may be ordered by. Each resource exposes its own closed set.
pub trait SortField: Copy + Sized {
    fn parse(value: &str) -> Option<Self>;
    fn column(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanySort {
    Name,
    Email,
    Website,
}

impl SortField for CompanySort {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "name" => Some(CompanySort::Name),
            "email" => Some(CompanySort::Email),
            "website" => Some(CompanySort::Website),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            CompanySort::Name => "name",
            CompanySort::Email => "email",
            CompanySort::Website => "website",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmployeeSort {
    FirstName,
    Email,
    Phone,
}

impl SortField for EmployeeSort {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "first_name" => Some(EmployeeSort::FirstName),
            "email" => Some(EmployeeSort::Email),
            "phone" => Some(EmployeeSort::Phone),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            EmployeeSort::FirstName => "first_name",
            EmployeeSort::Email => "email",
            EmployeeSort::Phone => "phone",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<S> {
    pub field: S,
    pub direction: SortDirection,
}

/// Search, ordering and page window of a listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery<S> {
    pub search: Option<String>,
    pub sort: Option<Sort<S>>,
    pub page: u32,
    pub per_page: u32,
}

impl<S> ListQuery<S> {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeListQuery {
    pub list: ListQuery<EmployeeSort>,
    pub company_id: Option<i64>,
}

/// One page of a listing plus the total number of matching rows.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[async_trait]
pub trait CompanyRepository: Send + Sync {
    /// Filtered, ordered page of companies with their logos loaded.
    async fn list(&self, query: &ListQuery<CompanySort>) -> Result<Page<CompanyWithLogo>, StoreError>;

    /// Name search ordered by name, used by selection controls.
    async fn options(&self, search: Option<&str>, page: u32, per_page: u32) -> Result<Page<Company>, StoreError>;

    async fn find(&self, id: i64) -> Result<Option<Company>, StoreError>;

    async fn find_with_logo(&self, id: i64) -> Result<Option<CompanyWithLogo>, StoreError>;

    async fn name_taken(&self, name: &str, ignore: Option<i64>) -> Result<bool, StoreError>;

    async fn email_taken(&self, email: &str, ignore: Option<i64>) -> Result<bool, StoreError>;

    /// Inserts the company and, in the same transaction, its logo record.
    async fn create(&self, input: CompanyInput, logo: Option<NewMedia>) -> Result<Company, StoreError>;

    /// Updates the company. When `logo` is given the previous logo records are
    /// removed in the same transaction and returned so their files can be deleted.
    async fn update(&self, id: i64, input: CompanyInput, logo: Option<NewMedia>) -> Result<Vec<Media>, StoreError>;

    /// Deletes the company and returns the media records that were attached to it.
    async fn delete(&self, id: i64) -> Result<Vec<Media>, StoreError>;
}

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// Filtered, ordered page of employees with their companies loaded.
    async fn list(&self, query: &EmployeeListQuery) -> Result<Page<EmployeeWithCompany>, StoreError>;

    async fn find(&self, id: i64) -> Result<Option<Employee>, StoreError>;

    async fn email_taken(&self, email: &str, ignore: Option<i64>) -> Result<bool, StoreError>;

    async fn exists_for_company(&self, company_id: i64) -> Result<bool, StoreError>;

    async fn create(&self, input: EmployeeInput) -> Result<Employee, StoreError>;

    async fn update(&self, id: i64, input: EmployeeInput) -> Result<Employee, StoreError>;

    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_fields_are_closed_per_resource() {
        assert_eq!(CompanySort::parse("website"), Some(CompanySort::Website));
        assert_eq!(CompanySort::parse("first_name"), None);
        assert_eq!(EmployeeSort::parse("first_name"), Some(EmployeeSort::FirstName));
        assert_eq!(EmployeeSort::parse("name"), None);
        assert_eq!(SortDirection::parse("DESC"), None);
    }

    #[test]
    fn offset_follows_page_window() {
        let query = ListQuery::<CompanySort> {
            search: None,
            sort: None,
            page: 3,
            per_page: 10,
        };
        assert_eq!(query.offset(), 20);
    }
}
