//! In-process repositories used by the handler tests.

use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Mutex;

use crate::db::{
    CompanyRepository, CompanySort, EmployeeListQuery, EmployeeRepository, EmployeeSort, ListQuery, Page,
    Sort, SortDirection,
};
use crate::errors::StoreError;
use crate::models::company::{Company, CompanyInput, CompanyWithLogo};
use crate::models::employee::{Employee, EmployeeInput, EmployeeWithCompany};
use crate::models::media::{Media, NewMedia, LOGO_COLLECTION};

#[derive(Default)]
struct Tables {
    companies: Vec<Company>,
    employees: Vec<Employee>,
    media: Vec<Media>,
    next_company_id: i64,
    next_employee_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail as a database outage would.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, AtomicOrdering::SeqCst);
    }

    pub fn companies(&self) -> Vec<Company> {
        self.tables.lock().unwrap().companies.clone()
    }

    pub fn employees(&self) -> Vec<Employee> {
        self.tables.lock().unwrap().employees.clone()
    }

    pub fn media(&self) -> Vec<Media> {
        self.tables.lock().unwrap().media.clone()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

fn contains(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

fn same(a: Option<&str>, b: &str) -> bool {
    a.is_some_and(|a| a.to_lowercase() == b.to_lowercase())
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

fn window<T>(items: Vec<T>, page: u32, per_page: u32) -> Page<T> {
    let total = items.len() as i64;
    let offset = i64::from(page.saturating_sub(1)) * i64::from(per_page);
    let skip = usize::try_from(offset).unwrap_or(usize::MAX);
    Page {
        items: items.into_iter().skip(skip).take(per_page as usize).collect(),
        total,
        page,
        per_page,
    }
}

fn new_media(company_id: i64, media: &NewMedia) -> Media {
    Media {
        id: media.id,
        company_id,
        collection: media.collection.clone(),
        file_name: media.file_name.clone(),
        mime_type: media.mime_type.clone(),
        size: media.size,
        created_at: Utc::now(),
    }
}

fn company_key(company: &Company, field: CompanySort) -> Option<String> {
    match field {
        CompanySort::Name => Some(company.name.clone()),
        CompanySort::Email => company.email.clone(),
        CompanySort::Website => company.website.clone(),
    }
}

fn employee_key(employee: &Employee, field: EmployeeSort) -> Option<String> {
    match field {
        EmployeeSort::FirstName => Some(employee.first_name.clone()),
        EmployeeSort::Email => employee.email.clone(),
        EmployeeSort::Phone => employee.phone.clone(),
    }
}

#[async_trait]
impl CompanyRepository for MemoryStore {
    async fn list(&self, query: &ListQuery<CompanySort>) -> Result<Page<CompanyWithLogo>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let mut companies: Vec<Company> = tables
            .companies
            .iter()
            .filter(|c| match &query.search {
                Some(search) => contains(Some(c.name.as_str()), search) || contains(c.email.as_deref(), search),
                None => true,
            })
            .cloned()
            .collect();

        match query.sort {
            Some(Sort { field, direction }) => companies.sort_by(|a, b| {
                directed(company_key(a, field).cmp(&company_key(b, field)), direction).then(a.id.cmp(&b.id))
            }),
            None => companies.sort_by_key(|c| c.id),
        }

        Ok(window(companies, query.page, query.per_page).map(|company| {
            let logo = tables
                .media
                .iter()
                .find(|m| m.company_id == company.id && m.collection == LOGO_COLLECTION)
                .cloned();
            CompanyWithLogo { company, logo }
        }))
    }

    async fn options(&self, search: Option<&str>, page: u32, per_page: u32) -> Result<Page<Company>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let mut companies: Vec<Company> = tables
            .companies
            .iter()
            .filter(|c| search.map_or(true, |s| contains(Some(c.name.as_str()), s)))
            .cloned()
            .collect();
        companies.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(window(companies, page, per_page))
    }

    async fn find(&self, id: i64) -> Result<Option<Company>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.companies.iter().find(|c| c.id == id).cloned())
    }

    async fn find_with_logo(&self, id: i64) -> Result<Option<CompanyWithLogo>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.companies.iter().find(|c| c.id == id).cloned().map(|company| {
            let logo = tables
                .media
                .iter()
                .find(|m| m.company_id == id && m.collection == LOGO_COLLECTION)
                .cloned();
            CompanyWithLogo { company, logo }
        }))
    }

    async fn name_taken(&self, name: &str, ignore: Option<i64>) -> Result<bool, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .companies
            .iter()
            .any(|c| Some(c.id) != ignore && same(Some(c.name.as_str()), name)))
    }

    async fn email_taken(&self, email: &str, ignore: Option<i64>) -> Result<bool, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .companies
            .iter()
            .any(|c| Some(c.id) != ignore && same(c.email.as_deref(), email)))
    }

    async fn create(&self, input: CompanyInput, logo: Option<NewMedia>) -> Result<Company, StoreError> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        tables.next_company_id += 1;
        let now = Utc::now();
        let company = Company {
            id: tables.next_company_id,
            name: input.name,
            email: input.email,
            website: input.website,
            created_at: now,
            updated_at: now,
        };
        tables.companies.push(company.clone());
        if let Some(logo) = &logo {
            tables.media.push(new_media(company.id, logo));
        }
        Ok(company)
    }

    async fn update(&self, id: i64, input: CompanyInput, logo: Option<NewMedia>) -> Result<Vec<Media>, StoreError> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        let company = tables
            .companies
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound { entity: "company", id })?;
        company.name = input.name;
        company.email = input.email;
        company.website = input.website;
        company.updated_at = Utc::now();

        let mut replaced = Vec::new();
        if let Some(logo) = &logo {
            let (old, kept): (Vec<Media>, Vec<Media>) = tables
                .media
                .drain(..)
                .partition(|m| m.company_id == id && m.collection == logo.collection);
            tables.media = kept;
            tables.media.push(new_media(id, logo));
            replaced = old;
        }
        Ok(replaced)
    }

    async fn delete(&self, id: i64) -> Result<Vec<Media>, StoreError> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        if !tables.companies.iter().any(|c| c.id == id) {
            return Err(StoreError::NotFound { entity: "company", id });
        }
        tables.companies.retain(|c| c.id != id);
        let (removed, kept): (Vec<Media>, Vec<Media>) = tables.media.drain(..).partition(|m| m.company_id == id);
        tables.media = kept;
        Ok(removed)
    }
}

#[async_trait]
impl EmployeeRepository for MemoryStore {
    async fn list(&self, query: &EmployeeListQuery) -> Result<Page<EmployeeWithCompany>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let mut employees: Vec<Employee> = tables
            .employees
            .iter()
            .filter(|e| query.company_id.map_or(true, |id| e.company_id == id))
            .filter(|e| match &query.list.search {
                Some(search) => {
                    contains(Some(e.first_name.as_str()), search)
                        || contains(Some(e.last_name.as_str()), search)
                        || contains(e.email.as_deref(), search)
                        || contains(e.phone.as_deref(), search)
                }
                None => true,
            })
            .cloned()
            .collect();

        match query.list.sort {
            Some(Sort { field, direction }) => employees.sort_by(|a, b| {
                directed(employee_key(a, field).cmp(&employee_key(b, field)), direction).then(a.id.cmp(&b.id))
            }),
            None => employees.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))),
        }

        Ok(window(employees, query.list.page, query.list.per_page).map(|employee| {
            let company = tables.companies.iter().find(|c| c.id == employee.company_id).cloned();
            EmployeeWithCompany { employee, company }
        }))
    }

    async fn find(&self, id: i64) -> Result<Option<Employee>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.employees.iter().find(|e| e.id == id).cloned())
    }

    async fn email_taken(&self, email: &str, ignore: Option<i64>) -> Result<bool, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .employees
            .iter()
            .any(|e| Some(e.id) != ignore && same(e.email.as_deref(), email)))
    }

    async fn exists_for_company(&self, company_id: i64) -> Result<bool, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.employees.iter().any(|e| e.company_id == company_id))
    }

    async fn create(&self, input: EmployeeInput) -> Result<Employee, StoreError> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        tables.next_employee_id += 1;
        let now = Utc::now();
        let employee = Employee {
            id: tables.next_employee_id,
            company_id: input.company_id,
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            phone: input.phone,
            created_at: now,
            updated_at: now,
        };
        tables.employees.push(employee.clone());
        Ok(employee)
    }

    async fn update(&self, id: i64, input: EmployeeInput) -> Result<Employee, StoreError> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        let employee = tables
            .employees
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(StoreError::NotFound { entity: "employee", id })?;
        employee.company_id = input.company_id;
        employee.first_name = input.first_name;
        employee.last_name = input.last_name;
        employee.email = input.email;
        employee.phone = input.phone;
        employee.updated_at = Utc::now();
        Ok(employee.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        if !tables.employees.iter().any(|e| e.id == id) {
            return Err(StoreError::NotFound { entity: "employee", id });
        }
        tables.employees.retain(|e| e.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::window;

    #[test]
    fn window_slices_the_requested_page() {
        let page = window((1..=25).collect::<Vec<i32>>(), 3, 10);
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total, 25);
    }

    #[test]
    fn window_past_the_end_is_empty_for_any_page_number() {
        for page_number in [4, 1_000_000, u32::MAX] {
            let page = window((1..=25).collect::<Vec<i32>>(), page_number, 100);
            assert!(page.items.is_empty(), "page {}", page_number);
            assert_eq!(page.total, 25);
            assert_eq!(page.page, page_number);
        }
    }
}
