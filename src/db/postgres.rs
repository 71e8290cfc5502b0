use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;

use crate::db::{
    CompanyRepository, CompanySort, EmployeeListQuery, EmployeeRepository, ListQuery, Page, SortField,
};
use crate::errors::StoreError;
use crate::models::company::{Company, CompanyInput, CompanyWithLogo};
use crate::models::employee::{Employee, EmployeeInput, EmployeeWithCompany};
use crate::models::media::{Media, NewMedia, LOGO_COLLECTION};

const COMPANY_SEARCH_COLUMNS: &[&str] = &["name", "email"];
const EMPLOYEE_SEARCH_COLUMNS: &[&str] = &["first_name", "last_name", "email", "phone"];

/// Repository implementation over a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn logos_for(&self, company_ids: &[i64]) -> Result<HashMap<i64, Media>, StoreError> {
        if company_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let media = sqlx::query_as::<_, Media>(
            "SELECT * FROM media WHERE company_id = ANY($1) AND collection = $2 ORDER BY created_at",
        )
        .bind(company_ids.to_vec())
        .bind(LOGO_COLLECTION)
        .fetch_all(&self.pool)
        .await?;

        let mut logos = HashMap::new();
        for m in media {
            logos.entry(m.company_id).or_insert(m);
        }
        Ok(logos)
    }
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Appends `AND (col ILIKE $n OR ...)` for a case-insensitive substring search.
fn push_search(builder: &mut QueryBuilder<'_, Postgres>, columns: &[&str], search: &str) {
    let pattern = format!("%{}%", escape_like(search));
    builder.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            builder.push(" OR ");
        }
        builder.push(*column).push(" ILIKE ").push_bind(pattern.clone());
    }
    builder.push(")");
}

fn push_window(builder: &mut QueryBuilder<'_, Postgres>, per_page: u32, offset: i64) {
    builder
        .push(" LIMIT ")
        .push_bind(i64::from(per_page))
        .push(" OFFSET ")
        .push_bind(offset);
}

fn push_company_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ListQuery<CompanySort>) {
    builder.push(" WHERE TRUE");
    if let Some(search) = &query.search {
        push_search(builder, COMPANY_SEARCH_COLUMNS, search);
    }
}

fn push_employee_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &EmployeeListQuery) {
    builder.push(" WHERE TRUE");
    if let Some(company_id) = query.company_id {
        builder.push(" AND company_id = ").push_bind(company_id);
    }
    if let Some(search) = &query.list.search {
        push_search(builder, EMPLOYEE_SEARCH_COLUMNS, search);
    }
}

async fn insert_media(conn: &mut PgConnection, company_id: i64, media: &NewMedia) -> Result<Media, sqlx::Error> {
    sqlx::query_as::<_, Media>(
        "INSERT INTO media (id, company_id, collection, file_name, mime_type, size, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(media.id)
    .bind(company_id)
    .bind(&media.collection)
    .bind(&media.file_name)
    .bind(&media.mime_type)
    .bind(media.size)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
}

#[async_trait]
impl CompanyRepository for PgStore {
    async fn list(&self, query: &ListQuery<CompanySort>) -> Result<Page<CompanyWithLogo>, StoreError> {
        let mut count: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM companies");
        push_company_filters(&mut count, query);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut select: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT * FROM companies");
        push_company_filters(&mut select, query);
        match &query.sort {
            Some(sort) => select.push(format!(
                " ORDER BY {} {}, id ASC",
                sort.field.column(),
                sort.direction.as_sql()
            )),
            None => select.push(" ORDER BY id ASC"),
        };
        push_window(&mut select, query.per_page, query.offset());

        let companies: Vec<Company> = select.build_query_as().fetch_all(&self.pool).await?;
        let ids: Vec<i64> = companies.iter().map(|c| c.id).collect();
        let mut logos = self.logos_for(&ids).await?;

        Ok(Page {
            items: companies
                .into_iter()
                .map(|company| {
                    let logo = logos.remove(&company.id);
                    CompanyWithLogo { company, logo }
                })
                .collect(),
            total,
            page: query.page,
            per_page: query.per_page,
        })
    }

    async fn options(&self, search: Option<&str>, page: u32, per_page: u32) -> Result<Page<Company>, StoreError> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(per_page);

        let mut count: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM companies WHERE TRUE");
        if let Some(search) = search {
            push_search(&mut count, &["name"], search);
        }
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut select: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT * FROM companies WHERE TRUE");
        if let Some(search) = search {
            push_search(&mut select, &["name"], search);
        }
        select.push(" ORDER BY name ASC, id ASC");
        push_window(&mut select, per_page, offset);

        let items = select.build_query_as().fetch_all(&self.pool).await?;
        Ok(Page {
            items,
            total,
            page,
            per_page,
        })
    }

    async fn find(&self, id: i64) -> Result<Option<Company>, StoreError> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    async fn find_with_logo(&self, id: i64) -> Result<Option<CompanyWithLogo>, StoreError> {
        let Some(company) = CompanyRepository::find(self, id).await? else {
            return Ok(None);
        };
        let logo = self.logos_for(&[company.id]).await?.remove(&company.id);
        Ok(Some(CompanyWithLogo { company, logo }))
    }

    async fn name_taken(&self, name: &str, ignore: Option<i64>) -> Result<bool, StoreError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM companies WHERE LOWER(name) = LOWER($1) AND ($2::BIGINT IS NULL OR id != $2))",
        )
        .bind(name)
        .bind(ignore)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn email_taken(&self, email: &str, ignore: Option<i64>) -> Result<bool, StoreError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM companies WHERE LOWER(email) = LOWER($1) AND ($2::BIGINT IS NULL OR id != $2))",
        )
        .bind(email)
        .bind(ignore)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn create(&self, input: CompanyInput, logo: Option<NewMedia>) -> Result<Company, StoreError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let company = sqlx::query_as::<_, Company>(
            "INSERT INTO companies (name, email, website, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $4) RETURNING *",
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.website)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(logo) = &logo {
            insert_media(&mut *tx, company.id, logo).await?;
        }

        tx.commit().await?;
        Ok(company)
    }

    async fn update(&self, id: i64, input: CompanyInput, logo: Option<NewMedia>) -> Result<Vec<Media>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE companies SET name = $1, email = $2, website = $3, updated_at = $4 WHERE id = $5",
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.website)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "company", id });
        }

        let mut replaced = Vec::new();
        if let Some(logo) = &logo {
            replaced = sqlx::query_as::<_, Media>(
                "DELETE FROM media WHERE company_id = $1 AND collection = $2 RETURNING *",
            )
            .bind(id)
            .bind(&logo.collection)
            .fetch_all(&mut *tx)
            .await?;
            insert_media(&mut *tx, id, logo).await?;
        }

        tx.commit().await?;
        Ok(replaced)
    }

    async fn delete(&self, id: i64) -> Result<Vec<Media>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query_as::<_, Media>("DELETE FROM media WHERE company_id = $1 RETURNING *")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "company", id });
        }

        tx.commit().await?;
        Ok(removed)
    }
}

#[async_trait]
impl EmployeeRepository for PgStore {
    async fn list(&self, query: &EmployeeListQuery) -> Result<Page<EmployeeWithCompany>, StoreError> {
        let mut count: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM employees");
        push_employee_filters(&mut count, query);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut select: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT * FROM employees");
        push_employee_filters(&mut select, query);
        match &query.list.sort {
            Some(sort) => select.push(format!(
                " ORDER BY {} {}, id ASC",
                sort.field.column(),
                sort.direction.as_sql()
            )),
            None => select.push(" ORDER BY created_at DESC, id DESC"),
        };
        push_window(&mut select, query.list.per_page, query.list.offset());

        let employees: Vec<Employee> = select.build_query_as().fetch_all(&self.pool).await?;

        let mut company_ids: Vec<i64> = employees.iter().map(|e| e.company_id).collect();
        company_ids.sort_unstable();
        company_ids.dedup();
        let companies: HashMap<i64, Company> = if company_ids.is_empty() {
            HashMap::new()
        } else {
            sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = ANY($1)")
                .bind(company_ids)
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .map(|c| (c.id, c))
                .collect()
        };

        Ok(Page {
            items: employees
                .into_iter()
                .map(|employee| {
                    let company = companies.get(&employee.company_id).cloned();
                    EmployeeWithCompany { employee, company }
                })
                .collect(),
            total,
            page: query.list.page,
            per_page: query.list.per_page,
        })
    }

    async fn find(&self, id: i64) -> Result<Option<Employee>, StoreError> {
        let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn email_taken(&self, email: &str, ignore: Option<i64>) -> Result<bool, StoreError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM employees WHERE LOWER(email) = LOWER($1) AND ($2::BIGINT IS NULL OR id != $2))",
        )
        .bind(email)
        .bind(ignore)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn exists_for_company(&self, company_id: i64) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM employees WHERE company_id = $1)")
            .bind(company_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn create(&self, input: EmployeeInput) -> Result<Employee, StoreError> {
        let now = Utc::now();
        let employee = sqlx::query_as::<_, Employee>(
            "INSERT INTO employees (company_id, first_name, last_name, email, phone, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $6) RETURNING *",
        )
        .bind(input.company_id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(employee)
    }

    async fn update(&self, id: i64, input: EmployeeInput) -> Result<Employee, StoreError> {
        sqlx::query_as::<_, Employee>(
            "UPDATE employees SET company_id = $1, first_name = $2, last_name = $3, email = $4, phone = $5, \
             updated_at = $6 WHERE id = $7 RETURNING *",
        )
        .bind(input.company_id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound { entity: "employee", id })
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let deleted = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "employee", id });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_is_an_ored_ilike_group() {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT * FROM employees WHERE TRUE");
        push_search(&mut builder, EMPLOYEE_SEARCH_COLUMNS, "ann");
        assert_eq!(
            builder.sql(),
            "SELECT * FROM employees WHERE TRUE AND (first_name ILIKE $1 OR last_name ILIKE $2 OR email ILIKE $3 OR phone ILIKE $4)"
        );
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn company_filters_only_search_name_and_email() {
        let query = ListQuery {
            search: Some("acme".to_string()),
            sort: None,
            page: 1,
            per_page: 10,
        };
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM companies");
        push_company_filters(&mut builder, &query);
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM companies WHERE TRUE AND (name ILIKE $1 OR email ILIKE $2)"
        );
    }
}
