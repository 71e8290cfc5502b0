use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::db::{EmployeeListQuery, EmployeeSort, ListQuery, Sort, SortDirection, SortField};
use crate::errors::AppError;
use crate::utils::validation::{clean, invalid, parse_id, validate_id, validate_payload, FieldErrors};

pub const MAX_PER_PAGE: u32 = 100;

/// Query string of a listing page. Everything arrives as text and is checked here.
#[derive(Debug, Default, Clone, Deserialize, Serialize, Validate)]
pub struct IndexParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_page")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_per_page")]
    pub per_page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255, message = "The search may not be greater than 255 characters."))]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_sort_direction")]
    pub sort_direction: Option<String>,
}

/// Employee listing query: the shared list parameters plus the company filters.
#[derive(Debug, Default, Clone, Deserialize, Serialize, Validate)]
pub struct EmployeeIndexParams {
    #[serde(flatten)]
    pub list: IndexParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_id")]
    pub company_id: Option<String>,
    #[serde(skip_serializing)]
    pub view_company_id: Option<String>,
}

fn validate_page(page: &str) -> Result<(), ValidationError> {
    match page.parse::<u32>() {
        Ok(n) if n >= 1 => Ok(()),
        _ => Err(invalid("page", "The page must be an integer of at least 1.")),
    }
}

fn validate_per_page(per_page: &str) -> Result<(), ValidationError> {
    match per_page.parse::<u32>() {
        Ok(n) if (1..=MAX_PER_PAGE).contains(&n) => Ok(()),
        _ => Err(invalid("per_page", "The per page must be an integer between 1 and 100.")),
    }
}

fn validate_sort_direction(direction: &str) -> Result<(), ValidationError> {
    match SortDirection::parse(direction) {
        Some(_) => Ok(()),
        None => Err(invalid("sort_direction", "The selected sort direction is invalid.")),
    }
}

impl IndexParams {
    pub fn normalized(self) -> Self {
        IndexParams {
            page: clean(self.page),
            per_page: clean(self.per_page),
            search: clean(self.search),
            sort_by: clean(self.sort_by),
            sort_direction: clean(self.sort_direction),
        }
    }

    /// Runs the list rules for a resource sortable by `S`, returning the failures and the
    /// sort field when it is valid.
    fn check<S: SortField>(&self) -> (FieldErrors, Option<S>) {
        let mut errors = validate_payload(self);

        let sort_field = match &self.sort_by {
            Some(sort_by) => match S::parse(sort_by) {
                Some(field) => Some(field),
                None => {
                    errors.add("sort_by", "The selected sort by is invalid.");
                    None
                }
            },
            None => None,
        };

        (errors, sort_field)
    }

    /// Checks every parameter and builds the query for a resource sortable by `S`.
    pub fn to_query<S: SortField>(&self, default_per_page: u32) -> Result<ListQuery<S>, AppError> {
        let (errors, sort_field) = self.check::<S>();
        if !errors.is_empty() {
            return Err(AppError::validation(errors, self));
        }
        Ok(self.build(sort_field, default_per_page))
    }

    fn build<S: SortField>(&self, sort_field: Option<S>, default_per_page: u32) -> ListQuery<S> {
        let direction = self.sort_direction.as_deref().and_then(SortDirection::parse);
        let sort = match (sort_field, direction) {
            (Some(field), Some(direction)) => Some(Sort { field, direction }),
            _ => None,
        };

        ListQuery {
            search: self.search.clone(),
            sort,
            page: self.page.as_deref().and_then(|p| p.parse().ok()).unwrap_or(1),
            per_page: self
                .per_page
                .as_deref()
                .and_then(|p| p.parse().ok())
                .unwrap_or(default_per_page),
        }
    }
}

impl EmployeeIndexParams {
    pub fn normalized(self) -> Self {
        EmployeeIndexParams {
            list: self.list.normalized(),
            company_id: clean(self.company_id),
            view_company_id: clean(self.view_company_id),
        }
    }

    pub fn to_query(&self, default_per_page: u32) -> Result<EmployeeListQuery, AppError> {
        let (mut errors, sort_field) = self.list.check::<EmployeeSort>();
        errors.merge(validate_payload(self));
        if !errors.is_empty() {
            return Err(AppError::validation(errors, self));
        }

        Ok(EmployeeListQuery {
            list: self.list.build(sort_field, default_per_page),
            company_id: self.company_filter(),
        })
    }

    pub fn company_filter(&self) -> Option<i64> {
        self.company_id.as_deref().and_then(parse_id)
    }

    pub fn view_company(&self) -> Option<i64> {
        self.view_company_id.as_deref().and_then(parse_id)
    }
}
