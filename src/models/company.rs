use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::media::Media;

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated attributes written on create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyInput {
    pub name: String,
    pub email: Option<String>,
    pub website: Option<String>,
}

/// A company together with its eager-loaded logo.
#[derive(Debug, Clone)]
pub struct CompanyWithLogo {
    pub company: Company,
    pub logo: Option<Media>,
}
