use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const LOGO_COLLECTION: &str = "logo";

/// A stored file attached to a company, grouped by collection.
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Media {
    pub id: Uuid,
    pub company_id: i64,
    pub collection: String,
    pub file_name: String,
    pub mime_type: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMedia {
    pub id: Uuid,
    pub collection: String,
    pub file_name: String,
    pub mime_type: String,
    pub size: i64,
}
