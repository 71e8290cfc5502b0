//! Shared fixtures for handler tests.

use actix_web::http::header;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::AppConfig;
use crate::db::memory::MemoryStore;
use crate::db::{CompanyRepository, EmployeeRepository};
use crate::models::company::{Company, CompanyInput};
use crate::models::employee::{Employee, EmployeeInput};
use crate::notifications::{self, EmployeeAdded};
use crate::state::AppState;
use crate::utils::jwt;
use crate::utils::media::memory::MemoryMediaStore;

/// Smallest byte sequence sniffed as a PNG.
pub const PNG: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R',
];

/// A GIF header, used where a second distinct image is needed.
pub const GIF: &[u8] = b"GIF89a\x01\x00\x01\x00\x00\x00\x00";

pub const BOUNDARY: &str = "----company-manager-test";

pub fn config() -> AppConfig {
    AppConfig {
        database_url: "postgres://localhost/company_manager_test".into(),
        bind_address: "127.0.0.1:0".into(),
        jwt_secret: "test-secret".into(),
        s3_bucket: "company-manager-test".into(),
        media_base_url: "https://media.test".into(),
        app_name: "Company Manager".into(),
    }
}

/// Authorization header for a user holding `permissions`.
pub fn bearer(permissions: &[&str]) -> (header::HeaderName, String) {
    let token = jwt::generate_token("1", permissions, &config().jwt_secret).unwrap();
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// Encodes text fields and an optional logo as `multipart/form-data`.
pub fn multipart(fields: &[(&str, &str)], logo: Option<&[u8]>) -> ((header::HeaderName, String), Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = logo {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"logo\"; filename=\"logo\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                BOUNDARY
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    let content_type = format!("multipart/form-data; boundary={}", BOUNDARY);
    ((header::CONTENT_TYPE, content_type), body)
}

/// In-memory application wiring plus handles to inspect what the handlers did.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub media: Arc<MemoryMediaStore>,
    pub notifications: UnboundedReceiver<EmployeeAdded>,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let media = Arc::new(MemoryMediaStore::default());
        let (notifier, notifications) = notifications::queue();
        let state = AppState::new(config(), store.clone(), media.clone(), Arc::new(notifier));
        TestApp {
            store,
            media,
            notifications,
            state,
        }
    }

    pub async fn company(&self, name: &str, email: Option<&str>) -> Company {
        CompanyRepository::create(
            self.store.as_ref(),
            CompanyInput {
                name: name.to_string(),
                email: email.map(String::from),
                website: None,
            },
            None,
        )
        .await
        .unwrap()
    }

    pub async fn employee(&self, company_id: i64, first_name: &str, email: Option<&str>) -> Employee {
        EmployeeRepository::create(
            self.store.as_ref(),
            EmployeeInput {
                company_id,
                first_name: first_name.to_string(),
                last_name: "Tester".to_string(),
                email: email.map(String::from),
                phone: None,
            },
        )
        .await
        .unwrap()
    }
}
