use actix_web::web;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::{CompanyRepository, EmployeeRepository};
use crate::notifications::Notifier;
use crate::routes;
use crate::utils::media::MediaStore;

/// Shared services handed to every worker's `App`.
#[derive(Clone)]
pub struct AppState {
    pub config: web::Data<AppConfig>,
    pub companies: web::Data<dyn CompanyRepository>,
    pub employees: web::Data<dyn EmployeeRepository>,
    pub media: web::Data<dyn MediaStore>,
    pub notifier: web::Data<dyn Notifier>,
}

impl AppState {
    pub fn new<S>(config: AppConfig, store: Arc<S>, media: Arc<dyn MediaStore>, notifier: Arc<dyn Notifier>) -> Self
    where
        S: CompanyRepository + EmployeeRepository + 'static,
    {
        let companies: Arc<dyn CompanyRepository> = store.clone();
        let employees: Arc<dyn EmployeeRepository> = store;

        AppState {
            config: web::Data::new(config),
            companies: web::Data::from(companies),
            employees: web::Data::from(employees),
            media: web::Data::from(media),
            notifier: web::Data::from(notifier),
        }
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.config.clone())
            .app_data(self.companies.clone())
            .app_data(self.employees.clone())
            .app_data(self.media.clone())
            .app_data(self.notifier.clone());
        routes::configure(cfg);
    }
}
