pub mod categories;
pub mod common;
pub mod dashboard;
pub mod departments;
pub mod employees;
pub mod locations;
pub mod products;
pub mod serials;
pub mod transactions;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    audit::AuditService, dashboard::DashboardService, import::ImportService,
    lending::LendingService, master_data::MasterDataService, products::ProductService,
    serials::SerialService,
};
use std::sync::Arc;

pub use crate::AppState;

/// Services layer used by the HTTP handlers and the CLI
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<ProductService>,
    pub serials: Arc<SerialService>,
    pub lending: Arc<LendingService>,
    pub master_data: Arc<MasterDataService>,
    pub dashboard: Arc<DashboardService>,
    pub import: Arc<ImportService>,
    pub audit: Arc<AuditService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let products = ProductService::new(db_pool.clone(), event_sender.clone());
        let import = ImportService::new(products.clone(), event_sender.clone());

        Self {
            products: Arc::new(products),
            serials: Arc::new(SerialService::new(db_pool.clone(), event_sender.clone())),
            lending: Arc::new(LendingService::new(db_pool.clone(), event_sender.clone())),
            master_data: Arc::new(MasterDataService::new(db_pool.clone(), event_sender)),
            dashboard: Arc::new(DashboardService::new(db_pool.clone())),
            import: Arc::new(import),
            audit: Arc::new(AuditService::new(db_pool)),
        }
    }
}
