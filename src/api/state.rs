//! Shared application state

use std::sync::Arc;

use crate::db::Database;
use crate::service::LedgerService;

pub struct AppState {
    pub db: Arc<Database>,
    pub service: Arc<LedgerService>,
}

impl AppState {
    pub fn new(db: Arc<Database>) -> Self {
        let service = Arc::new(LedgerService::new(db.clone()));
        Self { db, service }
    }
}
