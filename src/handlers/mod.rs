pub mod custody;
pub mod transfers;

use crate::db::DbPool;
use crate::events::EventSender;
use slog::Logger;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub custody: Arc<crate::services::custody::CustodyService>,
    pub transfers: Arc<crate::services::transfers::TransferService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, base_logger: Logger) -> Self {
        let custody_logger = base_logger.new(slog::o!("component" => "custody_service"));
        let transfers_logger = base_logger.new(slog::o!("component" => "transfer_service"));

        let custody = Arc::new(crate::services::custody::CustodyService::new(
            db_pool.clone(),
            event_sender.clone(),
            custody_logger,
        ));
        let transfers = Arc::new(crate::services::transfers::TransferService::new(
            db_pool,
            event_sender,
            transfers_logger,
        ));

        Self { custody, transfers }
    }
}
