pub mod http;

pub use http::{create_router, get_health, get_transfers, get_transfers_page, status_for, ApiServer, AppState, HealthResponse};
