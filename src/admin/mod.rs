pub mod auth;
pub mod error;
pub mod handlers;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use crate::http::server::AppState;
use self::handlers::*;
use self::auth::admin_auth_middleware;

pub use error::ApiError;

pub fn setup_admin_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/machines", get(list_machines).post(register_machine))
        .route("/machines/name", get(get_machine_name))
        .route("/nginx", get(list_sites))
        .route("/nginx/scan", post(scan_sites))
        .route("/nginx/create-config-file", post(create_config_file))
        .route("/nginx/clear", delete(clear_sites))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware));

    Router::new()
        .route("/status", get(get_status))
        .merge(protected)
        .with_state(state)
}
